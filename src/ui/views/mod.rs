mod cache_inspector;
mod home;
mod product_detail;
mod product_list;

pub use cache_inspector::CacheInspectorView;
pub use home::HomeView;
pub use product_detail::ProductDetailView;
pub use product_list::ProductListView;
