pub mod footer;
pub mod header;
pub mod product;
pub mod utils;

pub use footer::draw_footer;
pub use header::draw_header;
pub use product::{error_message, product_panel, product_row, ProductCard, ProductPanel};
pub use utils::{availability_color, status_color, truncate};
