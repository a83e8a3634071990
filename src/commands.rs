/// Available commands and autocomplete logic
use crate::route::Route;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "products",
    aliases: &["p", "list"],
    description: "Browse the catalog",
  },
  Command {
    name: "product",
    aliases: &["show"],
    description: "Open a product by id (product <id>)",
  },
  Command {
    name: "home",
    aliases: &["h"],
    description: "Start page",
  },
  Command {
    name: "cache",
    aliases: &["c", "queries"],
    description: "Inspect the query cache",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit shelf",
  },
];

/// What a submitted command asks the app to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Open(Route),
  Cache,
  Quit,
}

/// Look up a command by exact name or alias
fn find(name: &str) -> Option<&'static Command> {
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Turn a submitted command line into an action
pub fn parse(input: &str) -> Result<Action, String> {
  let mut words = input.split_whitespace();
  let Some(head) = words.next() else {
    return Err("empty command".to_string());
  };
  let arg = words.next();

  let Some(cmd) = find(&head.to_lowercase()) else {
    return Err(format!("unknown command: {}", head));
  };

  match (cmd.name, arg) {
    ("products", _) => Ok(Action::Open(Route::Products)),
    ("home", _) => Ok(Action::Open(Route::Home)),
    ("cache", _) => Ok(Action::Cache),
    ("quit", _) => Ok(Action::Quit),
    ("product", Some(id)) => id
      .parse()
      .map(|id| Action::Open(Route::Product(id)))
      .map_err(|_| format!("invalid product id: {}", id)),
    ("product", None) => Err("usage: product <id>".to_string()),
    _ => Err(format!("unknown command: {}", head)),
  }
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    if cmd.name == input_lower {
      matches.push((cmd, 0));
    } else if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
    } else if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
    } else if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
    } else if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    } else if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Stable sort keeps table order within a priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    assert_eq!(get_suggestions("").len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match_ranks_first() {
    let suggestions = get_suggestions("product");
    assert_eq!(suggestions[0].name, "product");
    assert_eq!(suggestions[1].name, "products");
  }

  #[test]
  fn test_alias_match() {
    assert_eq!(get_suggestions("c")[0].name, "cache");
    assert_eq!(get_suggestions("q")[0].name, "quit");
  }

  #[test]
  fn test_fuzzy_match() {
    assert_eq!(get_suggestions("ach")[0].name, "cache");
  }

  #[test]
  fn test_parse_actions() {
    assert_eq!(parse("products"), Ok(Action::Open(Route::Products)));
    assert_eq!(parse("p"), Ok(Action::Open(Route::Products)));
    assert_eq!(parse("product 7"), Ok(Action::Open(Route::Product(7))));
    assert_eq!(parse("  show   12 "), Ok(Action::Open(Route::Product(12))));
    assert_eq!(parse("cache"), Ok(Action::Cache));
    assert_eq!(parse("QUIT"), Ok(Action::Quit));
  }

  #[test]
  fn test_parse_errors() {
    assert!(parse("").is_err());
    assert_eq!(parse("product"), Err("usage: product <id>".to_string()));
    assert_eq!(parse("product x"), Err("invalid product id: x".to_string()));
    assert_eq!(parse("carts"), Err("unknown command: carts".to_string()));
  }
}
