/// Available commands and autocomplete logic

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
  Products,
  Orders,
  Users,
  Posts,
  Reports,
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  pub target: Target,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "products",
    aliases: &["p", "product", "catalog"],
    description: "Browse the product catalog",
    target: Target::Products,
  },
  Command {
    name: "orders",
    aliases: &["o", "order"],
    description: "Manage orders and their status",
    target: Target::Orders,
  },
  Command {
    name: "users",
    aliases: &["u", "user", "accounts"],
    description: "Back-office user accounts",
    target: Target::Users,
  },
  Command {
    name: "posts",
    aliases: &["blog", "post"],
    description: "Blog posts",
    target: Target::Posts,
  },
  Command {
    name: "reports",
    aliases: &["r", "report", "sales"],
    description: "Sales reports",
    target: Target::Reports,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit storefront-admin",
    target: Target::Quit,
  },
];

/// Look up a command by exact name or alias
pub fn find(input: &str) -> Option<&'static Command> {
  let input = input.trim().to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == input || cmd.aliases.contains(&input.as_str()))
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_priority(cmd, &input_lower).map(|p| (cmd, p)))
    .collect();

  // Stable sort keeps declaration order within a priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower is better; None means no match
fn match_priority(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("orders");
    assert_eq!(suggestions[0].target, Target::Orders);
  }

  #[test]
  fn test_alias_beats_prefix() {
    // "p" is an alias of products and a prefix of posts
    let suggestions = get_suggestions("p");
    assert_eq!(suggestions[0].name, "products");
    assert!(suggestions.iter().any(|c| c.name == "posts"));
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("rep");
    assert_eq!(suggestions[0].name, "reports");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("der");
    assert_eq!(suggestions[0].name, "orders");
  }

  #[test]
  fn test_find_by_alias() {
    assert_eq!(find(" Sales ").map(|c| c.target), Some(Target::Reports));
    assert!(find("nope").is_none());
  }
}
