/// Shell commands and name resolution

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
  View,
  Employees,
  Select,
  More,
  Approve,
  Reject,
  Refresh,
  Help,
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
  pub kind: CommandKind,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "view",
    aliases: &["v", "ls", "list"],
    usage: "view",
    description: "Show the current transactions",
    kind: CommandKind::View,
  },
  Command {
    name: "employees",
    aliases: &["e", "emp"],
    usage: "employees",
    description: "List employees to filter by",
    kind: CommandKind::Employees,
  },
  Command {
    name: "select",
    aliases: &["s", "filter"],
    usage: "select <employee-id|all>",
    description: "Show one employee's transactions, or all",
    kind: CommandKind::Select,
  },
  Command {
    name: "more",
    aliases: &["m", "next"],
    usage: "more",
    description: "Load the next page of transactions",
    kind: CommandKind::More,
  },
  Command {
    name: "approve",
    aliases: &["a", "ok"],
    usage: "approve <transaction-id>",
    description: "Mark a transaction approved",
    kind: CommandKind::Approve,
  },
  Command {
    name: "reject",
    aliases: &["r", "unapprove"],
    usage: "reject <transaction-id>",
    description: "Clear a transaction's approval",
    kind: CommandKind::Reject,
  },
  Command {
    name: "refresh",
    aliases: &["reload"],
    usage: "refresh",
    description: "Reload the current view from the backend",
    kind: CommandKind::Refresh,
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "Show available commands",
    kind: CommandKind::Help,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Exit txreview",
    kind: CommandKind::Quit,
  },
];

/// How a command matched the typed name, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
  Name,
  Alias,
  NamePrefix,
  AliasPrefix,
  NameContains,
  AliasContains,
}

impl Command {
  fn match_kind(&self, input: &str) -> Option<MatchKind> {
    if self.name == input {
      Some(MatchKind::Name)
    } else if self.aliases.contains(&input) {
      Some(MatchKind::Alias)
    } else if self.name.starts_with(input) {
      Some(MatchKind::NamePrefix)
    } else if self.aliases.iter().any(|a| a.starts_with(input)) {
      Some(MatchKind::AliasPrefix)
    } else if self.name.contains(input) {
      Some(MatchKind::NameContains)
    } else if self.aliases.iter().any(|a| a.contains(input)) {
      Some(MatchKind::AliasContains)
    } else {
      None
    }
  }
}

/// Commands matching a typed name, ranked by [`MatchKind`]. Table order
/// breaks ties.
pub fn get_suggestions(input: &str) -> Vec<(&'static Command, MatchKind)> {
  let input = input.to_lowercase();
  if input.is_empty() {
    return COMMANDS.iter().map(|cmd| (cmd, MatchKind::Name)).collect();
  }

  let mut matches: Vec<_> = COMMANDS
    .iter()
    .filter_map(|cmd| cmd.match_kind(&input).map(|kind| (cmd, kind)))
    .collect();
  matches.sort_by_key(|(_, kind)| *kind);
  matches
}

/// Split an input line into the best matching command and its arguments.
pub fn parse(line: &str) -> Option<(&'static Command, Vec<&str>)> {
  let mut words = line.split_whitespace();
  let name = words.next()?;
  let (cmd, _) = get_suggestions(name).into_iter().next()?;
  Some((cmd, words.collect()))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn best(input: &str) -> (CommandKind, MatchKind) {
    let (cmd, kind) = get_suggestions(input)[0];
    (cmd.kind, kind)
  }

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    assert_eq!(best("select"), (CommandKind::Select, MatchKind::Name));
    assert_eq!(best("QUIT"), (CommandKind::Quit, MatchKind::Name));
  }

  #[test]
  fn test_alias_beats_prefix() {
    // "r" is reject's alias and a prefix of "refresh"
    assert_eq!(best("r"), (CommandKind::Reject, MatchKind::Alias));
    let kinds: Vec<_> = get_suggestions("r").iter().map(|(cmd, _)| cmd.kind).collect();
    assert!(kinds.contains(&CommandKind::Refresh));
  }

  #[test]
  fn test_prefix_match() {
    assert_eq!(best("emp"), (CommandKind::Employees, MatchKind::Alias));
    assert_eq!(best("appr"), (CommandKind::Approve, MatchKind::NamePrefix));
    assert_eq!(best("rel"), (CommandKind::Refresh, MatchKind::AliasPrefix));
  }

  #[test]
  fn test_fuzzy_match() {
    assert_eq!(best("fres"), (CommandKind::Refresh, MatchKind::NameContains));
    assert_eq!(best("xi"), (CommandKind::Quit, MatchKind::AliasContains));
  }

  #[test]
  fn test_parse_with_arguments() {
    let (cmd, args) = parse("  approve   t42 ").unwrap();
    assert_eq!(cmd.kind, CommandKind::Approve);
    assert_eq!(args, vec!["t42"]);

    assert!(parse("   ").is_none());
    assert!(parse("zzz").is_none());
  }
}
