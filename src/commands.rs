/// Command table for the `:` prompt

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "dashboard",
    aliases: &["d", "home", "health"],
    description: "Backend status overview",
  },
  Command {
    name: "companies",
    aliases: &["c", "company"],
    description: "List companies",
  },
  Command {
    name: "events",
    aliases: &["e", "sync"],
    description: "Sync a company's events",
  },
  Command {
    name: "reports",
    aliases: &["r", "report", "logs"],
    description: "Generate reports and browse report logs",
  },
  Command {
    name: "settings",
    aliases: &["s", "config"],
    description: "Show effective configuration",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit wzm",
  },
];

impl Command {
  /// Match tier against `input`: exact, then prefix, then substring. Within a
  /// tier the command name beats its aliases.
  fn rank(&self, input: &str) -> Option<(u8, u8)> {
    std::iter::once(self.name)
      .chain(self.aliases.iter().copied())
      .enumerate()
      .filter_map(|(i, word)| {
        let tier = if word == input {
          0
        } else if word.starts_with(input) {
          1
        } else if word.contains(input) {
          2
        } else {
          return None;
        };
        Some((tier, u8::from(i > 0)))
      })
      .min()
  }
}

/// Commands matching `input`, best first. Blank input lists every command in
/// table order.
pub fn suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();
  let mut ranked: Vec<_> = COMMANDS
    .iter()
    .filter_map(|cmd| cmd.rank(&input).map(|rank| (rank, cmd)))
    .collect();
  ranked.sort_by_key(|(rank, _)| *rank);
  ranked.into_iter().map(|(_, cmd)| cmd).collect()
}
