//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

/// Fuzzy-find and stream Jellyfin music from the terminal.
#[derive(Debug, Parser)]
#[command(name = "jfzf", version, about)]
pub struct Cli {
  /// Connect straight to the named server instead of asking.
  #[arg(long, value_name = "NAME")]
  pub server: Option<String>,

  /// Narrow the album list to titles, artists, or genres matching TERM.
  #[arg(long, value_name = "TERM")]
  pub filter: Option<String>,

  /// Register a server (or update an existing name) before browsing.
  #[arg(long)]
  pub add: bool,

  /// Remove the named server and exit.
  #[arg(long, value_name = "NAME", conflicts_with_all = ["add", "server"])]
  pub forget: Option<String>,

  /// Print the configured servers and exit.
  #[arg(long)]
  pub list_servers: bool,

  /// Audio player binary (default: mpv, then ffplay).
  #[arg(long, env = "JFZF_PLAYER", value_name = "PATH")]
  pub player: Option<String>,

  /// Server registry file (default: the user config dir).
  #[arg(long, env = "JFZF_CONFIG", value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Extra arguments passed through to the player.
  #[arg(last = true, value_name = "PLAYER_ARGS")]
  pub player_args: Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
  }

  #[test]
  fn test_player_args_after_double_dash() {
    let cli = Cli::parse_from(["jfzf", "--filter", "beatles", "--", "--volume=50"]);
    assert_eq!(cli.filter.as_deref(), Some("beatles"));
    assert_eq!(cli.player_args, vec!["--volume=50"]);
  }

  #[test]
  fn test_forget_conflicts_with_browse_flags() {
    assert!(Cli::try_parse_from(["jfzf", "--forget", "home", "--server", "home"]).is_err());
  }
}
