//! Player detection, spawning, and exit classification.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::jellyfin::StreamDescriptor;

use super::{PlaybackLauncher, PlaybackResult, PlayerError};

/// Players probed in order when no explicit override is given.
const CANDIDATES: &[&str] = &["mpv", "ffplay"];

/// Launcher that spawns a player process per track and waits for it.
///
/// The binary is resolved on every play so installing a player mid-session
/// works without a restart; a miss is a recoverable playback failure.
pub struct ProcessLauncher {
  override_path: Option<String>,
  extra_args: Vec<String>,
  cancel: CancellationToken,
}

impl ProcessLauncher {
  pub fn new(
    override_path: Option<String>,
    extra_args: Vec<String>,
    cancel: CancellationToken,
  ) -> Self {
    Self {
      override_path,
      extra_args,
      cancel,
    }
  }

  fn resolve(&self) -> Result<PathBuf, PlayerError> {
    let program = match &self.override_path {
      Some(name) => which::which(name).map_err(|_| PlayerError::NotFound)?,
      None => find_player().ok_or(PlayerError::NotFound)?,
    };
    Ok(program)
  }
}

impl PlaybackLauncher for ProcessLauncher {
  async fn play(
    &self,
    stream: &StreamDescriptor,
    title: &str,
  ) -> Result<PlaybackResult, PlayerError> {
    let program = self.resolve()?;
    let args = build_args(&program, title, &self.extra_args, &stream.url);

    tracing::info!(
      player = %program.display(),
      container = %stream.container,
      title,
      "starting playback"
    );

    // The child inherits the terminal so the player's own keybindings work.
    let mut child = Command::new(&program)
      .args(&args)
      .kill_on_drop(true)
      .spawn()
      .map_err(|source| PlayerError::SpawnFailed {
        program: program.display().to_string(),
        source,
      })?;

    tokio::select! {
      status = child.wait() => {
        let status = status.map_err(|source| PlayerError::SpawnFailed {
          program: program.display().to_string(),
          source,
        })?;
        let result = classify_exit(status);
        tracing::info!(?result, code = status.code(), "playback finished");
        Ok(result)
      }
      _ = self.cancel.cancelled() => {
        // The terminal's SIGINT usually reaches the child too; make sure,
        // then reap it.
        child.start_kill().ok();
        child.wait().await.ok();
        tracing::info!("playback cancelled");
        Ok(PlaybackResult::Interrupted)
      }
    }
  }
}

/// Find a usable player on PATH.
fn find_player() -> Option<PathBuf> {
  CANDIDATES
    .iter()
    .find_map(|candidate| which::which(candidate).ok())
}

/// Assemble the player invocation: known binaries get quiet, audio-only
/// flags; anything else is invoked bare with the URL last.
fn build_args(program: &Path, title: &str, extra: &[String], url: &str) -> Vec<String> {
  let mut args = Vec::new();
  match program.file_stem().and_then(|stem| stem.to_str()) {
    Some("mpv") => {
      args.push("--no-video".to_string());
      args.push(format!("--force-media-title={}", title));
    }
    Some("ffplay") => {
      args.extend(
        ["-autoexit", "-nodisp", "-loglevel", "error"]
          .iter()
          .map(|arg| arg.to_string()),
      );
    }
    _ => {}
  }
  args.extend(extra.iter().cloned());
  args.push(url.to_string());
  args
}

/// Map a player exit status onto the playback outcome.
fn classify_exit(status: ExitStatus) -> PlaybackResult {
  if status.success() {
    return PlaybackResult::Completed;
  }
  #[cfg(unix)]
  {
    use std::os::unix::process::ExitStatusExt;
    if status.signal().is_some() {
      return PlaybackResult::Interrupted;
    }
  }
  PlaybackResult::Failed
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mpv_args_keep_url_last() {
    let args = build_args(
      Path::new("/usr/bin/mpv"),
      "Come Together - The Beatles",
      &["--volume=50".to_string()],
      "http://server/stream",
    );
    assert_eq!(args[0], "--no-video");
    assert_eq!(args[1], "--force-media-title=Come Together - The Beatles");
    assert_eq!(args[2], "--volume=50");
    assert_eq!(args.last().map(String::as_str), Some("http://server/stream"));
  }

  #[test]
  fn test_ffplay_args() {
    let args = build_args(Path::new("ffplay"), "t", &[], "http://server/stream");
    assert_eq!(
      args,
      vec!["-autoexit", "-nodisp", "-loglevel", "error", "http://server/stream"]
    );
  }

  #[test]
  fn test_unknown_player_gets_url_only() {
    let args = build_args(Path::new("/opt/bin/someplayer"), "t", &[], "http://u");
    assert_eq!(args, vec!["http://u"]);
  }

  #[cfg(unix)]
  #[test]
  fn test_classify_exit() {
    use std::os::unix::process::ExitStatusExt;

    // Wait statuses: exit code is in the high byte, signal in the low byte.
    assert_eq!(
      classify_exit(ExitStatus::from_raw(0)),
      PlaybackResult::Completed
    );
    assert_eq!(
      classify_exit(ExitStatus::from_raw(1 << 8)),
      PlaybackResult::Failed
    );
    assert_eq!(
      classify_exit(ExitStatus::from_raw(15)),
      PlaybackResult::Interrupted
    );
  }
}
