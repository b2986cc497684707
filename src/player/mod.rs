//! External audio player integration.

mod process;

pub use process::ProcessLauncher;

use thiserror::Error;

use crate::jellyfin::StreamDescriptor;

/// How a playback attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackResult {
  /// The player exited normally (end of stream, or the user quit it).
  Completed,
  /// The player was killed by a signal or cancelled from our side.
  Interrupted,
  /// The player exited with an error status.
  Failed,
}

#[derive(Debug, Error)]
pub enum PlayerError {
  #[error("no audio player found; install mpv or ffplay, or pass --player")]
  NotFound,

  #[error("failed to run {program}: {source}")]
  SpawnFailed {
    program: String,
    #[source]
    source: std::io::Error,
  },
}

/// Hands a resolved stream to an external player and waits it out.
#[allow(async_fn_in_trait)]
pub trait PlaybackLauncher {
  async fn play(
    &self,
    stream: &StreamDescriptor,
    title: &str,
  ) -> Result<PlaybackResult, PlayerError>;
}
