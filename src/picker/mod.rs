//! Menu rendering through an external fuzzy-finder.

mod fzf;

pub use fzf::FzfPicker;

use thiserror::Error;

/// Outcome of presenting a menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
  /// Indices into the candidate list.
  Picked(Vec<usize>),
  /// The user backed out (escape/interrupt) or matched nothing.
  Cancelled,
}

#[derive(Debug, Error)]
pub enum PickerError {
  #[error("fzf not found on PATH; install fzf to use this tool")]
  NotFound,

  #[error("failed to run {program}: {source}")]
  SpawnFailed {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("fzf exited with unexpected status {0}")]
  Aborted(i32),

  #[error("fzf returned an unreadable selection: {0}")]
  Malformed(String),
}

/// A choose-one (or choose-many) menu over display lines.
///
/// Implementations block until the user decides; cancellation is a normal
/// outcome, not an error.
#[allow(async_fn_in_trait)]
pub trait Picker {
  async fn choose(
    &self,
    prompt: &str,
    items: &[String],
    multi: bool,
  ) -> Result<Selection, PickerError>;
}
