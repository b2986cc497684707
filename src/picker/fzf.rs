//! fzf subprocess driver.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{Picker, PickerError, Selection};

/// fzf exit codes: 1 = no match, 130 = interrupted (escape or ctrl-c).
const EXIT_NO_MATCH: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

/// Picker backed by the `fzf` binary.
pub struct FzfPicker {
  program: PathBuf,
}

impl FzfPicker {
  /// Locate fzf on PATH. Fails fast so a missing binary surfaces at startup,
  /// not at the first menu.
  pub fn new() -> Result<Self, PickerError> {
    let program = which::which("fzf").map_err(|_| PickerError::NotFound)?;
    tracing::debug!(program = %program.display(), "found fzf");
    Ok(Self { program })
  }
}

impl Picker for FzfPicker {
  async fn choose(
    &self,
    prompt: &str,
    items: &[String],
    multi: bool,
  ) -> Result<Selection, PickerError> {
    let program = self.program.clone();
    let prompt = prompt.to_string();
    let input = render_input(items);

    // fzf owns the terminal until the user decides; keep the runtime free.
    tokio::task::spawn_blocking(move || run_fzf(&program, &prompt, &input, multi))
      .await
      .map_err(|err| PickerError::SpawnFailed {
        program: "fzf".to_string(),
        source: std::io::Error::other(err),
      })?
  }
}

fn run_fzf(program: &Path, prompt: &str, input: &str, multi: bool) -> Result<Selection, PickerError> {
  let mut cmd = Command::new(program);
  cmd
    .arg("--height=40%")
    .arg("--border")
    .arg("--delimiter=\t")
    .arg("--with-nth=2..")
    .arg(format!("--prompt={}", prompt))
    .stdin(Stdio::piped())
    .stdout(Stdio::piped());
  if multi {
    cmd.arg("--multi");
  }

  let mut child = cmd.spawn().map_err(|source| PickerError::SpawnFailed {
    program: program.display().to_string(),
    source,
  })?;

  if let Some(mut stdin) = child.stdin.take() {
    // fzf may exit before consuming all input; the exit status decides.
    let _ = stdin.write_all(input.as_bytes());
  }

  let output = child
    .wait_with_output()
    .map_err(|source| PickerError::SpawnFailed {
      program: program.display().to_string(),
      source,
    })?;

  interpret(output.status.code(), &String::from_utf8_lossy(&output.stdout))
}

/// Prefix every candidate with its index so the selection maps back exactly,
/// even when two labels render identically.
fn render_input(items: &[String]) -> String {
  items
    .iter()
    .enumerate()
    .map(|(index, label)| format!("{}\t{}", index, label.replace(&['\t', '\n'][..], " ")))
    .collect::<Vec<_>>()
    .join("\n")
}

fn interpret(code: Option<i32>, stdout: &str) -> Result<Selection, PickerError> {
  match code {
    Some(0) => parse_selection(stdout),
    // Killed by a signal (None) counts as the user bailing out.
    Some(EXIT_NO_MATCH) | Some(EXIT_INTERRUPTED) | None => Ok(Selection::Cancelled),
    Some(code) => Err(PickerError::Aborted(code)),
  }
}

fn parse_selection(stdout: &str) -> Result<Selection, PickerError> {
  let mut picked = Vec::new();
  for line in stdout.lines().filter(|line| !line.is_empty()) {
    let index = line
      .split_once('\t')
      .and_then(|(index, _)| index.parse::<usize>().ok())
      .ok_or_else(|| PickerError::Malformed(line.to_string()))?;
    picked.push(index);
  }
  if picked.is_empty() {
    return Ok(Selection::Cancelled);
  }
  Ok(Selection::Picked(picked))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_render_input_prefixes_indices() {
    let items = vec!["first".to_string(), "sec\tond".to_string()];
    assert_eq!(render_input(&items), "0\tfirst\n1\tsec ond");
  }

  #[test]
  fn test_interpret_selection() {
    let selection = interpret(Some(0), "1\tLet It Be\n0\tAbbey Road\n").unwrap();
    assert_eq!(selection, Selection::Picked(vec![1, 0]));
  }

  #[test]
  fn test_interpret_cancellation_codes() {
    assert_eq!(interpret(Some(1), "").unwrap(), Selection::Cancelled);
    assert_eq!(interpret(Some(130), "").unwrap(), Selection::Cancelled);
    assert_eq!(interpret(None, "").unwrap(), Selection::Cancelled);
    assert_eq!(interpret(Some(0), "").unwrap(), Selection::Cancelled);
  }

  #[test]
  fn test_interpret_unexpected_status() {
    assert!(matches!(interpret(Some(2), ""), Err(PickerError::Aborted(2))));
  }

  #[test]
  fn test_interpret_garbage_output() {
    assert!(matches!(
      interpret(Some(0), "no tab here"),
      Err(PickerError::Malformed(_))
    ));
  }
}
