//! Interactive server registration prompts.

use anyhow::{Context, Result};
use dialoguer::{Input, Password};

use crate::registry::{normalize_url, Server};

/// Collect a server entry from the terminal.
///
/// The URL is normalized (`http://` default, trailing slash stripped); an
/// existing name updates that entry when saved.
pub fn add_server() -> Result<Server> {
  let url: String = Input::new()
    .with_prompt("Jellyfin server URL")
    .validate_with(|input: &String| -> Result<(), &str> {
      if input.trim().is_empty() {
        Err("URL cannot be empty")
      } else {
        Ok(())
      }
    })
    .interact_text()
    .context("failed to read server URL")?;
  let url = normalize_url(&url);

  let username: String = Input::new()
    .with_prompt("Username")
    .validate_with(|input: &String| -> Result<(), &str> {
      if input.trim().is_empty() {
        Err("Username cannot be empty")
      } else {
        Ok(())
      }
    })
    .interact_text()
    .context("failed to read username")?;

  let password = Password::new()
    .with_prompt("Password")
    .allow_empty_password(true)
    .interact()
    .context("failed to read password")?;

  let name: String = Input::new()
    .with_prompt("Name for this server")
    .default(suggest_name(&url))
    .validate_with(|input: &String| -> Result<(), &str> {
      if input.trim().is_empty() {
        Err("Name cannot be empty")
      } else {
        Ok(())
      }
    })
    .interact_text()
    .context("failed to read server name")?;

  Ok(Server {
    name: name.trim().to_string(),
    url,
    username: username.trim().to_string(),
    password,
  })
}

/// Default server name: the host portion of the URL.
fn suggest_name(url: &str) -> String {
  url
    .trim_start_matches("http://")
    .trim_start_matches("https://")
    .split([':', '/'])
    .next()
    .unwrap_or("jellyfin")
    .to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_suggest_name_takes_host() {
    assert_eq!(suggest_name("http://media.local:8096"), "media.local");
    assert_eq!(suggest_name("https://jf.example.com/base"), "jf.example.com");
  }
}
