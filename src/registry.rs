//! Known-server registry with JSON persistence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A configured Jellyfin server and the credentials used against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
  /// Friendly name, unique within the registry.
  pub name: String,

  /// Base URL including scheme, no trailing slash.
  pub url: String,

  pub username: String,

  pub password: String,
}

#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("no servers configured")]
  NotConfigured,

  #[error("server registry {path} is corrupt ({source}); fix or delete it")]
  CorruptState {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to access server registry: {0}")]
  Io(#[from] io::Error),
}

/// The list of known servers, in file order. First entry is the default.
#[derive(Debug)]
pub struct ServerRegistry {
  path: PathBuf,
  servers: Vec<Server>,
}

impl ServerRegistry {
  /// Load the registry from `path`. A missing file is an empty registry.
  pub fn load(path: PathBuf) -> Result<Self, RegistryError> {
    let servers = match fs::read_to_string(&path) {
      Ok(raw) => serde_json::from_str(&raw).map_err(|source| RegistryError::CorruptState {
        path: path.clone(),
        source,
      })?,
      Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
      Err(err) => return Err(err.into()),
    };
    tracing::debug!(path = %path.display(), count = servers.len(), "loaded server registry");
    Ok(Self { path, servers })
  }

  /// Default registry location under the user config directory.
  pub fn default_path() -> PathBuf {
    dirs::config_dir()
      .unwrap_or_else(|| PathBuf::from("."))
      .join("jfzf")
      .join("servers.json")
  }

  pub fn list(&self) -> &[Server] {
    &self.servers
  }

  pub fn is_empty(&self) -> bool {
    self.servers.is_empty()
  }

  /// The default server: the first configured entry.
  pub fn get_active(&self) -> Result<&Server, RegistryError> {
    self.servers.first().ok_or(RegistryError::NotConfigured)
  }

  pub fn find(&self, name: &str) -> Option<&Server> {
    self.servers.iter().find(|s| s.name == name)
  }

  /// Insert `server`, replacing an existing entry with the same name in place.
  pub fn add_or_update(&mut self, server: Server) {
    match self.servers.iter_mut().find(|s| s.name == server.name) {
      Some(existing) => *existing = server,
      None => self.servers.push(server),
    }
  }

  /// Remove the named server. Returns false when no such entry exists.
  pub fn remove(&mut self, name: &str) -> bool {
    let before = self.servers.len();
    self.servers.retain(|s| s.name != name);
    self.servers.len() != before
  }

  /// Persist the current list atomically (temp file + rename, mode 0600).
  pub fn save(&self) -> Result<(), RegistryError> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(&self.servers).map_err(|source| {
      RegistryError::CorruptState {
        path: self.path.clone(),
        source,
      }
    })?;
    let tmp = self.path.with_extension("json.tmp");
    fs::write(&tmp, raw)?;
    restrict_permissions(&tmp)?;
    fs::rename(&tmp, &self.path)?;
    tracing::info!(path = %self.path.display(), count = self.servers.len(), "saved server registry");
    Ok(())
  }
}

/// Registry files hold credentials; keep them owner-readable only.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
  Ok(())
}

/// Normalize a user-entered base URL: default to http:// and strip the
/// trailing slash.
pub fn normalize_url(input: &str) -> String {
  let trimmed = input.trim();
  let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
    trimmed.to_string()
  } else {
    format!("http://{}", trimmed)
  };
  with_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn server(name: &str) -> Server {
    Server {
      name: name.to_string(),
      url: format!("http://{}.example:8096", name),
      username: "alice".to_string(),
      password: "secret".to_string(),
    }
  }

  #[test]
  fn test_missing_file_is_empty_registry() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ServerRegistry::load(dir.path().join("servers.json")).unwrap();
    assert!(registry.is_empty());
    assert!(matches!(
      registry.get_active(),
      Err(RegistryError::NotConfigured)
    ));
  }

  #[test]
  fn test_save_and_reload_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servers.json");
    let mut registry = ServerRegistry::load(path.clone()).unwrap();
    registry.add_or_update(server("home"));
    registry.add_or_update(server("remote"));
    registry.save().unwrap();

    let reloaded = ServerRegistry::load(path).unwrap();
    assert_eq!(reloaded.list(), registry.list());
  }

  #[test]
  fn test_get_active_returns_first_listed() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = ServerRegistry::load(dir.path().join("servers.json")).unwrap();
    registry.add_or_update(server("home"));
    registry.add_or_update(server("remote"));

    let active = registry.get_active().unwrap();
    assert_eq!(active.name, "home");
    assert!(registry.list().contains(active));
  }

  #[test]
  fn test_add_or_update_replaces_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = ServerRegistry::load(dir.path().join("servers.json")).unwrap();
    registry.add_or_update(server("home"));
    registry.add_or_update(server("remote"));

    let mut updated = server("home");
    updated.url = "https://new.example".to_string();
    registry.add_or_update(updated);

    assert_eq!(registry.list().len(), 2);
    assert_eq!(registry.list()[0].name, "home");
    assert_eq!(registry.list()[0].url, "https://new.example");
    assert_eq!(registry.list()[1].name, "remote");
  }

  #[test]
  fn test_remove_reports_whether_present() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = ServerRegistry::load(dir.path().join("servers.json")).unwrap();
    registry.add_or_update(server("home"));

    assert!(registry.remove("home"));
    assert!(!registry.remove("home"));
    assert!(registry.is_empty());
  }

  #[test]
  fn test_corrupt_file_is_reported_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servers.json");
    fs::write(&path, "{ not json").unwrap();

    match ServerRegistry::load(path.clone()) {
      Err(RegistryError::CorruptState { path: reported, .. }) => assert_eq!(reported, path),
      other => panic!("expected CorruptState, got {:?}", other),
    }
  }

  #[cfg(unix)]
  #[test]
  fn test_saved_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servers.json");
    let mut registry = ServerRegistry::load(path.clone()).unwrap();
    registry.add_or_update(server("home"));
    registry.save().unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
  }

  #[test]
  fn test_normalize_url() {
    assert_eq!(normalize_url("jellyfin.local:8096"), "http://jellyfin.local:8096");
    assert_eq!(normalize_url("https://media.example/"), "https://media.example");
    assert_eq!(normalize_url(" http://a.b "), "http://a.b");
  }
}
