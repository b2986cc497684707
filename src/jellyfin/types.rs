//! Wire types for the Jellyfin API responses this tool consumes.
//!
//! `Id` and `Name` are required: an item the server returns without them is
//! rejected at deserialization rather than carried around half-formed.

use serde::Deserialize;

const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Result of `AuthenticateByName`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthResponse {
  pub user: User,
  pub access_token: String,
  pub server_id: String,
}

/// Owner of the session token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
  pub id: String,
  pub name: String,
}

/// A music album.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Album {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub album_artist: Option<String>,
  #[serde(default)]
  pub genres: Vec<String>,
}

impl Album {
  pub fn artist(&self) -> &str {
    self.album_artist.as_deref().unwrap_or(UNKNOWN_ARTIST)
  }

  /// Menu label: `artist - title`.
  pub fn display(&self) -> String {
    format!("{} - {}", self.artist(), self.name)
  }

  /// Case-insensitive match against title, album artist, or genre.
  pub fn matches(&self, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    self.name.to_lowercase().contains(&needle)
      || self.artist().to_lowercase().contains(&needle)
      || self
        .genres
        .iter()
        .any(|genre| genre.to_lowercase().contains(&needle))
  }
}

/// An audio track.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Song {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub artists: Vec<String>,
  #[serde(default)]
  pub album_artist: Option<String>,
  #[serde(default)]
  pub index_number: Option<i32>,
  #[serde(default)]
  pub run_time_ticks: Option<i64>,
}

impl Song {
  pub fn artist(&self) -> &str {
    self
      .artists
      .first()
      .map(String::as_str)
      .or(self.album_artist.as_deref())
      .unwrap_or(UNKNOWN_ARTIST)
  }

  /// Menu label: `NN. title - artist`.
  pub fn display(&self) -> String {
    match self.index_number {
      Some(track) => format!("{:02}. {} - {}", track, self.name, self.artist()),
      None => format!("{} - {}", self.name, self.artist()),
    }
  }
}

/// One page of an `/Items` listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsPage<T> {
  pub items: Vec<T>,
  pub total_record_count: i32,
}

/// A resolved, ready-to-play stream for one track.
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
  /// Full URL including the API key; redact before logging.
  pub url: String,
  /// Container the server will deliver.
  pub container: String,
}

/// Ticks conversion (1 tick = 100 nanoseconds).
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Format a runtime in ticks as `m:ss`.
pub fn format_runtime(ticks: i64) -> String {
  let seconds = ticks / TICKS_PER_SECOND;
  format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn album(name: &str, artist: Option<&str>, genres: &[&str]) -> Album {
    Album {
      id: "a1".to_string(),
      name: name.to_string(),
      album_artist: artist.map(str::to_string),
      genres: genres.iter().map(|g| g.to_string()).collect(),
    }
  }

  #[test]
  fn test_album_deserializes_from_items_payload() {
    let raw = r#"{
      "Items": [
        {"Id": "a1", "Name": "Abbey Road", "AlbumArtist": "The Beatles", "Genres": ["Rock"]},
        {"Id": "a2", "Name": "Let It Be"}
      ],
      "TotalRecordCount": 2
    }"#;
    let page: ItemsPage<Album> = serde_json::from_str(raw).unwrap();
    assert_eq!(page.total_record_count, 2);
    assert_eq!(page.items[0].display(), "The Beatles - Abbey Road");
    assert_eq!(page.items[1].display(), "Unknown Artist - Let It Be");
  }

  #[test]
  fn test_item_without_id_is_rejected() {
    let raw = r#"{"Items": [{"Name": "Abbey Road"}], "TotalRecordCount": 1}"#;
    assert!(serde_json::from_str::<ItemsPage<Album>>(raw).is_err());
  }

  #[test]
  fn test_album_matches_is_case_insensitive_across_fields() {
    let abbey = album("Abbey Road", Some("The Beatles"), &["Rock"]);
    assert!(abbey.matches("abbey"));
    assert!(abbey.matches("BEATLES"));
    assert!(abbey.matches("rock"));
    assert!(!abbey.matches("jazz"));
  }

  #[test]
  fn test_song_display_prefers_track_artist() {
    let song = Song {
      id: "s1".to_string(),
      name: "Come Together".to_string(),
      artists: vec!["The Beatles".to_string()],
      album_artist: Some("Various".to_string()),
      index_number: Some(1),
      run_time_ticks: None,
    };
    assert_eq!(song.display(), "01. Come Together - The Beatles");
  }

  #[test]
  fn test_song_display_falls_back_without_index() {
    let song = Song {
      id: "s1".to_string(),
      name: "Come Together".to_string(),
      artists: Vec::new(),
      album_artist: None,
      index_number: None,
      run_time_ticks: None,
    };
    assert_eq!(song.display(), "Come Together - Unknown Artist");
  }

  #[test]
  fn test_format_runtime() {
    assert_eq!(format_runtime(259 * TICKS_PER_SECOND), "4:19");
    assert_eq!(format_runtime(5 * TICKS_PER_SECOND), "0:05");
  }
}
