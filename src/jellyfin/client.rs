//! Authenticated access to the Jellyfin HTTP API.

use parking_lot::RwLock;
use reqwest::{header, Client, StatusCode};
use std::sync::Arc;
use uuid::Uuid;

use crate::registry::Server;

use super::error::JellyfinError;
use super::types::*;

/// Client identity reported in the authorization header.
const DEFAULT_DEVICE_NAME: &str = "JFZF";
const DEVICE_ID_PREFIX: &str = "jfzf-";
const CLIENT_NAME: &str = "jfzf";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed transcode parameters for the audio stream endpoint: mp3 at 192 kbps,
/// which every player candidate handles without probing.
const STREAM_PARAMS: &str = "container=mp3&audioCodec=mp3&transcodingContainer=mp3\
&transcodingProtocol=ffmpeg&maxAudioChannels=2&audioBitRate=192000&static=true";

/// Jellyfin API client. One instance serves the whole session; `authenticate`
/// rebinds it when the user switches servers.
pub struct JellyfinClient {
  http: Client,
  state: Arc<RwLock<ClientState>>,
}

/// Where we are connected and as whom.
struct ClientState {
  server_url: Option<String>,
  access_token: Option<String>,
  user_id: Option<String>,
  device_id: String,
}

/// Session facts cloned out of the lock for one request.
struct Connected {
  server_url: String,
  token: String,
  user_id: String,
  device_id: String,
}

impl JellyfinClient {
  /// Build an unauthenticated client with a fresh device id.
  pub fn new() -> Self {
    let device_id = format!("{}{}", DEVICE_ID_PREFIX, Uuid::new_v4());

    Self {
      http: Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("failed to build HTTP client"),
      state: Arc::new(RwLock::new(ClientState {
        server_url: None,
        access_token: None,
        user_id: None,
        device_id,
      })),
    }
  }

  /// `X-Emby-Authorization` value, with the token appended once known.
  fn auth_header(&self, token: Option<&str>) -> String {
    let state = self.state.read();
    let mut header = format!(
      r#"MediaBrowser Client="{}", Device="{}", DeviceId="{}", Version="{}""#,
      CLIENT_NAME, DEFAULT_DEVICE_NAME, state.device_id, CLIENT_VERSION
    );
    if let Some(token) = token {
      header.push_str(&format!(r#", Token="{}""#, token));
    }
    header
  }

  /// Authenticate against `server` and store the session token.
  pub async fn authenticate(&self, server: &Server) -> Result<AuthResponse, JellyfinError> {
    let server_url = server.url.trim_end_matches('/').to_string();

    if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
      return Err(JellyfinError::InvalidUrl(
        "server URL must start with http:// or https://".to_string(),
      ));
    }

    let url = format!("{}/Users/AuthenticateByName", server_url);

    let body = serde_json::json!({
      "Username": server.username,
      "Pw": server.password
    });

    let response = self
      .http
      .post(&url)
      .header(header::CONTENT_TYPE, "application/json")
      .header("X-Emby-Authorization", self.auth_header(None))
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
      return Err(JellyfinError::AuthFailed(format!(
        "server rejected credentials for '{}'",
        server.username
      )));
    }
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(JellyfinError::Http { status, body });
    }

    let auth: AuthResponse = serde_json::from_str(&response.text().await?)?;

    {
      let mut state = self.state.write();
      state.server_url = Some(server_url);
      state.access_token = Some(auth.access_token.clone());
      state.user_id = Some(auth.user.id.clone());
    }

    tracing::info!(
      server = %server.name,
      user = %auth.user.name,
      server_id = %auth.server_id,
      "authenticated"
    );

    Ok(auth)
  }

  /// List the music albums visible to the authenticated user, optionally
  /// narrowed by a case-insensitive search term.
  pub async fn list_albums(&self, filter: Option<&str>) -> Result<Vec<Album>, JellyfinError> {
    let user_id = self.connected()?.user_id;
    let path = format!(
      "/Users/{}/Items?IncludeItemTypes=MusicAlbum&Recursive=true\
&Fields=AlbumArtist,Genres&SortBy=AlbumArtist,SortName&SortOrder=Ascending",
      user_id
    );

    let page: ItemsPage<Album> = self.get(&path).await?;
    let total = page.total_record_count;

    let mut albums = page.items;
    if let Some(needle) = filter {
      albums.retain(|album| album.matches(needle));
    }
    tracing::debug!(count = albums.len(), total, "listed albums");
    Ok(albums)
  }

  /// List the audio tracks of one album, in disc/track order.
  pub async fn list_songs(&self, album_id: &str) -> Result<Vec<Song>, JellyfinError> {
    let user_id = self.connected()?.user_id;
    let path = format!(
      "/Users/{}/Items?ParentId={}&IncludeItemTypes=Audio&Recursive=true\
&Fields=Artists,AlbumArtist&SortBy=ParentIndexNumber,IndexNumber,SortName&SortOrder=Ascending",
      user_id, album_id
    );

    let page: ItemsPage<Song> = self.get(&path).await?;
    tracing::debug!(album_id, count = page.items.len(), "listed songs");
    Ok(page.items)
  }

  /// Resolve a playable stream for one track.
  ///
  /// Fetches the item first so a track that vanished server-side fails here,
  /// not inside the player.
  pub async fn resolve_stream(&self, song_id: &str) -> Result<StreamDescriptor, JellyfinError> {
    let conn = self.connected()?;
    let song: Song = self
      .get(&format!("/Users/{}/Items/{}", conn.user_id, song_id))
      .await?;

    let url = format!(
      "{}/Audio/{}/stream?UserId={}&DeviceId={}&{}&api_key={}",
      conn.server_url, song_id, conn.user_id, conn.device_id, STREAM_PARAMS, conn.token
    );

    tracing::debug!(song = %song.name, url = %redact_url(&url), "resolved stream");
    Ok(StreamDescriptor {
      url,
      container: "mp3".to_string(),
    })
  }

  /// Snapshot of the session facts an authenticated call needs; fails with
  /// `NotConnected` until `authenticate` has succeeded.
  fn connected(&self) -> Result<Connected, JellyfinError> {
    let state = self.state.read();
    match (&state.server_url, &state.access_token, &state.user_id) {
      (Some(server_url), Some(token), Some(user_id)) => Ok(Connected {
        server_url: server_url.clone(),
        token: token.clone(),
        user_id: user_id.clone(),
        device_id: state.device_id.clone(),
      }),
      _ => Err(JellyfinError::NotConnected),
    }
  }

  /// GET `path` with auth headers and decode the JSON body.
  async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, JellyfinError> {
    let conn = self.connected()?;
    let url = format!("{}{}", conn.server_url, path);

    let response = self
      .http
      .get(&url)
      .header("X-Emby-Authorization", self.auth_header(Some(&conn.token)))
      .send()
      .await?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
      return Err(JellyfinError::AuthFailed(format!(
        "access token rejected (HTTP {})",
        status.as_u16()
      )));
    }
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(JellyfinError::Http { status, body });
    }

    Ok(serde_json::from_str(&response.text().await?)?)
  }
}

impl Default for JellyfinClient {
  fn default() -> Self {
    Self::new()
  }
}

impl crate::navigator::MusicProvider for JellyfinClient {
  async fn connect(&self, server: &Server) -> Result<(), JellyfinError> {
    self.authenticate(server).await.map(|_| ())
  }

  async fn list_albums(&self, filter: Option<&str>) -> Result<Vec<Album>, JellyfinError> {
    JellyfinClient::list_albums(self, filter).await
  }

  async fn list_songs(&self, album_id: &str) -> Result<Vec<Song>, JellyfinError> {
    JellyfinClient::list_songs(self, album_id).await
  }

  async fn resolve_stream(&self, song_id: &str) -> Result<StreamDescriptor, JellyfinError> {
    JellyfinClient::resolve_stream(self, song_id).await
  }
}

/// Redact the api_key query parameter from a URL for logging.
fn redact_url(url: &str) -> String {
  if let Some(idx) = url.find("api_key=") {
    let start = idx + 8;
    let end = url[start..]
      .find('&')
      .map(|i| start + i)
      .unwrap_or(url.len());
    format!("{}[REDACTED]{}", &url[..start], &url[end..])
  } else {
    url.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_auth_header_format() {
    let client = JellyfinClient::new();

    let header = client.auth_header(None);
    assert!(header.starts_with(r#"MediaBrowser Client="jfzf""#));
    assert!(header.contains(r#"DeviceId="jfzf-"#));
    assert!(!header.contains("Token"));

    let with_token = client.auth_header(Some("abc123"));
    assert!(with_token.ends_with(r#"Token="abc123""#));
  }

  #[test]
  fn test_calls_require_authentication() {
    let client = JellyfinClient::new();
    assert!(matches!(
      client.connected(),
      Err(JellyfinError::NotConnected)
    ));
  }

  #[test]
  fn test_redact_url_hides_api_key() {
    let url = "http://x/Audio/1/stream?UserId=u&api_key=tok123&static=true";
    let redacted = redact_url(url);
    assert!(!redacted.contains("tok123"));
    assert_eq!(
      redacted,
      "http://x/Audio/1/stream?UserId=u&api_key=[REDACTED]&static=true"
    );
  }

  #[test]
  fn test_redact_url_without_key_is_unchanged() {
    assert_eq!(redact_url("http://x/path"), "http://x/path");
  }
}
