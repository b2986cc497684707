//! Menu-driven navigation: server -> album -> song -> playback.

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::jellyfin::{format_runtime, Album, JellyfinError, Song, StreamDescriptor};
use crate::picker::{Picker, PickerError, Selection};
use crate::player::{PlaybackLauncher, PlaybackResult};
use crate::registry::Server;

/// Trailing menu entry on the server list.
const ADD_SERVER_ENTRY: &str = "Add a new server";

/// Read side of the music library, as the navigator consumes it.
#[allow(async_fn_in_trait)]
pub trait MusicProvider {
  async fn connect(&self, server: &Server) -> Result<(), JellyfinError>;
  async fn list_albums(&self, filter: Option<&str>) -> Result<Vec<Album>, JellyfinError>;
  async fn list_songs(&self, album_id: &str) -> Result<Vec<Song>, JellyfinError>;
  async fn resolve_stream(&self, song_id: &str) -> Result<StreamDescriptor, JellyfinError>;
}

/// Why the navigation loop returned.
#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome {
  /// Normal exit: the user backed all the way out or interrupted.
  Quit,
  /// The user picked the add-server entry; the caller runs the prompt flow
  /// and restarts navigation.
  AddServer,
}

/// Errors the navigator cannot recover from by returning to a menu.
#[derive(Debug, Error)]
pub enum NavError {
  #[error(transparent)]
  Picker(#[from] PickerError),

  #[error("no servers configured")]
  NotConfigured,
}

/// Active selection context: the chosen server and album, plus the cached
/// listings for the menu subtree the user is currently inside. Backing out
/// of a level discards that level's cache.
#[derive(Default)]
struct Session {
  server: Option<Server>,
  albums: Option<Vec<Album>>,
  album: Option<Album>,
  songs: Option<Vec<Song>>,
  queue: Vec<Song>,
}

enum State {
  ServerSelect,
  AlbumSelect,
  SongSelect,
  Playing,
  Done(RunOutcome),
}

/// Drives the selection loop over a provider, a picker, and a launcher.
pub struct Navigator<'a, M, P, L> {
  provider: &'a M,
  picker: &'a P,
  launcher: &'a L,
  servers: Vec<Server>,
  filter: Option<String>,
  preselect: Option<String>,
  cancel: CancellationToken,
  session: Session,
}

impl<'a, M, P, L> Navigator<'a, M, P, L>
where
  M: MusicProvider,
  P: Picker,
  L: PlaybackLauncher,
{
  pub fn new(
    provider: &'a M,
    picker: &'a P,
    launcher: &'a L,
    servers: Vec<Server>,
    cancel: CancellationToken,
  ) -> Self {
    Self {
      provider,
      picker,
      launcher,
      servers,
      filter: None,
      preselect: None,
      cancel,
      session: Session::default(),
    }
  }

  /// Narrow album listings to a search term.
  pub fn with_filter(mut self, filter: Option<String>) -> Self {
    self.filter = filter;
    self
  }

  /// Connect straight to the named server instead of asking first.
  pub fn with_preselect(mut self, name: Option<String>) -> Self {
    self.preselect = name;
    self
  }

  /// Run the loop until the user exits or asks to add a server.
  pub async fn run(mut self) -> Result<RunOutcome, NavError> {
    if self.servers.is_empty() {
      return Err(NavError::NotConfigured);
    }

    let mut state = State::ServerSelect;
    loop {
      if self.cancel.is_cancelled() {
        println!("Interrupted.");
        return Ok(RunOutcome::Quit);
      }
      state = match state {
        State::ServerSelect => self.select_server().await?,
        State::AlbumSelect => self.select_album().await?,
        State::SongSelect => self.select_song().await?,
        State::Playing => self.play_queue().await?,
        State::Done(outcome) => return Ok(outcome),
      };
    }
  }

  async fn select_server(&mut self) -> Result<State, NavError> {
    if let Some(name) = self.preselect.take() {
      if let Some(server) = self.servers.iter().find(|s| s.name == name).cloned() {
        return Ok(self.connect(server).await);
      }
      println!("Unknown server '{}'.", name);
    }

    let mut items: Vec<String> = self
      .servers
      .iter()
      .map(|server| format!("{} ({})", server.name, server.url))
      .collect();
    items.push(ADD_SERVER_ENTRY.to_string());

    match self.picker.choose("Select server > ", &items, false).await? {
      Selection::Cancelled => Ok(State::Done(RunOutcome::Quit)),
      Selection::Picked(indices) => {
        let Some(&index) = indices.first() else {
          return Ok(State::Done(RunOutcome::Quit));
        };
        match self.servers.get(index) {
          Some(server) => {
            let server = server.clone();
            Ok(self.connect(server).await)
          }
          None => Ok(State::Done(RunOutcome::AddServer)),
        }
      }
    }
  }

  async fn connect(&mut self, server: Server) -> State {
    match self.provider.connect(&server).await {
      Ok(()) => {
        println!("Connected to {}.", server.name);
        self.session = Session {
          server: Some(server),
          ..Session::default()
        };
        State::AlbumSelect
      }
      Err(err) => {
        report(&err);
        State::ServerSelect
      }
    }
  }

  async fn select_album(&mut self) -> Result<State, NavError> {
    if self.session.albums.is_none() {
      if let Some(server) = &self.session.server {
        tracing::debug!(server = %server.name, "fetching album list");
      }
      match self.provider.list_albums(self.filter.as_deref()).await {
        Ok(albums) => {
          if albums.is_empty() {
            match &self.filter {
              Some(term) => println!("No albums matching '{}'.", term),
              None => println!("No albums found in the music library."),
            }
          }
          self.session.albums = Some(albums);
        }
        Err(err) => {
          report(&err);
          if err.is_auth() {
            return Ok(State::ServerSelect);
          }
          // Render the level empty; re-selecting the server retries.
          self.session.albums = Some(Vec::new());
        }
      }
    }

    let Some(albums) = self.session.albums.as_deref() else {
      return Ok(State::ServerSelect);
    };
    let items: Vec<String> = albums.iter().map(Album::display).collect();

    match self.picker.choose("Select album > ", &items, false).await? {
      Selection::Cancelled => {
        self.session.albums = None;
        Ok(State::ServerSelect)
      }
      Selection::Picked(indices) => {
        let Some(album) = indices.first().and_then(|&i| albums.get(i)).cloned() else {
          return Ok(State::AlbumSelect);
        };
        self.session.album = Some(album);
        self.session.songs = None;
        Ok(State::SongSelect)
      }
    }
  }

  async fn select_song(&mut self) -> Result<State, NavError> {
    let Some(album) = self.session.album.clone() else {
      return Ok(State::AlbumSelect);
    };

    if self.session.songs.as_ref().map_or(true, |songs| songs.is_empty()) {
      match self.provider.list_songs(&album.id).await {
        Ok(songs) => {
          if songs.is_empty() {
            println!("Album '{}' has no tracks.", album.name);
          }
          self.session.songs = Some(songs);
        }
        Err(err) => {
          report(&err);
          if err.is_auth() {
            return Ok(State::ServerSelect);
          }
          self.session.songs = Some(Vec::new());
        }
      }
    }

    let Some(songs) = self.session.songs.as_deref() else {
      return Ok(State::AlbumSelect);
    };
    let items: Vec<String> = songs.iter().map(Song::display).collect();

    match self.picker.choose("Select tracks > ", &items, true).await? {
      Selection::Cancelled => {
        // Pop the album level; the album list itself stays cached.
        self.session.songs = None;
        self.session.album = None;
        Ok(State::AlbumSelect)
      }
      Selection::Picked(mut indices) => {
        indices.sort_unstable();
        indices.dedup();
        let queue: Vec<Song> = indices
          .iter()
          .filter_map(|&i| songs.get(i))
          .cloned()
          .collect();
        if queue.is_empty() {
          return Ok(State::SongSelect);
        }
        self.session.queue = queue;
        Ok(State::Playing)
      }
    }
  }

  async fn play_queue(&mut self) -> Result<State, NavError> {
    let queue = std::mem::take(&mut self.session.queue);
    for song in queue {
      if self.cancel.is_cancelled() {
        break;
      }

      let stream = match self.provider.resolve_stream(&song.id).await {
        Ok(stream) => stream,
        Err(err) => {
          report(&err);
          if err.is_auth() {
            return Ok(State::ServerSelect);
          }
          return Ok(State::SongSelect);
        }
      };

      let title = format!("{} - {}", song.name, song.artist());
      let runtime = song
        .run_time_ticks
        .map(|ticks| format!(" [{}]", format_runtime(ticks)))
        .unwrap_or_default();
      println!("Now playing: {}{}", title, runtime);

      match self.launcher.play(&stream, &title).await {
        Ok(PlaybackResult::Completed) => {}
        Ok(PlaybackResult::Interrupted) => {
          if !self.cancel.is_cancelled() {
            println!("Playback interrupted.");
          }
          return Ok(State::SongSelect);
        }
        Ok(PlaybackResult::Failed) => {
          println!("Player exited with an error; dropping the remaining queue.");
          return Ok(State::SongSelect);
        }
        Err(err) => {
          report(&err);
          return Ok(State::SongSelect);
        }
      }
    }
    Ok(State::SongSelect)
  }
}

/// One user-facing line; the log keeps the detail.
fn report(err: &dyn std::error::Error) {
  println!("Error: {}", err);
  tracing::warn!(error = %err, "recoverable error surfaced");
}
