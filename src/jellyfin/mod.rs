//! Jellyfin API surface: authentication, library listings, stream resolution.

mod client;
mod error;
mod types;

pub use client::JellyfinClient;
pub use error::JellyfinError;
pub use types::*;
