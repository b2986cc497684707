//! jfzf: fuzzy-find and stream Jellyfin music from the terminal.

pub mod cli;
pub mod jellyfin;
pub mod logging;
pub mod navigator;
pub mod picker;
pub mod player;
pub mod prompt;
pub mod registry;
