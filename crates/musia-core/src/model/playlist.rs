use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::model::ids::PlaylistId;
use crate::model::song::Song;

/// Shortest name accepted when a playlist is requested by a user.
pub const MIN_PLAYLIST_NAME_LEN: usize = 2;

/// A named, ordered collection of songs.
///
/// The name is also the keyword the playlist was generated from. Song order
/// is rank order and is preserved through storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    songs: Vec<Song>,
    pub created_at: DateTime<Utc>,
}

impl Playlist {
    /// Create a playlist from already ordered songs.
    ///
    /// Songs repeating an earlier song's identity are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] when the name is blank.
    pub fn new(name: impl Into<String>, songs: Vec<Song>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidData("playlist name must not be empty".into()));
        }
        let mut playlist = Self {
            id: PlaylistId::new(),
            name,
            songs: Vec::with_capacity(songs.len()),
            created_at: Utc::now(),
        };
        for song in songs {
            playlist.add_song(song);
        }
        Ok(playlist)
    }

    /// Check a user-supplied playlist name.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().chars().count() < MIN_PLAYLIST_NAME_LEN {
            return Err(Error::InvalidData(format!(
                "playlist name must be at least {MIN_PLAYLIST_NAME_LEN} characters"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    #[must_use]
    pub fn contains(&self, song: &Song) -> bool {
        self.songs.contains(song)
    }

    /// Append a song. Returns `false` if the song is already present.
    pub fn add_song(&mut self, song: Song) -> bool {
        if self.contains(&song) {
            return false;
        }
        self.songs.push(song);
        true
    }

    /// Remove a song by identity. Returns `false` if it was not present.
    pub fn remove_song(&mut self, title: &str, artist: &str) -> bool {
        let before = self.songs.len();
        self.songs.retain(|s| !s.is(title, artist));
        self.songs.len() != before
    }
}

impl fmt::Display for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.songs.is_empty() {
            return write!(f, "Playlist '{}' (empty)", self.name);
        }
        write!(f, "Playlist '{}':", self.name)?;
        for (i, song) in self.songs.iter().enumerate() {
            write!(f, "\n  {}. {}", i + 1, song)?;
        }
        Ok(())
    }
}
