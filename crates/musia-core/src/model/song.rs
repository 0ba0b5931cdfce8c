use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};
use crate::model::ids::SongId;
use crate::model::lyrics::Lyrics;

/// A catalogued song.
///
/// Two songs are the same song when they share a title and an artist,
/// regardless of their surrogate ids or lyrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,

    /// Release year, when known.
    pub year: Option<i32>,

    /// Lyrics and their embedding. Songs without lyrics are catalogued but
    /// never ranked.
    pub lyrics: Option<Lyrics>,

    pub created_at: DateTime<Utc>,
}

impl Song {
    /// Create a song, trimming title and artist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] when title or artist is blank.
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Result<Self> {
        let title = title.into().trim().to_string();
        let artist = artist.into().trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidData("song title must not be empty".into()));
        }
        if artist.is_empty() {
            return Err(Error::InvalidData("song artist must not be empty".into()));
        }
        Ok(Self {
            id: SongId::new(),
            title,
            artist,
            year: None,
            lyrics: None,
            created_at: Utc::now(),
        })
    }

    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn with_lyrics(mut self, lyrics: Lyrics) -> Self {
        self.lyrics = Some(lyrics);
        self
    }

    /// Whether this song can take part in ranking.
    #[must_use]
    pub fn has_vector(&self) -> bool {
        self.lyrics.as_ref().is_some_and(|l| !l.vector.is_empty())
    }

    /// Whether this song is identified by the given title and artist.
    #[must_use]
    pub fn is(&self, title: &str, artist: &str) -> bool {
        self.title == title.trim() && self.artist == artist.trim()
    }
}

impl PartialEq for Song {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.artist == other.artist
    }
}

impl Eq for Song {}

impl Hash for Song {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.title.hash(state);
        self.artist.hash(state);
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} - {} ({})", self.title, self.artist, year),
            None => write!(f, "{} - {}", self.title, self.artist),
        }
    }
}
