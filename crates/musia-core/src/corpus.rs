//! Read access to the stored lyric corpus.

use crate::error::Result;
use crate::model::{Embedding, Lyrics, Song};

/// Source of the lyrics a playlist is ranked against.
///
/// Implementations only read. Callers can share one accessor between
/// independent ranking requests as long as the implementation itself is safe
/// to read concurrently.
pub trait CorpusAccessor {
    /// All stored lyrics that carry a vector, in a stable order.
    fn all_lyrics_with_vectors(&self) -> Result<Vec<Lyrics>>;

    /// The song whose lyrics vector equals `vector` after rounding.
    fn song_by_lyrics_vector(&self, vector: &Embedding) -> Result<Option<Song>>;
}

impl<T: CorpusAccessor + ?Sized> CorpusAccessor for &T {
    fn all_lyrics_with_vectors(&self) -> Result<Vec<Lyrics>> {
        (**self).all_lyrics_with_vectors()
    }

    fn song_by_lyrics_vector(&self, vector: &Embedding) -> Result<Option<Song>> {
        (**self).song_by_lyrics_vector(vector)
    }
}
