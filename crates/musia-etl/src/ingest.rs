//! Song ingestion.
//!
//! A song enters the catalog once: its lyrics are fetched (unless supplied),
//! embedded with the configured provider, and stored together with the
//! rounded vector. Songs whose lyrics cannot be found are still stored but
//! stay out of ranking until their lyrics are refreshed.

use musia_core::model::{Lyrics, Song};
use musia_core::schema::Database;
use musia_core::CorpusAccessor;
use musia_search::{CosineSimilarity, EmbeddingProvider, VectorComparator};

use crate::error::{IngestError, IngestResult};
use crate::lyrics::LyricsSource;

/// A song to add to the catalog.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
    /// Lyrics supplied by the caller. When `None` they are looked up.
    pub lyrics: Option<String>,
}

impl IngestRequest {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    #[must_use]
    pub fn with_lyrics(mut self, lyrics: Option<String>) -> Self {
        self.lyrics = lyrics;
        self
    }
}

/// What happened to an ingested song.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// Stored with lyrics and a vector.
    Added(Song),
    /// Stored, but no lyrics were found so it is not ranked.
    AddedWithoutLyrics(Song),
    /// The catalog already holds this song (or these exact lyrics).
    AlreadyPresent(Song),
}

impl IngestOutcome {
    pub fn song(&self) -> &Song {
        match self {
            Self::Added(song) | Self::AddedWithoutLyrics(song) | Self::AlreadyPresent(song) => {
                song
            }
        }
    }

    pub fn is_new(&self) -> bool {
        !matches!(self, Self::AlreadyPresent(_))
    }
}

/// Fetches, embeds and stores songs.
#[derive(Debug)]
pub struct SongIngester<'a, L: ?Sized, E: ?Sized> {
    db: &'a Database,
    lyrics: &'a L,
    embedder: &'a E,
}

impl<'a, L, E> SongIngester<'a, L, E>
where
    L: LyricsSource + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    pub fn new(db: &'a Database, lyrics: &'a L, embedder: &'a E) -> Self {
        Self {
            db,
            lyrics,
            embedder,
        }
    }

    /// Add one song to the catalog.
    ///
    /// A song already stored under the same title and artist is returned
    /// as [`IngestOutcome::AlreadyPresent`] without any network call.
    ///
    /// # Errors
    ///
    /// Fails on blank title or artist, lookup or embedding failure, an
    /// embedding whose dimensionality differs from the stored corpus, or one
    /// that rounds to a vector cosine similarity is undefined for.
    pub async fn ingest(&self, request: IngestRequest) -> IngestResult<IngestOutcome> {
        let mut song = Song::new(&request.title, &request.artist)
            .map_err(|e| IngestError::InvalidInput(e.to_string()))?;
        if let Some(year) = request.year {
            song = song.with_year(year);
        }

        if let Some(existing) = self.db.get_song(&song.title, &song.artist)? {
            log::info!("Already in catalog: {}", existing);
            return Ok(IngestOutcome::AlreadyPresent(existing));
        }

        let content = match request.lyrics {
            Some(text) => Some(text),
            None => self.lyrics.fetch_lyrics(&song.title, &song.artist).await?,
        };

        let Some(content) = content.filter(|text| !text.trim().is_empty()) else {
            log::warn!(
                "No lyrics found for {} on {}, storing without a vector",
                song,
                self.lyrics.name()
            );
            return self.store(song, IngestOutcome::AddedWithoutLyrics);
        };

        let expected = self.db.corpus_dimensions()?;
        let lyrics = self.embed(&song, content, expected).await?;
        self.store(song.with_lyrics(lyrics), IngestOutcome::Added)
    }

    /// Look up and embed the lyrics of a stored song again.
    ///
    /// Used for songs that were stored without lyrics or whose lyrics
    /// changed. The song's own previous vector is ignored by the
    /// dimensionality check, so a lone song can move to a new model; with
    /// other songs stored, the new vector must match theirs.
    pub async fn refresh_lyrics(&self, title: &str, artist: &str) -> IngestResult<Song> {
        let song = self
            .db
            .get_song(title, artist)?
            .ok_or_else(|| IngestError::NotFound {
                entity: format!("song '{} - {}'", title.trim(), artist.trim()),
                source_name: "catalog".to_string(),
            })?;

        let content = self
            .lyrics
            .fetch_lyrics(&song.title, &song.artist)
            .await?
            .ok_or_else(|| IngestError::NotFound {
                entity: format!("lyrics for '{song}'"),
                source_name: self.lyrics.name().to_string(),
            })?;

        let expected = self.db.corpus_dimensions_excluding(&song.id)?;
        let lyrics = self.embed(&song, content, expected).await?;
        self.db.replace_lyrics(&song.id, &lyrics)?;
        log::info!("Refreshed lyrics for {}", song);

        Ok(song.with_lyrics(lyrics))
    }

    /// Embed `content` and check the rounded vector can be ranked: matching
    /// `expected` dimensions, non-empty, finite and of non-zero magnitude.
    async fn embed(
        &self,
        song: &Song,
        content: String,
        expected: Option<usize>,
    ) -> IngestResult<Lyrics> {
        let vector = self.embedder.vectorize(&content).await?;

        if let Some(expected) = expected {
            if expected != vector.len() {
                return Err(IngestError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        let lyrics = Lyrics::new(content, vector);
        let rounded = lyrics.vector.as_slice();
        CosineSimilarity
            .compare(rounded, rounded)
            .map_err(|reason| IngestError::DegenerateVector {
                song: song.to_string(),
                reason,
            })?;

        Ok(lyrics)
    }

    fn store(&self, song: Song, outcome: fn(Song) -> IngestOutcome) -> IngestResult<IngestOutcome> {
        if self.db.insert_song(&song)? {
            log::info!("Added {}", song);
            return Ok(outcome(song));
        }

        // Lost to a concurrent insert, or the lyrics vector is already taken.
        let existing = match &song.lyrics {
            Some(lyrics) => self.db.song_by_lyrics_vector(&lyrics.vector)?,
            None => None,
        };
        let existing = match existing {
            Some(found) => Some(found),
            None => self.db.get_song(&song.title, &song.artist)?,
        };
        Ok(IngestOutcome::AlreadyPresent(existing.unwrap_or(song)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use musia_search::{EmbeddingError, InvalidVectorError};

    #[derive(Debug, Default)]
    struct FakeLyrics {
        text: Option<String>,
        calls: AtomicUsize,
    }

    impl FakeLyrics {
        fn with(text: &str) -> Self {
            Self {
                text: Some(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LyricsSource for FakeLyrics {
        fn name(&self) -> &str {
            "fake"
        }

        async fn fetch_lyrics(&self, _title: &str, _artist: &str) -> IngestResult<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    /// Embeds text as `[len, 1.0]` padded to `dims`.
    #[derive(Debug)]
    struct LengthEmbedder {
        dims: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        fn name(&self) -> &str {
            "length"
        }

        async fn vectorize(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
            let mut vector = vec![1.0; self.dims];
            vector[0] = text.len() as f64;
            Ok(vector)
        }
    }

    #[tokio::test]
    async fn test_ingest_fetches_and_embeds() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::with("Imagine there's no heaven");
        let embedder = LengthEmbedder { dims: 2 };
        let ingester = SongIngester::new(&db, &source, &embedder);

        let outcome = ingester
            .ingest(IngestRequest::new("Imagine", "John Lennon").with_year(Some(1971)))
            .await
            .unwrap();

        assert!(matches!(outcome, IngestOutcome::Added(_)));
        let stored = db.get_song("Imagine", "John Lennon").unwrap().unwrap();
        assert_eq!(stored.year, Some(1971));
        let lyrics = stored.lyrics.unwrap();
        assert_eq!(lyrics.content, "Imagine there's no heaven");
        assert_eq!(lyrics.vector.as_slice(), &[25.0, 1.0]);
    }

    #[tokio::test]
    async fn test_supplied_lyrics_skip_lookup() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::default();
        let embedder = LengthEmbedder { dims: 2 };
        let ingester = SongIngester::new(&db, &source, &embedder);

        let outcome = ingester
            .ingest(IngestRequest::new("Yesterday", "The Beatles").with_lyrics(Some("Yesterday...".into())))
            .await
            .unwrap();

        assert!(matches!(outcome, IngestOutcome::Added(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_lyrics_stores_without_vector() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::default();
        let embedder = LengthEmbedder { dims: 2 };
        let ingester = SongIngester::new(&db, &source, &embedder);

        let outcome = ingester
            .ingest(IngestRequest::new("Unknown", "Nobody"))
            .await
            .unwrap();

        assert!(matches!(outcome, IngestOutcome::AddedWithoutLyrics(_)));
        assert_eq!(db.count_songs().unwrap(), 1);
        assert_eq!(db.count_songs_with_vectors().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_existing_song_is_not_refetched() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::with("Hey Jude, don't make it bad");
        let embedder = LengthEmbedder { dims: 2 };
        let ingester = SongIngester::new(&db, &source, &embedder);

        ingester
            .ingest(IngestRequest::new("Hey Jude", "The Beatles"))
            .await
            .unwrap();
        let again = ingester
            .ingest(IngestRequest::new(" Hey Jude ", "The Beatles"))
            .await
            .unwrap();

        assert!(matches!(again, IngestOutcome::AlreadyPresent(_)));
        assert!(!again.is_new());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(db.count_songs().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_vector_is_already_present() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::with("same words");
        let embedder = LengthEmbedder { dims: 2 };
        let ingester = SongIngester::new(&db, &source, &embedder);

        ingester
            .ingest(IngestRequest::new("Original", "Band"))
            .await
            .unwrap();
        let cover = ingester
            .ingest(IngestRequest::new("Cover", "Other Band"))
            .await
            .unwrap();

        assert!(matches!(cover, IngestOutcome::AlreadyPresent(_)));
        assert_eq!(cover.song().title, "Original");
        assert_eq!(db.count_songs().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::with("la la la");
        let small = LengthEmbedder { dims: 2 };
        SongIngester::new(&db, &source, &small)
            .ingest(IngestRequest::new("First", "Band"))
            .await
            .unwrap();

        let large = LengthEmbedder { dims: 3 };
        let err = SongIngester::new(&db, &source, &large)
            .ingest(IngestRequest::new("Second", "Band").with_lyrics(Some("other".into())))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IngestError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert_eq!(db.count_songs().unwrap(), 1);
    }

    /// Returns the same vector for every text.
    #[derive(Debug)]
    struct ConstantEmbedder(Vec<f64>);

    #[async_trait]
    impl EmbeddingProvider for ConstantEmbedder {
        fn name(&self) -> &str {
            "constant"
        }

        async fn vectorize(&self, _text: &str) -> Result<Vec<f64>, EmbeddingError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_vector_rounding_to_zero_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::with("whispered");
        SongIngester::new(&db, &source, &ConstantEmbedder(vec![1.0, 0.0, 0.0]))
            .ingest(IngestRequest::new("Good", "Band"))
            .await
            .unwrap();

        let tiny = ConstantEmbedder(vec![1e-7, -2e-7, 3e-7]);
        let err = SongIngester::new(&db, &source, &tiny)
            .ingest(IngestRequest::new("Tiny", "Band"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IngestError::DegenerateVector {
                reason: InvalidVectorError::ZeroMagnitude,
                ..
            }
        ));
        assert!(err.to_string().contains("Tiny - Band"));
        assert_eq!(db.count_songs_with_vectors().unwrap(), 1);
        assert!(db.get_song("Tiny", "Band").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_catalog_stays_rankable_after_rejected_vector() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::with("whispered");
        let good = ConstantEmbedder(vec![1.0, 0.0, 0.0]);
        SongIngester::new(&db, &source, &good)
            .ingest(IngestRequest::new("Good", "Band"))
            .await
            .unwrap();
        let tiny = ConstantEmbedder(vec![1e-7, -2e-7, 3e-7]);
        assert!(SongIngester::new(&db, &source, &tiny)
            .ingest(IngestRequest::new("Tiny", "Band"))
            .await
            .is_err());

        let playlist = musia_search::PlaylistRanker::new(&db, &good)
            .build_playlist("love", 5)
            .await
            .unwrap();
        assert_eq!(playlist.len(), 1);
    }

    #[tokio::test]
    async fn test_non_finite_vector_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::with("words");
        let err = SongIngester::new(&db, &source, &ConstantEmbedder(vec![f64::NAN, 1.0]))
            .ingest(IngestRequest::new("Broken", "Band"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IngestError::DegenerateVector {
                reason: InvalidVectorError::NonFinite,
                ..
            }
        ));
        assert_eq!(db.count_songs().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refresh_rejects_zero_vector_and_keeps_old_lyrics() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::with("first words");
        SongIngester::new(&db, &source, &ConstantEmbedder(vec![0.0, 1.0]))
            .ingest(IngestRequest::new("Song", "Band"))
            .await
            .unwrap();

        let err = SongIngester::new(&db, &source, &ConstantEmbedder(vec![0.0, 0.0]))
            .refresh_lyrics("Song", "Band")
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::DegenerateVector { .. }));
        let stored = db.get_song("Song", "Band").unwrap().unwrap();
        assert_eq!(stored.lyrics.unwrap().vector.as_slice(), &[0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_refresh_lone_song_with_new_model_dimensions() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::with("words");
        SongIngester::new(&db, &source, &LengthEmbedder { dims: 2 })
            .ingest(IngestRequest::new("Only", "Band"))
            .await
            .unwrap();

        let song = SongIngester::new(&db, &source, &LengthEmbedder { dims: 4 })
            .refresh_lyrics("Only", "Band")
            .await
            .unwrap();

        assert_eq!(song.lyrics.unwrap().vector.dimensions(), 4);
        assert_eq!(db.corpus_dimensions().unwrap(), Some(4));
    }

    #[tokio::test]
    async fn test_refresh_must_match_other_songs() {
        let db = Database::open_in_memory().unwrap();
        let small = LengthEmbedder { dims: 2 };
        SongIngester::new(&db, &FakeLyrics::with("one"), &small)
            .ingest(IngestRequest::new("First", "Band"))
            .await
            .unwrap();
        SongIngester::new(&db, &FakeLyrics::with("second"), &small)
            .ingest(IngestRequest::new("Second", "Band"))
            .await
            .unwrap();

        let err = SongIngester::new(&db, &FakeLyrics::with("third"), &LengthEmbedder { dims: 4 })
            .refresh_lyrics("Second", "Band")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IngestError::DimensionMismatch {
                expected: 2,
                actual: 4
            }
        ));
    }

    #[tokio::test]
    async fn test_blank_title_is_invalid() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::default();
        let embedder = LengthEmbedder { dims: 2 };
        let err = SongIngester::new(&db, &source, &embedder)
            .ingest(IngestRequest::new("  ", "Band"))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_refresh_adds_vector_to_bare_song() {
        let db = Database::open_in_memory().unwrap();
        let embedder = LengthEmbedder { dims: 2 };
        SongIngester::new(&db, &FakeLyrics::default(), &embedder)
            .ingest(IngestRequest::new("Late", "Band"))
            .await
            .unwrap();

        let found = FakeLyrics::with("finally published");
        let song = SongIngester::new(&db, &found, &embedder)
            .refresh_lyrics("Late", "Band")
            .await
            .unwrap();

        assert!(song.has_vector());
        assert_eq!(db.count_songs_with_vectors().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_refresh_unknown_song_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeLyrics::with("words");
        let embedder = LengthEmbedder { dims: 2 };
        let err = SongIngester::new(&db, &source, &embedder)
            .refresh_lyrics("Ghost", "Nobody")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }
}
