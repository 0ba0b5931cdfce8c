//! Similarity-ranked playlist construction.
//!
//! A keyword is embedded once, scored against every stored lyric vector,
//! and the best `max_songs` matches become the playlist. The scan is linear
//! over the whole corpus.

use serde::Serialize;

use musia_core::model::{Lyrics, Playlist};
use musia_core::CorpusAccessor;

use crate::assembler::PlaylistAssembler;
use crate::embedding::EmbeddingProvider;
use crate::error::{IntegrityWarning, RankError, RankResult};
use crate::similarity::{CosineSimilarity, VectorComparator};

/// One corpus entry with its similarity to the keyword.
#[derive(Debug, Clone, Serialize)]
pub struct RankedLyrics {
    pub lyrics: Lyrics,
    pub score: f64,
}

/// A built playlist together with the ranking details behind it.
#[derive(Debug, Clone, Serialize)]
pub struct RankedPlaylist {
    pub playlist: Playlist,
    /// Score of each playlist song, in playlist order.
    pub scores: Vec<f64>,
    pub warnings: Vec<IntegrityWarning>,
}

/// Builds playlists from a keyword.
///
/// The corpus accessor and embedding provider are borrowed, so one of each
/// can serve any number of rankers. The ranker itself holds no mutable
/// state.
#[derive(Debug)]
pub struct PlaylistRanker<'a, C: ?Sized, E: ?Sized, V = CosineSimilarity> {
    corpus: &'a C,
    embedder: &'a E,
    comparator: V,
}

impl<'a, C, E> PlaylistRanker<'a, C, E>
where
    C: CorpusAccessor + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    pub fn new(corpus: &'a C, embedder: &'a E) -> Self {
        Self {
            corpus,
            embedder,
            comparator: CosineSimilarity,
        }
    }
}

impl<'a, C, E, V> PlaylistRanker<'a, C, E, V>
where
    C: CorpusAccessor + ?Sized,
    E: EmbeddingProvider + ?Sized,
    V: VectorComparator,
{
    /// Swap the similarity measure.
    pub fn with_comparator<W: VectorComparator>(self, comparator: W) -> PlaylistRanker<'a, C, E, W> {
        PlaylistRanker {
            corpus: self.corpus,
            embedder: self.embedder,
            comparator,
        }
    }

    /// Score the whole corpus against `keyword` and keep the best
    /// `max_songs` entries, best first.
    ///
    /// Entries with equal scores keep corpus order. Asking for more songs
    /// than the corpus holds returns the whole corpus, ranked.
    pub async fn rank(&self, keyword: &str, max_songs: usize) -> RankResult<Vec<RankedLyrics>> {
        validate_request(keyword, max_songs)?;

        let corpus = self.corpus.all_lyrics_with_vectors()?;
        if corpus.is_empty() {
            return Err(RankError::EmptyCorpus);
        }

        let key_vector = self.embedder.vectorize(keyword).await?;
        log::debug!(
            "Vectorized '{}' with {} ({} dimensions)",
            keyword,
            self.embedder.name(),
            key_vector.len()
        );

        let mut ranked = corpus
            .into_iter()
            .map(|lyrics| -> RankResult<RankedLyrics> {
                let score = self
                    .comparator
                    .compare(&key_vector, lyrics.vector.as_slice())?;
                Ok(RankedLyrics { lyrics, score })
            })
            .collect::<RankResult<Vec<_>>>()?;

        let corpus_size = ranked.len();
        // `sort_by` is stable: ties stay in corpus order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(max_songs);

        log::info!(
            "Ranked {} lyrics for '{}', keeping {}",
            corpus_size,
            keyword,
            ranked.len()
        );
        Ok(ranked)
    }

    /// Build the playlist named `keyword` from the best matches.
    pub async fn build_playlist(&self, keyword: &str, max_songs: usize) -> RankResult<Playlist> {
        self.build_playlist_with_report(keyword, max_songs)
            .await
            .map(|report| report.playlist)
    }

    /// Like [`build_playlist`](Self::build_playlist), also returning each
    /// song's score and any vectors that could not be resolved to a song.
    pub async fn build_playlist_with_report(
        &self,
        keyword: &str,
        max_songs: usize,
    ) -> RankResult<RankedPlaylist> {
        let ranked = self.rank(keyword, max_songs).await?;
        let assembly = PlaylistAssembler::new(self.corpus).resolve(&ranked)?;

        let playlist = Playlist::new(keyword, assembly.songs)
            .map_err(|e| RankError::InvalidRequest(e.to_string()))?;

        Ok(RankedPlaylist {
            playlist,
            scores: assembly.scores,
            warnings: assembly.warnings,
        })
    }
}

fn validate_request(keyword: &str, max_songs: usize) -> RankResult<()> {
    if keyword.trim().is_empty() {
        return Err(RankError::InvalidRequest("keyword must not be empty".into()));
    }
    if max_songs == 0 {
        return Err(RankError::InvalidRequest(
            "playlist must hold at least one song".into(),
        ));
    }
    Ok(())
}
