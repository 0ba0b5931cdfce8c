//! Turns ranked lyric vectors back into songs.

use musia_core::model::Song;
use musia_core::CorpusAccessor;

use crate::error::{IntegrityWarning, RankResult};
use crate::ranker::RankedLyrics;

/// Songs resolved from a ranking, in rank order.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub songs: Vec<Song>,
    /// Score of each entry in `songs`, index for index.
    pub scores: Vec<f64>,
    pub warnings: Vec<IntegrityWarning>,
}

/// Resolves ranked vectors to full song records through the corpus.
///
/// A vector with no matching song is skipped and reported as an
/// [`IntegrityWarning`]; the rest of the playlist is still built.
#[derive(Debug)]
pub struct PlaylistAssembler<'a, C: ?Sized> {
    corpus: &'a C,
}

impl<'a, C> PlaylistAssembler<'a, C>
where
    C: CorpusAccessor + ?Sized,
{
    pub fn new(corpus: &'a C) -> Self {
        Self { corpus }
    }

    pub fn resolve(&self, ranked: &[RankedLyrics]) -> RankResult<Assembly> {
        let mut assembly = Assembly {
            songs: Vec::with_capacity(ranked.len()),
            scores: Vec::with_capacity(ranked.len()),
            warnings: Vec::new(),
        };

        for (idx, entry) in ranked.iter().enumerate() {
            let rank = idx + 1;
            match self.corpus.song_by_lyrics_vector(&entry.lyrics.vector)? {
                Some(song) if assembly.songs.contains(&song) => {
                    assembly.warn(rank, entry.score, format!("'{song}' already ranked higher"));
                }
                Some(song) => {
                    assembly.songs.push(song);
                    assembly.scores.push(entry.score);
                }
                None => {
                    assembly.warn(
                        rank,
                        entry.score,
                        format!(
                            "no song stored for a {}-dimensional lyrics vector",
                            entry.lyrics.vector.dimensions()
                        ),
                    );
                }
            }
        }

        Ok(assembly)
    }
}

impl Assembly {
    fn warn(&mut self, rank: usize, score: f64, message: String) {
        let warning = IntegrityWarning {
            rank,
            score,
            message,
        };
        log::warn!("Skipping ranked lyrics, {}", warning);
        self.warnings.push(warning);
    }
}
