//! Vector search for musia.
//!
//! Builds playlists by embedding a keyword, scoring it against every stored
//! lyric vector with cosine similarity, and keeping the best matches.
//! The corpus and the embedding model are injected through
//! [`CorpusAccessor`](musia_core::CorpusAccessor) and [`EmbeddingProvider`].

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod assembler;
pub mod embedding;
pub mod error;
pub mod ranker;
pub mod similarity;

pub use assembler::{Assembly, PlaylistAssembler};
pub use embedding::EmbeddingProvider;
pub use error::{EmbeddingError, IntegrityWarning, InvalidVectorError, RankError, RankResult};
pub use ranker::{PlaylistRanker, RankedLyrics, RankedPlaylist};
pub use similarity::{CosineSimilarity, VectorComparator};
