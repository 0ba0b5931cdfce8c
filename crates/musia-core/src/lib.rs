//! Core domain model for musia.
//!
//! This crate defines the catalog data model (Song, Lyrics, Embedding,
//! Playlist), the SQLite schema, and the [`CorpusAccessor`] seam through
//! which the ranking layer reads stored lyric vectors.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod corpus;
pub mod error;
pub mod model;
pub mod schema;

pub use corpus::CorpusAccessor;
pub use error::{Error, Result};
