//! Ingestion side of musia.
//!
//! Fetches lyrics from LRCLIB, embeds them through an Ollama-compatible
//! endpoint, and stores the resulting songs. Also owns the layered
//! configuration shared by the CLI.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod lyrics;
pub mod resilience;

pub use config::Config;
pub use embedding::OllamaEmbedder;
pub use error::{IngestError, IngestResult};
pub use ingest::{IngestOutcome, IngestRequest, SongIngester};
pub use lyrics::{LrclibClient, LyricsSource};
