use anyhow::Result;
use serde_json::json;

use musia_etl::Config;

use super::{open_db, print_json};

pub fn show_status(config: &Config, json: bool) -> Result<()> {
    let db = open_db(&config.database_path)?;

    let songs = db.count_songs()?;
    let ranked = db.count_songs_with_vectors()?;
    let playlists = db.count_playlists()?;
    let dimensions = db.corpus_dimensions()?;

    if json {
        return print_json(&json!({
            "database": config.database_path,
            "songs": songs,
            "songs_with_lyrics": ranked,
            "playlists": playlists,
            "dimensions": dimensions,
            "embedding_model": config.embedding_model,
        }));
    }

    println!("\n📊 Musia Status\n");
    println!("  Database: {}", config.database_path.display());
    println!("  Songs: {} ({} with lyrics)", songs, ranked);
    println!("  Playlists: {}", playlists);
    println!("  Embedding model: {}", config.embedding_model);
    if let Some(dims) = dimensions {
        println!("  Vector dimensions: {}", dims);
    }

    if songs > ranked {
        println!(
            "\n  {} songs have no lyrics. Run `musia song refresh <title> <artist>` to retry.",
            songs - ranked
        );
    }

    Ok(())
}
