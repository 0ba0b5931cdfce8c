use anyhow::{Context, Result};
use serde_json::json;
use std::path::{Path, PathBuf};

use musia_core::model::Song;
use musia_etl::{
    Config, IngestOutcome, IngestRequest, LrclibClient, OllamaEmbedder, SongIngester,
};

use super::{open_db, print_json};

/// Add a song to the catalog.
pub async fn add_song(
    config: &Config,
    title: String,
    artist: String,
    year: Option<i32>,
    lyrics_file: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let lyrics = lyrics_file
        .map(|path| {
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read lyrics from {}", path.display()))
        })
        .transpose()?;

    let db = open_db(&config.database_path)?;
    let source = LrclibClient::from_config(config)?;
    let embedder = OllamaEmbedder::from_config(config)?;
    let ingester = SongIngester::new(&db, &source, &embedder);

    let request = IngestRequest::new(title, artist)
        .with_year(year)
        .with_lyrics(lyrics);
    let outcome = ingester.ingest(request).await?;

    if json {
        let status = match &outcome {
            IngestOutcome::Added(_) => "added",
            IngestOutcome::AddedWithoutLyrics(_) => "added_without_lyrics",
            IngestOutcome::AlreadyPresent(_) => "already_present",
        };
        return print_json(&json!({ "status": status, "song": song_summary(outcome.song()) }));
    }

    match outcome {
        IngestOutcome::Added(song) => println!("✓ Added {}", song),
        IngestOutcome::AddedWithoutLyrics(song) => {
            println!("⚠ Added {} without lyrics", song);
            println!("  It will not appear in playlists until `musia song refresh` finds lyrics.");
        }
        IngestOutcome::AlreadyPresent(song) => println!("Already in catalog: {}", song),
    }

    Ok(())
}

/// List catalogued songs, optionally only those by one artist.
pub fn list_songs(db_path: &Path, artist: Option<&str>, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let songs = match artist {
        Some(name) => db.list_songs_by_artist(name)?,
        None => db.list_songs()?,
    };

    if json {
        let summaries: Vec<_> = songs.iter().map(song_summary).collect();
        return print_json(&summaries);
    }

    if songs.is_empty() {
        match artist {
            Some(name) => println!("No songs by {}. See `musia song artists`.", name.trim()),
            None => println!("No songs yet. Add one with `musia song add <title> <artist>`."),
        }
        return Ok(());
    }

    match artist {
        Some(name) => println!("\n🎵 {} songs by {}\n", songs.len(), name.trim()),
        None => println!("\n🎵 {} songs\n", songs.len()),
    }
    for song in &songs {
        let marker = if song.has_vector() { " " } else { "-" };
        println!("  {} {}", marker, song);
    }
    if songs.iter().any(|s| !s.has_vector()) {
        println!("\n  - no lyrics, not ranked");
    }

    Ok(())
}

/// List artists in the catalog.
pub fn list_artists(db_path: &Path, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let artists = db.list_artists()?;

    if json {
        let entries: Vec<_> = artists
            .iter()
            .map(|(name, songs)| json!({ "artist": name, "songs": songs }))
            .collect();
        return print_json(&entries);
    }

    if artists.is_empty() {
        println!("No songs yet. Add one with `musia song add <title> <artist>`.");
        return Ok(());
    }

    for (name, songs) in &artists {
        println!("  {} ({})", name, songs);
    }
    println!("\n  Show one artist's songs with `musia song list --artist <name>`.");
    Ok(())
}

/// Print the stored lyrics of a song.
pub fn show_lyrics(db_path: &Path, title: &str, artist: &str, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let song = find_song(&db, title, artist)?;

    if json {
        return print_json(&json!({
            "song": song_summary(&song),
            "lyrics": song.lyrics.as_ref().map(|l| &l.content),
        }));
    }

    match &song.lyrics {
        Some(lyrics) => {
            println!("{}\n", song);
            println!("{}", lyrics.content);
        }
        None => println!("No lyrics stored for {}", song),
    }
    Ok(())
}

/// Remove a song from the catalog.
pub fn remove_song(db_path: &Path, title: &str, artist: &str) -> Result<()> {
    let db = open_db(db_path)?;
    if db.delete_song(title, artist)? {
        println!("✓ Removed {} - {}", title.trim(), artist.trim());
    } else {
        anyhow::bail!("Song not found: {} - {}", title.trim(), artist.trim());
    }
    Ok(())
}

/// Look up a song's lyrics again and replace the stored vector.
pub async fn refresh_song(config: &Config, title: &str, artist: &str, json: bool) -> Result<()> {
    let db = open_db(&config.database_path)?;
    let source = LrclibClient::from_config(config)?;
    let embedder = OllamaEmbedder::from_config(config)?;

    let song = SongIngester::new(&db, &source, &embedder)
        .refresh_lyrics(title, artist)
        .await?;

    if json {
        return print_json(&song_summary(&song));
    }
    println!("✓ Refreshed lyrics for {}", song);
    Ok(())
}

fn find_song(db: &musia_core::schema::Database, title: &str, artist: &str) -> Result<Song> {
    db.get_song(title, artist)?
        .ok_or_else(|| anyhow::anyhow!("Song not found: {} - {}", title.trim(), artist.trim()))
}

/// Song fields worth printing; vectors are long and not meant for reading.
pub(crate) fn song_summary(song: &Song) -> serde_json::Value {
    json!({
        "title": song.title,
        "artist": song.artist,
        "year": song.year,
        "has_lyrics": song.has_vector(),
        "dimensions": song.lyrics.as_ref().map(|l| l.vector.dimensions()),
    })
}
