use anyhow::{bail, Result};
use serde_json::json;
use std::path::Path;

use musia_core::model::Playlist;
use musia_core::schema::Database;
use musia_etl::{Config, OllamaEmbedder};
use musia_search::{PlaylistRanker, RankError};

use super::song::song_summary;
use super::{open_db, print_json};

/// Generate a playlist for `keyword` and save it under that name.
pub async fn create_playlist(
    config: &Config,
    keyword: &str,
    size: usize,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let name = keyword.trim();
    Playlist::validate_name(name)?;

    let db = open_db(&config.database_path)?;
    if !dry_run && db.get_playlist_by_name(name)?.is_some() {
        bail!(
            "Playlist '{}' already exists. Delete it first with `musia playlist delete \"{}\"`.",
            name,
            name
        );
    }

    let embedder = OllamaEmbedder::from_config(config)?;
    let ranker = PlaylistRanker::new(&db, &embedder);

    let report = match ranker.build_playlist_with_report(name, size).await {
        Ok(report) => report,
        Err(RankError::EmptyCorpus) => {
            bail!("No songs with lyrics in the catalog. Add some with `musia song add`.")
        }
        Err(e) => return Err(e.into()),
    };

    if !dry_run {
        db.save_playlist(&report.playlist)?;
    }

    if json {
        let songs: Vec<_> = report
            .playlist
            .songs()
            .iter()
            .zip(&report.scores)
            .map(|(song, score)| json!({ "song": song_summary(song), "score": score }))
            .collect();
        return print_json(&json!({
            "name": report.playlist.name,
            "saved": !dry_run,
            "songs": songs,
            "warnings": report.warnings,
        }));
    }

    println!("\n🎶 Playlist '{}'\n", report.playlist.name);
    for (idx, (song, score)) in report
        .playlist
        .songs()
        .iter()
        .zip(&report.scores)
        .enumerate()
    {
        println!("  {:>2}. {}  [{:.3}]", idx + 1, song, score);
    }
    for warning in &report.warnings {
        println!("  ⚠ {}", warning);
    }

    if dry_run {
        println!("\n  Dry run: playlist not saved.");
    } else {
        println!("\n✓ Saved {} songs", report.playlist.len());
    }

    Ok(())
}

/// List saved playlists.
pub fn list_playlists(db_path: &Path, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let playlists = db.list_playlists()?;

    if json {
        let entries: Vec<_> = playlists
            .iter()
            .map(|p| json!({ "name": p.name, "songs": p.len(), "created_at": p.created_at }))
            .collect();
        return print_json(&entries);
    }

    if playlists.is_empty() {
        println!("No playlists yet. Create one with `musia playlist create <keyword>`.");
        return Ok(());
    }

    for playlist in &playlists {
        println!(
            "  {} ({} songs, created {})",
            playlist.name,
            playlist.len(),
            playlist.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

/// Show one playlist.
pub fn show_playlist(db_path: &Path, name: &str, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let playlist = find_playlist(&db, name)?;

    if json {
        let songs: Vec<_> = playlist.songs().iter().map(song_summary).collect();
        return print_json(&json!({ "name": playlist.name, "songs": songs }));
    }

    println!("{}", playlist);
    Ok(())
}

/// Delete a playlist. Its songs stay in the catalog.
pub fn delete_playlist(db_path: &Path, name: &str) -> Result<()> {
    let db = open_db(db_path)?;
    if !db.delete_playlist(name)? {
        bail!("Playlist not found: {}", name);
    }
    println!("✓ Deleted playlist '{}'", name);
    Ok(())
}

/// Append a catalogued song to a playlist.
pub fn add_song(db_path: &Path, name: &str, title: &str, artist: &str) -> Result<()> {
    let db = open_db(db_path)?;
    let mut playlist = find_playlist(&db, name)?;
    let Some(song) = db.get_song(title, artist)? else {
        bail!("Song not found: {} - {}", title.trim(), artist.trim());
    };

    let label = song.to_string();
    if !playlist.add_song(song) {
        println!("'{}' is already in '{}'", label, playlist.name);
        return Ok(());
    }

    db.update_playlist_songs(&playlist)?;
    println!("✓ Added {} to '{}'", label, playlist.name);
    Ok(())
}

/// Remove a song from a playlist.
pub fn remove_song(db_path: &Path, name: &str, title: &str, artist: &str) -> Result<()> {
    let db = open_db(db_path)?;
    let mut playlist = find_playlist(&db, name)?;

    if !playlist.remove_song(title, artist) {
        bail!(
            "{} - {} is not in playlist '{}'",
            title.trim(),
            artist.trim(),
            playlist.name
        );
    }

    db.update_playlist_songs(&playlist)?;
    println!(
        "✓ Removed {} - {} from '{}'",
        title.trim(),
        artist.trim(),
        playlist.name
    );
    Ok(())
}

fn find_playlist(db: &Database, name: &str) -> Result<Playlist> {
    db.get_playlist_by_name(name)?
        .ok_or_else(|| anyhow::anyhow!("Playlist not found: {}", name))
}
