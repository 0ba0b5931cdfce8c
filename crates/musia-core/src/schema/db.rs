use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

use crate::corpus::CorpusAccessor;
use crate::error::{Error, Result};
use crate::model::{Embedding, Lyrics, Playlist, PlaylistId, Song, SongId};

use super::migrations::MIGRATIONS;

const SONG_COLUMNS: &str = "s.id, s.title, s.artist, s.release_year, s.lyrics_content, \
                            s.lyrics_vector, s.created_at";

/// A database connection with CRUD methods for songs and playlists.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

// Song CRUD
impl Database {
    /// Insert a song.
    ///
    /// Returns `false` without writing anything when a song with the same
    /// title and artist, or with the same lyrics vector, is already stored.
    pub fn insert_song(&self, song: &Song) -> Result<bool> {
        let (content, vector_key) = lyrics_columns(song.lyrics.as_ref())?;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO songs (
                id, title, artist, release_year, lyrics_content, lyrics_vector, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                song.id.to_string(),
                song.title,
                song.artist,
                song.year,
                content,
                vector_key,
                song.created_at.to_rfc3339(),
            ],
        )?;

        if inserted == 0 {
            log::debug!("Song already catalogued, skipping: {}", song);
        }
        Ok(inserted > 0)
    }

    /// List all songs in insertion order.
    pub fn list_songs(&self) -> Result<Vec<Song>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {SONG_COLUMNS} FROM songs s ORDER BY s.rowid"))?;
        let songs = stmt
            .query_map([], row_to_song)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(songs)
    }

    /// Songs by one artist, in insertion order.
    pub fn list_songs_by_artist(&self, artist: &str) -> Result<Vec<Song>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SONG_COLUMNS} FROM songs s WHERE s.artist = ?1 ORDER BY s.rowid"
        ))?;
        let songs = stmt
            .query_map([artist.trim()], row_to_song)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(songs)
    }

    /// Distinct artists with their song counts, alphabetically.
    pub fn list_artists(&self) -> Result<Vec<(String, usize)>> {
        let mut stmt = self.conn.prepare(
            "SELECT artist, COUNT(*) FROM songs GROUP BY artist ORDER BY artist COLLATE NOCASE",
        )?;
        let artists = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok((row.get(0)?, usize::try_from(count).unwrap_or(0)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(artists)
    }

    /// Find a song by its title and artist.
    pub fn get_song(&self, title: &str, artist: &str) -> Result<Option<Song>> {
        let song = self
            .conn
            .query_row(
                &format!("SELECT {SONG_COLUMNS} FROM songs s WHERE s.title = ?1 AND s.artist = ?2"),
                [title.trim(), artist.trim()],
                row_to_song,
            )
            .optional()?;
        Ok(song)
    }

    pub fn get_song_by_id(&self, id: &SongId) -> Result<Option<Song>> {
        let song = self
            .conn
            .query_row(
                &format!("SELECT {SONG_COLUMNS} FROM songs s WHERE s.id = ?1"),
                [id.to_string()],
                row_to_song,
            )
            .optional()?;
        Ok(song)
    }

    /// Delete a song. Playlist memberships are removed with it.
    pub fn delete_song(&self, title: &str, artist: &str) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM songs WHERE title = ?1 AND artist = ?2",
            [title.trim(), artist.trim()],
        )?;
        Ok(deleted > 0)
    }

    /// Replace the whole lyrics value of a stored song.
    pub fn replace_lyrics(&self, id: &SongId, lyrics: &Lyrics) -> Result<()> {
        let (content, vector_key) = lyrics_columns(Some(lyrics))?;
        let updated = self
            .conn
            .execute(
                "UPDATE songs SET lyrics_content = ?2, lyrics_vector = ?3 WHERE id = ?1",
                rusqlite::params![id.to_string(), content, vector_key],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    Error::AlreadyExists {
                        entity: "lyrics vector",
                        key: format!("for song {id}"),
                    }
                } else {
                    Error::Database(e)
                }
            })?;

        if updated == 0 {
            return Err(Error::NotFound {
                entity: "song",
                key: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn count_songs(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM songs")
    }

    /// Number of songs that take part in ranking.
    pub fn count_songs_with_vectors(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM songs WHERE lyrics_vector IS NOT NULL")
    }

    /// Dimensionality of the stored lyric vectors, if any are stored.
    pub fn corpus_dimensions(&self) -> Result<Option<usize>> {
        self.vector_dimensions(None)
    }

    /// Like [`corpus_dimensions`](Self::corpus_dimensions), ignoring one
    /// song's own vector.
    pub fn corpus_dimensions_excluding(&self, id: &SongId) -> Result<Option<usize>> {
        self.vector_dimensions(Some(id))
    }

    fn vector_dimensions(&self, excluded: Option<&SongId>) -> Result<Option<usize>> {
        let excluded = excluded.map(ToString::to_string);
        let key: Option<String> = self
            .conn
            .query_row(
                "SELECT lyrics_vector FROM songs
                 WHERE lyrics_vector IS NOT NULL AND (?1 IS NULL OR id != ?1)
                 ORDER BY rowid LIMIT 1",
                [excluded],
                |row| row.get(0),
            )
            .optional()?;

        key.map(|k| Embedding::from_key(&k).map(|e| e.dimensions()))
            .transpose()
            .map_err(Error::from)
    }

    fn count(&self, sql: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

// Playlist CRUD
impl Database {
    /// Persist a playlist and its songs atomically.
    ///
    /// A playlist name is unique: saving a second playlist under an existing
    /// name fails with [`Error::AlreadyExists`] and leaves storage untouched.
    /// Every song must already be catalogued.
    pub fn save_playlist(&self, playlist: &Playlist) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM playlists WHERE name = ?1",
                [&playlist.name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if exists {
            return Err(Error::AlreadyExists {
                entity: "playlist",
                key: playlist.name.clone(),
            });
        }

        tx.execute(
            "INSERT INTO playlists (id, name, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                playlist.id.to_string(),
                playlist.name,
                playlist.created_at.to_rfc3339(),
            ],
        )?;
        insert_members(&tx, &playlist.id, playlist.songs())?;
        tx.commit()?;

        log::info!(
            "Saved playlist '{}' with {} songs",
            playlist.name,
            playlist.len()
        );
        Ok(())
    }

    /// Overwrite the stored song list of an existing playlist.
    pub fn update_playlist_songs(&self, playlist: &Playlist) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM playlists WHERE id = ?1",
                [playlist.id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(Error::NotFound {
                entity: "playlist",
                key: playlist.name.clone(),
            });
        }

        tx.execute(
            "DELETE FROM playlist_songs WHERE playlist_id = ?1",
            [playlist.id.to_string()],
        )?;
        insert_members(&tx, &playlist.id, playlist.songs())?;
        tx.commit()?;
        Ok(())
    }

    /// List all playlists, oldest first, each with its songs in rank order.
    pub fn list_playlists(&self) -> Result<Vec<Playlist>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM playlists ORDER BY created_at, rowid")?;
        let headers = stmt
            .query_map([], row_to_playlist_header)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        headers
            .into_iter()
            .map(|header| self.hydrate_playlist(header))
            .collect()
    }

    pub fn get_playlist_by_name(&self, name: &str) -> Result<Option<Playlist>> {
        let header = self
            .conn
            .query_row(
                "SELECT id, name, created_at FROM playlists WHERE name = ?1",
                [name],
                row_to_playlist_header,
            )
            .optional()?;
        header.map(|h| self.hydrate_playlist(h)).transpose()
    }

    pub fn get_playlist_by_id(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        let header = self
            .conn
            .query_row(
                "SELECT id, name, created_at FROM playlists WHERE id = ?1",
                [id.to_string()],
                row_to_playlist_header,
            )
            .optional()?;
        header.map(|h| self.hydrate_playlist(h)).transpose()
    }

    /// Delete a playlist by name. Its memberships cascade.
    pub fn delete_playlist(&self, name: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM playlists WHERE name = ?1", [name])?;
        Ok(deleted > 0)
    }

    pub fn count_playlists(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM playlists")
    }

    fn hydrate_playlist(&self, header: PlaylistHeader) -> Result<Playlist> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SONG_COLUMNS}
             FROM songs s
             JOIN playlist_songs ps ON ps.song_id = s.id
             WHERE ps.playlist_id = ?1
             ORDER BY ps.position"
        ))?;
        let songs = stmt
            .query_map([header.id.to_string()], row_to_song)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut playlist = Playlist::new(header.name, songs)?;
        playlist.id = header.id;
        playlist.created_at = header.created_at;
        Ok(playlist)
    }
}

impl CorpusAccessor for Database {
    fn all_lyrics_with_vectors(&self) -> Result<Vec<Lyrics>> {
        let mut stmt = self.conn.prepare(
            "SELECT lyrics_content, lyrics_vector
             FROM songs
             WHERE lyrics_vector IS NOT NULL
             ORDER BY rowid",
        )?;
        let lyrics = stmt
            .query_map([], |row| {
                let content: Option<String> = row.get(0)?;
                let key: String = row.get(1)?;
                let vector = Embedding::from_key(&key).map_err(|e| conversion_error(1, e))?;
                Ok(Lyrics::new(content.unwrap_or_default(), vector))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lyrics)
    }

    fn song_by_lyrics_vector(&self, vector: &Embedding) -> Result<Option<Song>> {
        let key = vector.to_key()?;
        let song = self
            .conn
            .query_row(
                &format!("SELECT {SONG_COLUMNS} FROM songs s WHERE s.lyrics_vector = ?1"),
                [key],
                row_to_song,
            )
            .optional()?;
        Ok(song)
    }
}

#[derive(Debug)]
struct PlaylistHeader {
    id: PlaylistId,
    name: String,
    created_at: DateTime<Utc>,
}

fn insert_members(conn: &Connection, playlist_id: &PlaylistId, songs: &[Song]) -> Result<()> {
    let mut lookup = conn.prepare("SELECT id FROM songs WHERE title = ?1 AND artist = ?2")?;
    let mut insert = conn.prepare(
        "INSERT INTO playlist_songs (playlist_id, song_id, position) VALUES (?1, ?2, ?3)",
    )?;

    for (position, song) in songs.iter().enumerate() {
        let song_id: String = lookup
            .query_row([&song.title, &song.artist], |row| row.get(0))
            .optional()?
            .ok_or_else(|| Error::NotFound {
                entity: "song",
                key: song.to_string(),
            })?;
        insert.execute(rusqlite::params![
            playlist_id.to_string(),
            song_id,
            position as i64
        ])?;
    }
    Ok(())
}

fn lyrics_columns(lyrics: Option<&Lyrics>) -> Result<(Option<&str>, Option<String>)> {
    match lyrics {
        Some(l) if l.vector.is_empty() => Err(Error::InvalidData(
            "lyrics vector must not be empty".into(),
        )),
        Some(l) => Ok((Some(l.content.as_str()), Some(l.vector.to_key()?))),
        None => Ok((None, None)),
    }
}

fn row_to_song(row: &rusqlite::Row) -> rusqlite::Result<Song> {
    let id: String = row.get(0)?;
    let content: Option<String> = row.get(4)?;
    let vector_key: Option<String> = row.get(5)?;
    let created_at: String = row.get(6)?;

    let lyrics = vector_key
        .map(|key| {
            Embedding::from_key(&key)
                .map(|vector| Lyrics::new(content.unwrap_or_default(), vector))
                .map_err(|e| conversion_error(5, e))
        })
        .transpose()?;

    Ok(Song {
        id: SongId::from_uuid(parse_uuid(0, &id)?),
        title: row.get(1)?,
        artist: row.get(2)?,
        year: row.get(3)?,
        lyrics,
        created_at: parse_timestamp(6, &created_at)?,
    })
}

fn row_to_playlist_header(row: &rusqlite::Row) -> rusqlite::Result<PlaylistHeader> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(2)?;
    Ok(PlaylistHeader {
        id: PlaylistId::from_uuid(parse_uuid(0, &id)?),
        name: row.get(1)?,
        created_at: parse_timestamp(2, &created_at)?,
    })
}

fn parse_uuid(idx: usize, value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| conversion_error(idx, e))
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song_with_vector(title: &str, artist: &str, vector: Vec<f64>) -> Song {
        Song::new(title, artist)
            .unwrap()
            .with_lyrics(Lyrics::new(format!("{title} lyrics"), vector))
    }

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_song_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let song = song_with_vector("Imagine", "John Lennon", vec![0.1, 0.2, 0.300_000_4]).with_year(1971);

        assert!(db.insert_song(&song).unwrap());

        let loaded = db.get_song("Imagine", "John Lennon").unwrap().unwrap();
        assert_eq!(loaded.id, song.id);
        assert_eq!(loaded.year, Some(1971));
        let lyrics = loaded.lyrics.unwrap();
        assert_eq!(lyrics.content, "Imagine lyrics");
        assert_eq!(lyrics.vector.as_slice(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_song_without_lyrics_is_not_in_corpus() {
        let db = Database::open_in_memory().unwrap();
        db.insert_song(&Song::new("Instrumental", "Nobody").unwrap())
            .unwrap();

        assert_eq!(db.count_songs().unwrap(), 1);
        assert_eq!(db.count_songs_with_vectors().unwrap(), 0);
        assert!(db.all_lyrics_with_vectors().unwrap().is_empty());
        assert!(db.corpus_dimensions().unwrap().is_none());
    }

    #[test]
    fn test_duplicate_song_is_noop() {
        let db = Database::open_in_memory().unwrap();
        let song = song_with_vector("Hey Jude", "The Beatles", vec![1.0, 0.0, 0.0]);

        assert!(db.insert_song(&song).unwrap());
        assert!(!db
            .insert_song(&song_with_vector("Hey Jude", "The Beatles", vec![1.0, 0.0, 0.0]))
            .unwrap());
        assert_eq!(db.count_songs().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_vector_under_other_metadata_is_noop() {
        let db = Database::open_in_memory().unwrap();
        db.insert_song(&song_with_vector("Hey Jude", "The Beatles", vec![1.0, 0.0]))
            .unwrap();

        let inserted = db
            .insert_song(&song_with_vector("Hey Jude (Remaster)", "Beatles", vec![1.0, 0.0]))
            .unwrap();
        assert!(!inserted);
        assert_eq!(db.count_songs().unwrap(), 1);
    }

    #[test]
    fn test_empty_vector_rejected() {
        let db = Database::open_in_memory().unwrap();
        let song = song_with_vector("Silence", "Nobody", Vec::new());
        assert!(matches!(db.insert_song(&song), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_corpus_keeps_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        db.insert_song(&song_with_vector("B", "x", vec![0.0, 1.0])).unwrap();
        db.insert_song(&song_with_vector("A", "x", vec![1.0, 0.0])).unwrap();

        let corpus = db.all_lyrics_with_vectors().unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0].content, "B lyrics");
        assert_eq!(corpus[1].content, "A lyrics");
        assert_eq!(db.corpus_dimensions().unwrap(), Some(2));
    }

    #[test]
    fn test_song_by_lyrics_vector_matches_after_rounding() {
        let db = Database::open_in_memory().unwrap();
        db.insert_song(&song_with_vector("Let It Be", "The Beatles", vec![0.123_456_7, 0.5]))
            .unwrap();

        let probe = Embedding::new(vec![0.123_456_74, 0.500_000_1]);
        let song = db.song_by_lyrics_vector(&probe).unwrap().unwrap();
        assert_eq!(song.title, "Let It Be");

        let missing = Embedding::new(vec![0.9, 0.1]);
        assert!(db.song_by_lyrics_vector(&missing).unwrap().is_none());
    }

    #[test]
    fn test_replace_lyrics() {
        let db = Database::open_in_memory().unwrap();
        let song = Song::new("Yesterday", "The Beatles").unwrap();
        db.insert_song(&song).unwrap();

        db.replace_lyrics(&song.id, &Lyrics::new("All my troubles", vec![0.3, 0.4]))
            .unwrap();

        let loaded = db.get_song_by_id(&song.id).unwrap().unwrap();
        assert!(loaded.has_vector());
        assert_eq!(db.count_songs_with_vectors().unwrap(), 1);
    }

    #[test]
    fn test_songs_by_artist() {
        let db = Database::open_in_memory().unwrap();
        db.insert_song(&song_with_vector("Let It Be", "The Beatles", vec![1.0, 0.0]))
            .unwrap();
        db.insert_song(&song_with_vector("Imagine", "John Lennon", vec![0.0, 1.0]))
            .unwrap();
        db.insert_song(&Song::new("Hey Jude", "The Beatles").unwrap())
            .unwrap();

        let titles: Vec<String> = db
            .list_songs_by_artist(" The Beatles ")
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Let It Be", "Hey Jude"]);
        assert!(db.list_songs_by_artist("Nobody").unwrap().is_empty());

        assert_eq!(
            db.list_artists().unwrap(),
            vec![
                ("John Lennon".to_string(), 1),
                ("The Beatles".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_corpus_dimensions_excluding_own_row() {
        let db = Database::open_in_memory().unwrap();
        let only = song_with_vector("Solo", "x", vec![1.0, 0.0, 0.0]);
        db.insert_song(&only).unwrap();

        assert_eq!(db.corpus_dimensions().unwrap(), Some(3));
        assert_eq!(db.corpus_dimensions_excluding(&only.id).unwrap(), None);

        db.insert_song(&song_with_vector("Other", "x", vec![0.0, 1.0, 0.0]))
            .unwrap();
        assert_eq!(db.corpus_dimensions_excluding(&only.id).unwrap(), Some(3));
    }

    #[test]
    fn test_replace_lyrics_unknown_song() {
        let db = Database::open_in_memory().unwrap();
        let result = db.replace_lyrics(&SongId::new(), &Lyrics::new("", vec![1.0]));
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_replace_lyrics_with_taken_vector() {
        let db = Database::open_in_memory().unwrap();
        db.insert_song(&song_with_vector("A", "x", vec![1.0, 0.0])).unwrap();
        let other = Song::new("B", "x").unwrap();
        db.insert_song(&other).unwrap();

        let result = db.replace_lyrics(&other.id, &Lyrics::new("", vec![1.0, 0.0]));
        assert!(matches!(result, Err(Error::AlreadyExists { .. })));
    }

    #[test]
    fn test_playlist_round_trip_preserves_order() {
        let db = Database::open_in_memory().unwrap();
        let a = song_with_vector("A", "x", vec![1.0, 0.0]);
        let b = song_with_vector("B", "x", vec![0.0, 1.0]);
        db.insert_song(&a).unwrap();
        db.insert_song(&b).unwrap();

        let playlist = Playlist::new("sunshine", vec![b, a]).unwrap();
        db.save_playlist(&playlist).unwrap();

        let loaded = db.get_playlist_by_name("sunshine").unwrap().unwrap();
        assert_eq!(loaded.id, playlist.id);
        let titles: Vec<&str> = loaded.songs().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);

        let by_id = db.get_playlist_by_id(&playlist.id).unwrap().unwrap();
        assert_eq!(by_id.name, "sunshine");
    }

    #[test]
    fn test_duplicate_playlist_name_is_rejected_without_overwrite() {
        let db = Database::open_in_memory().unwrap();
        let a = song_with_vector("A", "x", vec![1.0, 0.0]);
        db.insert_song(&a).unwrap();

        db.save_playlist(&Playlist::new("love", vec![a]).unwrap())
            .unwrap();
        let err = db
            .save_playlist(&Playlist::new("love", Vec::new()).unwrap())
            .unwrap_err();
        assert!(err.is_already_exists());

        let stored = db.get_playlist_by_name("love").unwrap().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(db.count_playlists().unwrap(), 1);
    }

    #[test]
    fn test_save_playlist_with_unknown_song_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let ghost = Song::new("Ghost", "Nobody").unwrap();

        let err = db
            .save_playlist(&Playlist::new("haunted", vec![ghost]).unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(db.get_playlist_by_name("haunted").unwrap().is_none());
    }

    #[test]
    fn test_update_playlist_songs() {
        let db = Database::open_in_memory().unwrap();
        let a = song_with_vector("A", "x", vec![1.0, 0.0]);
        let b = song_with_vector("B", "x", vec![0.0, 1.0]);
        db.insert_song(&a).unwrap();
        db.insert_song(&b).unwrap();

        let mut playlist = Playlist::new("mix", vec![a]).unwrap();
        db.save_playlist(&playlist).unwrap();

        playlist.add_song(b);
        playlist.remove_song("A", "x");
        db.update_playlist_songs(&playlist).unwrap();

        let loaded = db.get_playlist_by_name("mix").unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.songs()[0].title, "B");
    }

    #[test]
    fn test_delete_song_cascades_to_playlists() {
        let db = Database::open_in_memory().unwrap();
        let a = song_with_vector("A", "x", vec![1.0, 0.0]);
        db.insert_song(&a).unwrap();
        db.save_playlist(&Playlist::new("mix", vec![a]).unwrap())
            .unwrap();

        assert!(db.delete_song("A", "x").unwrap());
        assert!(!db.delete_song("A", "x").unwrap());

        let loaded = db.get_playlist_by_name("mix").unwrap().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_delete_playlist() {
        let db = Database::open_in_memory().unwrap();
        db.save_playlist(&Playlist::new("gone", Vec::new()).unwrap())
            .unwrap();

        assert!(db.delete_playlist("gone").unwrap());
        assert!(!db.delete_playlist("gone").unwrap());
        assert!(db.list_playlists().unwrap().is_empty());
    }
}
