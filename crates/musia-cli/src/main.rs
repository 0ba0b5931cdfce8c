use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use musia_etl::Config;

mod commands;
mod logging;

#[derive(Debug, Parser)]
#[command(name = "musia", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/musia/musia.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Manage the song catalog
    #[command(subcommand)]
    Song(SongCommands),

    /// Build and manage playlists
    ///
    /// `playlist create <keyword>` embeds the keyword, compares it with the
    /// lyrics of every catalogued song using cosine similarity, and keeps
    /// the closest matches in order. The keyword becomes the playlist name.
    #[command(subcommand)]
    Playlist(PlaylistCommands),

    /// Show catalog statistics
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Debug, clap::Subcommand)]
enum SongCommands {
    /// Add a song, fetching and embedding its lyrics
    ///
    /// Lyrics are looked up on LRCLIB unless --lyrics-file is given. Songs
    /// without lyrics are stored but not ranked until `song refresh` finds
    /// them.
    Add {
        title: String,
        artist: String,
        /// Release year
        #[arg(long)]
        year: Option<i32>,
        /// Read lyrics from this file instead of looking them up
        #[arg(long)]
        lyrics_file: Option<PathBuf>,
    },
    /// List catalogued songs
    List {
        /// Only songs by this artist
        #[arg(long)]
        artist: Option<String>,
    },
    /// List artists with their song counts
    Artists,
    /// Print the stored lyrics of a song
    Lyrics { title: String, artist: String },
    /// Remove a song (and its playlist entries)
    Remove { title: String, artist: String },
    /// Look up and embed a song's lyrics again
    Refresh { title: String, artist: String },
}

#[derive(Debug, clap::Subcommand)]
enum PlaylistCommands {
    /// Generate a playlist for a keyword
    Create {
        keyword: String,
        /// Number of songs (default from config: default_playlist_size)
        #[arg(long, short = 'n')]
        songs: Option<usize>,
        /// Show the ranking without saving it
        #[arg(long)]
        dry_run: bool,
    },
    /// List saved playlists
    List,
    /// Show a playlist's songs
    Show { name: String },
    /// Delete a playlist
    Delete { name: String },
    /// Append a catalogued song to a playlist
    AddSong {
        name: String,
        title: String,
        artist: String,
    },
    /// Remove a song from a playlist
    RemoveSong {
        name: String,
        title: String,
        artist: String,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
    /// Print one setting, or the whole config file
    Get { key: Option<String> },
    /// Change one setting in the config file
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.db {
        Some(path) => Config::load_with_db_path(path)?,
        None => Config::load()?,
    };
    logging::init(&config.logging)?;

    let json = cli.json;
    match cli.command {
        Commands::Config(command) => match command {
            ConfigCommands::Show => commands::config::show_config(&config, json)?,
            ConfigCommands::Path => commands::config::show_path()?,
            ConfigCommands::Example => commands::config::show_example()?,
            ConfigCommands::Init => commands::config::init_config()?,
            ConfigCommands::Get { key } => commands::config::get_config(&config, key)?,
            ConfigCommands::Set { key, value } => commands::config::set_config(&key, &value)?,
        },
        command => {
            // Ensure database directory exists
            if let Some(parent) = config.database_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            run_catalog_command(command, &config, json).await?;
        }
    }

    Ok(())
}

async fn run_catalog_command(command: Commands, config: &Config, json: bool) -> Result<()> {
    let db_path = &config.database_path;
    match command {
        Commands::Song(command) => match command {
            SongCommands::Add {
                title,
                artist,
                year,
                lyrics_file,
            } => commands::song::add_song(config, title, artist, year, lyrics_file, json).await?,
            SongCommands::List { artist } => {
                commands::song::list_songs(db_path, artist.as_deref(), json)?;
            }
            SongCommands::Artists => commands::song::list_artists(db_path, json)?,
            SongCommands::Lyrics { title, artist } => {
                commands::song::show_lyrics(db_path, &title, &artist, json)?;
            }
            SongCommands::Remove { title, artist } => {
                commands::song::remove_song(db_path, &title, &artist)?;
            }
            SongCommands::Refresh { title, artist } => {
                commands::song::refresh_song(config, &title, &artist, json).await?;
            }
        },
        Commands::Playlist(command) => match command {
            PlaylistCommands::Create {
                keyword,
                songs,
                dry_run,
            } => {
                let size = songs.unwrap_or(config.default_playlist_size);
                commands::playlist::create_playlist(config, &keyword, size, dry_run, json).await?;
            }
            PlaylistCommands::List => commands::playlist::list_playlists(db_path, json)?,
            PlaylistCommands::Show { name } => {
                commands::playlist::show_playlist(db_path, &name, json)?;
            }
            PlaylistCommands::Delete { name } => {
                commands::playlist::delete_playlist(db_path, &name)?;
            }
            PlaylistCommands::AddSong {
                name,
                title,
                artist,
            } => commands::playlist::add_song(db_path, &name, &title, &artist)?,
            PlaylistCommands::RemoveSong {
                name,
                title,
                artist,
            } => commands::playlist::remove_song(db_path, &name, &title, &artist)?,
        },
        Commands::Status => commands::status::show_status(config, json)?,
        Commands::Config(_) => {}
    }
    Ok(())
}
