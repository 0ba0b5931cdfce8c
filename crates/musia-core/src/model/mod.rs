pub mod ids;
pub mod lyrics;
pub mod playlist;
pub mod song;

pub use ids::{PlaylistId, SongId};
pub use lyrics::{Embedding, Lyrics, VECTOR_DECIMALS};
pub use playlist::{Playlist, MIN_PLAYLIST_NAME_LEN};
pub use song::Song;
