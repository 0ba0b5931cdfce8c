pub mod config;
pub mod playlist;
pub mod song;
pub mod status;

use anyhow::Result;
use musia_core::schema::Database;
use std::path::Path;

pub(crate) fn open_db(path: &Path) -> Result<Database> {
    Ok(Database::open(path)?)
}

pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
