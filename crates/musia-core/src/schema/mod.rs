//! SQLite persistence for the catalog.

mod db;
mod migrations;

pub use db::Database;
pub use migrations::{Migration, MIGRATIONS};
