use anyhow::{bail, Context, Result};
use std::path::Path;
use toml_edit::{value, DocumentMut, Item, Table};

use musia_etl::{config, Config};

use super::print_json;

/// Show the current effective configuration.
pub fn show_config(config: &Config, json: bool) -> Result<()> {
    let config_path = config::config_file_path();

    if json {
        let mut shown = config.clone();
        if shown.embedding_api_key.is_some() {
            shown.embedding_api_key = Some("********".to_string());
        }
        return print_json(&shown);
    }

    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config_path.display());
    let exists = config_path.exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    print!("{}", config.to_toml()?);

    println!("\nPriority: CLI args > ENV vars (MUSIA_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value, or print the whole config file.
pub fn get_config(config: &Config, key: Option<String>) -> Result<()> {
    if let Some(key) = key {
        match config.get(&key) {
            Some(current) => println!("{}", current),
            None => bail!(
                "Unknown config key: {}\n\nValid keys: {}",
                key,
                config::KEYS.join(", ")
            ),
        }
    } else {
        let config_path = config::config_file_path();

        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            print!("{}", contents);
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'musia config init' to create it.");
        }
    }

    Ok(())
}

/// Set a config value, keeping the rest of the file (comments included) intact.
pub fn set_config(key: &str, raw: &str) -> Result<()> {
    let config_path = config::config_file_path();
    config::ensure_config_file()?;

    update_file(&config_path, key, raw)?;

    println!("✓ Updated {} = {}", key, raw);
    println!("  in {}", config_path.display());

    Ok(())
}

fn update_file(path: &Path, key: &str, raw: &str) -> Result<()> {
    let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
    let updated = apply_setting(&contents, key, raw)?;
    std::fs::write(path, updated).context("Failed to write config file")?;
    Ok(())
}

/// Write `key = raw` into a TOML document, typed by key.
fn apply_setting(contents: &str, key: &str, raw: &str) -> Result<String> {
    let mut doc: DocumentMut = contents.parse().context("Config file is not valid TOML")?;

    let item = match key {
        "database_path" | "embedding_url" | "embedding_model" | "embedding_api_key"
        | "lyrics_url" | "logging.level" => value(raw),
        "embedding_timeout_secs" | "lyrics_timeout_secs" | "default_playlist_size" => {
            let number: i64 = raw
                .parse()
                .with_context(|| format!("{} must be a whole number", key))?;
            if number <= 0 {
                bail!("{} must be greater than zero", key);
            }
            value(number)
        }
        "logging.coloured" | "logging.report_caller" => {
            let flag: bool = raw
                .parse()
                .with_context(|| format!("{} must be true or false", key))?;
            value(flag)
        }
        _ => bail!(
            "Unknown config key: {}\n\nValid keys: {}",
            key,
            config::KEYS.join(", ")
        ),
    };

    match key.split_once('.') {
        Some((section, field)) => {
            let table = doc
                .entry(section)
                .or_insert_with(|| Item::Table(Table::new()))
                .as_table_mut()
                .with_context(|| format!("[{}] in the config file is not a table", section))?;
            table[field] = item;
        }
        None => doc[key] = item,
    }

    Ok(doc.to_string())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    let config_path = config::config_file_path();
    println!("{}", config_path.display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure musia.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
