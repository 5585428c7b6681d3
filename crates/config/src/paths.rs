//! Path utilities

use std::path::PathBuf;

/// Data directory (`~/.cmop`), falling back to `./.cmop` without a home
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".cmop"))
        .unwrap_or_else(|| PathBuf::from(".cmop"))
}

/// Default config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}
