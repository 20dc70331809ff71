/// Startup error taxonomy.
///
/// Decoding errors are fatal: a broken asset means a broken build, so they
/// propagate to `main` and end the process. `Io` only describes an
/// unreadable level override, which falls back to the built-in map.
/// Degraded-but-playable conditions (empty maps, short spawns) are logged
/// warnings and never reach this type.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("level '{level}': map has no <data> block")]
    MissingDataStart { level: String },

    #[error("level '{level}': map <data> block is never closed")]
    MissingDataEnd { level: String },

    #[error("tileset sheet: {0}")]
    Sheet(String),

    #[error("sprite '{name}': {reason}")]
    Sprite { name: String, reason: String },

    #[error("asset is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
