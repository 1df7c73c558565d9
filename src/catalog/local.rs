use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use super::model::FontRecord;

#[derive(Debug, Error)]
pub enum LocalFontsError {
    #[error("cannot read local fonts file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("local fonts file {path} is not a JSON array of font records: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads the self-hosted record set: a JSON array shaped like upstream records.
pub fn load_local_fonts(path: &Path) -> Result<Vec<FontRecord>, LocalFontsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LocalFontsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<FontRecord> =
        serde_json::from_str(&raw).map_err(|source| LocalFontsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    info!(path = %path.display(), families = records.len(), "local fonts loaded");
    Ok(records)
}
