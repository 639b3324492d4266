//! SSH public key loading
//!
//! Keys are read once at startup. A key file holds `<type> <base64> [comment]`;
//! the comment usually names the host, so only the first two fields are served.
//! Several key files are joined with a single newline in the order given.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading key material
#[derive(Debug, Error)]
pub enum PubkeyError {
    #[error("no SSH public key sources configured")]
    NoSources,

    #[error("failed to read SSH public key {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed SSH public key {path}: expected `<type> <key> [comment]`")]
    Malformed { path: PathBuf },
}

/// Reduce a key line to `<type> <key>`, dropping any trailing comment
///
/// Returns `None` when fewer than two fields are present.
pub fn normalize_pubkey(raw: &[u8]) -> Option<Vec<u8>> {
    let mut fields = raw
        .split(|b| b.is_ascii_whitespace())
        .filter(|field| !field.is_empty());

    let key_type = fields.next()?;
    let key_data = fields.next()?;

    let mut normalized = Vec::with_capacity(key_type.len() + 1 + key_data.len());
    normalized.extend_from_slice(key_type);
    normalized.push(b' ');
    normalized.extend_from_slice(key_data);
    Some(normalized)
}

/// Load and normalize a single key file
pub fn load_pubkey(path: &Path) -> Result<Vec<u8>, PubkeyError> {
    let raw = std::fs::read(path).map_err(|source| PubkeyError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    normalize_pubkey(&raw).ok_or_else(|| PubkeyError::Malformed {
        path: path.to_path_buf(),
    })
}

/// Load every configured key and join them with `\n`, in source order
///
/// No trailing newline is appended.
pub fn load_pubkeys<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<u8>, PubkeyError> {
    if paths.is_empty() {
        return Err(PubkeyError::NoSources);
    }

    let keys = paths
        .iter()
        .map(|path| load_pubkey(path.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(keys.join(&b'\n'))
}

#[cfg(test)]
#[path = "pubkey_test.rs"]
mod tests;
