//! Access/refresh token persistence.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        TokenPair {
            access: Some(access.into()),
            refresh: Some(refresh.into()),
        }
    }
}

/// Where the session's tokens live between runs.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> TokenPair;
    fn save(&self, tokens: &TokenPair);

    fn clear(&self) {
        self.save(&TokenPair::default());
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<TokenPair>,
}

impl MemoryTokenStore {
    pub fn new(tokens: TokenPair) -> Self {
        MemoryTokenStore {
            tokens: RwLock::new(tokens),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> TokenPair {
        match self.tokens.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn save(&self, tokens: &TokenPair) {
        match self.tokens.write() {
            Ok(mut guard) => *guard = tokens.clone(),
            Err(poisoned) => *poisoned.into_inner() = tokens.clone(),
        }
    }
}

/// JSON file on disk, read once at open and rewritten on every save.
/// IO failures are logged; the in-memory copy stays authoritative.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: MemoryTokenStore,
}

impl FileTokenStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tokens = read_tokens(&path);
        FileTokenStore {
            path,
            cached: MemoryTokenStore::new(tokens),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_tokens(path: &Path) -> TokenPair {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "token file is not valid json, ignoring");
            TokenPair::default()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => TokenPair::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read token file");
            TokenPair::default()
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> TokenPair {
        self.cached.load()
    }

    fn save(&self, tokens: &TokenPair) {
        self.cached.save(tokens);
        let result = if tokens == &TokenPair::default() {
            match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            }
        } else {
            serde_json::to_string_pretty(tokens)
                .map_err(std::io::Error::other)
                .and_then(|raw| std::fs::write(&self.path, raw))
        };
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "cannot persist tokens");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_and_clears() {
        let store = MemoryTokenStore::default();
        assert_eq!(store.load(), TokenPair::default());
        store.save(&TokenPair::new("a", "r"));
        assert_eq!(store.load().access.as_deref(), Some("a"));
        store.clear();
        assert_eq!(store.load(), TokenPair::default());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");

        let store = FileTokenStore::open(&path);
        store.save(&TokenPair::new("access-1", "refresh-1"));
        drop(store);

        let reopened = FileTokenStore::open(&path);
        assert_eq!(reopened.load(), TokenPair::new("access-1", "refresh-1"));

        reopened.clear();
        assert!(!path.exists());
        assert_eq!(FileTokenStore::open(&path).load(), TokenPair::default());
    }

    #[test]
    fn corrupt_file_is_treated_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(FileTokenStore::open(&path).load(), TokenPair::default());
    }
}
