//! Session credential storage
//!
//! At most one bearer token per client instance. The file-backed store is
//! what lets authentication survive a process restart; the in-memory store
//! backs tests and ephemeral sessions. There is no client-side expiry logic:
//! an invalid token is only ever detected through a failed authenticated
//! call.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Storage for the session bearer token.
///
/// Every `set`/`clear` must be visible to the next `get` with no caching lag.
pub trait TokenStore: Send + Sync {
    /// Current credential, if any. Absence means unauthenticated.
    fn get(&self) -> Option<String>;

    /// Store a credential, replacing any existing one.
    fn set(&self, token: &str);

    /// Drop the credential.
    fn clear(&self);
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn get(&self) -> Option<String> {
        (**self).get()
    }

    fn set(&self, token: &str) {
        (**self).set(token);
    }

    fn clear(&self) {
        (**self).clear();
    }
}

/// Volatile store for tests and ephemeral sessions.
#[allow(dead_code)] // Used by tests
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

#[allow(dead_code)] // Used by tests
impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn set(&self, token: &str) {
        *self.token.lock().unwrap() = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.lock().unwrap() = None;
    }
}

/// Durable store backed by a single file on disk.
///
/// Reads go through an in-process cache kept in lockstep with the file, so a
/// write that fails to reach disk still satisfies the immediate-visibility
/// contract for this process; the failure is logged and only durability is
/// lost.
pub struct FileTokenStore {
    path: PathBuf,
    cached: Mutex<Option<String>>,
}

impl FileTokenStore {
    /// Open the store, loading any previously persisted credential.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let cached = match fs::read_to_string(&path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(err),
        };

        Ok(Self {
            path,
            cached: Mutex::new(cached),
        })
    }

    fn persist(&self, token: Option<&str>) {
        let result = match token {
            Some(token) => {
                if let Some(parent) = self.path.parent() {
                    if let Err(err) = fs::create_dir_all(parent) {
                        tracing::warn!(path = %parent.display(), error = %err, "Failed to create token directory");
                    }
                }
                fs::write(&self.path, token)
            }
            None => match fs::remove_file(&self.path) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
                _ => Ok(()),
            },
        };

        if let Err(err) = result {
            tracing::warn!(path = %self.path.display(), error = %err, "Failed to persist credential");
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        self.cached.lock().unwrap().clone()
    }

    fn set(&self, token: &str) {
        *self.cached.lock().unwrap() = Some(token.to_string());
        self.persist(Some(token));
    }

    fn clear(&self) {
        *self.cached.lock().unwrap() = None;
        self.persist(None);
    }
}
