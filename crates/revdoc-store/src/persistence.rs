//! Persistence boundary - loading and saving the published text and draft.
//!
//! The store never decides *where* an asset lives; it only calls
//! [`Persistence::save`] with `draft = None` when there is no pending draft,
//! telling the collaborator to drop any stored draft.

use crate::error::PersistenceError;
use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Text and draft as read from storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistedAsset {
    pub text: String,
    pub draft: String,
}

/// Storage collaborator for one asset.
pub trait Persistence: Send + Sync {
    /// Read the published text and the draft. A missing draft reads as the text.
    fn load(&self) -> Result<PersistedAsset, PersistenceError>;

    /// Write the published text, and the draft if there is one.
    fn save(&self, text: &str, draft: Option<&str>) -> Result<(), PersistenceError>;
}

/// Unify line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Stores an asset as `document.<ext>` and `draft.<ext>` inside a directory.
#[derive(Clone, Debug)]
pub struct FsPersistence {
    dir: PathBuf,
    extension: String,
}

impl FsPersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: "txt".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn document_path(&self) -> PathBuf {
        self.dir.join(format!("document.{}", self.extension))
    }

    pub fn draft_path(&self) -> PathBuf {
        self.dir.join(format!("draft.{}", self.extension))
    }
}

impl Persistence for FsPersistence {
    fn load(&self) -> Result<PersistedAsset, PersistenceError> {
        let document_path = self.document_path();
        let text = match fs::read_to_string(&document_path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound(document_path))
            }
            Err(e) => return Err(e.into()),
        };

        let draft = match fs::read_to_string(self.draft_path()) {
            Ok(draft) => draft,
            Err(e) if e.kind() == ErrorKind::NotFound => text.clone(),
            Err(e) => return Err(e.into()),
        };

        Ok(PersistedAsset { text, draft })
    }

    fn save(&self, text: &str, draft: Option<&str>) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.document_path(), text)?;

        match draft {
            Some(draft) => fs::write(self.draft_path(), draft)?,
            None => match fs::remove_file(self.draft_path()) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }

        tracing::debug!(dir = %self.dir.display(), has_draft = draft.is_some(), "Saved asset");
        Ok(())
    }
}

/// In-memory persistence, mostly for tests and simulations.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    state: Mutex<(String, Option<String>)>,
}

impl MemoryPersistence {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            state: Mutex::new((text.into(), None)),
        }
    }

    pub fn with_draft(text: impl Into<String>, draft: impl Into<String>) -> Self {
        Self {
            state: Mutex::new((text.into(), Some(draft.into()))),
        }
    }

    /// The stored published text.
    pub fn stored_text(&self) -> String {
        self.state.lock().0.clone()
    }

    /// The stored draft, if one is kept.
    pub fn stored_draft(&self) -> Option<String> {
        self.state.lock().1.clone()
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self) -> Result<PersistedAsset, PersistenceError> {
        let state = self.state.lock();
        Ok(PersistedAsset {
            text: state.0.clone(),
            draft: state.1.clone().unwrap_or_else(|| state.0.clone()),
        })
    }

    fn save(&self, text: &str, draft: Option<&str>) -> Result<(), PersistenceError> {
        *self.state.lock() = (text.to_string(), draft.map(str::to_string));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\r\n"), "a\nb\n");
        assert_eq!(normalize_line_endings("a\nb"), "a\nb");
    }

    #[test]
    fn test_fs_missing_draft_reads_as_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("document.txt"), "hello").unwrap();

        let persistence = FsPersistence::new(dir.path());
        let asset = persistence.load().unwrap();
        assert_eq!(asset.text, "hello");
        assert_eq!(asset.draft, "hello");
    }

    #[test]
    fn test_fs_missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FsPersistence::new(dir.path().join("missing"));
        assert!(matches!(
            persistence.load(),
            Err(PersistenceError::NotFound(_))
        ));
    }

    #[test]
    fn test_fs_save_writes_and_removes_draft() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FsPersistence::new(dir.path()).with_extension("tex");

        persistence.save("text", Some("draft")).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("document.tex")).unwrap(), "text");
        assert_eq!(fs::read_to_string(dir.path().join("draft.tex")).unwrap(), "draft");

        persistence.save("draft", None).unwrap();
        assert!(!dir.path().join("draft.tex").exists());

        // Removing an already missing draft is fine.
        persistence.save("draft", None).unwrap();
    }

    #[test]
    fn test_memory_persistence() {
        let persistence = MemoryPersistence::with_draft("a", "ab");
        assert_eq!(
            persistence.load().unwrap(),
            PersistedAsset {
                text: "a".to_string(),
                draft: "ab".to_string()
            }
        );

        persistence.save("ab", None).unwrap();
        assert_eq!(persistence.stored_text(), "ab");
        assert_eq!(persistence.stored_draft(), None);
        assert_eq!(persistence.load().unwrap().draft, "ab");
    }
}
