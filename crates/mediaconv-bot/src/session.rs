//! Per-user "current file" sessions, held in memory only.

use mediaconv_core::FileKind;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// The most recent upload of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub path: PathBuf,
    pub kind: FileKind,
    pub original_name: String,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<u64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: u64) -> Option<Session> {
        self.sessions.read().await.get(&user_id).cloned()
    }

    /// Make `session` the current file of `user_id`.
    ///
    /// The previous input file is deleted unless it is the same path.
    pub async fn replace(&self, user_id: u64, session: Session) -> Option<Session> {
        let previous = self
            .sessions
            .write()
            .await
            .insert(user_id, session.clone());

        if let Some(old) = &previous {
            if old.path != session.path {
                match tokio::fs::remove_file(&old.path).await {
                    Ok(()) => tracing::debug!(
                        user_id,
                        path = %old.path.display(),
                        "Removed previous input"
                    ),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => tracing::warn!(
                        user_id,
                        path = %old.path.display(),
                        error = %e,
                        "Failed to remove previous input"
                    ),
                }
            }
        }

        previous
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session(path: PathBuf, kind: FileKind) -> Session {
        Session {
            path,
            kind,
            original_name: "file".to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = SessionStore::new();
        assert!(store.get(1).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_replace_overwrites_and_removes_old_input() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("1_a.mp4");
        let second = dir.path().join("1_b.pdf");
        tokio::fs::write(&first, b"a").await.unwrap();
        tokio::fs::write(&second, b"b").await.unwrap();

        let store = SessionStore::new();
        let previous = store
            .replace(1, session(first.clone(), FileKind::Video))
            .await;
        assert!(previous.is_none());
        let previous = store
            .replace(1, session(second.clone(), FileKind::Document))
            .await;

        assert_eq!(previous.unwrap().path, first);
        assert!(!first.exists());
        assert!(second.exists());
        assert_eq!(store.get(1).await.unwrap().kind, FileKind::Document);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_replace_same_path_keeps_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("1_a.jpg");
        tokio::fs::write(&path, b"a").await.unwrap();

        let store = SessionStore::new();
        store
            .replace(1, session(path.clone(), FileKind::Image))
            .await;
        store
            .replace(1, session(path.clone(), FileKind::Image))
            .await;

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new();
        let video = session(dir.path().join("1_a.mp4"), FileKind::Video);
        let document = session(dir.path().join("2_a.pdf"), FileKind::Document);
        store.replace(1, video).await;
        store.replace(2, document).await;

        assert_eq!(store.get(1).await.unwrap().kind, FileKind::Video);
        assert_eq!(store.get(2).await.unwrap().kind, FileKind::Document);
    }
}
