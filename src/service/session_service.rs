use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::models::chat::Session;

// Process-wide session registry. Each session sits behind its own mutex so
// concurrent requests for the same id serialize instead of racing; the outer
// map lock is held only long enough to resolve the id.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        let sessions = self.inner.lock().await;
        sessions.get(id).cloned()
    }

    pub async fn get_or_create(&self, id: &str) -> Arc<Mutex<Session>> {
        let mut sessions = self.inner.lock().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(session = id, "creating session");
                Arc::new(Mutex::new(Session::new(id)))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_or_create_returns_the_same_session() {
        let store = SessionStore::new();
        let first = store.get_or_create("s1").await;
        first.lock().await.push(crate::models::chat::ChatEntry::user("hi"));

        let second = store.get_or_create("s1").await;
        assert_eq!(second.lock().await.log.len(), 1);
    }

    #[tokio::test]
    async fn get_does_not_create() {
        let store = SessionStore::new();
        assert!(store.get("missing").await.is_none());
        store.get_or_create("present").await;
        assert!(store.get("present").await.is_some());
    }
}
