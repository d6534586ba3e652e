//! Connected clients and the worker controlling each of them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub id: String,
    pub url: String,
    pub controller: Option<String>,
}

#[derive(Clone, Default)]
pub struct Clients {
    inner: Arc<RwLock<HashMap<String, ClientInfo>>>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened client. It starts uncontrolled.
    pub fn connect(&self, url: impl Into<String>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let info = ClientInfo {
            id: id.clone(),
            url: url.into(),
            controller: None,
        };
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), info);
        id
    }

    pub fn disconnect(&self, id: &str) -> bool {
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
            .is_some()
    }

    /// Make `worker_id` the controller of every connected client. Returns how many
    /// clients changed controller.
    pub fn claim(&self, worker_id: &str) -> usize {
        let mut clients = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let mut claimed = 0;
        for client in clients.values_mut() {
            if client.controller.as_deref() != Some(worker_id) {
                client.controller = Some(worker_id.to_string());
                claimed += 1;
            }
        }
        claimed
    }

    pub fn get(&self, id: &str) -> Option<ClientInfo> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    pub fn controller_of(&self, id: &str) -> Option<String> {
        self.get(id).and_then(|c| c.controller)
    }

    /// Ids of the clients controlled by `worker_id`.
    pub fn controlled(&self, worker_id: &str) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|c| c.controller.as_deref() == Some(worker_id))
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn uncontrolled(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|c| c.controller.is_none())
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_adopts_every_client_once() {
        let clients = Clients::new();
        let a = clients.connect("https://example.com/");
        let b = clients.connect("https://example.com/guides/x");
        assert_eq!(clients.uncontrolled().len(), 2);

        assert_eq!(clients.claim("worker-1"), 2);
        assert_eq!(clients.controller_of(&a).as_deref(), Some("worker-1"));
        assert_eq!(clients.controller_of(&b).as_deref(), Some("worker-1"));
        assert!(clients.uncontrolled().is_empty());
        assert_eq!(clients.claim("worker-1"), 0);
        assert_eq!(clients.claim("worker-2"), 2);
        assert_eq!(clients.controlled("worker-2").len(), 2);
        assert!(clients.controlled("worker-1").is_empty());
    }

    #[test]
    fn test_disconnect() {
        let clients = Clients::new();
        let id = clients.connect("https://example.com/");
        assert!(clients.disconnect(&id));
        assert!(!clients.disconnect(&id));
        assert!(clients.is_empty());
    }
}
