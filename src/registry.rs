//! Client registry
//!
//! The single source of truth for membership. Holds registered clients in
//! registration order behind one mutex. Every method locks for the duration
//! of the operation only and hands out owned clones, so callers never hold
//! the lock across a send.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::client::Client;
use crate::error::AppError;
use crate::types::ClientId;

/// Default maximum number of concurrently registered clients
pub const DEFAULT_MAX_CLIENTS: usize = 50;

/// Shared, capacity-bounded registry of active clients
///
/// Cheap to clone; all clones refer to the same membership.
/// Display names are not required to be unique.
#[derive(Debug, Clone)]
pub struct ClientRegistry {
    clients: Arc<Mutex<Vec<Client>>>,
    capacity: usize,
}

impl ClientRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            clients: Arc::new(Mutex::new(Vec::new())),
            capacity,
        }
    }

    /// Add a client at the end of the registry
    ///
    /// Fails with `AppError::ServerFull` once `capacity` clients are registered.
    pub async fn register(&self, client: Client) -> Result<(), AppError> {
        let mut clients = self.clients.lock().await;
        if clients.len() >= self.capacity {
            return Err(AppError::ServerFull);
        }
        debug!("Registering client {} as '{}'", client.id, client.name);
        clients.push(client);
        Ok(())
    }

    /// Remove a client by identity; returns it if it was registered
    pub async fn unregister(&self, id: ClientId) -> Option<Client> {
        let mut clients = self.clients.lock().await;
        let pos = clients.iter().position(|c| c.id == id)?;
        Some(clients.remove(pos))
    }

    /// First registered client whose name equals `name`
    pub async fn find_by_name(&self, name: &str) -> Option<Client> {
        let clients = self.clients.lock().await;
        clients.iter().find(|c| c.name == name).cloned()
    }

    pub async fn snapshot_all(&self) -> Vec<Client> {
        self.clients.lock().await.clone()
    }

    pub async fn snapshot_except(&self, id: ClientId) -> Vec<Client> {
        let clients = self.clients.lock().await;
        clients.iter().filter(|c| c.id != id).cloned().collect()
    }

    /// Registered names in registry order
    pub async fn names(&self) -> Vec<String> {
        let clients = self.clients.lock().await;
        clients.iter().map(|c| c.name.clone()).collect()
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CLIENTS)
    }
}
