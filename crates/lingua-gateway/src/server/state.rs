//! Gateway state
//!
//! Application state shared by every HTTP handler and chat session.

use crate::broadcast::RoomBroadcaster;
use crate::connection::ConnectionRegistry;
use lingua_common::{AppConfig, CredentialAuthority};
use lingua_core::{MessageHistoryStore, ProfileDirectory};
use std::sync::Arc;

/// Gateway application state
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct GatewayState {
    config: Arc<AppConfig>,
    authority: Arc<CredentialAuthority>,
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<RoomBroadcaster>,
    history: Arc<dyn MessageHistoryStore>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl GatewayState {
    /// Create a new gateway state around the given collaborators
    pub fn new(
        config: AppConfig,
        history: Arc<dyn MessageHistoryStore>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        let authority =
            CredentialAuthority::new(&config.credential.secret, config.credential.ttl());
        let registry = ConnectionRegistry::new_shared();
        let broadcaster = Arc::new(RoomBroadcaster::new(registry.clone()));

        Self {
            config: Arc::new(config),
            authority: Arc::new(authority),
            registry,
            broadcaster,
            history,
            profiles,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn authority(&self) -> &CredentialAuthority {
        &self.authority
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn broadcaster(&self) -> &RoomBroadcaster {
        &self.broadcaster
    }

    /// Room message log
    pub fn history(&self) -> &dyn MessageHistoryStore {
        self.history.as_ref()
    }

    /// User directory
    pub fn profiles(&self) -> &dyn ProfileDirectory {
        self.profiles.as_ref()
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("authority", &self.authority)
            .field("config", &"AppConfig")
            .finish()
    }
}
