//! services/api/src/web/state.rs
//!
//! Defines the application's shared and session-specific states.

use crate::config::Config;
use crate::web::screens::{HomeLimits, Screen};
use learning_overlay_core::ports::{EntitySource, OverlayDirectory, OverlayStore};
use learning_overlay_core::sequence::RequestSequencer;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub entities: Arc<dyn EntitySource>,
    pub overlays: Arc<dyn OverlayDirectory>,
    pub config: Arc<Config>,
}

impl AppState {
    /// The overlay store of one device.
    pub fn store_for(&self, device_id: Uuid) -> Arc<dyn OverlayStore> {
        self.overlays.open(device_id)
    }

    pub fn home_limits(&self) -> HomeLimits {
        HomeLimits {
            courses: self.config.home_course_limit,
            articles: self.config.home_article_limit,
        }
    }
}

//=========================================================================================
// LiveSession (Specific to One WebSocket Connection)
//=========================================================================================

/// The state for a single live connection.
pub struct LiveSession {
    pub device_id: Uuid,
    /// One sequencer per screen: a refresh only supersedes refreshes of the same screen.
    screens: HashMap<Screen, Arc<RequestSequencer>>,
    pub search_sequencer: Arc<RequestSequencer>,
    /// Cancels the pending debounced search when a newer query arrives.
    pub search_token: CancellationToken,
    /// Cancelled when the connection closes; every task of the session observes it.
    pub connection: CancellationToken,
}

impl LiveSession {
    pub fn new(device_id: Uuid) -> Self {
        let connection = CancellationToken::new();
        Self {
            device_id,
            screens: HashMap::new(),
            search_sequencer: Arc::new(RequestSequencer::new()),
            search_token: connection.child_token(),
            connection,
        }
    }

    pub fn sequencer_for(&mut self, screen: Screen) -> Arc<RequestSequencer> {
        self.screens
            .entry(screen)
            .or_insert_with(|| Arc::new(RequestSequencer::new()))
            .clone()
    }

    /// Cancels the pending search and returns the token for the next one.
    pub fn restart_search(&mut self) -> CancellationToken {
        self.search_token.cancel();
        self.search_token = self.connection.child_token();
        self.search_token.clone()
    }
}
