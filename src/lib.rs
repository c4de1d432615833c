/// Public library interface for the Learning Progress MCP server
///
/// This module exports the main server implementation and public types
/// that can be used by other applications or tests.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tokio::sync::broadcast;

// Internal modules
mod domain;
pub mod analytics;
pub mod engine;
pub mod storage;
pub mod tools;
mod mcp;

// Re-export public modules and types
pub use analytics::{AnalyticsTracker, ConsentManager, ConsentPreferences};
pub use domain::*;
pub use engine::{DayProgress, ProgressEngine, QuestBoard};
pub use storage::{KeyValueStore, ProgressStore, SqliteStore, StorageError};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Startup settings resolved from the command line
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Authenticated user id; `None` starts as guest
    pub user_id: Option<String>,
    /// Roadmap to serve
    pub curriculum: Curriculum,
    /// IANA timezone used for consent region detection
    pub timezone: Option<String>,
}

/// Main learning progress server that implements the MCP protocol
///
/// This server keeps progress in a SQLite key-value store, scoped to the
/// active identity, and re-derives streak and quests whenever a progress
/// event is published.
pub struct LearningProgressServer {
    store: SqliteStore,
    session: Session,
    engine: ProgressEngine,
    bus: EventBus,
    events: broadcast::Receiver<ProgressEvent>,
    timezone: Option<String>,
}

impl LearningProgressServer {
    /// Create a new server with the specified database path
    ///
    /// This will initialize the SQLite database with the required schema
    /// if it doesn't already exist.
    pub async fn new(db_path: PathBuf, config: ServerConfig) -> Result<Self, ServerError> {
        tracing::info!("Initializing Learning Progress server with database: {:?}", db_path);
        let store = SqliteStore::new(db_path)?;
        Self::with_store(store, config)
    }

    /// Create a server over an existing store (in-memory stores are useful for testing)
    pub fn with_store(store: SqliteStore, config: ServerConfig) -> Result<Self, ServerError> {
        config.curriculum.validate()?;
        let (session, _) = tools::switch_session(tools::SessionSwitchParams {
            user_id: config.user_id,
        })?;

        let bus = EventBus::new();
        let events = bus.subscribe();

        Ok(Self {
            store,
            session,
            engine: ProgressEngine::new(config.curriculum),
            bus,
            events,
            timezone: config.timezone,
        })
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// This method will block until stdin is closed or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting MCP server...");

        // Test database connectivity
        let lessons = self.progress().completed_lessons();
        tracing::info!(
            "Server started successfully for {}, {} lessons completed",
            self.session,
            lessons.len()
        );

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    /// Current local calendar date
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    /// Progress operations for the active identity
    pub fn progress(&self) -> ProgressStore<'_, SqliteStore> {
        ProgressStore::new(&self.store, self.session.clone())
    }

    /// Consent-gated analytics over the device-wide keys
    pub fn analytics(&self) -> AnalyticsTracker<'_, SqliteStore> {
        AnalyticsTracker::new(&self.store, self.timezone.clone())
    }

    /// Get a reference to the raw store (useful for testing)
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn engine(&self) -> &ProgressEngine {
        &self.engine
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Switch identity; any events still queued for the old identity are dropped
    pub fn set_session(&mut self, session: Session) {
        self.events = self.events.resubscribe();
        self.session = session;
    }

    /// Deliver queued progress events to the engine; returns how many were handled
    pub fn process_events(&mut self, today: NaiveDate) -> usize {
        let mut pending = Vec::new();
        let mut lagged = false;
        loop {
            match self.events.try_recv() {
                Ok(event) => pending.push(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} progress events", skipped);
                    lagged = true;
                }
                Err(_) => break,
            }
        }

        let progress = self.progress();
        for event in &pending {
            self.engine.on_event(&progress, event, today);
        }
        // Everything is re-derived from storage, so one pass covers dropped events
        if lagged && pending.is_empty() {
            self.engine.refresh_day(&progress, today);
            self.engine.refresh_quests(&progress, today);
        }

        pending.len()
    }
}
