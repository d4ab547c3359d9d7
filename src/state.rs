use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::BookingEvent;
use crate::services::catalog::CatalogSource;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub catalog: Box<dyn CatalogSource>,
    pub events_tx: broadcast::Sender<BookingEvent>,
}

impl AppState {
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("database lock poisoned")))
    }

    /// Fan recorded events out to live subscribers; no receivers is fine.
    pub fn publish(&self, events: Vec<BookingEvent>) {
        for event in events {
            let _ = self.events_tx.send(event);
        }
    }
}
