use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::database::TableStore;
use crate::error::StoreError;
use crate::models::Registration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(1);

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().map(|o| *o).unwrap_or_default();
        self.start + offset
    }
}

struct Snapshot {
    loaded_at: Instant,
    rows: Arc<Vec<Registration>>,
}

/// Read-through cache over the registrations table.
///
/// Every reader within the TTL sees the same snapshot. Writers call
/// [`RegistrationsCache::invalidate`] so the next read goes to the store.
pub struct RegistrationsCache {
    store: Arc<dyn TableStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    snapshot: AsyncMutex<Option<Snapshot>>,
}

impl RegistrationsCache {
    pub fn new(store: Arc<dyn TableStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            snapshot: AsyncMutex::new(None),
        }
    }

    pub fn with_system_clock(store: Arc<dyn TableStore>, ttl: Duration) -> Self {
        Self::new(store, Arc::new(SystemClock), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self) -> Result<Arc<Vec<Registration>>, StoreError> {
        let mut guard = self.snapshot.lock().await;
        let now = self.clock.now();

        if let Some(snapshot) = guard.as_ref() {
            if now.saturating_duration_since(snapshot.loaded_at) < self.ttl {
                return Ok(Arc::clone(&snapshot.rows));
            }
        }

        match self.store.read_registrations().await {
            Ok(rows) => {
                debug!(rows = rows.len(), "registrations cache reloaded");
                let rows = Arc::new(rows);
                *guard = Some(Snapshot {
                    loaded_at: now,
                    rows: Arc::clone(&rows),
                });
                Ok(rows)
            }
            Err(e) => {
                *guard = None;
                Err(e)
            }
        }
    }

    pub async fn invalidate(&self) {
        *self.snapshot.lock().await = None;
    }
}
