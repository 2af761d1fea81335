use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::{registrations_repo, roster_repo};
use crate::error::StoreError;
use crate::models::{Registration, RosterEntry};

/// Tabular backend holding the roster and the registrations.
///
/// `append_registration` is not tied to any earlier read. A caller that reads,
/// checks capacity and then appends is doing check-then-act: two callers can
/// both pass the check and both append.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn read_roster(&self) -> Result<Vec<RosterEntry>, StoreError>;

    async fn read_registrations(&self) -> Result<Vec<Registration>, StoreError>;

    async fn append_registration(&self, registration: &Registration) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct SqliteTableStore {
    pool: SqlitePool,
}

impl SqliteTableStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TableStore for SqliteTableStore {
    async fn read_roster(&self) -> Result<Vec<RosterEntry>, StoreError> {
        roster_repo::list_roster(&self.pool)
            .await
            .map_err(|e| StoreError::Read(e.to_string()))
    }

    async fn read_registrations(&self) -> Result<Vec<Registration>, StoreError> {
        registrations_repo::list_registrations(&self.pool)
            .await
            .map_err(|e| StoreError::Read(e.to_string()))
    }

    async fn append_registration(&self, registration: &Registration) -> Result<(), StoreError> {
        registrations_repo::insert_registration(&self.pool, registration)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Write(e.to_string()))
    }
}

/// In-process tables. Appends copy the whole table, push the row and swap the
/// table back in, the same read-modify-write a worksheet overwrite does.
#[derive(Default)]
pub struct MemoryTableStore {
    roster: Mutex<Vec<RosterEntry>>,
    registrations: Mutex<Vec<Registration>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    registration_reads: AtomicUsize,
}

impl MemoryTableStore {
    pub fn new(roster: Vec<RosterEntry>, registrations: Vec<Registration>) -> Self {
        Self {
            roster: Mutex::new(roster),
            registrations: Mutex::new(registrations),
            ..Self::default()
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// How many times the registrations table was read from this store.
    pub fn registration_reads(&self) -> usize {
        self.registration_reads.load(Ordering::SeqCst)
    }

    pub fn registrations_snapshot(&self) -> Vec<Registration> {
        self.registrations
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

fn poisoned(table: &str) -> String {
    format!("{} table lock poisoned", table)
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn read_roster(&self) -> Result<Vec<RosterEntry>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Read("roster unavailable".to_string()));
        }
        self.roster
            .lock()
            .map(|rows| rows.clone())
            .map_err(|_| StoreError::Read(poisoned("roster")))
    }

    async fn read_registrations(&self) -> Result<Vec<Registration>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Read("registrations unavailable".to_string()));
        }
        self.registration_reads.fetch_add(1, Ordering::SeqCst);
        self.registrations
            .lock()
            .map(|rows| rows.clone())
            .map_err(|_| StoreError::Read(poisoned("registrations")))
    }

    async fn append_registration(&self, registration: &Registration) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write("registrations are read-only".to_string()));
        }
        let mut rows = self
            .registrations
            .lock()
            .map_err(|_| StoreError::Write(poisoned("registrations")))?;
        let mut updated = rows.clone();
        updated.push(registration.clone());
        *rows = updated;
        Ok(())
    }
}
