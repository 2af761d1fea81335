pub mod registrations_repo;
pub mod roster_repo;
pub mod schema;
pub mod table_store;

pub use table_store::{MemoryTableStore, SqliteTableStore, TableStore};
