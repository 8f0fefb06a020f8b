pub mod ingest;
pub mod query;
pub mod status;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use ticketgraph::{SqliteEntityStore, StoreConfig};

pub(crate) fn open_store(db_path: &Path) -> Result<Arc<SqliteEntityStore>> {
    let store = SqliteEntityStore::open(StoreConfig::new(db_path.to_path_buf()))
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    Ok(Arc::new(store))
}
