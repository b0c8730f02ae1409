//! # JSON Backup
//!
//! Exports the catalog and the transaction history to a single pretty-printed
//! JSON file, `backup_<unix seconds>.json`, in a backup directory. A file
//! is never overwritten: a second backup in the same second becomes
//! `backup_<unix seconds>_1.json`, and so on.
//!
//! ```text
//! {
//!   "created_at": "...",
//!   "products": [ Product, ... ],
//!   "transactions": [ TransactionRecord, ... ]
//! }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use smartdesk_core::{Product, TransactionRecord};

/// Suffixes tried for one timestamp before giving up.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Contents of one backup file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub created_at: DateTime<Utc>,
    pub products: Vec<Product>,
    pub transactions: Vec<TransactionRecord>,
}

/// Reads everything out of `db`.
pub async fn snapshot(db: &Database) -> DbResult<BackupSnapshot> {
    Ok(BackupSnapshot {
        created_at: Utc::now(),
        products: db.products().list_all().await?,
        transactions: db.transactions().list_all().await?,
    })
}

/// Writes a backup of `db` into `dir` (created if missing) and returns the
/// file's path.
pub async fn write_backup(db: &Database, dir: &Path) -> DbResult<PathBuf> {
    let snapshot = snapshot(db).await?;
    let bytes = serde_json::to_vec_pretty(&snapshot)
        .map_err(|e| DbError::BackupFailed(format!("encode: {e}")))?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DbError::BackupFailed(format!("{}: {e}", dir.display())))?;

    let (path, mut file) = create_backup_file(dir, snapshot.created_at.timestamp()).await?;
    let written = async {
        file.write_all(&bytes).await?;
        file.sync_all().await
    };
    written
        .await
        .map_err(|e| DbError::BackupFailed(format!("{}: {e}", path.display())))?;

    info!(
        path = %path.display(),
        products = snapshot.products.len(),
        transactions = snapshot.transactions.len(),
        "Backup written"
    );
    Ok(path)
}

/// Creates a file that did not exist before, adding `_<n>` to the name
/// while `backup_<timestamp>.json` is taken.
async fn create_backup_file(dir: &Path, timestamp: i64) -> DbResult<(PathBuf, File)> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = match attempt {
            0 => format!("backup_{timestamp}.json"),
            n => format!("backup_{timestamp}_{n}.json"),
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Backup name taken");
            }
            Err(e) => return Err(DbError::BackupFailed(format!("{}: {e}", path.display()))),
        }
    }

    Err(DbError::BackupFailed(format!(
        "no free backup name for {timestamp} in {}",
        dir.display()
    )))
}

/// Parses a backup file written by [`write_backup`].
pub async fn read_backup(path: &Path) -> DbResult<BackupSnapshot> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DbError::BackupFailed(format!("{}: {e}", path.display())))?;
    serde_json::from_slice(&bytes).map_err(|e| DbError::BackupFailed(format!("decode: {e}")))
}
