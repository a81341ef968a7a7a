//! Buffered, idempotent persistence of place records.

use camino::{Utf8Path, Utf8PathBuf};
use log::error;
use rusqlite::Connection;
use thiserror::Error;

use placemill_core::PlaceRecord;

/// Records buffered before a flush.
const BATCH_SIZE: usize = 1000;

/// Consumes the record stream exactly once.
///
/// A failed flush is reported, not retried; callers needing durability must
/// wrap the sink with their own retry discipline.
pub trait PlaceSink {
    /// Buffer one record, flushing when the batch threshold is reached.
    fn consume(&mut self, record: PlaceRecord);
    /// Flush whatever remains buffered.
    fn complete(&mut self);
}

/// Errors raised when opening the place database.
#[derive(Debug, Error)]
pub enum SinkOpenError {
    /// The parent directory could not be created.
    #[error("failed to create parent directory {path}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open place database at {path}")]
    Open {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the `places` table failed.
    #[error("failed to create places table")]
    CreateSchema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

#[derive(Debug, Error)]
enum BatchWriteError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// SQLite-backed sink keyed by the origin URI.
///
/// Each flush performs one bulk upsert inside a transaction: a record whose
/// `linked.osm` already exists is replaced wholesale, anything else is
/// inserted. Re-running the pipeline over the same or an overlapping extract
/// therefore leaves one document per place, with the latest write winning.
pub struct SqlitePlaceSink {
    connection: Connection,
    buffer: Vec<PlaceRecord>,
}

impl SqlitePlaceSink {
    /// Open (and if needed initialise) the place database.
    ///
    /// Parent directories are created automatically.
    ///
    /// # Errors
    /// Returns a [`SinkOpenError`] when the database cannot be opened or its
    /// schema cannot be created.
    pub fn open(path: &Utf8Path) -> Result<Self, SinkOpenError> {
        ensure_parent_dir(path)?;
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| SinkOpenError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS places (
                    uri TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    lon REAL NOT NULL,
                    lat REAL NOT NULL,
                    document TEXT NOT NULL
                )",
                [],
            )
            .map_err(|source| SinkOpenError::CreateSchema { source })?;
        Ok(Self {
            connection,
            buffer: Vec::with_capacity(BATCH_SIZE),
        })
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        if let Err(err) = self.write_batch() {
            error!("dropped a batch of {} place(s): {err}", self.buffer.len());
        }
        // The buffer is cleared even after a failed write; retrying is the
        // caller's responsibility.
        self.buffer.clear();
    }

    fn write_batch(&mut self) -> Result<(), BatchWriteError> {
        let transaction = self.connection.transaction()?;
        {
            let mut statement = transaction.prepare(
                "INSERT OR REPLACE INTO places (uri, name, lon, lat, document)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for record in &self.buffer {
                let document = serde_json::to_string(record)?;
                statement.execute((
                    record.linked.osm.as_str(),
                    record.name.as_str(),
                    record.centroid.x,
                    record.centroid.y,
                    document,
                ))?;
            }
        }
        transaction.commit()?;
        Ok(())
    }
}

impl PlaceSink for SqlitePlaceSink {
    fn consume(&mut self, record: PlaceRecord) {
        self.buffer.push(record);
        if self.buffer.len() >= BATCH_SIZE {
            self.flush();
        }
    }

    fn complete(&mut self) {
        self.flush();
    }
}

fn ensure_parent_dir(path: &Utf8Path) -> Result<(), SinkOpenError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }
    std::fs::create_dir_all(parent.as_std_path()).map_err(|source| {
        SinkOpenError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        }
    })
}

/// In-memory sink for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryPlaceSink {
    /// Records received so far, in consumption order.
    pub records: Vec<PlaceRecord>,
}

impl MemoryPlaceSink {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaceSink for MemoryPlaceSink {
    fn consume(&mut self, record: PlaceRecord) {
        self.records.push(record);
    }

    fn complete(&mut self) {}
}
