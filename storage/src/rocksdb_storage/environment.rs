//! Storage environment over RocksDB: one database holding a column family per
//! keyspace, shared by every tree store opened on it.
use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, PoisonError,
    },
};

use lazy_static::lazy_static;
use rocksdb::{properties, ColumnFamily, ColumnFamilyDescriptor, OptimisticTransactionDB};
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use super::transaction::{ReadTransaction, WriteTransaction};
use crate::{Error, KeyspaceKind};

pub(crate) type Db = OptimisticTransactionDB;
pub(crate) type Tx<'db> = rocksdb::Transaction<'db, Db>;

/// Default maximum size of an environment, 10 GiB
pub const DEFAULT_MAP_SIZE_KB: u64 = 10 * 1024 * 1024;
/// Default maximum number of concurrently open read transactions
pub const DEFAULT_MAX_READERS: usize = 126;

lazy_static! {
    static ref DEFAULT_OPTS: rocksdb::Options = {
        let mut opts = rocksdb::Options::default();
        opts.create_if_missing(true);
        opts.increase_parallelism(num_cpus::get() as i32);
        opts.create_missing_column_families(true);
        opts.set_atomic_flush(true);
        opts
    };
}

/// Parameters an environment is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Directory holding the database files
    pub directory: PathBuf,
    /// Maximum size of committed data in KiB; commits growing past it fail
    pub map_size_kb: u64,
    /// Maximum number of read transactions open at the same time
    pub max_readers: usize,
}

impl EnvironmentConfig {
    /// Config for `directory` with default limits
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        EnvironmentConfig {
            directory: directory.as_ref().to_path_buf(),
            map_size_kb: DEFAULT_MAP_SIZE_KB,
            max_readers: DEFAULT_MAX_READERS,
        }
    }

    /// Set the maximum storage size
    pub fn with_map_size_kb(mut self, map_size_kb: u64) -> Self {
        self.map_size_kb = map_size_kb;
        self
    }

    /// Set the maximum number of concurrent readers
    pub fn with_max_readers(mut self, max_readers: usize) -> Self {
        self.max_readers = max_readers;
        self
    }
}

/// Storage environment.
///
/// Exactly one [`WriteTransaction`] can be open at a time; asking for another
/// blocks until the current one is committed, aborted or dropped. Read
/// transactions are snapshots and never wait for the writer.
pub struct Environment {
    db: Db,
    config: EnvironmentConfig,
    write_lock: Mutex<()>,
    active_readers: AtomicUsize,
}

impl Environment {
    /// Open or create the environment described by `config`
    pub fn open(config: EnvironmentConfig) -> Result<Self, Error> {
        let db = Db::open_cf_descriptors(
            &DEFAULT_OPTS,
            &config.directory,
            KeyspaceKind::iter()
                .map(|kind| ColumnFamilyDescriptor::new(kind.name(), DEFAULT_OPTS.clone())),
        )?;
        debug!(
            directory = %config.directory.display(),
            map_size_kb = config.map_size_kb,
            max_readers = config.max_readers,
            "opened tree storage environment"
        );

        Ok(Environment {
            db,
            config,
            write_lock: Mutex::new(()),
            active_readers: AtomicUsize::new(0),
        })
    }

    /// Parameters the environment was opened with
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Start the exclusive write transaction, waiting for the current writer
    /// to finish if there is one
    pub fn create_write_transaction(&self) -> WriteTransaction<'_> {
        // The lock guards no data, a poisoned lock is as good as a healthy one.
        let guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        WriteTransaction::new(self, guard)
    }

    /// Start a read transaction over a snapshot of the committed state
    pub fn create_read_transaction(&self) -> Result<ReadTransaction<'_>, Error> {
        let max_readers = self.config.max_readers;
        if self
            .active_readers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                (active < max_readers).then_some(active + 1)
            })
            .is_err()
        {
            warn!(max_readers, "read transaction refused, all reader slots taken");
            return Err(Error::ReadersFull(max_readers));
        }
        Ok(ReadTransaction::new(self))
    }

    /// Number of read transactions currently open
    pub fn active_readers(&self) -> usize {
        self.active_readers.load(Ordering::Acquire)
    }

    /// Approximate size in bytes of the data held by the environment
    pub fn used_bytes(&self) -> Result<u64, Error> {
        let mut used = 0;
        for kind in KeyspaceKind::iter() {
            let cf = self.cf(kind)?;
            for property in [
                properties::TOTAL_SST_FILES_SIZE,
                properties::CUR_SIZE_ALL_MEM_TABLES,
            ] {
                used += self.db.property_int_value_cf(cf, property)?.unwrap_or(0);
            }
        }
        Ok(used)
    }

    /// Forces data to be written
    pub fn flush(&self) -> Result<(), Error> {
        for kind in KeyspaceKind::iter() {
            self.db.flush_cf(self.cf(kind)?)?;
        }
        Ok(())
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub(crate) fn cf(&self, kind: KeyspaceKind) -> Result<&ColumnFamily, Error> {
        self.db
            .cf_handle(kind.name())
            .ok_or(Error::MissingKeyspace(kind.name()))
    }

    pub(crate) fn release_reader(&self) {
        self.active_readers.fetch_sub(1, Ordering::AcqRel);
    }
}
