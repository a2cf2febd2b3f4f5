//! Storage errors

/// Storage and underlying errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rocks DB error
    #[cfg(feature = "rocksdb_storage")]
    #[error("rocksDB error: {0}")]
    RocksDBError(#[from] rocksdb::Error),
    /// Commit would grow the environment past its configured size
    #[error("storage full: {used_kb} KiB used, map size is {map_size_kb} KiB")]
    StorageFull {
        /// Size of committed data plus the pending write set
        used_kb: u64,
        /// Configured maximum
        map_size_kb: u64,
    },
    /// All reader slots of the environment are taken
    #[error("maximum number of concurrent readers ({0}) reached")]
    ReadersFull(usize),
    /// Column family backing a keyspace is not open
    #[error("keyspace {0} is not open in this environment")]
    MissingKeyspace(&'static str),
}
