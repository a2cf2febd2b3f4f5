//! Tree store: the records of one named tree over a shared environment.

mod blocks;
mod leaf_index;
mod leaves;
mod nodes;

use std::{fmt, sync::Arc};

use mtree_storage::{
    Environment, Keyspace, KeyspaceKind, RawIterator, ReadTransaction, TransactionRead,
    WriteTransaction,
};
use tracing::debug;

pub use self::nodes::ReleaseStats;
use crate::{codec::Payload, Error};

/// Number of records a tree holds in each keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeDbStats {
    /// Block records, the metadata record included
    pub blocks: u64,
    /// Stored nodes
    pub nodes: u64,
    /// Distinct leaf values
    pub leaf_indices: u64,
    /// Stored leaf preimages
    pub leaf_preimages: u64,
    /// Configured maximum size of the environment
    pub map_size_kb: u64,
}

/// Store of one tree. Several stores with different names can share an
/// environment, their records never mix.
pub struct TreeStore {
    name: String,
    env: Arc<Environment>,
    blocks: Keyspace,
    nodes: Keyspace,
    leaf_indices: Keyspace,
    leaf_preimages: Keyspace,
}

impl TreeStore {
    /// Open the store of the tree called `name`
    pub fn new(name: impl Into<String>, env: Arc<Environment>) -> Self {
        let name = name.into();
        debug!(tree = %name, "opened tree store");
        TreeStore {
            blocks: Keyspace::new(KeyspaceKind::Blocks, &name),
            nodes: Keyspace::new(KeyspaceKind::Nodes, &name),
            leaf_indices: Keyspace::new(KeyspaceKind::LeafValueIndex, &name),
            leaf_preimages: Keyspace::new(KeyspaceKind::LeafHashPreimage, &name),
            name,
            env,
        }
    }

    /// Tree name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Environment the store lives in
    pub fn environment(&self) -> &Arc<Environment> {
        &self.env
    }

    /// Start a read transaction over the committed state
    pub fn create_read_transaction(&self) -> Result<ReadTransaction<'_>, Error> {
        Ok(self.env.create_read_transaction()?)
    }

    /// Start the write transaction of the environment, waiting for the
    /// current writer if there is one
    pub fn create_write_transaction(&self) -> WriteTransaction<'_> {
        self.env.create_write_transaction()
    }

    /// Count the records of this tree in every keyspace
    pub fn get_stats<T: TransactionRead>(&self, tx: &T) -> Result<TreeDbStats, Error> {
        Ok(TreeDbStats {
            blocks: count_records(&self.blocks, tx)?,
            nodes: count_records(&self.nodes, tx)?,
            leaf_indices: count_records(&self.leaf_indices, tx)?,
            leaf_preimages: count_records(&self.leaf_preimages, tx)?,
            map_size_kb: self.env.config().map_size_kb,
        })
    }

    fn get_value<P: Payload, K: AsRef<[u8]>, T: TransactionRead>(
        &self,
        key: K,
        keyspace: &Keyspace,
        tx: &T,
    ) -> Result<Option<P>, Error> {
        tx.get(key, keyspace)?
            .map(|bytes| P::decode_payload(&bytes))
            .transpose()
    }

    fn put_value<P: Payload, K: AsRef<[u8]>>(
        &self,
        key: K,
        value: &P,
        keyspace: &Keyspace,
        tx: &WriteTransaction,
    ) -> Result<(), Error> {
        let bytes = value.encode_payload()?;
        Ok(tx.put(key, &bytes, keyspace)?)
    }
}

impl fmt::Debug for TreeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeStore")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn count_records<T: TransactionRead>(keyspace: &Keyspace, tx: &T) -> Result<u64, Error> {
    let mut iter = tx.raw_iter(keyspace)?;
    let mut count = 0;
    iter.seek_to_first();
    while iter.valid() {
        count += 1;
        iter.next();
    }
    iter.status()?;
    Ok(count)
}
