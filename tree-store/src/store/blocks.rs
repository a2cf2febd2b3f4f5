//! Block records and tree metadata.

use mtree_storage::{TransactionRead, WriteTransaction};

use super::TreeStore;
use crate::{BlockPayload, Error, TreeMeta};

/// Key of the metadata record. Shorter than any block key, so the two never
/// collide inside the blocks keyspace.
const META_KEY: [u8; 1] = [0x00];

fn block_key(block_number: u64) -> [u8; 8] {
    block_number.to_be_bytes()
}

impl TreeStore {
    /// Store the tree version of `block_number`, replacing any earlier one
    pub fn write_block_data(
        &self,
        block_number: u64,
        block: &BlockPayload,
        tx: &WriteTransaction,
    ) -> Result<(), Error> {
        self.put_value(block_key(block_number), block, &self.blocks, tx)
    }

    /// Tree version of `block_number`
    pub fn read_block_data<T: TransactionRead>(
        &self,
        block_number: u64,
        tx: &T,
    ) -> Result<Option<BlockPayload>, Error> {
        self.get_value(block_key(block_number), &self.blocks, tx)
    }

    /// Remove the tree version of `block_number`. Blocks are removed most
    /// recent first; keeping that order is up to the caller.
    pub fn delete_block_data(&self, block_number: u64, tx: &WriteTransaction) -> Result<(), Error> {
        Ok(tx.delete(block_key(block_number), &self.blocks)?)
    }

    /// Replace the tree metadata
    pub fn write_meta_data(&self, meta: &TreeMeta, tx: &WriteTransaction) -> Result<(), Error> {
        self.put_value(META_KEY, meta, &self.blocks, tx)
    }

    /// Tree metadata, `None` for a tree that was never written
    pub fn read_meta_data<T: TransactionRead>(&self, tx: &T) -> Result<Option<TreeMeta>, Error> {
        self.get_value(META_KEY, &self.blocks, tx)
    }
}
