//! Leaf preimages keyed by leaf hash.

use mtree_storage::{TransactionRead, WriteTransaction};

use super::TreeStore;
use crate::{codec::Payload, Error, Fr};

impl TreeStore {
    /// Preimage of the leaf hashing to `hash`
    pub fn read_leaf_by_hash<L: Payload, T: TransactionRead>(
        &self,
        hash: &Fr,
        tx: &T,
    ) -> Result<Option<L>, Error> {
        self.get_value(hash, &self.leaf_preimages, tx)
    }

    /// Store the preimage of the leaf hashing to `hash`
    pub fn write_leaf_by_hash<L: Payload>(
        &self,
        hash: &Fr,
        leaf: &L,
        tx: &WriteTransaction,
    ) -> Result<(), Error> {
        self.put_value(hash, leaf, &self.leaf_preimages, tx)
    }

    /// Remove the preimage of the leaf hashing to `hash`
    pub fn delete_leaf_by_hash(&self, hash: &Fr, tx: &WriteTransaction) -> Result<(), Error> {
        Ok(tx.delete(hash, &self.leaf_preimages)?)
    }
}
