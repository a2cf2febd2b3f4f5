//! Leaf value to leaf position index and the low leaf search over it.

use mtree_storage::{RawIterator, TransactionRead, WriteTransaction};
use tracing::trace;

use super::TreeStore;
use crate::{codec::Payload, Error, Fr, Indices};

impl TreeStore {
    /// Store the complete list of positions `value` was inserted at
    pub fn write_leaf_indices(
        &self,
        value: &Fr,
        indices: &Indices,
        tx: &WriteTransaction,
    ) -> Result<(), Error> {
        self.put_value(value, indices, &self.leaf_indices, tx)
    }

    /// Positions `value` was inserted at
    pub fn read_leaf_indices<T: TransactionRead>(
        &self,
        value: &Fr,
        tx: &T,
    ) -> Result<Option<Indices>, Error> {
        self.get_value(value, &self.leaf_indices, tx)
    }

    /// Forget `value` entirely, as when the only insertion of a value is
    /// unwound
    pub fn delete_leaf_indices(&self, value: &Fr, tx: &WriteTransaction) -> Result<(), Error> {
        Ok(tx.delete(value, &self.leaf_indices)?)
    }

    /// Find the low leaf of `target`: the greatest stored value not above it.
    ///
    /// With a `size_limit` the search runs against the tree as it was when it
    /// held that many leaves. Values first inserted at or after that position
    /// are skipped and the returned positions are cut to those below the
    /// limit.
    ///
    /// Returns `None` when no visible value is `<= target`.
    pub fn find_low_leaf<T: TransactionRead>(
        &self,
        target: &Fr,
        size_limit: Option<u64>,
        tx: &T,
    ) -> Result<Option<(Fr, Indices)>, Error> {
        let mut iter = tx.raw_iter(&self.leaf_indices)?;
        iter.seek_for_prev(target);

        while iter.valid() {
            let (Some(key), Some(value)) = (iter.key(), iter.value()) else {
                break;
            };
            let leaf_value = Fr::try_from(key)?;
            let indices = Indices::decode_payload(value)?;

            let visible = match size_limit {
                None => Some(indices),
                Some(limit) => indices.visible_below(limit),
            };
            if let Some(indices) = visible {
                trace!(key = %target, low_leaf = %leaf_value, "found low leaf");
                return Ok(Some((leaf_value, indices)));
            }

            trace!(value = %leaf_value, ?size_limit, "skipping leaf value inserted later");
            iter.prev();
        }

        iter.status()?;
        trace!(key = %target, "no low leaf");
        Ok(None)
    }
}
