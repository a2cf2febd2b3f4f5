//! Content addressed nodes and their reference counts.
//!
//! A node is stored once however many versions and subtrees contain it. Every
//! reference from a parent or a retained root holds one count; the record is
//! deleted when the last reference goes away.

use mtree_storage::{TransactionRead, WriteTransaction};
use tracing::trace;

use super::TreeStore;
use crate::{Error, Fr, NodePayload};

/// Outcome of releasing a subtree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReleaseStats {
    /// Nodes whose last reference was dropped and that were deleted
    pub removed_nodes: u64,
    /// Deleted hashes at leaf level. Their preimages are not touched, the
    /// caller decides whether to delete them.
    pub freed_leaves: Vec<Fr>,
}

impl TreeStore {
    /// Node with hash `hash`
    pub fn read_node<T: TransactionRead>(
        &self,
        hash: &Fr,
        tx: &T,
    ) -> Result<Option<NodePayload>, Error> {
        self.get_value(hash, &self.nodes, tx)
    }

    /// Store `node` under `hash` as is, reference count included
    pub fn write_node(
        &self,
        hash: &Fr,
        node: &NodePayload,
        tx: &WriteTransaction,
    ) -> Result<(), Error> {
        self.put_value(hash, node, &self.nodes, tx)
    }

    /// Add a reference to a stored node and return the updated record
    pub fn increment_node_reference_count(
        &self,
        hash: &Fr,
        tx: &WriteTransaction,
    ) -> Result<NodePayload, Error> {
        let node = self.read_node(hash, tx)?.ok_or(Error::NodeNotFound(*hash))?;
        self.increment(hash, node, tx)
    }

    /// Store `node` with a single reference if `hash` is new, otherwise add a
    /// reference to the stored node. The children of `node` are ignored in
    /// the second case: equal hashes mean equal children.
    pub fn set_or_increment_node_reference_count(
        &self,
        hash: &Fr,
        node: &NodePayload,
        tx: &WriteTransaction,
    ) -> Result<NodePayload, Error> {
        match self.read_node(hash, tx)? {
            Some(stored) => self.increment(hash, stored, tx),
            None => {
                let node = NodePayload {
                    ref_count: 1,
                    ..node.clone()
                };
                self.write_node(hash, &node, tx)?;
                trace!(%hash, "stored new node");
                Ok(node)
            }
        }
    }

    /// Drop a reference to a stored node, deleting it with the last one.
    ///
    /// Returns the record with its decremented count, so a count of zero
    /// tells the caller the node is gone and its children lost a reference.
    pub fn decrement_node_reference_count(
        &self,
        hash: &Fr,
        tx: &WriteTransaction,
    ) -> Result<NodePayload, Error> {
        let mut node = self.read_node(hash, tx)?.ok_or(Error::NodeNotFound(*hash))?;
        node.ref_count = node.ref_count.checked_sub(1).ok_or_else(|| {
            Error::CorruptedData(format!("node {} is stored with no references", hash))
        })?;

        if node.ref_count == 0 {
            tx.delete(hash, &self.nodes)?;
            trace!(%hash, "deleted node");
        } else {
            self.write_node(hash, &node, tx)?;
            trace!(%hash, ref_count = node.ref_count, "decremented node");
        }
        Ok(node)
    }

    /// Drop a reference to the node `hash` at `level`, and cascade into the
    /// children of every node that gets deleted.
    ///
    /// Level 0 is the root and `depth` the leaf level. Children that were
    /// never stored (empty subtrees) are skipped.
    pub fn release_subtree(
        &self,
        hash: &Fr,
        level: u32,
        depth: u32,
        tx: &WriteTransaction,
    ) -> Result<ReleaseStats, Error> {
        let mut stats = ReleaseStats::default();
        let mut pending = vec![(*hash, level)];

        while let Some((hash, level)) = pending.pop() {
            let node = self.decrement_node_reference_count(&hash, tx)?;
            if node.ref_count > 0 {
                continue;
            }
            stats.removed_nodes += 1;

            if level >= depth {
                stats.freed_leaves.push(hash);
                continue;
            }
            // right first, so the left subtree is released first
            for child in [node.right, node.left].into_iter().flatten() {
                if self.read_node(&child, tx)?.is_some() {
                    pending.push((child, level + 1));
                }
            }
        }

        trace!(
            %hash,
            removed_nodes = stats.removed_nodes,
            freed_leaves = stats.freed_leaves.len(),
            "released subtree"
        );
        Ok(stats)
    }

    fn increment(
        &self,
        hash: &Fr,
        mut node: NodePayload,
        tx: &WriteTransaction,
    ) -> Result<NodePayload, Error> {
        node.ref_count = node.ref_count.checked_add(1).ok_or_else(|| {
            Error::CorruptedData(format!("reference count of node {} overflows", hash))
        })?;
        self.write_node(hash, &node, tx)?;
        trace!(%hash, ref_count = node.ref_count, "incremented node");
        Ok(node)
    }
}
