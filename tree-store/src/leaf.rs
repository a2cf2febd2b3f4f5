//! Leaf preimages of indexed trees.
//!
//! An indexed leaf links to the leaf holding the next greater value, which is
//! what lets a tree prove non-membership with a single low leaf.

use bincode::{Decode, Encode};

use crate::{codec::Payload, Fr};

/// A value that can be stored in an indexed tree.
pub trait LeafValue: Payload + Clone {
    /// The value the leaf is ordered and indexed by
    fn key(&self) -> Fr;

    /// Whether this is the empty leaf value
    fn is_empty(&self) -> bool {
        self.key().is_zero()
    }
}

/// Leaf value of a nullifier tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct NullifierLeafValue {
    /// The nullifier
    pub value: Fr,
}

impl NullifierLeafValue {
    /// Leaf for `value`
    pub fn new(value: Fr) -> Self {
        NullifierLeafValue { value }
    }
}

impl Payload for NullifierLeafValue {}

impl LeafValue for NullifierLeafValue {
    fn key(&self) -> Fr {
        self.value
    }
}

/// Leaf value of a public data tree: a value written to a storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct PublicDataLeafValue {
    /// Stored value
    pub value: Fr,
    /// Slot, the leaf is indexed by it
    pub slot: Fr,
}

impl PublicDataLeafValue {
    /// Leaf writing `value` to `slot`
    pub fn new(slot: Fr, value: Fr) -> Self {
        PublicDataLeafValue { value, slot }
    }
}

impl Payload for PublicDataLeafValue {}

impl LeafValue for PublicDataLeafValue {
    fn key(&self) -> Fr {
        self.slot
    }

    fn is_empty(&self) -> bool {
        self.slot.is_zero() && self.value.is_zero()
    }
}

/// Preimage of an indexed tree leaf.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode)]
pub struct IndexedLeaf<V> {
    /// The leaf value
    pub value: V,
    /// Position of the leaf holding the next greater key
    pub next_index: u64,
    /// Next greater key, zero for the greatest leaf
    pub next_value: Fr,
}

impl<V: LeafValue> IndexedLeaf<V> {
    /// Leaf linked to the leaf at `next_index` holding `next_value`
    pub fn new(value: V, next_index: u64, next_value: Fr) -> Self {
        IndexedLeaf {
            value,
            next_index,
            next_value,
        }
    }

    /// Whether `key` falls into the gap this leaf covers, meaning this is
    /// the low leaf of `key`
    pub fn covers(&self, key: &Fr) -> bool {
        self.value.key() < *key && (self.next_value.is_zero() || *key < self.next_value)
    }
}

impl<V: LeafValue> Payload for IndexedLeaf<V> {}
