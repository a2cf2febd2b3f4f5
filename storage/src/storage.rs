// MIT LICENSE
//
// Copyright (c) 2021 Dash Core Group
//
// Permission is hereby granted, free of charge, to any
// person obtaining a copy of this software and associated
// documentation files (the "Software"), to deal in the
// Software without restriction, including without
// limitation the rights to use, copy, modify, merge,
// publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software
// is furnished to do so, subject to the following
// conditions:
//
// The above copyright notice and this permission notice
// shall be included in all copies or substantial portions
// of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF
// ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED
// TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A
// PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT
// SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY
// CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR
// IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! Storage abstraction shared by tree stores: keyspaces, ordered iteration and
//! read access common to snapshot and write transactions.

use std::fmt;

use strum::{EnumIter, IntoStaticStr};

use crate::Error;

/// Prefix identifying one tree inside the shared keyspaces of an environment.
pub type SubtreePrefix = [u8; 32];

/// Logical keyspaces a tree store is made of. Each one maps to its own
/// column family in the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum KeyspaceKind {
    /// Block number to block payload, plus the tree metadata singleton
    Blocks,
    /// Node hash to node payload
    Nodes,
    /// Leaf value to the indices it was inserted at
    LeafValueIndex,
    /// Leaf hash to leaf preimage
    LeafHashPreimage,
}

impl KeyspaceKind {
    /// Column family name backing this keyspace
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Handle to one keyspace of one tree.
///
/// Every key written through the handle is prefixed with the tree prefix, so
/// trees sharing an environment never see each other's records.
pub struct Keyspace {
    kind: KeyspaceKind,
    prefix: SubtreePrefix,
}

impl Keyspace {
    /// Open the `kind` keyspace of the tree called `tree_name`
    pub fn new(kind: KeyspaceKind, tree_name: &str) -> Self {
        Keyspace {
            kind,
            prefix: build_prefix(tree_name.as_bytes()),
        }
    }

    /// Keyspace kind
    pub fn kind(&self) -> KeyspaceKind {
        self.kind
    }

    /// Tree prefix applied to every key
    pub fn prefix(&self) -> &SubtreePrefix {
        &self.prefix
    }

    /// Build the key actually stored in the column family
    pub fn prefixed_key<K: AsRef<[u8]>>(&self, key: K) -> Vec<u8> {
        make_prefixed_key(&self.prefix, key)
    }
}

impl fmt::Debug for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyspace")
            .field("kind", &self.kind)
            .field("prefix", &hex::encode(self.prefix))
            .finish()
    }
}

/// A helper to build the prefix identifying a tree by its name
pub fn build_prefix(name: &[u8]) -> SubtreePrefix {
    let mut res = Vec::with_capacity(name.len() + 8);
    res.extend_from_slice(name);
    res.extend((name.len() as u64).to_be_bytes());
    *blake3::hash(&res).as_bytes()
}

pub(crate) fn make_prefixed_key<K: AsRef<[u8]>>(prefix: &SubtreePrefix, key: K) -> Vec<u8> {
    let key = key.as_ref();
    let mut prefixed_key = Vec::with_capacity(prefix.len() + key.len());
    prefixed_key.extend_from_slice(prefix);
    prefixed_key.extend_from_slice(key);
    prefixed_key
}

/// Read access shared by snapshot (read) and write transactions.
pub trait TransactionRead {
    /// Ordered iterator over a single keyspace of a single tree
    type RawIterator<'a>: RawIterator
    where
        Self: 'a;

    /// Get entry by `key` from `keyspace`
    fn get<K: AsRef<[u8]>>(&self, key: K, keyspace: &Keyspace)
        -> Result<Option<Vec<u8>>, Error>;

    /// Get raw iterator over `keyspace`
    fn raw_iter<'a>(&'a self, keyspace: &Keyspace) -> Result<Self::RawIterator<'a>, Error>;
}

/// Allows to iterate over the records of one keyspace in key order. Keys are
/// returned without the tree prefix.
pub trait RawIterator {
    /// Move iterator to first valid record.
    fn seek_to_first(&mut self);

    /// Move iterator to last valid record.
    fn seek_to_last(&mut self);

    /// Move iterator forward until `key` is hit.
    fn seek<K: AsRef<[u8]>>(&mut self, key: K);

    /// Move iterator backward until `key` is hit: lands on the greatest
    /// record less than or equal to `key`.
    fn seek_for_prev<K: AsRef<[u8]>>(&mut self, key: K);

    /// Move iterator to next record.
    fn next(&mut self);

    /// Move iterator to previous record.
    fn prev(&mut self);

    /// Return value of key-value pair where raw iterator points at.
    fn value(&self) -> Option<&[u8]>;

    /// Return key of key-value pair where raw iterator points at.
    fn key(&self) -> Option<&[u8]>;

    /// Check if raw iterator points into a valid record
    fn valid(&self) -> bool;

    /// Error the underlying engine hit while iterating, if any. An invalid
    /// iterator with an `Ok` status has simply run out of records.
    fn status(&self) -> Result<(), Error>;
}
