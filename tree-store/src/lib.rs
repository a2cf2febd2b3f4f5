//! Persistent store for indexed Merkle trees.
//!
//! A [`TreeStore`] keeps four kinds of records for one named tree inside a
//! shared [`Environment`]:
//!
//! - block records, one per committed version, plus the tree metadata;
//! - internal nodes keyed by their hash, shared between versions and counted
//!   by reference;
//! - for every leaf value, the positions it was inserted at, which also
//!   answers low leaf queries;
//! - leaf preimages keyed by leaf hash.
//!
//! The store never opens or commits transactions on its own. Callers open a
//! [`ReadTransaction`] or the exclusive [`WriteTransaction`], run any number
//! of store operations against it and commit or drop it.

#![warn(missing_docs)]

pub mod codec;
mod error;
mod fr;
pub mod leaf;
mod store;


pub use codec::{BlockPayload, Indices, NodePayload, Payload, TreeMeta};
pub use error::Error;
pub use fr::Fr;
pub use leaf::{IndexedLeaf, LeafValue, NullifierLeafValue, PublicDataLeafValue};
pub use mtree_storage::{
    Environment, EnvironmentConfig, ReadTransaction, TransactionRead, WriteTransaction,
};
pub use store::{ReleaseStats, TreeDbStats, TreeStore};
