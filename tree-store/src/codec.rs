//! Records stored by a tree store and their binary encoding.
//!
//! Values are bincode with big-endian integers, fields in declaration order.
//! A decode has to consume the whole buffer: trailing bytes mean the record
//! was written with another layout and are reported as corruption.

use bincode::{config, Decode, Encode};

use crate::{Error, Fr};

/// Largest record a decode accepts. Length prefixes of corrupted records are
/// checked against it before anything is allocated.
pub const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

fn record_config() -> impl config::Config {
    config::standard()
        .with_big_endian()
        .with_limit::<{ MAX_RECORD_SIZE }>()
}

/// A record that can be stored as a value.
///
/// Types deriving bincode's `Encode` and `Decode` get both methods for free
/// with an empty impl.
pub trait Payload: Encode + Decode<()> + Sized {
    /// Serialize to bytes
    fn encode_payload(&self) -> Result<Vec<u8>, Error> {
        bincode::encode_to_vec(self, record_config())
            .map_err(|e| Error::EncodingError(format!("failed to encode record: {}", e)))
    }

    /// Deserialize from bytes
    fn decode_payload(bytes: &[u8]) -> Result<Self, Error> {
        let (value, read) = bincode::decode_from_slice(bytes, record_config())
            .map_err(|e| Error::CorruptedData(format!("failed to decode record: {}", e)))?;
        if read != bytes.len() {
            return Err(Error::CorruptedData(format!(
                "{} trailing bytes after record",
                bytes.len() - read
            )));
        }
        Ok(value)
    }
}

/// A committed version of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct BlockPayload {
    /// Number of leaves after the block
    pub size: u64,
    /// Block the version belongs to
    pub block_number: u64,
    /// Root after the block
    pub root: Fr,
}

impl Payload for BlockPayload {}

/// Ascending leaf positions a value has been inserted at.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode)]
pub struct Indices {
    /// Positions, ascending
    pub indices: Vec<u64>,
}

impl Indices {
    /// Wrap a list of positions
    pub fn new(indices: Vec<u64>) -> Self {
        Indices { indices }
    }

    /// The positions that exist in a tree of `size` leaves, `None` when the
    /// value had not been inserted yet at that size.
    pub fn visible_below(&self, size: u64) -> Option<Indices> {
        let visible: Vec<u64> = self
            .indices
            .iter()
            .copied()
            .take_while(|index| *index < size)
            .collect();
        (!visible.is_empty()).then_some(Indices { indices: visible })
    }
}

impl From<Vec<u64>> for Indices {
    fn from(indices: Vec<u64>) -> Self {
        Indices { indices }
    }
}

impl Payload for Indices {}

/// Internal node of the tree, keyed by its own hash.
///
/// Nodes are shared by every version and subtree that contains them; a stored
/// node always has `ref_count >= 1`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode)]
pub struct NodePayload {
    /// Hash of the left child, `None` for an empty subtree
    pub left: Option<Fr>,
    /// Hash of the right child, `None` for an empty subtree
    pub right: Option<Fr>,
    /// Number of parents and roots referencing the node
    pub ref_count: u64,
}

impl NodePayload {
    /// Node with the given children and a single reference
    pub fn new(left: Option<Fr>, right: Option<Fr>) -> Self {
        NodePayload {
            left,
            right,
            ref_count: 1,
        }
    }
}

impl Payload for NodePayload {}

/// Tree-wide metadata, one record per tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode)]
pub struct TreeMeta {
    /// Tree name
    pub name: String,
    /// Number of levels below the root
    pub depth: u32,
    /// Current number of leaves, including uncommitted ones
    pub size: u64,
    /// Number of leaves in the last committed state
    pub committed_size: u64,
    /// Root of the last committed state
    pub root: Fr,
    /// Number of leaves the tree was created with
    pub initial_size: u64,
    /// Root the tree was created with
    pub initial_root: Fr,
    /// Oldest block whose state is still held
    pub oldest_historic_block: u64,
    /// Latest block applied to the tree
    pub unfinalised_block_height: u64,
    /// Latest block that can no longer be unwound
    pub finalised_block_height: u64,
}

impl Payload for TreeMeta {}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn block_payload_round_trip() {
        let block = BlockPayload {
            size: 1024,
            block_number: 17,
            root: Fr::from(0xdead_beefu64),
        };
        let bytes = block.encode_payload().expect("encode block");
        assert_eq!(
            BlockPayload::decode_payload(&bytes).expect("decode block"),
            block
        );
    }

    #[test]
    fn node_payload_round_trip_with_absent_children() {
        for node in [
            NodePayload::new(Some(Fr::from(1u64)), Some(Fr::from(2u64))),
            NodePayload::new(Some(Fr::from(1u64)), None),
            NodePayload {
                left: None,
                right: None,
                ref_count: 9,
            },
        ] {
            let bytes = node.encode_payload().expect("encode node");
            assert_eq!(
                NodePayload::decode_payload(&bytes).expect("decode node"),
                node
            );
        }
    }

    #[test]
    fn indices_round_trip() {
        for indices in [Indices::default(), Indices::new(vec![0, 5, u64::MAX])] {
            let bytes = indices.encode_payload().expect("encode indices");
            assert_eq!(
                Indices::decode_payload(&bytes).expect("decode indices"),
                indices
            );
        }
    }

    #[test]
    fn tree_meta_round_trip() {
        let meta = TreeMeta {
            name: "nullifier_tree".to_owned(),
            depth: 40,
            size: 128,
            committed_size: 64,
            root: Fr::from(3u64),
            initial_size: 2,
            initial_root: Fr::from(4u64),
            oldest_historic_block: 1,
            unfinalised_block_height: 8,
            finalised_block_height: 6,
        };
        let bytes = meta.encode_payload().expect("encode meta");
        assert_eq!(TreeMeta::decode_payload(&bytes).expect("decode meta"), meta);
    }

    #[test]
    fn truncated_and_trailing_bytes_are_corruption() {
        let bytes = BlockPayload::default()
            .encode_payload()
            .expect("encode block");

        assert_matches!(
            BlockPayload::decode_payload(&bytes[..bytes.len() - 1]),
            Err(Error::CorruptedData(_))
        );

        let mut longer = bytes.clone();
        longer.push(0);
        assert_matches!(
            BlockPayload::decode_payload(&longer),
            Err(Error::CorruptedData(_))
        );
    }

    #[test]
    fn oversized_length_prefix_is_corruption() {
        // varint marker for a big-endian u64 length of 2^61
        let bytes = [0xfd, 0x20, 0, 0, 0, 0, 0, 0, 0];
        assert_matches!(Indices::decode_payload(&bytes), Err(Error::CorruptedData(_)));

        let mut meta = vec![0xfd];
        meta.extend_from_slice(&(MAX_RECORD_SIZE as u64 + 1).to_be_bytes());
        assert_matches!(TreeMeta::decode_payload(&meta), Err(Error::CorruptedData(_)));
    }

    #[test]
    fn non_canonical_field_element_is_corruption() {
        let mut bytes = BlockPayload::default()
            .encode_payload()
            .expect("encode block");
        let len = bytes.len();
        bytes[len - 32..].copy_from_slice(&[0xff; 32]);
        assert_matches!(
            BlockPayload::decode_payload(&bytes),
            Err(Error::CorruptedData(_))
        );
    }

    #[test]
    fn visible_indices_are_truncated() {
        let indices = Indices::new(vec![2, 4, 9]);
        assert_eq!(indices.visible_below(2), None);
        assert_eq!(indices.visible_below(5), Some(Indices::new(vec![2, 4])));
        assert_eq!(indices.visible_below(100), Some(indices.clone()));
        assert_eq!(Indices::default().visible_below(100), None);
    }

    mod random {
        use proptest::{option, prelude::*};

        use super::*;
        use crate::fr::arb_fr;

        fn round_trip<P: Payload + PartialEq + std::fmt::Debug>(value: &P) {
            let bytes = value.encode_payload().expect("encode record");
            assert_eq!(&P::decode_payload(&bytes).expect("decode record"), value);
        }

        prop_compose! {
            fn arb_meta()
                (name in ".{0,24}", depth in any::<u32>(), sizes in any::<[u64; 4]>(),
                 roots in (arb_fr(), arb_fr()), blocks in any::<[u64; 3]>())
                -> TreeMeta {
                    TreeMeta {
                        name,
                        depth,
                        size: sizes[0],
                        committed_size: sizes[1],
                        root: roots.0,
                        initial_size: sizes[2],
                        initial_root: roots.1,
                        oldest_historic_block: blocks[0],
                        unfinalised_block_height: blocks[1],
                        finalised_block_height: blocks[2],
                    }
            }
        }

        proptest! {
            #[test]
            fn block_payload(size in any::<u64>(), block_number in any::<u64>(), root in arb_fr()) {
                round_trip(&BlockPayload { size, block_number, root });
            }

            #[test]
            fn node_payload(
                left in option::of(arb_fr()),
                right in option::of(arb_fr()),
                ref_count in any::<u64>()
            ) {
                round_trip(&NodePayload { left, right, ref_count });
            }

            #[test]
            fn indices(indices in prop::collection::btree_set(any::<u64>(), 0..64)) {
                round_trip(&Indices::new(indices.into_iter().collect()));
            }

            #[test]
            fn tree_meta(meta in arb_meta()) {
                round_trip(&meta);
            }

            #[test]
            fn indexed_leaf(
                slot in arb_fr(),
                value in arb_fr(),
                next_index in any::<u64>(),
                next_value in arb_fr()
            ) {
                round_trip(&crate::IndexedLeaf::new(
                    crate::PublicDataLeafValue::new(slot, value),
                    next_index,
                    next_value,
                ));
                round_trip(&crate::IndexedLeaf::new(
                    crate::NullifierLeafValue::new(value),
                    next_index,
                    next_value,
                ));
            }

            #[test]
            fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
                // any outcome but a panic
                let _ = Indices::decode_payload(&bytes);
                let _ = TreeMeta::decode_payload(&bytes);
                let _ = NodePayload::decode_payload(&bytes);
            }
        }
    }
}
