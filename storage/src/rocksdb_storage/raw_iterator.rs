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

//! Prefixed raw iterator implementation for RocksDB backend.

use rocksdb::{DBAccess, DBRawIteratorWithThreadMode};

use crate::{storage::make_prefixed_key, Error, RawIterator, SubtreePrefix};

/// Raw iterator over the records of one tree inside a keyspace.
pub struct PrefixedRocksDbRawIterator<'a, D: DBAccess> {
    prefix: SubtreePrefix,
    raw_iterator: DBRawIteratorWithThreadMode<'a, D>,
}

impl<'a, D: DBAccess> PrefixedRocksDbRawIterator<'a, D> {
    pub(super) fn new(prefix: SubtreePrefix, raw_iterator: DBRawIteratorWithThreadMode<'a, D>) -> Self {
        PrefixedRocksDbRawIterator {
            prefix,
            raw_iterator,
        }
    }
}

/// Smallest byte string greater than every key carrying `prefix`, `None` if
/// the prefix is all `0xff`.
fn prefix_upper_bound(prefix: &SubtreePrefix) -> Option<SubtreePrefix> {
    let mut bound = *prefix;
    for i in (0..bound.len()).rev() {
        bound[i] = bound[i].wrapping_add(1);
        if bound[i] != 0 {
            // no carry into the next byte
            return Some(bound);
        }
    }
    None
}

impl<D: DBAccess> RawIterator for PrefixedRocksDbRawIterator<'_, D> {
    fn seek_to_first(&mut self) {
        self.raw_iterator.seek(self.prefix);
    }

    fn seek_to_last(&mut self) {
        match prefix_upper_bound(&self.prefix) {
            Some(bound) => {
                self.raw_iterator.seek_for_prev(bound);
                if self.raw_iterator.key() == Some(bound.as_slice()) {
                    self.raw_iterator.prev();
                }
            }
            None => self.raw_iterator.seek_to_last(),
        }
    }

    fn seek<K: AsRef<[u8]>>(&mut self, key: K) {
        self.raw_iterator.seek(make_prefixed_key(&self.prefix, key));
    }

    fn seek_for_prev<K: AsRef<[u8]>>(&mut self, key: K) {
        self.raw_iterator
            .seek_for_prev(make_prefixed_key(&self.prefix, key));
    }

    fn next(&mut self) {
        self.raw_iterator.next();
    }

    fn prev(&mut self) {
        self.raw_iterator.prev();
    }

    fn value(&self) -> Option<&[u8]> {
        if self.valid() {
            self.raw_iterator.value()
        } else {
            None
        }
    }

    fn key(&self) -> Option<&[u8]> {
        self.raw_iterator
            .key()
            .and_then(|k| k.strip_prefix(self.prefix.as_slice()))
    }

    fn valid(&self) -> bool {
        self.raw_iterator
            .key()
            .map(|k| k.starts_with(&self.prefix))
            .unwrap_or(false)
    }

    fn status(&self) -> Result<(), Error> {
        Ok(self.raw_iterator.status()?)
    }
}
