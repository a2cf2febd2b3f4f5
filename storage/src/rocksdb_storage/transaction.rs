//! Read and write transactions over the environment.
use std::{cell::RefCell, collections::HashMap, sync::MutexGuard};

use rocksdb::SnapshotWithThreadMode;
use tracing::{debug, warn};

use super::{
    environment::{Db, Tx},
    Environment, PrefixedRocksDbRawIterator,
};
use crate::{Error, Keyspace, KeyspaceKind, TransactionRead};

/// Read transaction: a view of the committed state frozen when it was created.
///
/// Writes committed after creation are never observed, however long the
/// transaction lives. Releases its reader slot on drop.
pub struct ReadTransaction<'env> {
    snapshot: SnapshotWithThreadMode<'env, Db>,
    env: &'env Environment,
}

impl<'env> ReadTransaction<'env> {
    pub(super) fn new(env: &'env Environment) -> Self {
        ReadTransaction {
            snapshot: env.db().snapshot(),
            env,
        }
    }
}

impl Drop for ReadTransaction<'_> {
    fn drop(&mut self) {
        self.env.release_reader();
    }
}

impl TransactionRead for ReadTransaction<'_> {
    type RawIterator<'a>
        = PrefixedRocksDbRawIterator<'a, Db>
    where
        Self: 'a;

    fn get<K: AsRef<[u8]>>(
        &self,
        key: K,
        keyspace: &Keyspace,
    ) -> Result<Option<Vec<u8>>, Error> {
        let cf = self.env.cf(keyspace.kind())?;
        Ok(self.snapshot.get_cf(cf, keyspace.prefixed_key(key))?)
    }

    fn raw_iter<'a>(&'a self, keyspace: &Keyspace) -> Result<Self::RawIterator<'a>, Error> {
        let cf = self.env.cf(keyspace.kind())?;
        Ok(PrefixedRocksDbRawIterator::new(
            *keyspace.prefix(),
            self.snapshot.raw_iterator_cf(cf),
        ))
    }
}

/// The exclusive write transaction of an environment.
///
/// Reads through it observe its own uncommitted writes. Nothing becomes
/// visible to other transactions before [`WriteTransaction::commit`]; dropping
/// it without committing rolls everything back and frees the writer slot.
pub struct WriteTransaction<'env> {
    // Declared before the guard: the transaction is released before the
    // writer slot is handed over.
    transaction: Tx<'env>,
    env: &'env Environment,
    // size of the last value put under each key of the write set
    pending: RefCell<HashMap<(KeyspaceKind, Vec<u8>), u64>>,
    _guard: MutexGuard<'env, ()>,
}

impl<'env> WriteTransaction<'env> {
    pub(super) fn new(env: &'env Environment, guard: MutexGuard<'env, ()>) -> Self {
        WriteTransaction {
            transaction: env.db().transaction(),
            env,
            pending: RefCell::new(HashMap::new()),
            _guard: guard,
        }
    }

    /// Put `value` into `keyspace` under `key`
    pub fn put<K: AsRef<[u8]>>(
        &self,
        key: K,
        value: &[u8],
        keyspace: &Keyspace,
    ) -> Result<(), Error> {
        let cf = self.env.cf(keyspace.kind())?;
        let prefixed_key = keyspace.prefixed_key(key);
        self.transaction.put_cf(cf, &prefixed_key, value)?;
        let size = (prefixed_key.len() + value.len()) as u64;
        self.pending
            .borrow_mut()
            .insert((keyspace.kind(), prefixed_key), size);
        Ok(())
    }

    /// Delete entry with `key` from `keyspace`
    pub fn delete<K: AsRef<[u8]>>(&self, key: K, keyspace: &Keyspace) -> Result<(), Error> {
        let cf = self.env.cf(keyspace.kind())?;
        let prefixed_key = keyspace.prefixed_key(key);
        self.transaction.delete_cf(cf, &prefixed_key)?;
        self.pending
            .borrow_mut()
            .remove(&(keyspace.kind(), prefixed_key));
        Ok(())
    }

    /// Bytes the write set adds when committed: every key put counts once
    /// with its last value, keys deleted again count nothing.
    pub fn pending_bytes(&self) -> u64 {
        self.pending.borrow().values().sum()
    }

    /// Consumes and commits the transaction.
    ///
    /// Fails with [`Error::StorageFull`] and rolls back when the environment
    /// would grow past its configured size, counting the committed data plus
    /// [`WriteTransaction::pending_bytes`]. Deletes of committed records are
    /// not credited until RocksDB compacts them away.
    pub fn commit(self) -> Result<(), Error> {
        let pending_bytes = self.pending_bytes();
        let WriteTransaction {
            transaction,
            env,
            _guard,
            ..
        } = self;

        let used = env.used_bytes()? + pending_bytes;
        let map_size_kb = env.config().map_size_kb;
        if used > map_size_kb.saturating_mul(1024) {
            let used_kb = used.div_ceil(1024);
            warn!(used_kb, map_size_kb, "commit refused, environment is full");
            transaction.rollback()?;
            return Err(Error::StorageFull {
                used_kb,
                map_size_kb,
            });
        }

        transaction.commit()?;
        debug!(written_bytes = pending_bytes, "write transaction committed");
        Ok(())
    }

    /// Consumes and rolls back the transaction
    pub fn abort(self) -> Result<(), Error> {
        self.transaction.rollback()?;
        debug!("write transaction aborted");
        Ok(())
    }
}

impl<'env> TransactionRead for WriteTransaction<'env> {
    type RawIterator<'a>
        = PrefixedRocksDbRawIterator<'a, Tx<'env>>
    where
        Self: 'a;

    fn get<K: AsRef<[u8]>>(
        &self,
        key: K,
        keyspace: &Keyspace,
    ) -> Result<Option<Vec<u8>>, Error> {
        let cf = self.env.cf(keyspace.kind())?;
        Ok(self.transaction.get_cf(cf, keyspace.prefixed_key(key))?)
    }

    fn raw_iter<'a>(&'a self, keyspace: &Keyspace) -> Result<Self::RawIterator<'a>, Error> {
        let cf = self.env.cf(keyspace.kind())?;
        Ok(PrefixedRocksDbRawIterator::new(
            *keyspace.prefix(),
            self.transaction.raw_iterator_cf(cf),
        ))
    }
}
