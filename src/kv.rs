//! The ordered key-value backend contract (spec.md §5) plus a simple
//! in-memory reference implementation for tests and small deployments,
//! grounded in the style of `toydb`'s `BTreeMap`-backed storage engine
//! (`examples/reifydb-reifydb/crates/base`'s toydb lineage).

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::ops::Bound;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Write {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// An ordered byte-string key-value store. Implementations are free to be
/// backed by anything (an embedded engine, a remote service) as long as
/// `scan` returns entries in ascending key order and `batch` is atomic.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> crate::Result<Option<Vec<u8>>>;

    /// Ascending entries in `[gte, lt)`.
    fn scan(&self, gte: &[u8], lt: &[u8]) -> crate::Result<Vec<(Vec<u8>, Vec<u8>)>>;

    fn batch(&self, writes: Vec<Write>) -> crate::Result<()>;
}

/// Substitutes a single space for an empty value. Some backends cannot
/// store zero-length values; the engine always round-trips through this
/// pair so object values may legitimately be empty. A value that is
/// literally a single space is therefore indistinguishable from empty -- an
/// accepted, documented limitation of the substitution rule.
pub fn encode_value(value: &str) -> Vec<u8> {
    if value.is_empty() { b" ".to_vec() } else { value.as_bytes().to_vec() }
}

pub fn decode_value(bytes: &[u8]) -> String {
    if bytes == b" " { String::new() } else { String::from_utf8_lossy(bytes).into_owned() }
}

/// A `BTreeMap`-backed in-memory store. Reference implementation, not
/// intended for production durability.
#[derive(Default)]
pub struct MemoryKv {
    data: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &[u8]) -> crate::Result<Option<Vec<u8>>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn scan(&self, gte: &[u8], lt: &[u8]) -> crate::Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let data = self.data.lock();
        Ok(data
            .range((Bound::Included(gte.to_vec()), Bound::Excluded(lt.to_vec())))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn batch(&self, writes: Vec<Write>) -> crate::Result<()> {
        let mut data = self.data.lock();
        for write in writes {
            match write {
                Write::Put(k, v) => {
                    data.insert(k, v);
                }
                Write::Delete(k) => {
                    data.remove(&k);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_value_round_trips() {
        assert_eq!(decode_value(&encode_value("")), "");
        assert_eq!(decode_value(&encode_value("hello")), "hello");
    }

    #[test]
    fn memory_kv_scan_is_ordered_and_bounded() {
        let kv = MemoryKv::new();
        kv.batch(vec![
            Write::Put(b"a".to_vec(), b"1".to_vec()),
            Write::Put(b"b".to_vec(), b"2".to_vec()),
            Write::Put(b"c".to_vec(), b"3".to_vec()),
        ])
        .unwrap();
        let rows = kv.scan(b"a", b"c").unwrap();
        assert_eq!(rows, vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())]);
    }

    #[test]
    fn memory_kv_delete_removes_key() {
        let kv = MemoryKv::new();
        kv.batch(vec![Write::Put(b"a".to_vec(), b"1".to_vec())]).unwrap();
        kv.batch(vec![Write::Delete(b"a".to_vec())]).unwrap();
        assert_eq!(kv.get(b"a").unwrap(), None);
    }
}
