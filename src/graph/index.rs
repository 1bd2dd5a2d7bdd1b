//! Secondary attribute indices
//!
//! An [`AttrIndex`] owns the ID lookup table of one element kind (nodes or
//! edges) and, for every declared attribute key, a mapping from attribute
//! value to the set of elements holding that value. The graph keeps it in
//! step with every insert, remove and attribute write, so a bucket never lags
//! a mutation.

use super::attr::{AttrValue, Attrs};
use crate::error::{ElementKind, Error, Result};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

type Buckets<H> = HashMap<AttrValue, IndexSet<H>>;

#[derive(Debug, Clone)]
pub struct AttrIndex<H> {
    kind: ElementKind,
    ids: IndexMap<String, H>,
    names: HashMap<H, String>,
    indices: HashMap<String, Buckets<H>>,
}

impl<H> AttrIndex<H>
where
    H: Copy + Eq + Hash + Debug,
{
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            ids: IndexMap::new(),
            names: HashMap::new(),
            indices: HashMap::new(),
        }
    }

    /// Declare `key` as indexed and fill its buckets from the elements held so far.
    ///
    /// `value_of` returns the current value of `key` for an element.
    pub fn create_index<'a, F>(&mut self, key: &str, value_of: F) -> Result<()>
    where
        F: Fn(H) -> Option<&'a AttrValue>,
    {
        if self.indices.contains_key(key) {
            return Err(Error::DuplicateAttrIndex(key.to_string()));
        }

        let mut buckets: Buckets<H> = HashMap::new();
        for &handle in self.ids.values() {
            if let Some(value) = value_of(handle) {
                buckets.entry(value.clone()).or_default().insert(handle);
            }
        }

        tracing::trace!(
            "Created {} index {:?} with {} buckets",
            self.kind,
            key,
            buckets.len()
        );
        self.indices.insert(key.to_string(), buckets);
        Ok(())
    }

    pub fn has_index(&self, key: &str) -> bool {
        self.indices.contains_key(key)
    }

    /// Register a new element under `id`.
    pub fn insert(&mut self, id: &str, handle: H, attrs: &Attrs) -> Result<()> {
        if self.ids.contains_key(id) {
            return Err(Error::duplicate(self.kind, id));
        }

        self.ids.insert(id.to_string(), handle);
        self.names.insert(handle, id.to_string());

        for (key, buckets) in self.indices.iter_mut() {
            if let Some(value) = attrs.get(key) {
                buckets.entry(value.clone()).or_default().insert(handle);
            }
        }
        Ok(())
    }

    /// Forget an element; `attrs` must be its current attribute bag.
    pub fn remove(&mut self, handle: H, attrs: &Attrs) -> Result<()> {
        let Some(id) = self.names.remove(&handle) else {
            return Err(Error::missing(self.kind, format!("{:?}", handle)));
        };
        self.ids.shift_remove(&id);

        for (key, buckets) in self.indices.iter_mut() {
            if let Some(value) = attrs.get(key)
                && let Some(bucket) = buckets.get_mut(value)
            {
                bucket.shift_remove(&handle);
                if bucket.is_empty() {
                    buckets.remove(value);
                }
            }
        }
        Ok(())
    }

    /// Move `handle` from the `old` bucket of `key` to the `new` bucket.
    ///
    /// `None` stands for an absent attribute. Nothing is modified when the
    /// element is not found under `old`.
    pub fn update(
        &mut self,
        key: &str,
        old: Option<&AttrValue>,
        new: Option<&AttrValue>,
        handle: H,
    ) -> Result<()> {
        let kind = self.kind;
        let Some(buckets) = self.indices.get_mut(key) else {
            return Err(Error::MissingAttrIndex(key.to_string()));
        };

        if let Some(old) = old {
            let found = buckets
                .get(old)
                .is_some_and(|bucket| bucket.contains(&handle));
            if !found {
                let id = self
                    .names
                    .get(&handle)
                    .cloned()
                    .unwrap_or_else(|| format!("{:?}", handle));
                return Err(Error::missing(kind, format!("{} (under {}={})", id, key, old)));
            }
            if let Some(bucket) = buckets.get_mut(old) {
                bucket.shift_remove(&handle);
                if bucket.is_empty() {
                    buckets.remove(old);
                }
            }
        }

        if let Some(new) = new {
            buckets.entry(new.clone()).or_default().insert(handle);
        }
        Ok(())
    }

    pub fn by_id(&self, id: &str) -> Option<H> {
        self.ids.get(id).copied()
    }

    pub fn id_of(&self, handle: H) -> Option<&str> {
        self.names.get(&handle).map(String::as_str)
    }

    /// Elements whose `key` attribute equals `value`, in bucket insertion order.
    pub fn by_attr(&self, key: &str, value: &AttrValue) -> Result<Vec<H>> {
        let buckets = self
            .indices
            .get(key)
            .ok_or_else(|| Error::MissingAttrIndex(key.to_string()))?;
        Ok(buckets
            .get(value)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default())
    }

    /// All elements in insertion order
    pub fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.ids.values().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::attr::attrs;
    use proptest::prelude::*;

    fn index() -> AttrIndex<u32> {
        let mut index = AttrIndex::new(ElementKind::Node);
        index.create_index("type", |_| None).unwrap();
        index
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut index = index();
        index.insert("a", 1, &attrs([("type", "task")])).unwrap();
        index.insert("b", 2, &attrs([("type", "task")])).unwrap();
        index.insert("c", 3, &attrs([("type", "startEvent")])).unwrap();

        assert_eq!(index.by_id("b"), Some(2));
        assert_eq!(index.by_id("zzz"), None);
        assert_eq!(index.by_attr("type", &"task".into()).unwrap(), vec![1, 2]);
        assert!(index.by_attr("type", &"gateway".into()).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_and_missing() {
        let mut index = index();
        index.insert("a", 1, &Attrs::new()).unwrap();
        assert!(matches!(
            index.insert("a", 2, &Attrs::new()),
            Err(Error::DuplicateElement { .. })
        ));
        assert!(matches!(
            index.remove(9, &Attrs::new()),
            Err(Error::MissingElement { .. })
        ));
        assert!(matches!(
            index.by_attr("name", &"x".into()),
            Err(Error::MissingAttrIndex(_))
        ));
        assert!(matches!(
            index.create_index("type", |_| None),
            Err(Error::DuplicateAttrIndex(_))
        ));
    }

    #[test]
    fn test_update_checks_old_bucket() {
        let mut index = index();
        index.insert("a", 1, &attrs([("type", "task")])).unwrap();

        let err = index
            .update("type", Some(&"gateway".into()), Some(&"task".into()), 1)
            .unwrap_err();
        assert!(matches!(err, Error::MissingElement { .. }));
        // failed update leaves the element where it was
        assert_eq!(index.by_attr("type", &"task".into()).unwrap(), vec![1]);

        index
            .update("type", Some(&"task".into()), Some(&"endEvent".into()), 1)
            .unwrap();
        assert!(index.by_attr("type", &"task".into()).unwrap().is_empty());
        assert_eq!(index.by_attr("type", &"endEvent".into()).unwrap(), vec![1]);

        assert!(matches!(
            index.update("name", None, Some(&"x".into()), 1),
            Err(Error::MissingAttrIndex(_))
        ));
    }

    #[test]
    fn test_create_index_scans_existing_elements() {
        let mut index: AttrIndex<u32> = AttrIndex::new(ElementKind::Edge);
        let bags = [
            attrs([("type", "sequenceFlow")]),
            attrs([("type", "messageFlow")]),
            attrs([("type", "sequenceFlow")]),
        ];
        for (i, bag) in bags.iter().enumerate() {
            index.insert(&format!("e{}", i), i as u32, bag).unwrap();
        }
        index
            .create_index("type", |h| bags[h as usize].get("type"))
            .unwrap();
        assert_eq!(
            index.by_attr("type", &"sequenceFlow".into()).unwrap(),
            vec![0, 2]
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u32, Option<i64>),
        Remove(u32),
        Update(u32, Option<i64>),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..6, proptest::option::of(0i64..3)).prop_map(|(h, v)| Op::Insert(h, v)),
            (0u32..6).prop_map(Op::Remove),
            (0u32..6, proptest::option::of(0i64..3)).prop_map(|(h, v)| Op::Update(h, v)),
        ]
    }

    fn bag(value: Option<i64>) -> Attrs {
        value.map(|v| attrs([("k", v)])).unwrap_or_default()
    }

    proptest! {
        #[test]
        fn prop_buckets_match_live_values(ops in proptest::collection::vec(op_strategy(), 0..64)) {
            let mut index: AttrIndex<u32> = AttrIndex::new(ElementKind::Node);
            index.create_index("k", |_| None).unwrap();
            let mut live: HashMap<u32, Option<i64>> = HashMap::new();

            for op in ops {
                match op {
                    Op::Insert(h, v) => {
                        let result = index.insert(&h.to_string(), h, &bag(v));
                        if live.contains_key(&h) {
                            prop_assert!(result.is_err());
                        } else {
                            prop_assert!(result.is_ok());
                            live.insert(h, v);
                        }
                    }
                    Op::Remove(h) => {
                        match live.remove(&h) {
                            Some(v) => prop_assert!(index.remove(h, &bag(v)).is_ok()),
                            None => prop_assert!(index.remove(h, &Attrs::new()).is_err()),
                        }
                    }
                    Op::Update(h, new) => {
                        if let Some(old) = live.get(&h).copied() {
                            let old_value = old.map(AttrValue::Int);
                            let new_value = new.map(AttrValue::Int);
                            index
                                .update("k", old_value.as_ref(), new_value.as_ref(), h)
                                .unwrap();
                            live.insert(h, new);
                        }
                    }
                }

                for v in 0i64..3 {
                    let mut got = index.by_attr("k", &AttrValue::Int(v)).unwrap();
                    got.sort_unstable();
                    let mut want: Vec<u32> = live
                        .iter()
                        .filter(|(_, value)| **value == Some(v))
                        .map(|(h, _)| *h)
                        .collect();
                    want.sort_unstable();
                    prop_assert_eq!(got, want);
                }
            }
        }
    }
}
