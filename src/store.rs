//! Stores holding one collection per type tag.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::frames::FrameId;
use crate::mask::Shape;

#[cfg(test)]
mod tests {

    use super::*;
    use crate::mask::Mask;

    #[test]
    fn push_and_get() {
        let mut store: MultiStore<Shape, Mask> = MultiStore::new();
        assert!(store.all_empty());

        let idx = store.push(
            Shape::Cylinder2,
            Mask::new(Shape::Cylinder2, &[1.0, -1.0, 1.0], None),
        );
        assert_eq!(idx, 0);
        let idx = store.push(
            Shape::Cylinder2,
            Mask::new(Shape::Cylinder2, &[2.0, -1.0, 1.0], None),
        );
        assert_eq!(idx, 1);

        assert!(!store.all_empty());
        assert!(store.empty(Shape::Rectangle2));
        assert_eq!(store.size(Shape::Cylinder2), 2);
        assert_eq!(store.get(Shape::Cylinder2, 1).map(|m| m.radius()), Some(2.0));
        assert!(store.get(Shape::Cylinder2, 2).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn keys_are_dense() {
        for (i, shape) in Shape::ALL.iter().enumerate() {
            assert_eq!(shape.store_index(), i);
        }
        for (i, frame) in FrameId::ALL.iter().enumerate() {
            assert_eq!(frame.store_index(), i);
        }
    }
}

/// Closed set of tags selecting a collection in a [`MultiStore`].
pub trait StoreKey: Copy + Eq + fmt::Debug + 'static {
    /// All tags, ordered by their store index.
    const ALL: &'static [Self];

    fn store_index(&self) -> usize;
}

impl StoreKey for Shape {
    const ALL: &'static [Self] = &Shape::ALL;

    fn store_index(&self) -> usize {
        match self {
            Shape::Annulus2 => 0,
            Shape::Cuboid3 => 1,
            Shape::Cylinder2 => 2,
            Shape::Cylinder3 => 3,
            Shape::ConcentricCylinder2 => 4,
            Shape::Rectangle2 => 5,
            Shape::Ring2 => 6,
            Shape::Trapezoid2 => 7,
            Shape::WireCell => 8,
            Shape::StrawTube => 9,
            Shape::Single1 => 10,
            Shape::Single2 => 11,
            Shape::Single3 => 12,
        }
    }
}

impl StoreKey for FrameId {
    const ALL: &'static [Self] = &FrameId::ALL;

    fn store_index(&self) -> usize {
        match self {
            FrameId::Cartesian2 => 0,
            FrameId::Cartesian3 => 1,
            FrameId::Polar2 => 2,
            FrameId::Cylindrical2 => 3,
            FrameId::Cylindrical3 => 4,
            FrameId::ConcentricCylindrical2 => 5,
        }
    }
}

/// One `Vec<T>` per tag of `K`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiStore<K, T> {
    collections: Vec<Vec<T>>,
    #[serde(skip)]
    _key: PhantomData<K>,
}

impl<K: StoreKey, T> Default for MultiStore<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StoreKey, T> MultiStore<K, T> {
    pub fn new() -> Self {
        Self {
            collections: K::ALL.iter().map(|_| Vec::new()).collect(),
            _key: PhantomData,
        }
    }

    /// Appends `value` to the collection of `key` and returns its index there.
    pub fn push(&mut self, key: K, value: T) -> usize {
        let coll = &mut self.collections[key.store_index()];
        coll.push(value);
        coll.len() - 1
    }

    pub fn get(&self, key: K, index: usize) -> Option<&T> {
        self.collections[key.store_index()].get(index)
    }

    pub fn collection(&self, key: K) -> &[T] {
        &self.collections[key.store_index()]
    }

    pub fn size(&self, key: K) -> usize {
        self.collection(key).len()
    }

    pub fn empty(&self, key: K) -> bool {
        self.collection(key).is_empty()
    }

    pub fn all_empty(&self) -> bool {
        self.collections.iter().all(Vec::is_empty)
    }

    /// Total number of entries over all collections.
    pub fn len(&self) -> usize {
        self.collections.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.all_empty()
    }

    /// Tags with their collections.
    pub fn iter(&self) -> impl Iterator<Item = (K, &[T])> {
        K::ALL
            .iter()
            .map(move |key| (*key, self.collection(*key)))
    }
}
