//! Name-keyed element storage.
//!
//! An [`ElementArena`] keeps elements in insertion order and resolves names
//! to positions. Relations between elements are expressed as names that the
//! arena turns into positions, so the network never holds object references
//! into itself.

use crate::entities::NetworkElement;
use crate::error::{MepError, MepResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// Insertion-ordered collection of one element kind.
///
/// [`insert`](Self::insert) rejects duplicate names. A deserialized arena
/// may still contain duplicates (the first occurrence wins lookups), which
/// the validator reports through [`duplicate_names`](Self::duplicate_names).
#[derive(Debug, Clone)]
pub struct ElementArena<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for ElementArena<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: NetworkElement> ElementArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element, returning its position.
    pub fn insert(&mut self, item: T) -> MepResult<usize> {
        if self.index.contains_key(item.name()) {
            return Err(MepError::DuplicateElement {
                kind: T::KIND,
                name: item.name().to_string(),
            });
        }
        let position = self.items.len();
        self.index.insert(item.name().to_string(), position);
        self.items.push(item);
        Ok(position)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.items[i])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names that occur more than once, in order of their second occurrence.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.items
            .iter()
            .map(NetworkElement::name)
            .filter(|name| !seen.insert(*name))
            .collect()
    }
}

impl<T> ElementArena<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> std::ops::Index<usize> for ElementArena<T> {
    type Output = T;

    fn index(&self, position: usize) -> &T {
        &self.items[position]
    }
}

impl<'a, T> IntoIterator for &'a ElementArena<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: NetworkElement> From<Vec<T>> for ElementArena<T> {
    fn from(items: Vec<T>) -> Self {
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            index.entry(item.name().to_string()).or_insert(position);
        }
        Self { items, index }
    }
}

impl<T: Serialize> Serialize for ElementArena<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for ElementArena<T>
where
    T: Deserialize<'de> + NetworkElement,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Bus;

    #[test]
    fn insert_keeps_order_and_rejects_duplicates() {
        let mut arena = ElementArena::new();
        assert_eq!(arena.insert(Bus::new("B", "heat")).unwrap(), 0);
        assert_eq!(arena.insert(Bus::new("A", "heat")).unwrap(), 1);

        let err = arena.insert(Bus::new("B", "electricity")).unwrap_err();
        assert!(matches!(err, MepError::DuplicateElement { .. }));

        let names: Vec<_> = arena.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
        assert_eq!(arena.position("A"), Some(1));
        assert_eq!(arena.get("B").unwrap().energy_type, "heat");
    }

    #[test]
    fn deserialized_duplicates_are_reported() {
        let json = r#"[
            {"name": "B1", "energy_type": "heat"},
            {"name": "B1", "energy_type": "electricity"}
        ]"#;
        let arena: ElementArena<Bus> = serde_json::from_str(json).unwrap();

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.duplicate_names(), vec!["B1"]);
        assert_eq!(arena.get("B1").unwrap().energy_type, "heat");
    }
}
