use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::debug;

use crate::describe::TypeKey;
use crate::schema::Schema;

/// Memoized schema definitions keyed by type identity, with the name maps
/// used for collision detection and the in-progress set used to break
/// cycles.
///
/// One registry belongs to one builder; every part of a document sees the
/// same definition for a given type.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<TypeKey, Schema>,
    key_to_name: HashMap<TypeKey, String>,
    name_to_key: IndexMap<String, TypeKey>,
    in_progress: HashSet<TypeKey>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &TypeKey) -> Option<&Schema> {
        self.schemas.get(key)
    }

    /// Store a finished definition. Named definitions also bind the name.
    pub fn set(&mut self, key: TypeKey, name: Option<&str>, schema: Schema) {
        if let Some(name) = name {
            self.bind_name(key, name);
        }
        self.schemas.insert(key, schema);
    }

    /// Bind `name` to `key` ahead of registration so references emitted while
    /// the type is still expanding use the final name.
    pub fn bind_name(&mut self, key: TypeKey, name: &str) {
        if let Some(previous) = self.key_to_name.get(&key) {
            if previous == name {
                return;
            }
            debug!("rebinding {:?} from {previous} to {name}", key);
            self.name_to_key.shift_remove(previous);
        }
        self.key_to_name.insert(key, name.to_string());
        self.name_to_key.insert(name.to_string(), key);
    }

    pub fn is_in_progress(&self, key: &TypeKey) -> bool {
        self.in_progress.contains(key)
    }

    pub fn mark_in_progress(&mut self, key: TypeKey) {
        self.in_progress.insert(key);
    }

    pub fn clear_in_progress(&mut self, key: &TypeKey) {
        self.in_progress.remove(key);
    }

    pub fn name_for(&self, key: &TypeKey) -> Option<&str> {
        self.key_to_name.get(key).map(String::as_str)
    }

    pub fn key_for(&self, name: &str) -> Option<TypeKey> {
        self.name_to_key.get(name).copied()
    }

    /// Named definitions in name-binding order.
    pub fn definitions(&self) -> IndexMap<String, Schema> {
        self.name_to_key
            .iter()
            .filter_map(|(name, key)| {
                self.schemas
                    .get(key)
                    .map(|schema| (name.clone(), schema.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.name_to_key
            .values()
            .filter(|key| self.schemas.contains_key(key))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaType;

    struct A;
    struct B;

    #[test]
    fn test_absent_is_normal() {
        let reg = SchemaRegistry::new();
        assert!(reg.get(&TypeKey::of::<A>()).is_none());
        assert!(reg.name_for(&TypeKey::of::<A>()).is_none());
        assert!(reg.key_for("a.A").is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_set_binds_both_directions() {
        let mut reg = SchemaRegistry::new();
        let key = TypeKey::of::<A>();
        reg.set(key, Some("a.A"), Schema::typed(SchemaType::Object));
        assert_eq!(reg.name_for(&key), Some("a.A"));
        assert_eq!(reg.key_for("a.A"), Some(key));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_anonymous_entries_are_not_definitions() {
        let mut reg = SchemaRegistry::new();
        reg.set(TypeKey::of::<A>(), None, Schema::typed(SchemaType::Object));
        assert!(reg.get(&TypeKey::of::<A>()).is_some());
        assert!(reg.definitions().is_empty());
    }

    #[test]
    fn test_in_progress_tracking() {
        let mut reg = SchemaRegistry::new();
        let key = TypeKey::of::<B>();
        reg.mark_in_progress(key);
        assert!(reg.is_in_progress(&key));
        reg.clear_in_progress(&key);
        assert!(!reg.is_in_progress(&key));
    }

    #[test]
    fn test_reserved_name_without_schema_is_hidden() {
        let mut reg = SchemaRegistry::new();
        reg.bind_name(TypeKey::of::<A>(), "a.A");
        assert_eq!(reg.key_for("a.A"), Some(TypeKey::of::<A>()));
        assert!(reg.definitions().is_empty());
    }
}
