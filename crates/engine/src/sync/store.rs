use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::drawable::Drawable;

/// Opaque entity identifier handed out by the simulation. The producer
/// formats these however it likes; this layer only compares and hashes them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for EntityKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("entity {0} is already present")]
    DuplicateEntity(EntityKey),
    #[error("entity {0} is not present")]
    UnknownEntity(EntityKey),
}

/// One render-ready mirror record. Implementations rebuild their drawable
/// before returning from any mutating call, so the drawable is never stale.
pub trait RenderRecord {
    type Geometry;
    type Style;

    fn new(geometry: Self::Geometry, style: Self::Style) -> Self;
    fn set_geometry(&mut self, geometry: Self::Geometry);
    fn set_style(&mut self, style: Self::Style);
    fn set_selected(&mut self, selected: bool);
    fn selected(&self) -> bool;
    fn drawable(&self) -> &Drawable;
}

/// Keyed mapping from entity id to one typed record. One store instance per
/// geometry kind; mutated only by the reconciler.
#[derive(Debug)]
pub struct EntityStore<R> {
    records: HashMap<EntityKey, R>,
}

impl<R> Default for EntityStore<R> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
        }
    }
}

impl<R: RenderRecord> EntityStore<R> {
    pub fn insert(
        &mut self,
        key: EntityKey,
        geometry: R::Geometry,
        style: R::Style,
    ) -> Result<(), StoreError> {
        if self.records.contains_key(&key) {
            return Err(StoreError::DuplicateEntity(key));
        }
        self.records.insert(key, R::new(geometry, style));
        Ok(())
    }

    pub fn update_geometry(
        &mut self,
        key: &EntityKey,
        geometry: R::Geometry,
    ) -> Result<(), StoreError> {
        let record = self
            .records
            .get_mut(key)
            .ok_or_else(|| StoreError::UnknownEntity(key.clone()))?;
        record.set_geometry(geometry);
        Ok(())
    }

    pub fn update_style(&mut self, key: &EntityKey, style: R::Style) -> Result<(), StoreError> {
        let record = self
            .records
            .get_mut(key)
            .ok_or_else(|| StoreError::UnknownEntity(key.clone()))?;
        record.set_style(style);
        Ok(())
    }

    /// Returns whether a record was present. Absent keys are a no-op, and
    /// re-applying the same flag leaves the record unchanged.
    pub fn set_selected(&mut self, key: &EntityKey, selected: bool) -> bool {
        match self.records.get_mut(key) {
            Some(record) => {
                record.set_selected(selected);
                true
            }
            None => false,
        }
    }

    /// Returns whether a record was actually removed; never fails.
    pub fn remove(&mut self, key: &EntityKey) -> bool {
        self.records.remove(key).is_some()
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn get(&self, key: &EntityKey) -> Option<&R> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &R)> {
        self.records.iter()
    }
}
