// ── Immutable entity collection ──
//
// One map per entity kind, keyed by gateway id. Collections are cloned
// and patched by the store's single writer, then published whole, so
// readers always see a consistent set.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Id-ordered collection of one entity type.
#[derive(Debug)]
pub(crate) struct EntityCollection<T> {
    by_id: BTreeMap<u32, Arc<T>>,
}

impl<T> Clone for EntityCollection<T> {
    fn clone(&self) -> Self {
        Self {
            by_id: self.by_id.clone(),
        }
    }
}

impl<T> Default for EntityCollection<T> {
    fn default() -> Self {
        Self {
            by_id: BTreeMap::new(),
        }
    }
}

impl<T> EntityCollection<T> {
    /// Build from `(id, entity)` pairs. Fails with the first duplicate id.
    pub(crate) fn from_entities(entities: impl IntoIterator<Item = (u32, T)>) -> Result<Self, u32> {
        let mut by_id = BTreeMap::new();
        for (id, entity) in entities {
            if by_id.insert(id, Arc::new(entity)).is_some() {
                return Err(id);
            }
        }
        Ok(Self { by_id })
    }

    pub(crate) fn get(&self, id: u32) -> Option<Arc<T>> {
        self.by_id.get(&id).map(Arc::clone)
    }

    pub(crate) fn contains(&self, id: u32) -> bool {
        self.by_id.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    /// All entities in id order (cheap `Arc` clones).
    pub(crate) fn snapshot(&self) -> Vec<Arc<T>> {
        self.by_id.values().cloned().collect()
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Arc<T>> {
        self.by_id.values()
    }
}

impl<T: PartialEq> EntityCollection<T> {
    /// Ids added, removed or modified between `self` (old) and `next`.
    pub(crate) fn changed_ids(&self, next: &Self) -> Vec<u32> {
        let mut changed: Vec<u32> = next
            .by_id
            .iter()
            .filter(|(id, entity)| self.by_id.get(*id).is_none_or(|old| old != *entity))
            .map(|(id, _)| *id)
            .collect();

        changed.extend(self.by_id.keys().filter(|id| !next.by_id.contains_key(*id)));
        changed.sort_unstable();
        changed
    }
}

impl<T: Clone> EntityCollection<T> {
    /// Mutate one entity in place (copy-on-write).
    ///
    /// Returns `None` if the id is unknown, otherwise whatever `f` reports.
    pub(crate) fn update(&mut self, id: u32, f: impl FnOnce(&mut T) -> bool) -> Option<bool> {
        let entity = self.by_id.get_mut(&id)?;
        Some(f(Arc::make_mut(entity)))
    }
}
