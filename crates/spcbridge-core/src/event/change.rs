use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{EntityKind, EntityRef};

/// Why a change set was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCause {
    /// A push event mutated individual fields.
    Event,
    /// A full snapshot replaced the store.
    Reload,
}

/// The entities touched by one mutation batch.
///
/// Carries references only; consumers re-read current values from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub cause: ChangeCause,
    pub entities: BTreeSet<EntityRef>,
}

impl ChangeSet {
    pub fn new(cause: ChangeCause) -> Self {
        Self {
            cause,
            entities: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        self.entities.contains(&entity)
    }

    /// References of one kind, in id order.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = EntityRef> + '_ {
        self.entities.iter().copied().filter(move |r| r.kind == kind)
    }

    pub(crate) fn insert(&mut self, entity: EntityRef) {
        self.entities.insert(entity);
    }

    pub(crate) fn extend_ids(&mut self, kind: EntityKind, ids: impl IntoIterator<Item = u32>) {
        self.entities
            .extend(ids.into_iter().map(|id| EntityRef::new(kind, id)));
    }
}
