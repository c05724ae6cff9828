mod entity;

pub use entity::{
    BSplineCurveData, BSplineSurfaceData, Color, CurveGeometry, Entity, Placement, ProfileCurve, ProfileDef,
    SurfaceGeometry,
};

use std::ops::{Deref, DerefMut};

use slotmap::SlotMap;
use tracing::trace;

use crate::error::{ExportError, ExportResult};

slotmap::new_key_type! {
    /// Unique identifier for an entity in a [`Document`].
    pub struct EntityId;
}

/// Arena of output entities.
///
/// Iteration follows creation order, so identical exports produce identical
/// documents.
#[derive(Debug, Default)]
pub struct Document {
    entities: SlotMap<EntityId, Entity>,
    journal: Vec<EntityId>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Document`] if the entity refers to an ID that
    /// is not in the document.
    pub fn add(&mut self, entity: Entity) -> ExportResult<EntityId> {
        if let Some(missing) = entity.references().into_iter().find(|r| !self.entities.contains_key(*r)) {
            return Err(ExportError::Document(format!(
                "{} refers to missing entity {missing:?}",
                entity.type_name()
            )));
        }
        let id = self.entities.insert(entity);
        self.journal.push(id);
        Ok(id)
    }

    /// Returns the entity with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Document`] if the ID is not in the document.
    pub fn get(&self, id: EntityId) -> ExportResult<&Entity> {
        self.entities
            .get(id)
            .ok_or_else(|| ExportError::Document(format!("entity {id:?} not found")))
    }

    /// Returns `true` if the ID refers to a live entity.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.journal.len()
    }

    /// Returns `true` if the document has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.journal.is_empty()
    }

    /// Iterates entities in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.journal
            .iter()
            .filter_map(|&id| self.entities.get(id).map(|e| (id, e)))
    }

    /// Opens a transaction. Entities added through it are removed again
    /// unless it is committed.
    pub fn transaction(&mut self) -> Transaction<'_> {
        let mark = self.journal.len();
        Transaction {
            doc: self,
            mark,
            committed: false,
        }
    }

    fn rollback_to(&mut self, mark: usize) {
        for id in self.journal.drain(mark..) {
            self.entities.remove(id);
        }
    }
}

/// A scoped change set on a [`Document`].
///
/// Dropping the guard without calling [`commit`](Self::commit) removes every
/// entity created since it was opened, including entities of committed
/// nested transactions.
#[derive(Debug)]
pub struct Transaction<'a> {
    doc: &'a mut Document,
    mark: usize,
    committed: bool,
}

impl Transaction<'_> {
    /// Keeps the entities created in this transaction.
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// Number of entities created since the transaction was opened.
    #[must_use]
    pub fn created(&self) -> usize {
        self.doc.journal.len() - self.mark
    }
}

impl Deref for Transaction<'_> {
    type Target = Document;

    fn deref(&self) -> &Document {
        self.doc
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut Document {
        self.doc
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            trace!(removed = self.created(), "rolling back transaction");
            self.doc.rollback_to(self.mark);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn point(doc: &mut Document, x: f64) -> EntityId {
        doc.add(Entity::CartesianPoint(Point3::new(x, 0.0, 0.0))).unwrap()
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let mut doc = Document::new();
        let kept = point(&mut doc, 0.0);
        {
            let mut tx = doc.transaction();
            point(&mut tx, 1.0);
            assert_eq!(tx.created(), 1);
        }
        assert_eq!(doc.len(), 1);
        assert!(doc.contains(kept));
    }

    #[test]
    fn committed_transaction_keeps_entities() {
        let mut doc = Document::new();
        let mut tx = doc.transaction();
        let id = point(&mut tx, 1.0);
        tx.commit();
        assert!(doc.contains(id));
    }

    #[test]
    fn outer_rollback_discards_committed_inner() {
        let mut doc = Document::new();
        let inner_id;
        {
            let mut outer = doc.transaction();
            point(&mut outer, 1.0);
            {
                let mut inner = outer.transaction();
                inner_id = point(&mut inner, 2.0);
                inner.commit();
            }
            assert!(outer.contains(inner_id));
        }
        assert!(!doc.contains(inner_id));
        assert!(doc.is_empty());
    }

    #[test]
    fn dangling_references_are_rejected() {
        let mut doc = Document::new();
        let stale = {
            let mut tx = doc.transaction();
            point(&mut tx, 1.0)
        };
        let err = doc.add(Entity::VertexPoint { point: stale }).unwrap_err();
        assert!(matches!(err, ExportError::Document(_)));
        assert!(doc.get(stale).is_err());
    }

    #[test]
    fn iteration_follows_creation_order() {
        let mut doc = Document::new();
        let a = point(&mut doc, 1.0);
        let b = doc.add(Entity::VertexPoint { point: a }).unwrap();
        let ids: Vec<_> = doc.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(doc.get(b).unwrap().type_name(), "IfcVertexPoint");
    }
}
