//! Mutation engine: the operations that take one document to the next.
//!
//! Every mutation is applied atomically by [`apply`]: it either fully
//! applies and returns `true`, or leaves the document untouched and returns
//! `false`. Misses (stale ids, out-of-range indices) are silent no-ops,
//! since UI events can race against just-deleted objects.

use bm_core::id::ObjectId;
use bm_core::model::{Attribute, BELONGS_TO, CONTAINS, Document, Entity};
use smallvec::SmallVec;

/// A partial entity update. `None` fields are left as-is; `Some` sequences
/// replace the entity's sequence wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPatch {
    pub name: Option<String>,
    pub attributes: Option<SmallVec<[Attribute; 4]>>,
    pub states: Option<SmallVec<[String; 4]>>,
    pub actions: Option<SmallVec<[String; 4]>>,
}

/// Merge `patch` into `entity`, overwriting only `Some` fields.
pub fn merge_entity_patch(entity: &mut Entity, patch: &EntityPatch) {
    if let Some(name) = &patch.name {
        entity.name = name.clone();
    }
    if let Some(attributes) = &patch.attributes {
        entity.attributes = attributes.clone();
    }
    if let Some(states) = &patch.states {
        entity.states = states.clone();
    }
    if let Some(actions) = &patch.actions {
        entity.actions = actions.clone();
    }
}

/// A single document mutation.
///
/// Collection edits (attributes/states/actions) are not separate variants —
/// they arrive as `UpdateEntity` patches built by the workspace, the same
/// path an inline name edit takes.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Append a new entity at the end of the display order.
    CreateEntity { id: ObjectId },
    /// Remove an entity and cascade-delete every relationship touching it.
    DeleteEntity { id: ObjectId },
    /// Merge a partial update into one entity.
    UpdateEntity { id: ObjectId, patch: EntityPatch },
    /// Move the entity at `old_index` (display order) to `new_index`.
    ReorderEntities { old_index: usize, new_index: usize },
    /// Add a directed labeled edge. Endpoint validation is the caller's
    /// job — see `Workspace::add_relationship`.
    AddRelationship {
        id: ObjectId,
        from: ObjectId,
        to: ObjectId,
        label: String,
    },
    /// Change a relationship's label, swapping its direction when the old
    /// and new labels are the contains/belongs-to inverse pair.
    SetRelationshipLabel { id: ObjectId, label: String },
}

/// Apply one mutation. Returns `true` when the document changed.
pub fn apply(document: &mut Document, mutation: Mutation) -> bool {
    match mutation {
        Mutation::CreateEntity { id } => {
            let order = document.entities.len();
            document.entities.push(Entity::new(id, order));
            true
        }
        Mutation::DeleteEntity { id } => {
            let before = document.entities.len();
            document.entities.retain(|e| e.id != id);
            if document.entities.len() == before {
                log::debug!("delete ignored: no entity {id}");
                return false;
            }
            document.relationships.retain(|r| r.from != id && r.to != id);
            reassign_ranks(document);
            true
        }
        Mutation::UpdateEntity { id, patch } => {
            let Some(entity) = document.find_entity_mut(id) else {
                log::debug!("update ignored: no entity {id}");
                return false;
            };
            merge_entity_patch(entity, &patch);
            true
        }
        Mutation::ReorderEntities {
            old_index,
            new_index,
        } => {
            let len = document.entities.len();
            if old_index >= len || new_index >= len {
                log::debug!("reorder ignored: {old_index} -> {new_index} out of range for {len}");
                return false;
            }
            // Canonicalize storage to display order, then splice.
            document.entities.sort_by_key(|e| e.order);
            let entity = document.entities.remove(old_index);
            document.entities.insert(new_index, entity);
            reassign_ranks(document);
            true
        }
        Mutation::AddRelationship {
            id,
            from,
            to,
            label,
        } => {
            document
                .relationships
                .push(bm_core::model::Relationship::new(id, from, to, &label));
            true
        }
        Mutation::SetRelationshipLabel { id, label } => {
            let Some(rel) = document.relationships.iter_mut().find(|r| r.id == id) else {
                log::debug!("relabel ignored: no relationship {id}");
                return false;
            };
            if is_inverse_pair(&rel.label, &label) {
                std::mem::swap(&mut rel.from, &mut rel.to);
            }
            rel.label = label;
            true
        }
    }
}

/// The edge direction always points out of the container, so switching
/// between the paired labels also switches which endpoint is the container.
fn is_inverse_pair(a: &str, b: &str) -> bool {
    (a == CONTAINS && b == BELONGS_TO) || (a == BELONGS_TO && b == CONTAINS)
}

/// Reassign dense ranks `0..N-1` following the current display order.
fn reassign_ranks(document: &mut Document) {
    document.entities.sort_by_key(|e| e.order);
    for (rank, entity) in document.entities.iter_mut().enumerate() {
        entity.order = rank;
    }
}
