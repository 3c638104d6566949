//! The editing workspace: one owned handle over document + history +
//! selection + link tool.
//!
//! Every collaborator-facing operation lives here. Each successful mutation
//! commits exactly one history snapshot; rejected no-ops commit nothing.
//! Selection is kept consistent by every mutation that could invalidate it,
//! and is cleared by every history-restoring operation.

use crate::engine::{self, EntityPatch, Mutation};
use crate::history::{DEFAULT_DEPTH, History};
use crate::link::{LinkClick, LinkTool};
use bm_core::envelope::{self, ImportError};
use bm_core::id::ObjectId;
use bm_core::model::{AttrType, Attribute, Document, Entity, RELATES_TO};

/// Which half of an attribute an indexed edit targets.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeEdit {
    Name(String),
    Type(AttrType),
}

pub struct Workspace {
    document: Document,
    history: History,
    /// Cached copy of the selected entity. Partial updates are merged into
    /// this copy rather than re-fetched — editors reading the selection see
    /// fresh values without a second lookup.
    selected: Option<Entity>,
    link: LinkTool,
}

impl Workspace {
    pub fn new() -> Self {
        let document = Document::default();
        let history = History::new(document.clone(), DEFAULT_DEPTH);
        Self {
            document,
            history,
            selected: None,
            link: LinkTool::new(),
        }
    }

    // ─── Read surface ────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selected(&self) -> Option<&Entity> {
        self.selected.as_ref()
    }

    /// True when there is nothing a destructive replace (new/import) would
    /// lose — the shell asks for confirmation otherwise.
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn link_active(&self) -> bool {
        self.link.is_active()
    }

    pub fn link_anchor(&self) -> Option<ObjectId> {
        self.link.anchor()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select(&mut self, id: ObjectId) {
        self.selected = self.document.find_entity(id).cloned();
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    // ─── Entity operations ───────────────────────────────────────────────

    /// Create a new entity at the end of the display order and select it.
    pub fn create_entity(&mut self) -> ObjectId {
        let id = ObjectId::entity();
        engine::apply(&mut self.document, Mutation::CreateEntity { id });
        self.selected = self.document.find_entity(id).cloned();
        self.commit();
        id
    }

    /// Delete an entity, cascading to every relationship touching it.
    pub fn delete_entity(&mut self, id: ObjectId) {
        if !engine::apply(&mut self.document, Mutation::DeleteEntity { id }) {
            return;
        }
        if self.selected.as_ref().is_some_and(|e| e.id == id) {
            self.selected = None;
        }
        if self.link.anchor() == Some(id) {
            self.link.cancel();
        }
        self.commit();
    }

    /// Merge a partial update into an entity. When the target is selected,
    /// the same patch is merged into the cached selected copy.
    pub fn update_entity(&mut self, id: ObjectId, patch: EntityPatch) {
        if !engine::apply(
            &mut self.document,
            Mutation::UpdateEntity {
                id,
                patch: patch.clone(),
            },
        ) {
            return;
        }
        if let Some(selected) = &mut self.selected
            && selected.id == id
        {
            engine::merge_entity_patch(selected, &patch);
        }
        self.commit();
    }

    pub fn rename_entity(&mut self, id: ObjectId, name: &str) {
        self.update_entity(
            id,
            EntityPatch {
                name: Some(name.to_string()),
                ..Default::default()
            },
        );
    }

    /// Move the entity at `old_index` in the display ordering to
    /// `new_index`. The sortable list yields one such request per drag
    /// gesture, so this is one undo step. Out-of-range indices are no-ops.
    pub fn reorder_entities(&mut self, old_index: usize, new_index: usize) {
        if engine::apply(
            &mut self.document,
            Mutation::ReorderEntities {
                old_index,
                new_index,
            },
        ) {
            self.commit();
        }
    }

    // ─── Attribute / state / action edits ────────────────────────────────
    //
    // Collection edits are patch builders over `update_entity`, the same
    // path a name edit takes. Missing entities and out-of-range indices
    // fall out as no-ops.

    pub fn add_attribute(&mut self, id: ObjectId) {
        let Some(entity) = self.document.find_entity(id) else {
            return;
        };
        let mut attributes = entity.attributes.clone();
        attributes.push(Attribute::default());
        self.update_entity(
            id,
            EntityPatch {
                attributes: Some(attributes),
                ..Default::default()
            },
        );
    }

    pub fn remove_attribute(&mut self, id: ObjectId, index: usize) {
        let Some(entity) = self.document.find_entity(id) else {
            return;
        };
        if index >= entity.attributes.len() {
            return;
        }
        let mut attributes = entity.attributes.clone();
        attributes.remove(index);
        self.update_entity(
            id,
            EntityPatch {
                attributes: Some(attributes),
                ..Default::default()
            },
        );
    }

    pub fn update_attribute(&mut self, id: ObjectId, index: usize, edit: AttributeEdit) {
        let Some(entity) = self.document.find_entity(id) else {
            return;
        };
        let mut attributes = entity.attributes.clone();
        let Some(attribute) = attributes.get_mut(index) else {
            return;
        };
        match edit {
            AttributeEdit::Name(name) => attribute.name = name,
            AttributeEdit::Type(ty) => attribute.ty = ty,
        }
        self.update_entity(
            id,
            EntityPatch {
                attributes: Some(attributes),
                ..Default::default()
            },
        );
    }

    pub fn add_state(&mut self, id: ObjectId) {
        self.edit_states(id, |states| states.push("new_state".to_string()));
    }

    pub fn remove_state(&mut self, id: ObjectId, index: usize) {
        self.edit_states(id, |states| {
            if index < states.len() {
                states.remove(index);
            }
        });
    }

    pub fn update_state(&mut self, id: ObjectId, index: usize, value: &str) {
        self.edit_states(id, |states| {
            if let Some(state) = states.get_mut(index) {
                *state = value.to_string();
            }
        });
    }

    pub fn add_action(&mut self, id: ObjectId) {
        self.edit_actions(id, |actions| actions.push("new_action".to_string()));
    }

    pub fn remove_action(&mut self, id: ObjectId, index: usize) {
        self.edit_actions(id, |actions| {
            if index < actions.len() {
                actions.remove(index);
            }
        });
    }

    pub fn update_action(&mut self, id: ObjectId, index: usize, value: &str) {
        self.edit_actions(id, |actions| {
            if let Some(action) = actions.get_mut(index) {
                *action = value.to_string();
            }
        });
    }

    fn edit_states(&mut self, id: ObjectId, edit: impl FnOnce(&mut smallvec::SmallVec<[String; 4]>)) {
        let Some(entity) = self.document.find_entity(id) else {
            return;
        };
        let mut states = entity.states.clone();
        edit(&mut states);
        self.update_entity(
            id,
            EntityPatch {
                states: Some(states),
                ..Default::default()
            },
        );
    }

    fn edit_actions(&mut self, id: ObjectId, edit: impl FnOnce(&mut smallvec::SmallVec<[String; 4]>)) {
        let Some(entity) = self.document.find_entity(id) else {
            return;
        };
        let mut actions = entity.actions.clone();
        edit(&mut actions);
        self.update_entity(
            id,
            EntityPatch {
                actions: Some(actions),
                ..Default::default()
            },
        );
    }

    // ─── Relationships ───────────────────────────────────────────────────

    /// Add a directed labeled relationship. Self-loops and stale endpoints
    /// are rejected here so no documented surface can produce a dangling
    /// edge.
    pub fn add_relationship(
        &mut self,
        from: ObjectId,
        to: ObjectId,
        label: &str,
    ) -> Option<ObjectId> {
        if from == to {
            log::debug!("relationship rejected: self-loop on {from}");
            return None;
        }
        if self.document.find_entity(from).is_none() || self.document.find_entity(to).is_none() {
            log::debug!("relationship rejected: stale endpoint {from} -> {to}");
            return None;
        }
        let id = ObjectId::relationship();
        engine::apply(
            &mut self.document,
            Mutation::AddRelationship {
                id,
                from,
                to,
                label: label.to_string(),
            },
        );
        self.commit();
        Some(id)
    }

    pub fn set_relationship_label(&mut self, id: ObjectId, label: &str) {
        if engine::apply(
            &mut self.document,
            Mutation::SetRelationshipLabel {
                id,
                label: label.to_string(),
            },
        ) {
            self.commit();
        }
    }

    // ─── Link gesture ────────────────────────────────────────────────────

    /// Enter or leave link mode. Returns the new active state.
    pub fn toggle_link_mode(&mut self) -> bool {
        self.link.toggle()
    }

    /// Enter link mode already anchored at `entity`.
    pub fn link_from(&mut self, entity: ObjectId) {
        self.link.arm_from(entity);
    }

    /// Route an entity click through the link tool: plain selection when
    /// idle, arm/complete when in link mode. A completed gesture creates
    /// the edge with the default label and commits one history entry.
    pub fn entity_clicked(&mut self, entity: ObjectId) {
        match self.link.click(entity) {
            LinkClick::Select(id) => self.select(id),
            LinkClick::Armed(_) | LinkClick::Ignored => {}
            LinkClick::Connect { from, to } => {
                self.add_relationship(from, to, RELATES_TO);
            }
        }
    }

    /// Abandon an in-progress gesture. No mutation, no history entry.
    pub fn cancel_link(&mut self) {
        self.link.cancel();
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Step back one committed action. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.document = snapshot.clone();
        self.selected = None;
        true
    }

    /// Step forward one undone action. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.document = snapshot.clone();
        self.selected = None;
        true
    }

    /// Replace everything with an empty document and a fresh history.
    /// Confirmation for a non-empty document is the shell's job.
    pub fn new_document(&mut self) {
        self.document = Document::default();
        self.selected = None;
        self.link.cancel();
        self.history.reset(&self.document);
    }

    // ─── Import / export ─────────────────────────────────────────────────

    /// Export the current document in the JSON envelope. `created` is an
    /// ISO-8601 timestamp supplied by the shell.
    pub fn export(&self, created: &str) -> String {
        envelope::export_document(&self.document, created)
    }

    /// Validate and import raw JSON, replacing document, selection, and
    /// history. On error nothing changes.
    pub fn import(&mut self, raw: &str) -> Result<(), ImportError> {
        let document = envelope::import_document(raw)?;
        self.document = document;
        self.selected = None;
        self.link.cancel();
        self.history.reset(&self.document);
        Ok(())
    }

    fn commit(&mut self) {
        self.history.record(&self.document);
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_follows_create() {
        let mut ws = Workspace::new();
        let id = ws.create_entity();
        assert_eq!(ws.selected().map(|e| e.id), Some(id));
        assert_eq!(ws.selected().map(|e| e.name.as_str()), Some("New Entity"));
    }

    #[test]
    fn selection_cleared_on_delete() {
        let mut ws = Workspace::new();
        let id = ws.create_entity();
        ws.delete_entity(id);
        assert!(ws.selected().is_none());

        // Deleting a different entity leaves selection alone.
        let kept = ws.create_entity();
        let other = ws.create_entity();
        ws.select(kept);
        ws.delete_entity(other);
        assert_eq!(ws.selected().map(|e| e.id), Some(kept));
    }

    #[test]
    fn update_merges_into_cached_selection() {
        let mut ws = Workspace::new();
        let a = ws.create_entity();
        let _b = ws.create_entity();
        ws.select(a);

        // Reorder changes the entity's rank in the document but not in the
        // cached copy; a later partial update must merge into that copy,
        // not re-fetch. The stale rank is the observable difference.
        ws.reorder_entities(0, 1);
        ws.rename_entity(a, "Customer");

        let selected = ws.selected().unwrap();
        assert_eq!(selected.name, "Customer");
        assert_eq!(selected.order, 0, "cached copy keeps its pre-reorder rank");
        assert_eq!(ws.document().find_entity(a).unwrap().order, 1);
    }

    #[test]
    fn attribute_edits_address_by_index() {
        let mut ws = Workspace::new();
        let id = ws.create_entity();
        ws.add_attribute(id);
        ws.add_attribute(id);
        ws.update_attribute(id, 1, AttributeEdit::Name("due_date".to_string()));
        ws.update_attribute(id, 1, AttributeEdit::Type(AttrType::Date));
        ws.remove_attribute(id, 0);

        let entity = ws.document().find_entity(id).unwrap();
        assert_eq!(entity.attributes.len(), 1);
        assert_eq!(entity.attributes[0].name, "due_date");
        assert_eq!(entity.attributes[0].ty, AttrType::Date);

        // Out-of-range edits are harmless.
        ws.remove_attribute(id, 9);
        ws.update_attribute(id, 9, AttributeEdit::Name("x".to_string()));
        assert_eq!(ws.document().find_entity(id).unwrap().attributes.len(), 1);
    }

    #[test]
    fn state_and_action_defaults() {
        let mut ws = Workspace::new();
        let id = ws.create_entity();
        ws.add_state(id);
        ws.add_action(id);
        let entity = ws.document().find_entity(id).unwrap();
        assert_eq!(entity.states.as_slice(), ["new_state".to_string()]);
        assert_eq!(entity.actions.as_slice(), ["new_action".to_string()]);

        ws.update_state(id, 0, "open");
        ws.remove_action(id, 0);
        let entity = ws.document().find_entity(id).unwrap();
        assert_eq!(entity.states.as_slice(), ["open".to_string()]);
        assert!(entity.actions.is_empty());
    }

    #[test]
    fn add_relationship_rejects_self_loop_and_stale_endpoints() {
        let mut ws = Workspace::new();
        let a = ws.create_entity();
        let b = ws.create_entity();

        assert!(ws.add_relationship(a, a, RELATES_TO).is_none());
        assert!(
            ws.add_relationship(a, ObjectId::intern("ghost"), RELATES_TO)
                .is_none()
        );
        assert!(ws.add_relationship(a, b, RELATES_TO).is_some());
        assert_eq!(ws.document().relationship_count(), 1);
    }

    #[test]
    fn deleting_anchor_cancels_gesture() {
        let mut ws = Workspace::new();
        let a = ws.create_entity();
        let b = ws.create_entity();
        ws.link_from(a);
        ws.delete_entity(a);
        assert!(!ws.link_active());

        // The interrupted gesture left no edge and the next click selects.
        ws.entity_clicked(b);
        assert_eq!(ws.selected().map(|e| e.id), Some(b));
        assert_eq!(ws.document().relationship_count(), 0);
    }

    #[test]
    fn no_op_edits_leave_no_history_entry() {
        let mut ws = Workspace::new();
        let id = ws.create_entity();
        assert!(ws.can_undo());

        ws.delete_entity(ObjectId::intern("ghost"));
        ws.reorder_entities(5, 0);
        ws.remove_state(id, 3);

        // One undo returns to the empty document; a second finds nothing.
        assert!(ws.undo());
        assert_eq!(ws.document().entity_count(), 0);
        assert!(!ws.undo());
    }

    #[test]
    fn undo_clears_selection() {
        let mut ws = Workspace::new();
        let id = ws.create_entity();
        ws.select(id);
        assert!(ws.undo());
        assert!(ws.selected().is_none());
        assert!(ws.redo());
        assert!(ws.selected().is_none());
    }
}
