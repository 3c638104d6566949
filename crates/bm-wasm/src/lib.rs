//! WASM bridge for BizMap — exposes the Rust modeling engine to JavaScript.
//!
//! Compiled via `wasm-pack build --target web` and loaded by the browser
//! shell. The bridge owns a [`Workspace`] and translates string ids and
//! JSON across the boundary; rendering, drag mechanics, and file dialogs
//! stay on the JS side.

use bm_core::id::ObjectId;
use bm_core::model::AttrType;
use bm_editor::shortcuts::{ShortcutAction, ShortcutMap};
use bm_editor::workspace::{AttributeEdit, Workspace};
use wasm_bindgen::prelude::*;

/// The main WASM-facing model controller.
///
/// All interaction from the shell goes through this struct.
#[wasm_bindgen]
pub struct ModelBoard {
    workspace: Workspace,
}

#[wasm_bindgen]
impl ModelBoard {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        Self {
            workspace: Workspace::new(),
        }
    }

    // ─── Entity operations ───────────────────────────────────────────────

    /// Create an entity and return its id. The new entity is selected.
    pub fn create_entity(&mut self) -> String {
        self.workspace.create_entity().as_str().to_string()
    }

    pub fn delete_entity(&mut self, id: &str) {
        self.workspace.delete_entity(ObjectId::intern(id));
    }

    pub fn rename_entity(&mut self, id: &str, name: &str) {
        self.workspace.rename_entity(ObjectId::intern(id), name);
    }

    /// Move the entity at `old_index` in the display ordering to
    /// `new_index` (one drop of the sortable list = one call).
    pub fn reorder(&mut self, old_index: usize, new_index: usize) {
        self.workspace.reorder_entities(old_index, new_index);
    }

    // ─── Attribute / state / action edits ────────────────────────────────

    pub fn add_attribute(&mut self, id: &str) {
        self.workspace.add_attribute(ObjectId::intern(id));
    }

    pub fn remove_attribute(&mut self, id: &str, index: usize) {
        self.workspace.remove_attribute(ObjectId::intern(id), index);
    }

    pub fn set_attribute_name(&mut self, id: &str, index: usize, name: &str) {
        self.workspace.update_attribute(
            ObjectId::intern(id),
            index,
            AttributeEdit::Name(name.to_string()),
        );
    }

    /// `ty` is the lowercase wire form (`"string"`, `"date"`, ...).
    /// Unknown types are dropped.
    pub fn set_attribute_type(&mut self, id: &str, index: usize, ty: &str) {
        let Some(ty) = AttrType::parse(ty) else {
            return;
        };
        self.workspace
            .update_attribute(ObjectId::intern(id), index, AttributeEdit::Type(ty));
    }

    pub fn add_state(&mut self, id: &str) {
        self.workspace.add_state(ObjectId::intern(id));
    }

    pub fn remove_state(&mut self, id: &str, index: usize) {
        self.workspace.remove_state(ObjectId::intern(id), index);
    }

    pub fn set_state(&mut self, id: &str, index: usize, value: &str) {
        self.workspace.update_state(ObjectId::intern(id), index, value);
    }

    pub fn add_action(&mut self, id: &str) {
        self.workspace.add_action(ObjectId::intern(id));
    }

    pub fn remove_action(&mut self, id: &str, index: usize) {
        self.workspace.remove_action(ObjectId::intern(id), index);
    }

    pub fn set_action(&mut self, id: &str, index: usize, value: &str) {
        self.workspace.update_action(ObjectId::intern(id), index, value);
    }

    // ─── Relationships & link gesture ────────────────────────────────────

    /// Add a relationship directly (panel flow). Returns the new id, or
    /// `None` if the endpoints were rejected.
    pub fn add_relationship(&mut self, from: &str, to: &str, label: &str) -> Option<String> {
        self.workspace
            .add_relationship(ObjectId::intern(from), ObjectId::intern(to), label)
            .map(|id| id.as_str().to_string())
    }

    pub fn set_relationship_label(&mut self, id: &str, label: &str) {
        self.workspace
            .set_relationship_label(ObjectId::intern(id), label);
    }

    /// Toggle link-creation mode. Returns the new active state.
    pub fn toggle_link_mode(&mut self) -> bool {
        self.workspace.toggle_link_mode()
    }

    /// Enter link mode already anchored at `id` (card-level shortcut).
    pub fn link_from(&mut self, id: &str) {
        self.workspace.link_from(ObjectId::intern(id));
    }

    /// Route an entity card click: selection when idle, arm/complete when
    /// in link mode.
    pub fn entity_clicked(&mut self, id: &str) {
        self.workspace.entity_clicked(ObjectId::intern(id));
    }

    pub fn cancel_link(&mut self) {
        self.workspace.cancel_link();
    }

    pub fn link_active(&self) -> bool {
        self.workspace.link_active()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select(&mut self, id: &str) {
        self.workspace.select(ObjectId::intern(id));
    }

    pub fn deselect(&mut self) {
        self.workspace.deselect();
    }

    /// The selected entity as JSON, or `"null"`.
    pub fn selected_json(&self) -> String {
        match self.workspace.selected() {
            Some(entity) => {
                serde_json::to_string(entity).unwrap_or_else(|_| "null".to_string())
            }
            None => "null".to_string(),
        }
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.workspace.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.workspace.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.workspace.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.workspace.can_redo()
    }

    /// Replace everything with an empty document. The shell confirms first
    /// when `is_empty()` is false.
    pub fn new_document(&mut self) {
        self.workspace.new_document();
    }

    pub fn is_empty(&self) -> bool {
        self.workspace.is_empty()
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Resolve and dispatch a keyboard event. Returns true if it changed
    /// anything the shell should re-render.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> bool {
        match ShortcutMap::resolve(key, ctrl, shift, alt, meta) {
            Some(ShortcutAction::Undo) => self.workspace.undo(),
            Some(ShortcutAction::Redo) => self.workspace.redo(),
            Some(ShortcutAction::DeleteSelection) => {
                let Some(id) = self.workspace.selected().map(|e| e.id) else {
                    return false;
                };
                self.workspace.delete_entity(id);
                true
            }
            Some(ShortcutAction::Cancel) => {
                if self.workspace.link_active() {
                    self.workspace.cancel_link();
                    true
                } else if self.workspace.selected().is_some() {
                    self.workspace.deselect();
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    // ─── Views for the renderer ──────────────────────────────────────────

    /// The whole document as JSON, entities in display order. The renderer
    /// consumes this; no pixel contract lives on the Rust side.
    pub fn document_json(&self) -> String {
        let document = self.workspace.document();
        let view = serde_json::json!({
            "entities": document.entities_in_order(),
            "relationships": document.relationships,
        });
        serde_json::to_string(&view).unwrap_or_else(|_| "{}".to_string())
    }

    /// The relationships touching one entity, labeled from that entity's
    /// perspective: `[{id, direction, label, other}]`.
    pub fn relationships_json(&self, id: &str) -> String {
        let viewpoint = ObjectId::intern(id);
        let document = self.workspace.document();
        let ends = document.relationships_of(viewpoint);

        let mut rows = Vec::new();
        for (direction, rels) in [("outgoing", &ends.outgoing), ("incoming", &ends.incoming)] {
            for rel in rels {
                let other = if rel.from == viewpoint { rel.to } else { rel.from };
                rows.push(serde_json::json!({
                    "id": rel.id,
                    "direction": direction,
                    "label": rel.display_label(viewpoint),
                    "other": document.entity_name(other),
                }));
            }
        }
        serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    // ─── Import / export ─────────────────────────────────────────────────

    /// Export the document in the JSON envelope, stamped with the current
    /// browser time.
    pub fn export_json(&self) -> String {
        self.workspace.export(&iso_now())
    }

    /// Suggested file name for a JSON export.
    pub fn export_file_name(&self) -> String {
        bm_core::envelope::json_file_name(&date_today())
    }

    /// Suggested file name for a canvas snapshot image.
    pub fn snapshot_file_name(&self) -> String {
        bm_core::envelope::snapshot_file_name(&date_today())
    }

    /// Import raw JSON, replacing the document and history. Returns a
    /// descriptive error message on rejection, `None` on success. The
    /// shell confirms before calling when `is_empty()` is false.
    pub fn import_json(&mut self, raw: &str) -> Option<String> {
        self.workspace.import(raw).err().map(|e| e.to_string())
    }
}

impl Default for ModelBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Current time as an ISO-8601 string, from the browser clock.
fn iso_now() -> String {
    js_sys::Date::new_0()
        .to_iso_string()
        .as_string()
        .unwrap_or_default()
}

/// Today's date as `YYYY-MM-DD` (the ISO timestamp's date part).
fn date_today() -> String {
    let iso = iso_now();
    iso.get(..10).unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_id_flow() {
        let mut board = ModelBoard::new();
        let id = board.create_entity();
        board.rename_entity(&id, "Customer");
        board.add_attribute(&id);
        board.set_attribute_type(&id, 0, "date");
        board.set_attribute_type(&id, 0, "uuid"); // unknown: dropped

        let doc: serde_json::Value = serde_json::from_str(&board.document_json()).unwrap();
        assert_eq!(doc["entities"][0]["name"], "Customer");
        assert_eq!(doc["entities"][0]["attributes"][0]["type"], "date");
    }

    #[test]
    fn handle_key_dispatches_undo_and_delete() {
        let mut board = ModelBoard::new();
        let id = board.create_entity();

        // Delete the selected entity via keyboard.
        assert!(board.handle_key("Delete", false, false, false, false));
        assert!(board.is_empty());

        // Ctrl+Z brings it back; Ctrl+Shift+Z (redo) removes it again.
        assert!(board.handle_key("z", true, false, false, false));
        let doc: serde_json::Value = serde_json::from_str(&board.document_json()).unwrap();
        assert_eq!(doc["entities"][0]["id"], id);
        assert!(board.handle_key("z", true, true, false, false));
        assert!(board.is_empty());
    }

    #[test]
    fn escape_cancels_gesture_before_clearing_selection() {
        let mut board = ModelBoard::new();
        let id = board.create_entity();
        board.select(&id);
        board.link_from(&id);

        assert!(board.handle_key("Escape", false, false, false, false));
        assert!(!board.link_active());
        assert_ne!(board.selected_json(), "null", "selection survives the first Escape");

        assert!(board.handle_key("Escape", false, false, false, false));
        assert_eq!(board.selected_json(), "null");
    }

    #[test]
    fn perspective_rows_for_an_entity() {
        let mut board = ModelBoard::new();
        let a = board.create_entity();
        let b = board.create_entity();
        board.rename_entity(&a, "Order");
        board.rename_entity(&b, "Line Item");
        board.add_relationship(&a, &b, "contains");

        let rows: serde_json::Value =
            serde_json::from_str(&board.relationships_json(&b)).unwrap();
        assert_eq!(rows[0]["direction"], "incoming");
        assert_eq!(rows[0]["label"], "belongs to");
        assert_eq!(rows[0]["other"], "Order");
    }

    #[test]
    fn import_surfaces_descriptive_errors() {
        let mut board = ModelBoard::new();
        let err = board.import_json(r#"{"entities": []}"#).unwrap();
        assert!(err.contains("relationships"));
        assert!(board.import_json(r#"{"entities": [], "relationships": []}"#).is_none());
    }
}
