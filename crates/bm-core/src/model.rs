//! Core data model for BizMap documents.
//!
//! A document is a flat, ordered collection of entities (business objects
//! with attributes, states, and actions) plus a list of directed, labeled
//! relationships between them. Entities carry a dense display rank in
//! `order`; relationships reference entities by id. This module is pure
//! shape + queries — all mutation lives in `bm-editor`.

use crate::id::ObjectId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Relationship labels ─────────────────────────────────────────────────

/// "A contains B" — drawn from A's side.
pub const CONTAINS: &str = "contains";
/// "B belongs to A" — the same edge seen from B's side.
pub const BELONGS_TO: &str = "belongs to";
/// Symmetric association — reads the same from both endpoints.
pub const RELATES_TO: &str = "relates to";

/// Name shown for an endpoint whose entity no longer exists.
pub const UNKNOWN_ENTITY: &str = "Unknown";

// ─── Attributes ──────────────────────────────────────────────────────────

/// The value type of an entity attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
    Enum,
}

impl AttrType {
    /// Parse the lowercase wire form. Unknown strings yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            "enum" => Some(Self::Enum),
            _ => None,
        }
    }
}

/// A named, typed attribute. Attributes have no identity of their own —
/// they are addressed by position in the owning entity's sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AttrType,
}

impl Default for Attribute {
    fn default() -> Self {
        Self {
            name: "attribute".to_string(),
            ty: AttrType::String,
        }
    }
}

// ─── Entities ────────────────────────────────────────────────────────────

/// A business object: named, ranked, with ordered attribute/state/action
/// sequences. Owned exclusively by a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entity {
    pub id: ObjectId,
    pub name: String,
    /// Dense display rank among all entities (0..N-1 after any
    /// add/delete/reorder).
    pub order: usize,
    pub attributes: SmallVec<[Attribute; 4]>,
    pub states: SmallVec<[String; 4]>,
    pub actions: SmallVec<[String; 4]>,
}

impl Entity {
    pub fn new(id: ObjectId, order: usize) -> Self {
        Self {
            id,
            name: "New Entity".to_string(),
            order,
            attributes: SmallVec::new(),
            states: SmallVec::new(),
            actions: SmallVec::new(),
        }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new(ObjectId::default(), 0)
    }
}

// ─── Relationships ───────────────────────────────────────────────────────

/// A directed, labeled edge between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relationship {
    pub id: ObjectId,
    pub from: ObjectId,
    pub to: ObjectId,
    pub label: String,
}

impl Relationship {
    pub fn new(id: ObjectId, from: ObjectId, to: ObjectId, label: &str) -> Self {
        Self {
            id,
            from,
            to,
            label: label.to_string(),
        }
    }

    /// The label as seen from `viewpoint`.
    ///
    /// Every presentation surface goes through this one function: the literal
    /// label from the `from` side, the paired inverse from the `to` side.
    /// `"relates to"` (and any label without an inverse pair) reads the same
    /// from both endpoints.
    pub fn display_label(&self, viewpoint: ObjectId) -> &str {
        if viewpoint == self.to {
            match self.label.as_str() {
                CONTAINS => BELONGS_TO,
                BELONGS_TO => CONTAINS,
                other => other,
            }
        } else {
            &self.label
        }
    }
}

impl Default for Relationship {
    fn default() -> Self {
        Self::new(ObjectId::default(), ObjectId::default(), ObjectId::default(), RELATES_TO)
    }
}

/// The relationships touching one entity, split by direction.
/// Both sequences keep document order.
#[derive(Debug, Default)]
pub struct RelationshipEnds<'a> {
    pub outgoing: Vec<&'a Relationship>,
    pub incoming: Vec<&'a Relationship>,
}

// ─── Document ────────────────────────────────────────────────────────────

/// The complete model document. `Clone` is the structural deep copy used
/// for history snapshots; `PartialEq` is the deep equality used for
/// snapshot dedup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

impl Document {
    /// Look up an entity by id. Total — a missing id yields `None`.
    pub fn find_entity(&self, id: ObjectId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Look up an entity mutably by id.
    pub fn find_entity_mut(&mut self, id: ObjectId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// The display name for an entity id, falling back to `"Unknown"` when
    /// the id no longer resolves (stale relationship endpoints).
    pub fn entity_name(&self, id: ObjectId) -> &str {
        self.find_entity(id).map_or(UNKNOWN_ENTITY, |e| e.name.as_str())
    }

    /// All relationships touching `id`, split into outgoing and incoming.
    pub fn relationships_of(&self, id: ObjectId) -> RelationshipEnds<'_> {
        let mut ends = RelationshipEnds::default();
        for rel in &self.relationships {
            if rel.from == id {
                ends.outgoing.push(rel);
            }
            if rel.to == id {
                ends.incoming.push(rel);
            }
        }
        ends
    }

    /// Entities in display order (sorted by rank; stable for equal ranks).
    pub fn entities_in_order(&self) -> Vec<&Entity> {
        let mut ordered: Vec<&Entity> = self.entities.iter().collect();
        ordered.sort_by_key(|e| e.order);
        ordered
    }

    /// Whether the entity ranks, sorted, form exactly `0..N-1`.
    pub fn is_densely_ordered(&self) -> bool {
        let mut ranks: Vec<usize> = self.entities.iter().map(|e| e.order).collect();
        ranks.sort_unstable();
        ranks.iter().copied().eq(0..self.entities.len())
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(entities: &[(&str, usize)]) -> Document {
        let mut doc = Document::default();
        for (name, order) in entities {
            let mut e = Entity::new(ObjectId::intern(name), *order);
            e.name = name.to_string();
            doc.entities.push(e);
        }
        doc
    }

    #[test]
    fn find_entity_is_total() {
        let doc = doc_with(&[("order", 0)]);
        assert!(doc.find_entity(ObjectId::intern("order")).is_some());
        assert!(doc.find_entity(ObjectId::intern("ghost")).is_none());
    }

    #[test]
    fn entity_name_falls_back_to_unknown() {
        let doc = doc_with(&[("order", 0)]);
        assert_eq!(doc.entity_name(ObjectId::intern("order")), "order");
        assert_eq!(doc.entity_name(ObjectId::intern("ghost")), UNKNOWN_ENTITY);
    }

    #[test]
    fn relationships_split_by_direction() {
        let mut doc = doc_with(&[("a", 0), ("b", 1)]);
        let a = ObjectId::intern("a");
        let b = ObjectId::intern("b");
        doc.relationships.push(Relationship::new(ObjectId::intern("r1"), a, b, CONTAINS));
        doc.relationships.push(Relationship::new(ObjectId::intern("r2"), b, a, RELATES_TO));

        let ends = doc.relationships_of(a);
        assert_eq!(ends.outgoing.len(), 1);
        assert_eq!(ends.incoming.len(), 1);
        assert_eq!(ends.outgoing[0].label, CONTAINS);
        assert_eq!(ends.incoming[0].label, RELATES_TO);

        let none = doc.relationships_of(ObjectId::intern("ghost"));
        assert!(none.outgoing.is_empty());
        assert!(none.incoming.is_empty());
    }

    #[test]
    fn display_label_flips_for_target_endpoint() {
        let a = ObjectId::intern("a");
        let b = ObjectId::intern("b");
        let rel = Relationship::new(ObjectId::intern("r"), a, b, CONTAINS);

        assert_eq!(rel.display_label(a), CONTAINS);
        assert_eq!(rel.display_label(b), BELONGS_TO);

        let sym = Relationship::new(ObjectId::intern("s"), a, b, RELATES_TO);
        assert_eq!(sym.display_label(a), RELATES_TO);
        assert_eq!(sym.display_label(b), RELATES_TO);
    }

    #[test]
    fn display_label_inverse_pair_is_symmetric() {
        let a = ObjectId::intern("a");
        let b = ObjectId::intern("b");
        let rel = Relationship::new(ObjectId::intern("r"), a, b, BELONGS_TO);
        assert_eq!(rel.display_label(b), CONTAINS);
    }

    #[test]
    fn dense_order_check() {
        assert!(doc_with(&[]).is_densely_ordered());
        assert!(doc_with(&[("a", 0), ("b", 1)]).is_densely_ordered());
        assert!(doc_with(&[("b", 1), ("a", 0)]).is_densely_ordered());
        assert!(!doc_with(&[("a", 0), ("b", 2)]).is_densely_ordered());
        assert!(!doc_with(&[("a", 1), ("b", 1)]).is_densely_ordered());
    }

    #[test]
    fn entities_in_order_sorts_by_rank() {
        let doc = doc_with(&[("b", 1), ("a", 0), ("c", 2)]);
        let names: Vec<&str> = doc.entities_in_order().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn attr_type_parse() {
        assert_eq!(AttrType::parse("string"), Some(AttrType::String));
        assert_eq!(AttrType::parse("date"), Some(AttrType::Date));
        assert_eq!(AttrType::parse("uuid"), None);
    }
}
