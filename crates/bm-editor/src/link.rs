//! Two-click relationship creation tool.
//!
//! The tool is a small state machine driven by "entity clicked" events:
//! idle clicks select, the first click in link mode arms an anchor, and a
//! click on a second entity completes the edge. Tool state is transient —
//! it is never recorded in history.

use bm_core::id::ObjectId;

/// What one entity click means, given the current tool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkClick {
    /// Tool inactive — the click is a plain selection.
    Select(ObjectId),
    /// First endpoint chosen; waiting for the second.
    Armed(ObjectId),
    /// Second endpoint chosen — materialize the edge and leave link mode.
    Connect { from: ObjectId, to: ObjectId },
    /// Click on the anchor itself: no self-loops. The tool stays armed.
    Ignored,
}

/// The relationship-creation tool: Idle ⇄ Armed.
#[derive(Debug, Default)]
pub struct LinkTool {
    active: bool,
    anchor: Option<ObjectId>,
}

impl LinkTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn anchor(&self) -> Option<ObjectId> {
        self.anchor
    }

    /// Enter link mode with no anchor, or leave it. Returns the new
    /// active state.
    pub fn toggle(&mut self) -> bool {
        if self.active {
            self.cancel();
        } else {
            self.active = true;
        }
        self.active
    }

    /// Convenience direct entry: enter link mode already anchored at
    /// `entity` (equivalent to toggling then clicking it).
    pub fn arm_from(&mut self, entity: ObjectId) {
        self.active = true;
        self.anchor = Some(entity);
    }

    /// Feed one entity click through the state machine.
    pub fn click(&mut self, entity: ObjectId) -> LinkClick {
        if !self.active {
            return LinkClick::Select(entity);
        }
        match self.anchor {
            None => {
                self.anchor = Some(entity);
                LinkClick::Armed(entity)
            }
            Some(anchor) if anchor == entity => LinkClick::Ignored,
            Some(anchor) => {
                self.active = false;
                self.anchor = None;
                LinkClick::Connect {
                    from: anchor,
                    to: entity,
                }
            }
        }
    }

    /// Abandon the gesture: back to idle, anchor discarded. No document
    /// mutation, no history entry.
    pub fn cancel(&mut self) {
        self.active = false;
        self.anchor = None;
    }
}
