pub mod engine;
pub mod history;
pub mod link;
pub mod shortcuts;
pub mod workspace;

pub use engine::{EntityPatch, Mutation, apply};
pub use history::History;
pub use link::{LinkClick, LinkTool};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use workspace::{AttributeEdit, Workspace};
