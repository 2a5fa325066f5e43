//! The message-feed rendering engine: windowing, grouping and the derived
//! per-message display attributes.

pub mod edits;
pub mod format;
pub mod group;
pub mod merge;
pub mod recipient;
pub mod visibility;
pub mod window;

pub use edits::{classify_edit_position, classify_moved, is_resolve_toggle, EditPosition};
pub use group::{
    build_message_groups, FeedContext, GroupId, GroupIdAllocator, MessageContainer, MessageGroup,
};
pub use merge::{Edge, GroupList, MergeDiff};
pub use recipient::RecipientKey;
pub use visibility::apply_visibility;
pub use window::{RenderWindow, WindowManager};
