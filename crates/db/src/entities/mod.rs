//! Database entities.

#![allow(missing_docs)]

pub mod comment;
pub mod group;
pub mod group_member;
pub mod item;
pub mod item_type;
pub mod user;
pub mod workflow;

pub use comment::Entity as Comment;
pub use group::Entity as Group;
pub use group_member::Entity as GroupMember;
pub use item::Entity as Item;
pub use item_type::{Entity as ItemType, ItemKind};
pub use user::Entity as User;
pub use workflow::WorkflowStatus;
