//! Repository layer for database operations.

pub mod comment;
pub mod group;
pub mod item;
pub mod item_type;
pub mod user;

pub use comment::CommentRepository;
pub use group::GroupRepository;
pub use item::{ItemRepository, Usage};
pub use item_type::ItemTypeRepository;
pub use user::UserRepository;
