//! Business logic services.

#![allow(missing_docs)]

pub mod group;
pub mod item;
pub mod limits;
pub mod membership;
pub mod quota;
pub mod storage;
pub mod user;

pub use group::{
    CreateGroupInput, GroupDetails, GroupOption, GroupService, MemberView, MyGroup, VIEW_DENIED,
};
pub use item::{
    CommentInput, CommentView, FeedItem, HomeFeed, ItemContent, ItemPreview, ItemService,
    UpdateItemTypeLimitInput, UploadItemInput, UploadedFile,
};
pub use limits::UpdateLimitsInput;
pub use membership::{AddMemberInput, MembershipService, PendingMembership};
pub use quota::QuotaService;
pub use storage::{LocalStorage, StorageBackend, StorageService};
pub use user::{RegisterInput, Session, SignInInput, UserService};
