pub mod attachment;
pub mod collection;
pub mod item;
pub mod upload;

pub use attachment::{
    AttachmentKind, AttachmentRequest, AttachmentResult, AttachmentStatus, FetchedContent,
};
pub use collection::Collection;
pub use item::{ItemDraft, ItemType};
pub use upload::{ContentFingerprint, UploadAuthorization, UploadOutcome, UploadSession, UploadTarget};
