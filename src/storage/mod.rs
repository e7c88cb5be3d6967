pub mod attachments;

pub use attachments::{AttachmentError, AttachmentStore, S3AttachmentStore};
