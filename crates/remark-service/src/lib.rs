mod attachments;
mod local;
mod receipts;
mod serializer;
mod traits;
mod upload;

pub use attachments::{AttachmentProcessor, Converted};
pub use local::LocalCommentService;
pub use receipts::ReadReceiptTracker;
pub use serializer::CommentSerializer;
pub use traits::{CommentService, ServiceError};
pub use upload::Upload;

/// MIME type reported for WAV attachments without sniffing.
pub const WAV_MIME_TYPE: &str = "audio/wav; charset:binary";
