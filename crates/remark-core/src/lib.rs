pub mod comment;
pub mod content_type;
pub mod context;
pub mod error;
pub mod read_receipt;
pub mod task_status;
pub mod view;

pub use comment::{Comment, CreateComment};
pub use content_type::{AttachmentFormat, ContentType};
pub use error::RemarkError;
pub use read_receipt::ReadReceipt;
pub use task_status::TaskStatus;
pub use view::{CommentView, PersonView};
