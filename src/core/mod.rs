pub mod completion;
pub mod conversation;
pub mod session;
pub mod transcript;
pub mod video_id;

pub use completion::*;
pub use conversation::*;
pub use session::*;
pub use transcript::*;
pub use video_id::*;
