pub mod chat;
pub mod input;
pub mod viewer;

pub use chat::*;
pub use input::*;
pub use viewer::*;
