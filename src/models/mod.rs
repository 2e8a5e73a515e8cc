pub mod append_request;
pub mod message;

pub use append_request::{AppendRequest, TrimPolicy};
pub use message::{FieldValue, Message};
