//! Core business logic for quill-rs.

pub mod content;
pub mod services;
pub mod slug;

pub use services::*;
