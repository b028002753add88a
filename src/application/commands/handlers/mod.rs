//! Command Handlers

mod task_command_handlers;

pub use task_command_handlers::{CancelTaskHandler, StartOverHandler, SubmitUploadHandler};
