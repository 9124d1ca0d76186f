//! Background worker that owns the blog service and runs remote calls off the UI thread.

pub mod commands;
pub mod runtime;
