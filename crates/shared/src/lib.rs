//! Types shared between the blog client, the desktop GUI and the CLI.

pub mod counter;
pub mod domain;
pub mod error;
pub mod protocol;
