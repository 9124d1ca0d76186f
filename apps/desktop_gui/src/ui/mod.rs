//! UI layer for desktop GUI: app shell and the Counter and Posts views.

pub mod app;

pub use app::{DesktopGuiApp, StartupConfig};
