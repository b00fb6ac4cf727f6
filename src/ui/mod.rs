//! UI rendering modules for the EMS TUI.

pub mod insights;
pub mod theme;

pub use insights::render_insights;
