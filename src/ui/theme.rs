//! Color theme constants for the EMS TUI
//!
//! Defines the minimal dark color palette used throughout the UI.

use ratatui::style::Color;

/// Primary border color - dark gray for minimal aesthetic
pub const COLOR_BORDER: Color = Color::DarkGray;

/// Header text color - white
pub const COLOR_HEADER: Color = Color::White;

/// Dim text for less important info
pub const COLOR_DIM: Color = Color::DarkGray;

/// Streaming cursor and active elements - bright green
pub const COLOR_ACTIVE: Color = Color::LightGreen;

/// Terminal error state - red
pub const COLOR_ERROR: Color = Color::Red;

/// Skeleton placeholder bars shown while the first fragment is pending
pub const COLOR_SKELETON: Color = Color::Rgb(40, 40, 50);
