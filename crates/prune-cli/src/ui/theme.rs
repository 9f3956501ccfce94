//! UI Theme - Design system constants
//!
//! Colors, icons and column widths used by progress lines and the final
//! report, kept in one place so both stay visually consistent.

use chrono::{DateTime, Utc};
use crossterm::style::Color;

/// Default theme for prune output
#[derive(Debug, Clone, Default)]
pub struct Theme {
    /// Colors for different UI elements
    pub colors: ColorScheme,
    /// Status icons
    pub icons: Icons,
    /// Table layout constants
    pub layout: Layout,
}

/// Color scheme for UI elements
#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Package names (primary content)
    pub package_name: Color,
    /// Version numbers
    pub version: Color,
    /// Sizes, dates and secondary info
    pub secondary: Color,
    /// Headers and labels
    pub header: Color,
    /// Success states
    pub success: Color,
    /// Warning states
    pub warning: Color,
    /// Error states
    pub error: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            package_name: Color::Cyan,
            version: Color::White,
            secondary: Color::DarkGrey,
            header: Color::DarkGrey,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
        }
    }
}

/// Status icons for different states
#[derive(Debug, Clone)]
pub struct Icons {
    /// Pending/queued state (○)
    pub pending: &'static str,
    /// Active/in-progress state (●)
    pub active: &'static str,
    /// Success/completed state (✓)
    pub success: &'static str,
    /// Error/failed state (✗)
    pub error: &'static str,
    /// Warning state (⚠)
    pub warning: &'static str,
    /// Info state (ℹ)
    pub info: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            pending: "○",
            active: "●",
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
        }
    }
}

/// Table layout constants
#[derive(Debug, Clone)]
pub struct Layout {
    /// Width allocated for package name column
    pub name_width: usize,
    /// Width allocated for version column
    pub version_width: usize,
    /// Width allocated for size column
    pub size_width: usize,
    /// Width allocated for last-used column
    pub date_width: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            name_width: 20,
            version_width: 12,
            size_width: 10,
            date_width: 10,
        }
    }
}

/// Format bytes for human-readable display
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if kb >= 1024.0 {
        format!("{mb:.1} MB")
    } else if kb >= 1.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{bytes} B")
    }
}

/// Format a last-used timestamp; `never` when absent
pub fn format_last_used(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "never".into(), |t| t.format("%Y-%m-%d").to_string())
}
