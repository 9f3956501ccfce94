//! Terminal output: theme, progress reporter and report tables.

pub mod output;
pub mod report;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
