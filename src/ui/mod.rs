//! Terminal front-end pieces.
//!
//! - [`display`]: status lines and result tables
//! - [`progress`]: progress bar fed by engine reports
//! - [`prompt`]: password and confirmation dialogs

pub mod display;
pub mod progress;
pub mod prompt;
