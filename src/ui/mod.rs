//! Ratatui browser over a [`crate::Library`]: one tab per extent, a list
//! with a detail pane, and a handful of actions on loans and reservations.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
