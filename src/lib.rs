pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod grid;
pub mod month;
pub mod notes;
pub mod session;
pub mod ui;
