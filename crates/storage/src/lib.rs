#![forbid(unsafe_code)]

//! SQLite-backed store for the social graph: directed relations with guarded
//! transitions, toggleable likes, and capped pins.

mod config;
mod store;

pub use config::*;
pub use store::*;
