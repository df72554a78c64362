//! Shared vocabulary for the Pilot agent runtime.
//!
//! Every crate in the workspace speaks in these types: the closed [`Action`]
//! alphabet, decision/history records, perception snapshots, and display
//! geometry. This crate holds data only; behavior lives with the owning
//! subsystems.

pub mod action;
pub mod display;
pub mod perception;

pub use action::*;
pub use display::*;
pub use perception::*;
