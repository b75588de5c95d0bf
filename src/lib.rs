//! Encounter Engine: choice and consequence resolution for narrative RPG encounters.
//!
//! Assembles a menu of choices from authored templates, projects how the
//! current situation modifies each choice, and applies the chosen one with
//! cascading threshold and combination effects.

pub mod core;
pub mod schema;
