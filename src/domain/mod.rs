//! Domain model
pub mod aggregates;
pub mod events;
pub mod patch;
pub mod value_objects;
