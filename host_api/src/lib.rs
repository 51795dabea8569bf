//! # Host API
//!
//! The surface the script event core calls into: block access, sound playback
//! and the console. This crate owns no scheduling logic; it only describes what
//! the host offers and ships a buffered implementation of it.

pub mod audio;
pub mod host;
pub mod vector;
pub mod world;

pub use audio::*;
pub use host::*;
pub use vector::*;
pub use world::*;
