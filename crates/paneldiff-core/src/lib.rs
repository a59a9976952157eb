#![forbid(unsafe_code)]

//! Core primitives for the paneldiff engine: rectangle and region
//! algebra plus the logging facade.
//!
//! This crate is dependency-light on purpose. The diff engine in
//! `paneldiff-render` builds on these types; nothing here performs I/O.

pub mod geometry;
pub mod logging;

pub use geometry::{Rect, Region};
