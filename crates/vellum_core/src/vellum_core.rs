//! # Core geometry types for Vellum
//!
//! This crate provides the shared geometric vocabulary used throughout
//! the Vellum canvas: 2D affine matrices, axis-aligned bounds, and
//! paint color parsing.

pub mod bounds;
pub mod color;
pub mod matrix;

pub use bounds::Bounds;
pub use matrix::{Decomposed, Matrix};
