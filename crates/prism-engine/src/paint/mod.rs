//! Color model shared by the scene and the passes.

pub mod color;

pub use color::Color;
