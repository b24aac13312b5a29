//! Prism engine crate.
//!
//! Platform and GPU runtime, a minimal 3D scene, and the post-processing
//! passes the demo switches between.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod render;
pub mod paint;
pub mod scene;
pub mod post;
