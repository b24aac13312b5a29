//! GPU device + surface management.
//!
//! This module is responsible for:
//! - checking for a usable adapter before any window is opened
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering

mod adapter;
mod context;
mod frame;
mod init;
mod surface;

pub use adapter::{check_adapter, AdapterSummary};
pub use context::Gpu;
pub use frame::GpuFrame;
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
