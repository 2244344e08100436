//! Utilities shared by the stitching workspace: the 2D pixel buffer and
//! logging setup.

pub mod buffer2;
pub mod log_setup;

pub use buffer2::Buffer2;
