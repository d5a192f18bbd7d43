//! Data models shared by the operation waiter and compute workflows

mod image;
mod operation;

pub use image::*;
pub use operation::*;
