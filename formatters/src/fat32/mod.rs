// FAT32 module - geometry and the formatting session

pub mod context;
pub mod geometry;
pub mod session;

pub use context::Fat32Context;
pub use geometry::{
    compute_layout, compute_layout_with, FormatPlan, GeometryError, GeometryOptions, Layout,
};
pub use session::{FormatStep, SessionProgress, SessionReport};
