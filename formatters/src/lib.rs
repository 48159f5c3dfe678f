pub mod fat32;
pub mod fat_common;
pub mod partitioner;

pub use fat32::{
    compute_layout, compute_layout_with, Fat32Context, FormatPlan, FormatStep, GeometryError,
    GeometryOptions, Layout, SessionReport,
};
pub use sdformat_core::{ErrorKind, FormatterConfig, FormatterError};
