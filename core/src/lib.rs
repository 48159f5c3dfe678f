pub mod config;
pub mod error;

pub use config::{
    ConfigError, FormatterConfig, DEFAULT_PARTITION_OFFSET_BYTES, MAX_CLUSTER_BYTES,
    SUPPORTED_SECTOR_SIZES,
};
pub use error::{check_status, classify_io_error, ErrorKind, FormatterError, StatusCode};
