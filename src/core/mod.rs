pub mod download;
pub mod engine;
pub mod ipc;
pub mod models3d;
pub mod workspace;

pub use crate::domain::model::{ConversionOptions, TargetReport, Variant, VariantSource};
pub use crate::domain::ports::{Converter, Fetcher, Target};
pub use crate::utils::error::Result;
pub use download::ensure_downloaded;
pub use workspace::{clear_subdirectories, rebuild_output_dir};
