pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod freepcb;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{ExternalConverter, HttpFetcher, NativeConverter};
pub use config::{BuildConfig, ConverterBackend};
pub use core::{engine::BuildEngine, ipc::IpcTarget, models3d::ModelsTarget};
pub use utils::error::{PcbLibError, Result};
