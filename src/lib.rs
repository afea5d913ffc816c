pub mod algo;
pub mod config;
pub mod error;
pub mod ops;

#[cfg(feature = "mcp")]
pub mod mcp;

#[cfg(feature = "plugin")]
pub mod commands;

pub use algo::dataset::{assemble, assemble_with, Dataset, FieldDescriptor, Schema};
pub use algo::document::{ObjectId, RawValue};
pub use algo::flatten::{FlattenDepth, NormalizedRow};
pub use algo::infer::FieldType;
pub use config::DatasetConfig;
pub use error::DatasetError;

#[cfg(feature = "plugin")]
use nu_plugin::{Plugin, PluginCommand};

#[cfg(feature = "plugin")]
pub struct DatasetPlugin;

#[cfg(feature = "plugin")]
impl Plugin for DatasetPlugin {
    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").into()
    }

    fn commands(&self) -> Vec<Box<dyn PluginCommand<Plugin = Self>>> {
        vec![
            Box::new(commands::Infer),
            Box::new(commands::Flatten),
            Box::new(commands::Profile),
        ]
    }
}
