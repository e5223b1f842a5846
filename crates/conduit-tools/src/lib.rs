pub mod capability;
pub mod command;
pub mod error;
pub mod filesystem;

pub use capability::{Capability, CapabilitySet};
pub use command::CommandCapability;
pub use error::CapabilityError;
pub use filesystem::{filesystem_capabilities, FilesystemTool, FsOperation, Workspace};

use std::sync::Arc;

use conduit_models::config::ToolsConfig;

/// Build the capability set described by configuration.
pub fn build_capability_set(config: &ToolsConfig) -> Result<CapabilitySet, CapabilityError> {
    let mut set = CapabilitySet::new();

    if let Some(fs_config) = &config.filesystem {
        for capability in filesystem_capabilities(fs_config)? {
            set.register(capability)?;
        }
    }

    for command in &config.commands {
        set.register(Arc::new(CommandCapability::from_config(command)))?;
    }

    Ok(set)
}
