// mapbridge library entry point.
// Keeps a host UI tree and a native map surface in step: child composition
// on one side, command dispatch and callback correlation on the other.

pub mod bridge;
pub mod composer;
pub mod config;
pub mod error;
pub mod headless;
pub mod logging;
pub mod replay;

// Re-export commonly used types
pub use bridge::{BridgeEvent, CallbackToken, Command, CommandBridge, CommandId, MapSurface};
pub use composer::{ChildComposer, ChildEntry, ChildKind, ChildListener, SceneGraph, SurfaceId};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install logging according to `config`. Safe to call more than once.
pub fn init(config: &BridgeConfig) {
    logging::init(&config.log_level);
    log::info!("[{}] bridge v{} ready", logging::TAG, VERSION);
}

pub fn version() -> String {
    format!("mapbridge v{}", VERSION)
}
