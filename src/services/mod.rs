pub mod asset_catalog;
pub mod context_engine;
pub mod display;
pub mod rule_set;
pub mod window_probe;

pub use asset_catalog::{AssetCatalog, AssetResolver};
pub use context_engine::ContextEngine;
pub use display::{ChannelSurface, DisplaySurface};
pub use rule_set::RuleSet;
pub use window_probe::{create_window_probe, WindowProbe};
#[cfg(test)]
pub use window_probe::NullProbe;
