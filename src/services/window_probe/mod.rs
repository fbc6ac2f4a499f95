//! WindowProbe: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for querying the focused
//! window (process name, process path, title) from the operating system.
//! All platform-specific and unsafe code lives here. It MUST NOT classify
//! windows or touch assets; that belongs to RuleSet and AssetCatalog.

mod dry_run;
#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
mod process;
#[cfg(target_os = "linux")]
mod sway;
#[cfg(windows)]
mod win32;
#[cfg(target_os = "linux")]
mod xdotool;
mod r#trait;

pub use self::r#trait::{create_window_probe, WindowProbe};
#[cfg(test)]
pub use self::r#trait::NullProbe;
