pub mod asset;
pub mod window;

pub use asset::{AssetChangeEvent, AssetDescriptor, MediaType, OVERRIDE_CATEGORY};
pub use window::WindowInfo;
