mod locator;
mod source;
mod types;
#[cfg(test)]
mod tests;

pub use locator::StreamLocator;
pub use source::{default_cameras, load_from_file, log_summary, ConfigSource, SourceKind};
pub use types::{ensure_unique, validate_set, CameraConfig};
