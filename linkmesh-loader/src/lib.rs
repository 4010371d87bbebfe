pub mod error;
pub mod loader;
pub mod record;

pub use error::LoadError;
pub use loader::{ExportLoader, LoadProgressCallback};
pub use record::{LoadSummary, LoadedExports, PerformanceRow};
