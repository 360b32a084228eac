// Library interface for the PaceGrid pipeline
// This allows integration tests to access the core functionality

pub mod aggregate;
pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod models;
pub mod prepare;
pub mod selection;
pub mod store;
pub mod surface;

// Re-export commonly used types for convenience
pub use aggregate::SurfaceAggregator;
pub use config::{AppConfig, SurfaceConfig};
pub use error::{PaceGridError, Result};
pub use models::{CompositeSurface, PreparedSample, RawPoint, RunListing, SpeedSurface};
pub use prepare::TrackPreparer;
pub use selection::RunSelector;
pub use store::SurfaceStore;
pub use surface::SpeedSurfaceBuilder;
