pub mod config;
pub mod error;
pub mod interval;

pub use config::{AnalysisConfig, ExcludeMode};
pub use error::{Error, TextRange};
pub use interval::RangeSet;
