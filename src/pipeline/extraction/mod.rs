pub mod extractors;
pub mod normalize;
pub mod registry;
pub mod types;

pub use extractors::*;
pub use registry::*;
pub use types::*;

use thiserror::Error;

use crate::models::enums::SectionType;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Field extraction failed for {section}: {reason}")]
    Failed { section: SectionType, reason: String },

    #[error("Malformed extractor output: {0}")]
    Malformed(String),
}
