//! Section segmentation: header detection, match confidence and the
//! fallback extension point.

pub mod confidence;
pub mod detector;
pub mod fallback;
pub mod types;

pub use detector::SectionDetector;
pub use fallback::{FallbackMatcher, HeadingShapeFallback};
pub use types::{MatchKind, Section, SectionMatch};
