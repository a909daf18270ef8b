//! Annotation model and path-quality metrics for labeled UI-interaction
//! datasets.
//!
//! An annotator marks on each screenshot of a recorded session where a
//! tap, multi-tap, long-press or slide happened. The records are kept in an
//! [`InteractionStore`] and turned into an ordered trajectory whose
//! inter-step pixel distances and leave-one-out quality scores are
//! computed by [`analyzer::analyze_dataset`].
//!
//! Every computation is a pure function of the store and the dataset's
//! image size; nothing is cached between calls.

pub mod analyzer;
pub mod config;
pub mod dataset;
pub mod error;
pub mod interaction;
pub mod metrics;
pub mod model;
pub mod renderer;
pub mod session;
pub mod store;
pub mod trajectory;

pub use error::{Error, Result};
pub use interaction::{grounding_text, normalize_click, retype_existing, upsert_point, ToolSettings};
pub use model::{AnchorPoint, Dimensions, InteractionRecord, InteractionType, Point, SlideStroke};
pub use store::InteractionStore;
