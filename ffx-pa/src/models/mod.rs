//! Data models for pronunciation analysis

pub mod analysis;
pub mod raw;

pub use analysis::{
    round_score, AnalysisRequest, CefrScore, FeedbackResult, NormalizedResult, PhoneAggregate,
    PhoneResult, ResponseMetadata, SyllableResult, WordResult, NEEDS_WORK_THRESHOLD,
};
pub use raw::RawScoreResponse;
