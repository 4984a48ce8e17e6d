//! Document summarization pipeline: chunking, map-reduce summarization, and orchestration.

pub mod chunking;
mod service;
pub mod summarize;
pub mod types;

pub use service::{SummarizeApi, SummaryPipeline};
pub use summarize::{HierarchicalSummarizer, SummarizerSettings};
pub use types::{LengthTier, PipelineError, PipelineResult, SummaryOutcome};
