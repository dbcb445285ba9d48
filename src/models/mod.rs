//! Shared data models spanning capture, dispatch and presentation.

pub mod analysis;

pub use analysis::{
    AnalysisMode, AnalysisRequest, AnalysisResult, Direction, ModelVerdict, RawModelReply,
    Timeframe, ValidationError, Verdict,
};
