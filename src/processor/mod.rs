pub mod job;
pub mod pipeline;

pub use self::job::AnalyzerKind;
pub use self::pipeline::{AnalysisEngine, AnalysisReport};
