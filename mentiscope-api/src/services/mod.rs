//! Outbound integrations and the analysis pipeline

pub mod analysis;
pub mod llm_client;
pub mod prompt;
pub mod support_client;

pub use analysis::{analyze_assessment, AnalysisError, AnalysisOutcome, AnalysisSummary};
pub use llm_client::{AnalysisProvider, LlmError, OpenRouterClient};
pub use support_client::{SupportClient, SupportError};
