// SnipAudit Core Library
// 核心功能库，包含行启发式扫描器、创造性发现增强器和会话存储

pub mod llm;
pub mod scanner;
pub mod store;

// 重新导出常用类型
pub use llm::response::{extract_json_from_response, parse_creative_finding, ParseError};
pub use llm::{should_invoke, Augmenter, LlmAugmenter};
pub use scanner::{Finding, HeuristicScanner, Severity};
pub use store::{
    default_submitted_at, now_processed_at, workflow_id, ProcessedEntry, SessionStore,
    SESSION_CAPACITY,
};

pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum CoreError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Serialization error: {0}")]
        Serialize(#[from] serde_json::Error),
    }

    pub type Result<T> = std::result::Result<T, CoreError>;
}
