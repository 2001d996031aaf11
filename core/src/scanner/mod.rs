// Scanner module - 扫描器模块
// 定义漏洞发现结果和行启发式扫描器

pub mod heuristics;

use serde::{Deserialize, Serialize};

pub use heuristics::HeuristicScanner;

/// 严重级别，固定四档
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// 从自由文本解析，大小写不敏感，四档之外一律拒绝
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// 漏洞发现结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// 1 起始的行号，整文件级别的发现没有行号
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub suggestion: String,
}
