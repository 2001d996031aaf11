// Session store - 会话存储
// 两份 JSON 文档的整文件读-改-写，带工作流边界重置和容量上限

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scanner::Finding;

/// 会话日志容量上限，超出时丢弃最旧的条目
pub const SESSION_CAPACITY: usize = 100;

/// 工作流标识取时间戳前 15 个字符（约定格式如 20250523_185214）
///
/// 时间戳不足 15 个字符时整串就是标识。
pub fn workflow_id(timestamp: &str) -> &str {
    match timestamp.char_indices().nth(15) {
        Some((idx, _)) => &timestamp[..idx],
        None => timestamp,
    }
}

/// 提交时间缺省值，遵循工作流时间戳约定（正好 15 个字符）
pub fn default_submitted_at() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// 处理完成时间，条目入库时打点
pub fn now_processed_at() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 一次已处理的提交，入库后不再修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedEntry {
    pub agent_id: String,
    pub agent_name: String,
    pub source_code: String,
    pub description: String,
    pub file_path: String,
    pub dependencies: Vec<String>,
    pub submitted_at: String,
    pub processed_at: String,
    pub findings: Vec<Finding>,
}

impl ProcessedEntry {
    pub fn workflow_id(&self) -> &str {
        workflow_id(&self.submitted_at)
    }
}

/// 文件路径由调用方注入，测试可指向临时目录
pub struct SessionStore {
    entries_path: PathBuf,
    logs_path: PathBuf,
}

impl SessionStore {
    pub fn new(entries_path: impl Into<PathBuf>, logs_path: impl Into<PathBuf>) -> Self {
        Self {
            entries_path: entries_path.into(),
            logs_path: logs_path.into(),
        }
    }

    /// 读取条目日志，文件缺失或内容损坏都按空日志处理
    pub fn load_entries(&self) -> Vec<ProcessedEntry> {
        read_array(&self.entries_path)
    }

    pub fn load_logs(&self) -> Vec<String> {
        read_array(&self.logs_path)
    }

    /// 上一条目的工作流标识与新提交不同时需要重置
    ///
    /// 首条提交（日志为空）不触发重置。
    pub fn should_reset(&self, previous: Option<&ProcessedEntry>, submitted_at: &str) -> bool {
        match previous {
            Some(entry) => entry.workflow_id() != workflow_id(submitted_at),
            None => false,
        }
    }

    /// 工作流边界重置，两份文档都清空
    pub fn reset(&self) -> Result<()> {
        write_array::<ProcessedEntry>(&self.entries_path, &[])?;
        write_array::<String>(&self.logs_path, &[])
    }

    /// 追加一条条目并持久化，超出容量先淘汰最旧的
    pub fn append(&self, entry: ProcessedEntry) -> Result<usize> {
        let mut entries = self.load_entries();
        entries.push(entry);
        if entries.len() > SESSION_CAPACITY {
            let excess = entries.len() - SESSION_CAPACITY;
            entries.drain(..excess);
        }
        write_array(&self.entries_path, &entries)?;
        Ok(entries.len())
    }

    /// 向第二份文档追加一行诊断记录，容量规则与条目日志一致
    pub fn append_log(&self, line: impl Into<String>) -> Result<usize> {
        let mut logs = self.load_logs();
        logs.push(line.into());
        if logs.len() > SESSION_CAPACITY {
            let excess = logs.len() - SESSION_CAPACITY;
            logs.drain(..excess);
        }
        write_array(&self.logs_path, &logs)?;
        Ok(logs.len())
    }

    /// 无条件清空两份文档，与工作流边界无关
    pub fn clear(&self) -> Result<()> {
        self.reset()
    }
}

fn read_array<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Vec::new(),
    };

    match serde_json::from_str(&content) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Unparsable log at {:?}, treating as empty: {}", path, e);
            Vec::new()
        }
    }
}

fn write_array<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(items)?;
    fs::write(path, content)?;
    Ok(())
}
