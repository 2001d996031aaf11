use std::env;

/// 运行配置，全部来自环境变量，缺省时取默认值
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_address: String,
    pub entries_path: String,
    pub logs_path: String,
    pub llm_endpoint: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    /// 每个请求触发增强器的独立概率，夹取到 [0, 1]
    pub creative_probability: f64,
}

impl Settings {
    pub fn from_env() -> Self {
        let creative_probability = env::var("SNIPAUDIT_CREATIVE_PROBABILITY")
            .ok()
            .and_then(|value| value.parse::<f64>().ok())
            .unwrap_or(0.5)
            .clamp(0.0, 1.0);

        let llm_timeout_secs = env::var("SNIPAUDIT_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(10);

        Self {
            bind_address: env_or("SNIPAUDIT_BIND", "0.0.0.0:8000"),
            entries_path: env_or("SNIPAUDIT_ENTRIES_FILE", "./data/processed_entries.json"),
            logs_path: env_or("SNIPAUDIT_LOGS_FILE", "./data/session_logs.json"),
            llm_endpoint: env_or("SNIPAUDIT_LLM_ENDPOINT", "http://localhost:11434"),
            llm_model: env_or("SNIPAUDIT_LLM_MODEL", "qwen2.5-coder:7b"),
            llm_timeout_secs,
            creative_probability,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
