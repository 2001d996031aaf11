use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use serde_json::Value;

use snipaudit_core::error::CoreError;
use snipaudit_core::{default_submitted_at, now_processed_at, should_invoke, ProcessedEntry};

use crate::state::AppState;

/// GET / 的静态用法提示
pub async fn usage() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "POST a JSON body with a source_code field to analyze a snippet",
        "fields": {
            "source_code": "required, the code to analyze",
            "agent_id": "optional identifier",
            "agent_name": "optional display name",
            "description": "optional free text",
            "file_path": "optional origin path",
            "dependencies": "optional array of strings",
            "timestamp": "optional, yyyymmdd_hhmmss convention"
        }
    }))
}

pub async fn process_submission(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    // 1. Content-Type 必须是 JSON 媒体类型
    if !is_json_content_type(&req) {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Content-Type must be application/json"
        }));
    }

    // 2. 空请求体直接拒绝
    if body.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Request body is empty"
        }));
    }

    // 3. 解析 JSON
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!("Malformed JSON body: {}", e)
            }));
        }
    };

    // 4. 必须是对象并带 source_code 字段
    let payload = match payload.as_object() {
        Some(object) => object,
        None => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Request body must be a JSON object"
            }));
        }
    };

    let source_code = match payload.get("source_code").and_then(|v| v.as_str()) {
        Some(code) => code.to_string(),
        None => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Missing required field: source_code"
            }));
        }
    };

    let submission = Submission::from_payload(payload, source_code);

    // 5-7. 扫描、增强、持久化；任何内部失败统一报 500
    match analyze_and_store(&state, submission).await {
        Ok(entry) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": format!("Processed submission with {} findings", entry.findings.len()),
            "processed_entry": entry
        })),
        Err(e) => {
            tracing::error!("Failed to process submission: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to process submission",
                "details": e.to_string()
            }))
        }
    }
}

/// DELETE / 无条件清空两份会话文档
pub async fn clear_session(state: web::Data<AppState>) -> impl Responder {
    let store = state.store.lock().await;
    match store.clear() {
        Ok(()) => {
            tracing::info!("Session logs cleared");
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Session logs cleared"
            }))
        }
        Err(e) => {
            tracing::error!("Failed to clear session logs: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to clear session logs",
                "details": e.to_string()
            }))
        }
    }
}

/// 校验后的提交内容，缺省值在这里补齐
struct Submission {
    agent_id: String,
    agent_name: String,
    source_code: String,
    description: String,
    file_path: String,
    dependencies: Vec<String>,
    submitted_at: String,
}

impl Submission {
    fn from_payload(payload: &serde_json::Map<String, Value>, source_code: String) -> Self {
        let text = |key: &str, default: &str| {
            payload
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or(default)
                .to_string()
        };

        // dependencies 不是数组时按空处理，数组里的非字符串元素跳过
        let dependencies = payload
            .get("dependencies")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let submitted_at = payload
            .get("timestamp")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(default_submitted_at);

        Self {
            agent_id: text("agent_id", "unknown"),
            agent_name: text("agent_name", "Unknown Agent"),
            source_code,
            description: text("description", ""),
            file_path: text("file_path", ""),
            dependencies,
            submitted_at,
        }
    }
}

async fn analyze_and_store(
    state: &AppState,
    submission: Submission,
) -> Result<ProcessedEntry, CoreError> {
    let store = state.store.lock().await;

    // 工作流边界：时间戳前缀变化时清空会话
    let entries = store.load_entries();
    if store.should_reset(entries.last(), &submission.submitted_at) {
        tracing::info!("Workflow boundary detected, resetting session log");
        store.reset()?;
    }

    // 行启发式扫描在前，创造性发现固定追加在末尾
    let mut findings = state.scanner.scan(&submission.source_code);
    if should_invoke(state.settings.creative_probability) {
        if let Some(extra) = state.augmenter.creative_finding(&submission.source_code).await {
            tracing::debug!(
                "Augmenter {} contributed: {}",
                state.augmenter.name(),
                extra.title
            );
            findings.push(extra);
        }
    }

    let entry = ProcessedEntry {
        agent_id: submission.agent_id,
        agent_name: submission.agent_name,
        source_code: submission.source_code,
        description: submission.description,
        file_path: submission.file_path,
        dependencies: submission.dependencies,
        submitted_at: submission.submitted_at,
        processed_at: now_processed_at(),
        findings,
    };

    let total = store.append(entry.clone())?;
    store.append_log(format!(
        "{} processed submission from {} with {} findings ({} entries in session)",
        entry.processed_at,
        entry.agent_name,
        entry.findings.len(),
        total
    ))?;

    Ok(entry)
}

fn is_json_content_type(req: &HttpRequest) -> bool {
    match req.content_type().parse::<mime::Mime>() {
        Ok(m) => {
            m.type_() == mime::APPLICATION
                && (m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
        }
        Err(_) => false,
    }
}
