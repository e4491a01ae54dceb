use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use ragdoc_core::Error;
use ragdoc_llm::{compose_messages, last_user_message, normalize_messages, search_context, Provider, RawMessage};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const INVALID_MODEL: &str = "Invalid model name. Kindly select a valid AI model.";
pub const NOT_INITIALIZED: &str = "RAG pipeline is not initialized yet.";

/// GET /health
pub async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// Final path component of a client-supplied name, restricted to `[A-Za-z0-9._-]`.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let clean: String = last.chars().filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')).collect();
    if clean.is_empty() || clean.chars().all(|c| c == '.') { None } else { Some(clean) }
}

/// Write `data` under `dir` with a name unique to this upload, keeping the
/// sanitized name as prefix and its extension as suffix.
pub fn store_upload(dir: &Path, filename: &str, data: &[u8]) -> ragdoc_core::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{}", ext)),
        _ => (filename, String::new()),
    };
    let mut file = tempfile::Builder::new().prefix(&format!("{}-", stem)).suffix(&ext).tempfile_in(dir)?;
    file.write_all(data)?;
    let (_, path) = file.keep().map_err(|e| Error::Io(e.error))?;
    Ok(path)
}

/// POST /upload - store the document and make it the one questions are answered from
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<Value>> {
    let mut saved = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::bad_request(format!("invalid multipart body: {}", e)))? {
        if field.name() != Some("file") { continue; }
        let raw_name = field.file_name().unwrap_or_default().to_string();
        let filename = sanitize_filename(&raw_name).ok_or_else(|| ApiError::bad_request(format!("invalid file name '{}'", raw_name)))?;
        let data = field.bytes().await.map_err(|e| ApiError::bad_request(format!("failed to read upload: {}", e)))?;
        saved = Some((filename, data));
        break;
    }
    let (filename, data) = saved.ok_or_else(|| ApiError::bad_request("multipart field 'file' is required"))?;

    let dir = state.upload_dir().clone();
    let name = filename.clone();
    let bytes = data.len();
    let path = tokio::task::spawn_blocking(move || store_upload(&dir, &name, &data)).await??;
    tracing::info!(file = %filename, stored = %path.display(), bytes, "stored upload");

    let pipeline = state.pipeline().await?;
    let summary = tokio::task::spawn_blocking(move || pipeline.prepare(&path)).await??;
    tracing::info!(file = %filename, passages = summary.passages, "document prepared");

    Ok(Json(json!({ "status": "uploaded", "filename": filename, "passages": summary.passages })))
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    pub question: String,
}

/// POST /ask_rag - answer from the prepared document
pub async fn ask_rag(State(state): State<AppState>, Form(form): Form<AskForm>) -> ApiResult<Json<Value>> {
    let question = form.question.trim().to_string();
    if question.is_empty() { return Err(ApiError::bad_request("Question must not be empty.")); }
    let pipeline = state.current_pipeline().ok_or_else(|| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, NOT_INITIALIZED))?;

    let rag = &state.settings().rag;
    let top_k = rag.top_k;
    let q = question.clone();
    let prompt = tokio::task::spawn_blocking(move || pipeline.build_grounded_prompt(&q, top_k)).await??;

    let provider: Provider = rag.answer_provider.parse()?;
    let model = state.models().model(provider, &rag.answer_model, Some(rag.answer_temperature))?;
    let answer = model.answer(&prompt).await?;
    tracing::info!(provider = %provider, model = %rag.answer_model, "answered question");
    Ok(Json(json!({ "answer": answer })))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub model_name: String,
    pub model_provider: Provider,
    #[serde(default)]
    pub system_prompt: Option<String>,
    pub messages: Vec<RawMessage>,
    #[serde(default)]
    pub allow_search: bool,
}

/// POST /chat - free-form chat with an allowed hosted model
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> ApiResult<Json<Value>> {
    if !state.settings().server.allowed_models.iter().any(|m| m == &request.model_name) {
        return Err(ApiError::bad_request(INVALID_MODEL));
    }
    let conversation = normalize_messages(request.messages)?;

    let mut context = None;
    if request.allow_search {
        if let (Some(search), Some(query)) = (state.web_search(), last_user_message(&conversation)) {
            match search.search(query).await {
                Ok(results) => context = search_context(&results),
                Err(e) => tracing::warn!(error = %e, "web search failed; answering without it"),
            }
        }
    }

    let messages = compose_messages(request.system_prompt.as_deref().unwrap_or_default(), context, conversation);
    let model = state.models().model(request.model_provider, &request.model_name, None)?;
    let answer = model.complete(&messages).await?;
    Ok(Json(json!({ "answer": answer })))
}
