use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::{Config, RegistrationMode};
use crate::db::NocRecord;
use crate::error::{AppError, Result};
use crate::identifier::is_noc_number;
use crate::registration::{Application, PhotoUpload, RegistrationForm};
use crate::state::AppState;
use crate::storage::AssetBody;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;

pub async fn register_noc(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response> {
    let form = read_form(multipart).await?;
    let application = Application::validate(form)?;
    let verify_base = verify_base(&state.config, &headers);

    match state.config.registration_mode {
        RegistrationMode::Sync => {
            let record = state.pipeline.register(application, verify_base).await?;
            Ok((
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "message": "NOC registered successfully",
                    "nocId": record.noc_number
                })),
            )
                .into_response())
        }
        RegistrationMode::FastAck => {
            let registration = state.pipeline.assign(application, verify_base);
            let noc_id = registration.noc_number.clone();
            // Failures past this point are only visible in the logs.
            state.pipeline.spawn(registration);
            Ok((
                StatusCode::ACCEPTED,
                Json(serde_json::json!({
                    "message": "NOC registration accepted",
                    "nocId": noc_id,
                    "status": "processing"
                })),
            )
                .into_response())
        }
    }
}

async fn read_form(mut multipart: Multipart) -> Result<RegistrationForm> {
    let mut form = RegistrationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("File upload error: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "photo" {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("File upload error: {}", e.body_text())))?;
            form.photo = Some(PhotoUpload {
                data: data.to_vec(),
                content_type,
            });
        } else if !name.is_empty() {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("File upload error: {}", e.body_text())))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

/// Scheme and host for verification links, as the client reached us.
fn verify_base(config: &Config, headers: &HeaderMap) -> String {
    if let Some(base) = &config.public_base_url {
        return base.clone();
    }
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}:{}", config.host, config.port));
    format!("{}://{}", scheme, host)
}

pub async fn get_qr_code(
    State(state): State<Arc<AppState>>,
    Path(noc_id): Path<String>,
) -> Result<Response> {
    let record = find_noc(&state, &noc_id).await?;
    serve_asset(&state, &record.qr_code_url).await
}

pub async fn download_pdf(
    State(state): State<Arc<AppState>>,
    Path(noc_id): Path<String>,
) -> Result<Response> {
    let record = find_noc(&state, &noc_id).await?;
    let pdf_url = record
        .pdf_url
        .ok_or_else(|| AppError::NotFound("NOC certificate not available".to_string()))?;
    serve_asset(&state, &pdf_url).await
}

async fn find_noc(state: &AppState, noc_id: &str) -> Result<NocRecord> {
    if !is_noc_number(noc_id) {
        return Err(AppError::NotFound("NOC not found".to_string()));
    }
    state
        .records
        .find_by_number(noc_id)
        .await?
        .ok_or_else(|| AppError::NotFound("NOC not found".to_string()))
}

async fn serve_asset(state: &AppState, location: &str) -> Result<Response> {
    match state.assets.fetch(location).await? {
        AssetBody::Bytes { content_type, data } => {
            Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
        }
        AssetBody::Redirect(url) => Ok(Redirect::temporary(&url).into_response()),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<String>,
    limit: Option<String>,
}

/// Lenient paging: anything that is not a positive integer falls back to the default.
fn positive_or(value: Option<&str>, default: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

pub async fn list_nocs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>> {
    let page = positive_or(params.page.as_deref(), DEFAULT_PAGE);
    let limit = positive_or(params.limit.as_deref(), DEFAULT_LIMIT);

    let (data, total) = state.records.list(page, limit).await?;
    let total_pages = (total + i64::from(limit) - 1) / i64::from(limit);

    Ok(Json(serde_json::json!({
        "message": "NOC details fetched successfully",
        "data": data,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "totalPages": total_pages
        }
    })))
}
