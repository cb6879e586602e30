use crate::error::AppError;
use crate::storage::ObjectMetadata;
use crate::utils::state::AppState;
use axum::body::{Body, to_bytes};
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::Json;
use axum::response::{IntoResponse, Response};
use common::{
    DeletedObject, SuccessResponse, UploadedObject, content_type_for, encode_component,
    validate_key,
};
use http_body_util::LengthLimitError;
use std::error::Error;
use std::sync::Arc;

/// GET /<key>
pub async fn get_object_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let key = key_from(path)?;
    tracing::info!("Getting file: {key}");

    let object = state
        .storage
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(key.clone()))?;

    let content_type = object
        .metadata
        .content_type
        .as_deref()
        .unwrap_or_else(|| content_type_for(&key))
        .to_string();
    let filename = key.rsplit('/').next().unwrap_or(&key);

    let mut headers = HeaderMap::new();
    insert_header(&mut headers, header::CONTENT_TYPE, &content_type);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(object.info.size));
    insert_header(&mut headers, header::ETAG, &format!("\"{}\"", object.info.etag));
    insert_header(
        &mut headers,
        header::CONTENT_DISPOSITION,
        &format!("inline; filename=\"{}\"", encode_component(filename)),
    );

    tracing::info!(
        "Successfully retrieved file: {key} ({} bytes)",
        object.info.size
    );
    Ok((StatusCode::OK, headers, Body::from(object.body)).into_response())
}

/// PUT /<key>
pub async fn put_object_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, AppError> {
    let key = key_from(path)?;
    let limit = state.config.max_file_size;

    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(size) = declared.filter(|size| *size > limit) {
        return Err(AppError::PayloadTooLarge { size, limit });
    }

    tracing::info!("Uploading file: {key}");
    let read_limit = usize::try_from(limit).unwrap_or(usize::MAX);
    let bytes = to_bytes(body, read_limit).await.map_err(|err| {
        if err.source().is_some_and(|e| e.is::<LengthLimitError>()) {
            AppError::PayloadTooLarge {
                size: declared.unwrap_or(limit.saturating_add(1)),
                limit,
            }
        } else {
            AppError::from(err)
        }
    })?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| content_type_for(&key).to_string());

    let info = state
        .storage
        .put(
            &key,
            bytes,
            ObjectMetadata {
                content_type: Some(content_type),
            },
        )
        .await?;

    tracing::info!("Successfully uploaded file: {key} ({} bytes)", info.size);
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(
            format!("File uploaded successfully: {key}"),
            Some(UploadedObject {
                key,
                size: info.size,
            }),
        )),
    ))
}

/// DELETE /<key>
///
/// Succeeds whether or not the key existed.
pub async fn delete_object_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let key = key_from(path)?;
    tracing::info!("Deleting file: {key}");

    state.storage.delete(&key).await?;

    tracing::info!("Successfully deleted file: {key}");
    Ok(Json(SuccessResponse::new(
        format!("File deleted successfully: {key}"),
        Some(DeletedObject { key }),
    )))
}

/// OPTIONS on any path. Behind the CORS layer, which answers every OPTIONS
/// request itself, this is only reached by routers built without it.
pub async fn options_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// The key is the percent-decoded remainder of the path.
fn key_from(path: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    let Path(raw) = path.map_err(|e| AppError::BadRequest(e.body_text()))?;
    Ok(validate_key(&raw)?)
}

/// Values that are not valid header text are dropped.
fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!("dropping invalid {name} header value: {value}"),
    }
}
