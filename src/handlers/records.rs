//! Resource tree handlers: databases, tables, record keys, records.

use crate::codec::{self, PathToken};
use crate::error::AppError;
use crate::record::{RecordKey, RecordValue};
use crate::response::{listing, single};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;

/// Characters that cannot appear raw inside one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

pub fn database_url(db: &str) -> String {
    format!("/{}", segment(db))
}

pub fn table_url(db: &str, table: &str) -> String {
    format!("/{}/{}", segment(db), segment(table))
}

/// The record token is percent-encoded; the `Path` extractor decodes it on the way back in.
pub fn record_url(db: &str, table: &str, key: &RecordKey) -> String {
    format!(
        "/{}/{}/{}",
        segment(db),
        segment(table),
        segment(codec::encode(key).as_str())
    )
}

fn location(url: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(url).map_err(|_| AppError::internal(format!("record path is not a valid header: {}", url)))
}

fn body_to_map(body: Result<Json<Value>, JsonRejection>) -> Result<RecordValue, AppError> {
    let Json(value) = body.map_err(|rejection| AppError::data_invalid(rejection.body_text()))?;
    match value {
        Value::Object(m) => Ok(m.into_iter().collect()),
        _ => Err(AppError::data_invalid("body must be a JSON object")),
    }
}

pub async fn list_databases(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let urls: Vec<String> = state
        .records
        .list_databases()
        .await?
        .iter()
        .map(|db| database_url(db.as_str()))
        .collect();
    Ok(listing(urls))
}

pub async fn list_tables(
    State(state): State<AppState>,
    Path(db): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let urls: Vec<String> = state
        .records
        .list_tables(&db)
        .await?
        .iter()
        .map(|table| table_url(&db, table))
        .collect();
    Ok(listing(urls))
}

pub async fn list_records(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let urls: Vec<String> = state
        .records
        .list_record_keys(&db, &table)
        .await?
        .iter()
        .map(|key| record_url(&db, &table, key))
        .collect();
    Ok(listing(urls))
}

pub async fn create(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = body_to_map(body)?;
    let key = state.records.create_record(&db, &table, &body).await?;
    let url = record_url(&db, &table, &key);
    let header = location(&url)?;
    Ok((StatusCode::CREATED, [(header::LOCATION, header)], single(url)))
}

pub async fn read(
    State(state): State<AppState>,
    Path((db, table, record)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let key = state.records.key_from_token(&db, &table, &PathToken::new(record)).await?;
    let row = state.records.get_record(&db, &table, &key).await?;
    Ok(single(row))
}

/// Replace a record. `Location` is set only when the update moved the record to a new key.
pub async fn update(
    State(state): State<AppState>,
    Path((db, table, record)): Path<(String, String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let token = PathToken::new(record);
    let key = state.records.key_from_token(&db, &table, &token).await?;
    let body = body_to_map(body)?;
    let new_key = state.records.update_record(&db, &table, &key, &body).await?;
    let url = record_url(&db, &table, &new_key);
    let mut response = single(url.clone()).into_response();
    if codec::encode(&new_key) != token {
        response.headers_mut().insert(header::LOCATION, location(&url)?);
    }
    Ok(response)
}

pub async fn delete(
    State(state): State<AppState>,
    Path((db, table, record)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let key = state.records.key_from_token(&db, &table, &PathToken::new(record)).await?;
    state.records.delete_record(&db, &table, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}
