//! Tag CRUD handlers. All of them sit behind the admin gate.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::auth::AuthUser;
use super::error::ApiError;
use super::types::{ApiResponse, Pagination, paginate};
use super::validation;
use super::AppState;
use crate::services::tag_service::TagDto;

#[derive(Debug, Deserialize)]
pub struct TagListQuery {
    pub page: Option<u64>,
    pub size: Option<u64>,
    pub order_by: Option<String>,
    pub order_dir: Option<String>,
    pub search: Option<String>,
}

/// `name` accepts either a single string or an array of strings, so one
/// request can create a whole batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name],
            Self::Many(names) => names,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: OneOrMany,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteBatchRequest {
    #[serde(default)]
    pub ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct TagListData {
    pub items: Vec<TagDto>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct DeleteBatchData {
    pub deleted: u64,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TagListQuery>,
) -> Result<(StatusCode, Json<ApiResponse<TagListData>>), ApiError> {
    let params = validation::validate_list_query(
        query.page,
        query.size,
        query.order_by.as_deref(),
        query.order_dir.as_deref(),
        query.search,
    )?;

    let (page, size) = (params.page, params.size);
    let result = state.tags.list(params).await?;

    let data = TagListData {
        pagination: paginate(result.total_items, page, size),
        items: result.items,
    };

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(200, "Hooray, here are your tags", data)),
    ))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ApiResponse<TagDto>>), ApiError> {
    let tag = state.tags.get(id).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(200, "Hooray, here's your tag", tag)),
    ))
}

pub async fn store(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<AuthUser>,
    Json(body): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<TagDto>>>), ApiError> {
    let names = body.name.into_vec();
    validation::validate_tag_names(&names)?;

    let created = state.tags.create(names, user.0).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            201,
            "Hooray, your tags have been created",
            created,
        )),
    ))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateTagRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TagDto>>), ApiError> {
    validation::validate_tag_names(std::slice::from_ref(&body.name))?;

    let updated = state.tags.update(id, &body.name, user.0).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            200,
            "Hooray, your tag has been updated",
            updated,
        )),
    ))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    state.tags.delete(id).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success_empty(
            200,
            "Hooray, your tag has been deleted",
        )),
    ))
}

pub async fn destroy_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeleteBatchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DeleteBatchData>>), ApiError> {
    validation::validate_ids(&body.ids)?;

    let deleted = state.tags.delete_batch(&body.ids).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            200,
            format!("Hooray, {deleted} tags have been deleted"),
            DeleteBatchData { deleted },
        )),
    ))
}
