//! Blog handlers
//!
//! Reads are public; writes need the Blogger tier and deletion is
//! SuperAdmin-only. The backend signals a rejected write with a path of
//! `"*"` and a missing blog with an empty path.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    error::ApiError,
    grpc_clients::blog,
    middleware::Role,
    models::{BlogListResponse, BlogRequest, BlogResponse, BlogUpdateRequest},
    server::AppState,
};

use super::backend_error;

const REJECTED_PATH: &str = "*";

#[derive(Debug, Deserialize)]
pub struct BlogRefQuery {
    pub language: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct BlogListQuery {
    pub language: String,
}

/// POST /blog  (Blogger)
pub async fn add_blog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BlogRequest>,
) -> Result<Json<BlogResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    identity.require_role(Role::Blogger)?;

    let mut client = state.clients.blog.clone();
    let response = client
        .add_blog(blog::BlogContent {
            language: request.language,
            title: request.title,
            content: request.content,
            path: String::new(),
        })
        .await
        .map_err(|e| backend_error("add_blog", "blog", &e))?
        .into_inner();

    if response.path == REJECTED_PATH {
        warn!("Blog creation rejected for user {}", identity.user_id);
        return Err(ApiError::OperationFailed);
    }

    info!("Added blog {}/{}", response.language, response.path);
    Ok(Json(to_response(response)))
}

/// PUT /blog  (Blogger)
pub async fn update_blog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BlogUpdateRequest>,
) -> Result<Json<BlogResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    identity.require_role(Role::Blogger)?;

    let mut client = state.clients.blog.clone();
    let response = client
        .update_blog(blog::BlogContent {
            language: request.language,
            title: request.title,
            content: request.content,
            path: request.path,
        })
        .await
        .map_err(|e| backend_error("update_blog", "blog", &e))?
        .into_inner();

    if response.path == REJECTED_PATH {
        return Err(ApiError::OperationFailed);
    }

    info!("Updated blog {}/{}", response.language, response.path);
    Ok(Json(to_response(response)))
}

/// GET /blog?language=&path=  (public)
pub async fn get_blog(
    State(state): State<AppState>,
    Query(query): Query<BlogRefQuery>,
) -> Result<Json<BlogResponse>, ApiError> {
    let mut client = state.clients.blog.clone();
    let response = client
        .get_blog(blog::BlogRef {
            language: query.language,
            path: query.path,
        })
        .await
        .map_err(|e| backend_error("get_blog", "blog", &e))?
        .into_inner();

    if response.path.is_empty() {
        return Err(ApiError::NoContent);
    }
    Ok(Json(to_response(response)))
}

/// GET /blog/blogs?language=  (public)
pub async fn list_blogs(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<Json<BlogListResponse>, ApiError> {
    let mut client = state.clients.blog.clone();
    let response = client
        .list_blogs(blog::BlogListRequest {
            language: query.language,
        })
        .await
        .map_err(|e| backend_error("list_blogs", "blog", &e))?
        .into_inner();

    if response.blogs.is_empty() {
        return Err(ApiError::NoContent);
    }

    Ok(Json(BlogListResponse {
        blogs: response.blogs.into_iter().map(to_response).collect(),
    }))
}

/// DELETE /blog?language=&path=  (SuperAdmin)
pub async fn delete_blog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BlogRefQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let identity = state.authorize(&headers)?;
    identity.require_role(Role::SuperAdmin)?;

    let mut client = state.clients.blog.clone();
    let response = client
        .delete_blog(blog::BlogRef {
            language: query.language.clone(),
            path: query.path.clone(),
        })
        .await
        .map_err(|e| backend_error("delete_blog", "blog", &e))?
        .into_inner();

    if !response.success {
        return Err(ApiError::OperationFailed);
    }

    info!("Deleted blog {}/{} by admin {}", query.language, query.path, identity.user_id);
    Ok(Json(serde_json::json!({ "success": true })))
}

fn to_response(content: blog::BlogContent) -> BlogResponse {
    BlogResponse {
        language: content.language,
        title: content.title,
        content: content.content,
        path: content.path,
    }
}
