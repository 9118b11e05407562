use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    db::queries::{
        categories::{category_exists, get_all_categories},
        questions::{get_all_questions, get_questions_for_category},
    },
    server::{app::AppState, deserializers::PathId, error::ApiError},
};

use super::{questions::QuestionList, ApiResponse};

/// Category id standing for every category.
pub const ALL_CATEGORIES: i64 = 0;

#[derive(Serialize)]
struct CategoriesResponse {
    success: bool,
    categories: BTreeMap<i64, String>,
}

/// Mapping from category id to category type.
pub(super) async fn category_map(pool: &SqlitePool) -> ApiResponse<BTreeMap<i64, String>> {
    let categories = get_all_categories(pool).await.map_err(ApiError::from_read)?;
    Ok(categories.into_iter().map(|c| (c.id, c.kind)).collect())
}

/// Checks `id` against the stored categories. `None` stands for every category.
pub(super) async fn resolve_category(pool: &SqlitePool, id: i64) -> ApiResponse<Option<i64>> {
    if id == ALL_CATEGORIES {
        return Ok(None);
    }
    if category_exists(pool, id).await.map_err(ApiError::from_read)? {
        Ok(Some(id))
    } else {
        tracing::debug!(id, "Unknown category");
        Err(ApiError::NotFound)
    }
}

async fn get_categories(State(pool): State<SqlitePool>) -> ApiResponse<Json<CategoriesResponse>> {
    Ok(Json(CategoriesResponse {
        success: true,
        categories: category_map(&pool).await?,
    }))
}

async fn questions_by_category(
    State(pool): State<SqlitePool>,
    PathId(id): PathId,
) -> ApiResponse<Json<QuestionList>> {
    let questions = match resolve_category(&pool, id).await? {
        Some(category) => get_questions_for_category(&pool, category).await,
        None => get_all_questions(&pool).await,
    }
    .map_err(ApiError::from_read)?;
    Ok(Json(QuestionList::new(questions)))
}

pub fn category_router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/{id}/questions", get(questions_by_category))
}
