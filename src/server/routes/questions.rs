use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{
            categories::category_exists,
            questions::{
                count_questions, create_question, delete_question, get_all_questions,
                search_questions,
            },
        },
        NewQuestion, Question,
    },
    server::{
        app::AppState,
        deserializers::{
            deserialize_page, first_page, is_truthy, lenient_i64, lenient_text, ApiJson, PathId,
        },
        error::ApiError,
        pagination::paginate,
    },
    telemetry::QUESTION_CHANGES,
};

use super::{categories::category_map, ApiResponse};

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default = "first_page", deserialize_with = "deserialize_page")]
    page: i64,
}

// fields stay loosely typed so that missing, falsy and mistyped values all end up as 422
#[derive(Deserialize)]
struct NewQuestionBody {
    #[serde(default)]
    question: Value,
    #[serde(default)]
    answer: Value,
    #[serde(default)]
    difficulty: Value,
    #[serde(default)]
    category: Value,
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(rename = "searchTerm", default)]
    search_term: Value,
}

/// Questions together with how many there are and the category of each one.
#[derive(Serialize)]
pub(super) struct QuestionList {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    current_category: Vec<i64>,
}

impl QuestionList {
    pub(super) fn new(questions: Vec<Question>) -> Self {
        Self {
            success: true,
            total_questions: questions.len(),
            current_category: questions.iter().map(|q| q.category).collect(),
            questions,
        }
    }
}

#[derive(Serialize)]
struct QuestionPage {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    categories: BTreeMap<i64, String>,
    current_category: Vec<i64>,
}

#[derive(Serialize)]
struct Created {
    success: bool,
    created: i64,
    total_questions: i64,
}

#[derive(Serialize)]
struct Deleted {
    success: bool,
    deleted: i64,
    total_questions: i64,
}

impl NewQuestionBody {
    fn validate(self) -> Option<NewQuestion> {
        let fields = [&self.question, &self.answer, &self.difficulty, &self.category];
        if !fields.into_iter().all(is_truthy) {
            return None;
        }
        Some(NewQuestion {
            question: self.question.as_str()?.to_owned(),
            answer: self.answer.as_str()?.to_owned(),
            difficulty: lenient_i64(&self.difficulty)?,
            category: lenient_i64(&self.category)?,
        })
    }
}

async fn list_questions(
    State(pool): State<SqlitePool>,
    Query(PageQuery { page }): Query<PageQuery>,
) -> ApiResponse<Json<QuestionPage>> {
    let all = get_all_questions(&pool).await.map_err(ApiError::from_read)?;
    let questions = paginate(page, &all).to_vec();
    if questions.is_empty() {
        tracing::debug!(page, total = all.len(), "Empty page");
        return Err(ApiError::NotFound);
    }

    Ok(Json(QuestionPage {
        success: true,
        total_questions: all.len(),
        categories: category_map(&pool).await?,
        current_category: questions.iter().map(|q| q.category).collect(),
        questions,
    }))
}

async fn add_question(
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<NewQuestionBody>,
) -> ApiResponse<Json<Created>> {
    let new_question = body.validate().ok_or_else(|| {
        tracing::debug!("Rejected incomplete question");
        ApiError::UnprocessableEntity
    })?;
    if !category_exists(&pool, new_question.category)
        .await
        .map_err(ApiError::from_write)?
    {
        tracing::debug!(category = new_question.category, "Question for unknown category");
        return Err(ApiError::UnprocessableEntity);
    }

    let id = create_question(&pool, &new_question)
        .await
        .map_err(ApiError::from_write)?;
    QUESTION_CHANGES.with_label_values(&["created"]).inc();
    tracing::info!(id, "Question created");

    Ok(Json(Created {
        success: true,
        created: id,
        total_questions: count_questions(&pool).await.map_err(ApiError::from_write)?,
    }))
}

async fn remove_question(
    State(pool): State<SqlitePool>,
    PathId(id): PathId,
) -> ApiResponse<Json<Deleted>> {
    delete_question(&pool, id)
        .await
        .map_err(ApiError::from_write)?;
    QUESTION_CHANGES.with_label_values(&["deleted"]).inc();
    tracing::info!(id, "Question deleted");

    Ok(Json(Deleted {
        success: true,
        deleted: id,
        total_questions: count_questions(&pool).await.map_err(ApiError::from_write)?,
    }))
}

async fn search(
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<SearchBody>,
) -> ApiResponse<Json<QuestionList>> {
    let term = lenient_text(&body.search_term);
    let questions = search_questions(&pool, &term)
        .await
        .map_err(ApiError::from_read)?;
    tracing::debug!(%term, found = questions.len(), "Searched questions");
    Ok(Json(QuestionList::new(questions)))
}

pub fn questions_router() -> Router<AppState> {
    Router::new()
        .route("/questions", get(list_questions).post(add_question))
        .route("/questions/{id}", delete(remove_question))
        .route("/search", post(search))
}
