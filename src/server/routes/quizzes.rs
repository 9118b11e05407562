use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    db::{queries::questions::random_question, Question},
    server::{
        app::AppState,
        deserializers::{lenient_i64, ApiJson},
        error::ApiError,
    },
    telemetry::QUIZ_QUESTIONS_SERVED,
};

use super::{categories::resolve_category, ApiResponse};

// loosely typed so that a malformed quiz request is a 404 like any other miss
#[derive(Deserialize)]
struct QuizBody {
    #[serde(default)]
    previous_questions: Value,
    #[serde(default)]
    quiz_category: Value,
}

#[derive(Serialize)]
struct NextQuestion {
    success: bool,
    question: Question,
}

fn previous_ids(value: &Value) -> Option<Vec<i64>> {
    match value {
        Value::Null => Some(vec![]),
        Value::Array(ids) => ids.iter().map(lenient_i64).collect(),
        _ => None,
    }
}

/// Serves one random question of the requested category that the player has not seen yet.
async fn next_question(
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<QuizBody>,
) -> ApiResponse<Json<NextQuestion>> {
    let category_id = body
        .quiz_category
        .get("id")
        .and_then(lenient_i64)
        .ok_or(ApiError::NotFound)?;
    let category = resolve_category(&pool, category_id).await?;
    let previous = previous_ids(&body.previous_questions).ok_or(ApiError::NotFound)?;

    let question = random_question(&pool, category, &previous)
        .await
        .map_err(ApiError::from_read)?
        .ok_or_else(|| {
            tracing::debug!(category_id, seen = previous.len(), "Quiz exhausted");
            ApiError::NotFound
        })?;

    QUIZ_QUESTIONS_SERVED
        .with_label_values(&[category_id.to_string().as_str()])
        .inc();
    Ok(Json(NextQuestion {
        success: true,
        question,
    }))
}

pub fn quizzes_router() -> Router<AppState> {
    Router::new().route("/quizzes", post(next_question))
}
