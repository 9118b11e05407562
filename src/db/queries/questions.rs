use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::{StoreError, StoreResult};

const QUESTION_COLUMNS: &str = "id, question, answer, difficulty, category";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub difficulty: i64,
    pub category: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub difficulty: i64,
    pub category: i64,
}

pub async fn get_all_questions(pool: &SqlitePool) -> StoreResult<Vec<Question>> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(questions)
}

pub async fn count_questions(pool: &SqlitePool) -> StoreResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn get_question(pool: &SqlitePool, id: i64) -> StoreResult<Question> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE questions.id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound {
        resource: "question",
        id,
    })
}

pub async fn get_questions_for_category(
    pool: &SqlitePool,
    category: i64,
) -> StoreResult<Vec<Question>> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE questions.category = ?1 ORDER BY id"
    ))
    .bind(category)
    .fetch_all(pool)
    .await?;
    Ok(questions)
}

/// Case-insensitive, unanchored substring match on the question text.
///
/// Case folding is Unicode-aware, which SQLite `LIKE` is not, so the match runs here
/// over the ordered rows. An empty term matches every row.
pub async fn search_questions(pool: &SqlitePool, term: &str) -> StoreResult<Vec<Question>> {
    let term = term.to_lowercase();
    let questions = get_all_questions(pool)
        .await?
        .into_iter()
        .filter(|q| q.question.to_lowercase().contains(&term))
        .collect();
    Ok(questions)
}

/// Picks one question uniformly at random among those in `category` (any category when
/// `None`) whose id is not listed in `exclude`.
pub async fn random_question(
    pool: &SqlitePool,
    category: Option<i64>,
    exclude: &[i64],
) -> StoreResult<Option<Question>> {
    // one JSON array parameter, however many ids the player has already seen
    let excluded = serde_json::Value::from(exclude.to_vec()).to_string();
    let question = sqlx::query_as::<_, Question>(&format!(
        r#"
SELECT {QUESTION_COLUMNS}
FROM questions
WHERE (?1 IS NULL OR category = ?1)
  AND id NOT IN (SELECT value FROM json_each(?2))
ORDER BY RANDOM()
LIMIT 1
        "#
    ))
    .bind(category)
    .bind(excluded)
    .fetch_optional(pool)
    .await?;
    Ok(question)
}

pub async fn create_question(pool: &SqlitePool, question: &NewQuestion) -> StoreResult<i64> {
    let mut conn = pool.acquire().await?;

    let id = sqlx::query(
        r#"
INSERT INTO questions (question, answer, difficulty, category) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(question.difficulty)
    .bind(question.category)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn delete_question(pool: &SqlitePool, id: i64) -> StoreResult<()> {
    let mut conn = pool.acquire().await?;

    let deleted = sqlx::query(
        r#"
        DELETE FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if deleted == 0 {
        return Err(StoreError::NotFound {
            resource: "question",
            id,
        });
    }
    Ok(())
}

/// Inserts the given questions keeping their ids, overwriting rows that already exist.
pub async fn import_questions(pool: &SqlitePool, questions: Vec<Question>) -> StoreResult<()> {
    let mut tx = pool.begin().await?;
    for question in questions {
        sqlx::query(
            r#"
INSERT INTO questions (id, question, answer, difficulty, category) VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT (id) DO UPDATE SET
    question = excluded.question,
    answer = excluded.answer,
    difficulty = excluded.difficulty,
    category = excluded.category
            "#,
        )
        .bind(question.id)
        .bind(&question.question)
        .bind(&question.answer)
        .bind(question.difficulty)
        .bind(question.category)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::db::test_pool;

    fn new_question(question: &str, category: i64) -> NewQuestion {
        NewQuestion {
            question: question.to_owned(),
            answer: "answer".to_owned(),
            difficulty: 1,
            category,
        }
    }

    async fn seed(pool: &SqlitePool) -> Vec<i64> {
        let mut ids = vec![];
        for (text, category) in [
            ("What is the heaviest organ in the human body?", 1),
            ("Who discovered penicillin?", 1),
            ("La Giaconda is better known as what?", 2),
            ("What is the largest lake in Africa?", 3),
            ("100% of what?", 3),
        ] {
            ids.push(create_question(pool, &new_question(text, category)).await.unwrap());
        }
        ids
    }

    #[tokio::test]
    async fn created_questions_are_listed_in_id_order() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;
        let questions = get_all_questions(&pool).await.unwrap();
        assert_eq!(questions.iter().map(|q| q.id).collect::<Vec<_>>(), ids);
        assert_eq!(count_questions(&pool).await.unwrap(), 5);
        assert_eq!(get_question(&pool, ids[2]).await.unwrap().category, 2);
    }

    #[tokio::test]
    async fn create_rejects_unknown_category() {
        let pool = test_pool().await;
        let err = create_question(&pool, &new_question("orphan", 42))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
        assert_eq!(count_questions(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;
        let last = *ids.last().unwrap();
        delete_question(&pool, last).await.unwrap();
        assert!(matches!(
            get_question(&pool, last).await,
            Err(StoreError::NotFound { .. })
        ));
        let fresh = create_question(&pool, &new_question("again", 1)).await.unwrap();
        assert!(fresh > last);
    }

    #[tokio::test]
    async fn deleting_missing_question_is_not_found() {
        let pool = test_pool().await;
        assert!(matches!(
            delete_question(&pool, 9999).await,
            Err(StoreError::NotFound { id: 9999, .. })
        ));
    }

    #[tokio::test]
    async fn questions_for_category_only_match_that_category() {
        let pool = test_pool().await;
        seed(&pool).await;
        let science = get_questions_for_category(&pool, 1).await.unwrap();
        assert_eq!(science.len(), 2);
        assert!(science.iter().all(|q| q.category == 1));
        assert!(get_questions_for_category(&pool, 6).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let pool = test_pool().await;
        seed(&pool).await;
        let found = search_questions(&pool, "WHAT IS").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(search_questions(&pool, "").await.unwrap().len(), 5);
        assert_eq!(search_questions(&pool, "?").await.unwrap().len(), 5);
        assert!(search_questions(&pool, "title").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let pool = test_pool().await;
        seed(&pool).await;
        let found = search_questions(&pool, "100%").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(search_questions(&pool, "_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        let pool = test_pool().await;
        seed(&pool).await;
        let id = create_question(&pool, &new_question("Who painted École 1900?", 2))
            .await
            .unwrap();
        for term in ["école", "ÉCOLE", "painted école"] {
            let found = search_questions(&pool, term).await.unwrap();
            assert_eq!(found.iter().map(|q| q.id).collect::<Vec<_>>(), vec![id]);
        }
    }

    #[tokio::test]
    async fn random_question_skips_excluded_ids() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;
        let mut seen = HashSet::new();
        let mut previous = vec![];
        while let Some(question) = random_question(&pool, None, &previous).await.unwrap() {
            assert!(!previous.contains(&question.id));
            assert!(seen.insert(question.id));
            previous.push(question.id);
        }
        assert_eq!(seen, ids.into_iter().collect::<HashSet<_>>());
    }

    #[tokio::test]
    async fn random_question_respects_category() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;
        let question = random_question(&pool, Some(2), &[]).await.unwrap().unwrap();
        assert_eq!(question.id, ids[2]);
        assert!(random_question(&pool, Some(2), &[ids[2]])
            .await
            .unwrap()
            .is_none());
        assert!(random_question(&pool, Some(5), &[]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn random_question_accepts_long_exclusion_lists() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;
        let mut previous: Vec<i64> = (1_000..41_000).collect();
        previous.extend(&ids[1..]);
        let question = random_question(&pool, None, &previous).await.unwrap().unwrap();
        assert_eq!(question.id, ids[0]);
        previous.push(ids[0]);
        assert!(random_question(&pool, None, &previous).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn import_keeps_ids_and_overwrites() {
        let pool = test_pool().await;
        let ids = seed(&pool).await;
        import_questions(
            &pool,
            vec![
                Question {
                    id: ids[0],
                    question: "Rewritten?".to_owned(),
                    answer: "Yes".to_owned(),
                    difficulty: 3,
                    category: 4,
                },
                Question {
                    id: 50,
                    question: "Imported?".to_owned(),
                    answer: "Yes".to_owned(),
                    difficulty: 2,
                    category: 6,
                },
            ],
        )
        .await
        .unwrap();
        assert_eq!(count_questions(&pool).await.unwrap(), 6);
        assert_eq!(get_question(&pool, ids[0]).await.unwrap().category, 4);
        assert_eq!(get_question(&pool, 50).await.unwrap().question, "Imported?");
    }
}
