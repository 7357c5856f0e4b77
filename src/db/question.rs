use serde::{Deserialize, Serialize};

use crate::db::{PageId, PageKind};
use crate::error::{AppError, AppResult};
use crate::AppState;

id_struct!(QuestionId, "question");

/// A quiz question. Owned by exactly one quiz page; `position` fixes its place
/// in the display order.
#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct Question {
    pub id: QuestionId,
    pub page_id: PageId,
    pub position: i32,
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: Option<i32>,
}

/// Payload for adding or updating a question.
#[derive(Deserialize, Debug, Clone)]
pub struct QuestionData {
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: Option<i32>,
}

impl AppState {
    async fn expect_quiz(&self, page_id: PageId) -> AppResult {
        let kind = sqlx::query_scalar::<_, PageKind>("SELECT kind FROM CoursePage WHERE id = $1")
            .bind(page_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::PageDoesNotExist)?;
        if kind != PageKind::Quiz {
            return Err(AppError::NotAQuiz);
        }
        Ok(())
    }

    /// Appends a question at the end of a quiz's display order.
    pub async fn add_question(
        &self,
        quiz_id: PageId,
        data: &QuestionData,
    ) -> Result<Question, AppError> {
        self.expect_quiz(quiz_id).await?;
        let question = sqlx::query_as::<_, Question>(
            "INSERT INTO Question (page_id, position, prompt, options, answer)
                VALUES (
                    $1,
                    (SELECT COALESCE(MAX(position) + 1, 0) FROM Question WHERE page_id = $1),
                    $2, $3, $4
                )
                RETURNING *",
        )
        .bind(quiz_id)
        .bind(&data.prompt)
        .bind(&data.options)
        .bind(data.answer)
        .fetch_one(&self.pool)
        .await?;
        Ok(question)
    }

    /// Rewrites a question's content in place; its display position is
    /// untouched.
    pub async fn update_question(&self, id: QuestionId, data: &QuestionData) -> AppResult {
        let result =
            sqlx::query("UPDATE Question SET prompt = $2, options = $3, answer = $4 WHERE id = $1")
                .bind(id)
                .bind(&data.prompt)
                .bind(&data.options)
                .bind(data.answer)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::QuestionDoesNotExist);
        }
        Ok(())
    }

    /// Removes a question from the quiz that owns it.
    pub async fn delete_question(&self, quiz_id: PageId, id: QuestionId) -> AppResult {
        let result = sqlx::query("DELETE FROM Question WHERE id = $1 AND page_id = $2")
            .bind(id)
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::QuestionDoesNotExist);
        }
        Ok(())
    }

    /// Questions of a quiz in display order.
    pub async fn questions_for(&self, quiz_id: PageId) -> sqlx::Result<Vec<Question>> {
        sqlx::query_as::<_, Question>(
            "SELECT * FROM Question WHERE page_id = $1 ORDER BY position, id",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
    }

    pub(crate) async fn question_ids(&self, quiz_id: PageId) -> sqlx::Result<Vec<QuestionId>> {
        sqlx::query_scalar::<_, QuestionId>(
            "SELECT id FROM Question WHERE page_id = $1 ORDER BY position, id",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
    }
}
