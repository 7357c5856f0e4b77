use serde::{Deserialize, Serialize};

use crate::db::{CourseId, QuestionData, QuestionId};
use crate::error::{AppError, AppResult};
use crate::AppState;

id_struct!(PageId, "course page");

/// Stored discriminator for the course-page family.
#[derive(sqlx::Type, Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Generic,
    Quiz,
}

/// Payload of a course page, dispatched on the stored discriminator.
///
/// A quiz carries its question references in display order; the order only
/// changes through the explicit question operations, never wholesale.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageContent {
    Generic { body: Option<String> },
    Quiz { questions: Vec<QuestionId> },
}

#[derive(Serialize, Debug, Clone)]
pub struct CoursePage {
    pub id: PageId,
    pub course_id: CourseId,
    pub name: String,
    #[serde(flatten)]
    pub content: PageContent,
}

#[derive(sqlx::FromRow)]
struct PageRow {
    id: PageId,
    course_id: CourseId,
    name: String,
    kind: PageKind,
    body: Option<String>,
}

impl AppState {
    pub async fn get_page(&self, id: PageId) -> Result<Option<CoursePage>, AppError> {
        let row = sqlx::query_as::<_, PageRow>("SELECT * FROM CoursePage WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.assemble_page(row).await?)),
            None => Ok(None),
        }
    }

    pub async fn pages_for_course(&self, course_id: CourseId) -> Result<Vec<CoursePage>, AppError> {
        let rows = sqlx::query_as::<_, PageRow>(
            "SELECT * FROM CoursePage WHERE course_id = $1 ORDER BY id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let mut pages = Vec::with_capacity(rows.len());
        for row in rows {
            pages.push(self.assemble_page(row).await?);
        }
        Ok(pages)
    }

    async fn assemble_page(&self, row: PageRow) -> Result<CoursePage, AppError> {
        let content = match row.kind {
            PageKind::Generic => PageContent::Generic { body: row.body },
            PageKind::Quiz => PageContent::Quiz {
                questions: self.question_ids(row.id).await?,
            },
        };
        Ok(CoursePage {
            id: row.id,
            course_id: row.course_id,
            name: row.name,
            content,
        })
    }

    pub async fn create_page(
        &self,
        course_id: CourseId,
        name: &str,
        body: Option<String>,
    ) -> Result<CoursePage, AppError> {
        let row = sqlx::query_as::<_, PageRow>(
            "INSERT INTO CoursePage (course_id, name, kind, body)
                VALUES ($1, $2, 'generic', $3)
                RETURNING *",
        )
        .bind(course_id)
        .bind(name)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;
        self.assemble_page(row).await
    }

    /// Creates a quiz page with an initial question list, usually empty.
    pub async fn create_quiz(
        &self,
        name: &str,
        course_id: CourseId,
        questions: Vec<QuestionData>,
    ) -> Result<CoursePage, AppError> {
        let row = sqlx::query_as::<_, PageRow>(
            "INSERT INTO CoursePage (course_id, name, kind) VALUES ($1, $2, 'quiz') RETURNING *",
        )
        .bind(course_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        for data in &questions {
            self.add_question(row.id, data).await?;
        }

        self.assemble_page(row).await
    }

    /// Deletes a quiz page matched by both id and name; its questions go with
    /// it.
    pub async fn delete_quiz(&self, id: PageId, name: &str) -> AppResult {
        let result =
            sqlx::query("DELETE FROM CoursePage WHERE id = $1 AND name = $2 AND kind = 'quiz'")
                .bind(id)
                .bind(name)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::PageDoesNotExist);
        }
        Ok(())
    }
}
