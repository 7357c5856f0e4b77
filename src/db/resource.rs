use serde::Serialize;

use crate::db::CourseId;
use crate::error::{AppError, AppResult};
use crate::AppState;

id_struct!(ResourceId, "resource");

/// A course resource: either an uploaded file (by its serving URL) or an
/// external link, plus descriptive metadata.
#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct Resource {
    pub id: ResourceId,
    pub course_id: CourseId,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct NewResource {
    pub course_id: CourseId,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub url: String,
}

impl AppState {
    pub async fn get_resource(&self, id: ResourceId) -> sqlx::Result<Option<Resource>> {
        sqlx::query_as::<_, Resource>("SELECT * FROM Resource WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create_resource(&self, new: NewResource) -> sqlx::Result<Resource> {
        sqlx::query_as::<_, Resource>(
            "INSERT INTO Resource (course_id, name, topic, description, url)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *",
        )
        .bind(new.course_id)
        .bind(new.name)
        .bind(new.topic)
        .bind(new.description)
        .bind(new.url)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn delete_resource(&self, id: ResourceId) -> AppResult {
        let result = sqlx::query("DELETE FROM Resource WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceDoesNotExist);
        }
        Ok(())
    }

    pub async fn resources_for_course(&self, course_id: CourseId) -> sqlx::Result<Vec<Resource>> {
        sqlx::query_as::<_, Resource>("SELECT * FROM Resource WHERE course_id = $1 ORDER BY id")
            .bind(course_id)
            .fetch_all(&self.pool)
            .await
    }
}
