use axum::body::Bytes;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::require_manager;
use crate::db::{CourseId, NewResource, ResourceId, User};
use crate::error::AppError;
use crate::traits::RequestBody;
use crate::{env, AppState};

#[derive(TryFromMultipart)]
pub struct AddResourceRequest {
    pub course_id: i32,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    /// External link, used when no file is uploaded.
    pub link: Option<String>,
    /// Uploaded file; takes precedence over `link`.
    #[form_data(limit = "16MiB")]
    pub res: Option<FieldData<Bytes>>,
}

impl RequestBody for AddResourceRequest {
    type Response = Redirect;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        let course_id = CourseId(self.course_id);
        require_manager(user, course_id)?;

        let url = match (&self.res, &self.link) {
            (Some(file), _) => store_upload(file).await?,
            (None, Some(link)) if !link.is_empty() => link.clone(),
            _ => return Err(AppError::MissingUpload),
        };

        state
            .create_resource(NewResource {
                course_id,
                name: self.name,
                topic: self.topic,
                description: self.description,
                url,
            })
            .await?;

        Ok(Redirect::to(&format!("/dashboard/admin/{}", course_id.0)))
    }
}

/// Writes an uploaded file into the upload directory and returns the URL it is
/// served under.
async fn store_upload(file: &FieldData<Bytes>) -> Result<String, AppError> {
    let original = file.metadata.file_name.as_deref().unwrap_or("file");
    let filename = format!(
        "{}-{}",
        Uuid::new_v4(),
        crate::util::sanitize_filename(original)
    );

    let dir = std::path::Path::new(&**env::UPLOAD_DIR);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|err| AppError::Other(format!("could not store upload: {err}")))?;
    tokio::fs::write(dir.join(&filename), &file.contents)
        .await
        .map_err(|err| AppError::Other(format!("could not store upload: {err}")))?;

    Ok(format!("/uploads/{filename}"))
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RemoveResourceRequest {
    pub id: ResourceId,
}

#[derive(Serialize, Debug)]
pub struct RemoveResourceResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<RemoveResourceRequest>,
}

impl RemoveResourceResponse {
    fn failed(err: AppError, body: RemoveResourceRequest) -> Self {
        RemoveResourceResponse {
            success: false,
            error: Some(err.message()),
            body: Some(body),
        }
    }
}

impl IntoResponse for RemoveResourceResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl RequestBody for RemoveResourceRequest {
    type Response = RemoveResourceResponse;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        let resource = match state.get_resource(self.id).await {
            Ok(Some(resource)) => resource,
            Ok(None) => {
                return Ok(RemoveResourceResponse::failed(
                    AppError::ResourceDoesNotExist,
                    self,
                ))
            }
            Err(err) => return Ok(RemoveResourceResponse::failed(err.into(), self)),
        };
        require_manager(user, resource.course_id)?;

        match state.delete_resource(self.id).await {
            Ok(()) => Ok(RemoveResourceResponse {
                success: true,
                error: None,
                body: None,
            }),
            Err(err) => {
                warn!(error = %err.message(), "resource deletion failed");
                Ok(RemoveResourceResponse::failed(err, self))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::db::fixtures::{add_course, add_user, state};
    use crate::db::Role;

    fn link_request(course_id: CourseId, link: Option<&str>) -> AddResourceRequest {
        AddResourceRequest {
            course_id: course_id.0,
            name: Some("Slides".to_string()),
            topic: Some("Intro".to_string()),
            description: None,
            link: link.map(str::to_string),
            res: None,
        }
    }

    #[sqlx::test]
    fn link_resources_do_not_touch_the_disk(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        let admin = add_user(&state, "a@x", Role::Admin).await;
        let course = add_course(&state, "Networks", 2024, 1).await;

        link_request(course.id, Some("https://example.com/slides"))
            .request(state.clone(), Some(admin))
            .await?;

        let resources = state.resources_for_course(course.id).await?;
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].url, "https://example.com/slides");
        assert_eq!(resources[0].name.as_deref(), Some("Slides"));
        Ok(())
    }

    #[sqlx::test]
    fn missing_file_and_link_is_a_validation_failure(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        let admin = add_user(&state, "a@x", Role::Admin).await;
        let course = add_course(&state, "Networks", 2024, 1).await;

        let none = link_request(course.id, None)
            .request(state.clone(), Some(admin.clone()))
            .await;
        assert!(matches!(none, Err(AppError::MissingUpload)));

        let empty = link_request(course.id, Some(""))
            .request(state.clone(), Some(admin))
            .await;
        assert!(matches!(empty, Err(AppError::MissingUpload)));

        assert!(state.resources_for_course(course.id).await?.is_empty());
        Ok(())
    }

    #[sqlx::test]
    fn remove_reports_failure_with_the_request_body(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        let admin = add_user(&state, "a@x", Role::Admin).await;
        let course = add_course(&state, "Networks", 2024, 1).await;

        let resource = state
            .create_resource(NewResource {
                course_id: course.id,
                name: None,
                topic: None,
                description: None,
                url: "https://example.com".to_string(),
            })
            .await?;

        let removed = RemoveResourceRequest { id: resource.id }
            .request(state.clone(), Some(admin.clone()))
            .await?;
        assert!(removed.success);

        let missing = RemoveResourceRequest { id: resource.id }
            .request(state.clone(), Some(admin))
            .await?;
        assert!(!missing.success);
        assert!(missing.error.is_some());
        assert_eq!(missing.body.map(|b| b.id), Some(resource.id));
        Ok(())
    }
}
