use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{require_admin, require_manager, Ack};
use crate::db::{Course, CourseId, CoursePage, NewCourse, UpdateCourse, User, UserId};
use crate::error::AppError;
use crate::traits::RequestBody;
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateCourseRequest {
    #[serde(flatten)]
    pub course: NewCourse,
}

impl RequestBody for CreateCourseRequest {
    type Response = Json<Course>;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        require_admin(user)?;
        Ok(Json(state.create_course(self.course).await?))
    }
}

#[derive(Deserialize)]
pub struct UpdateCourseRequest {
    pub course_id: CourseId,
    #[serde(flatten)]
    pub patch: UpdateCourse,
}

impl RequestBody for UpdateCourseRequest {
    type Response = Json<Course>;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        require_manager(user, self.course_id)?;
        Ok(Json(state.update_course(self.course_id, self.patch).await?))
    }
}

#[derive(Deserialize)]
pub struct DeleteCourseRequest {
    pub course_id: CourseId,
}

impl RequestBody for DeleteCourseRequest {
    type Response = Ack;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        require_admin(user)?;
        state.delete_course(self.course_id).await?;
        Ok(Ack::ok())
    }
}

#[derive(Deserialize)]
pub struct CreatePageRequest {
    pub course_id: CourseId,
    pub name: String,
    pub body: Option<String>,
}

impl RequestBody for CreatePageRequest {
    type Response = Json<CoursePage>;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        require_manager(user, self.course_id)?;
        Ok(Json(
            state
                .create_page(self.course_id, &self.name, self.body)
                .await?,
        ))
    }
}

/// Roster entry sent to the dashboard.
#[derive(Serialize, Debug)]
pub struct StudentRecord {
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub bits_id: Option<String>,
}

impl From<User> for StudentRecord {
    fn from(user: User) -> Self {
        StudentRecord {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            bits_id: user.bits_id,
        }
    }
}

#[derive(Deserialize)]
pub struct StudentsRequest {
    pub course_id: CourseId,
}

impl RequestBody for StudentsRequest {
    type Response = Json<Vec<StudentRecord>>;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        require_manager(user, self.course_id)?;
        let students = state.registered_students(self.course_id).await?;
        Ok(Json(students.into_iter().map(Into::into).collect()))
    }
}

#[derive(Deserialize)]
pub struct StudentsCsvRequest {
    pub course_id: CourseId,
}

/// CSV body served as a file download.
pub struct CsvAttachment(pub String);

impl IntoResponse for CsvAttachment {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=export.csv",
                ),
            ],
            self.0,
        )
            .into_response()
    }
}

impl RequestBody for StudentsCsvRequest {
    type Response = CsvAttachment;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        require_manager(user, self.course_id)?;
        Ok(CsvAttachment(state.registered_csv(self.course_id).await?))
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::db::fixtures::{add_course, add_user, state};
    use crate::db::Role;

    #[sqlx::test]
    fn course_creation_is_admin_only(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        let student = add_user(&state, "s@x", Role::Student).await;
        let admin = add_user(&state, "a@x", Role::Admin).await;

        let body = || CreateCourseRequest {
            course: NewCourse {
                name: "Networks".to_string(),
                subtitle: None,
                description: None,
                handout: None,
                cover_image: None,
                offer_year: 2024,
                offer_sem: 1,
                instructors: String::new(),
            },
        };

        let denied = body().request(state.clone(), Some(student)).await;
        assert!(matches!(denied, Err(AppError::NotAuthorized)));

        let Json(course) = body().request(state.clone(), Some(admin)).await?;
        assert_eq!(course.name, "Networks");
        Ok(())
    }

    #[sqlx::test]
    fn instructors_manage_only_their_course(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        add_user(&state, "i@x", Role::Student).await;
        let mine = add_course(&state, "Mine", 2024, 1).await;
        let other = add_course(&state, "Other", 2024, 1).await;
        state.grant_instructor("i@x", mine.id).await?;
        let instructor = state.get_user_from_email("i@x").await?.unwrap();

        let ok = StudentsRequest { course_id: mine.id }
            .request(state.clone(), Some(instructor.clone()))
            .await;
        assert!(ok.is_ok());

        let denied = StudentsRequest {
            course_id: other.id,
        }
        .request(state.clone(), Some(instructor))
        .await;
        assert!(matches!(denied, Err(AppError::NotAuthorized)));

        let anonymous = StudentsRequest { course_id: mine.id }
            .request(state.clone(), None)
            .await;
        assert!(matches!(anonymous, Err(AppError::NotLoggedIn)));
        Ok(())
    }

    #[sqlx::test]
    fn roster_download_renders_csv(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        let admin = add_user(&state, "a@x", Role::Admin).await;
        let student = add_user(&state, "s@x", Role::Student).await;
        let course = add_course(&state, "Networks", 2024, 1).await;
        state.register(student.id, course.id).await?;

        let csv = StudentsCsvRequest {
            course_id: course.id,
        }
        .request(state.clone(), Some(admin))
        .await?;
        assert_eq!(csv.0, "name,email,phone,bits_id\n ,s@x, , \n");
        Ok(())
    }
}
