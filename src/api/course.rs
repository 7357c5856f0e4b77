use axum::Json;
use serde::Deserialize;

use super::Ack;
use crate::db::{Course, CourseId, CoursePage, CourseView, Resource, Role, User};
use crate::error::AppError;
use crate::period::{archives_between, ArchiveEntry, Period};
use crate::traits::RequestBody;
use crate::{env, AppState};

#[derive(Deserialize)]
pub struct CourseViewRequest {
    pub id: CourseId,
}

impl RequestBody for CourseViewRequest {
    type Response = Json<CourseView>;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        Ok(Json(state.course_view(self.id, user.as_ref()).await?))
    }
}

#[derive(Deserialize)]
pub struct CourseListRequest {}

impl RequestBody for CourseListRequest {
    type Response = Json<Vec<Course>>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        Ok(Json(state.all_courses().await?))
    }
}

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

impl RequestBody for SearchRequest {
    type Response = Json<Vec<Course>>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        Ok(Json(state.search_courses(&self.query).await?))
    }
}

#[derive(Deserialize)]
pub struct CoursePagesRequest {
    pub course_id: CourseId,
}

impl RequestBody for CoursePagesRequest {
    type Response = Json<Vec<CoursePage>>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        Ok(Json(state.pages_for_course(self.course_id).await?))
    }
}

#[derive(Deserialize)]
pub struct CourseResourcesRequest {
    pub course_id: CourseId,
}

impl RequestBody for CourseResourcesRequest {
    type Response = Json<Vec<Resource>>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        Ok(Json(state.resources_for_course(self.course_id).await?))
    }
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub course_id: CourseId,
}

impl RequestBody for RegisterRequest {
    type Response = Ack;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        state
            .get_course(self.course_id)
            .await?
            .ok_or(AppError::CourseDoesNotExist)?;
        state.register(user.id, self.course_id).await?;
        Ok(Ack::ok())
    }
}

#[derive(Deserialize)]
pub struct DeregisterRequest {
    /// Defaults to the signed-in user; acting on someone else requires admin.
    pub email: Option<String>,
    pub course_name: String,
}

impl RequestBody for DeregisterRequest {
    type Response = Ack;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        let email = match self.email {
            Some(email) if email != user.email => {
                if user.role != Role::Admin {
                    return Err(AppError::NotAuthorized);
                }
                email
            }
            Some(email) => email,
            None => user.email,
        };
        state.deregister(&email, &self.course_name).await?;
        Ok(Ack::ok())
    }
}

#[derive(Deserialize)]
pub struct ArchivesRequest {}

impl RequestBody for ArchivesRequest {
    type Response = Json<Vec<ArchiveEntry>>;

    async fn request(
        self,
        _state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        Ok(Json(archives_between(
            *env::ARCHIVES_START,
            Period::current(),
        )))
    }
}

#[derive(Deserialize)]
pub struct ArchiveCoursesRequest {
    pub year: i32,
    pub sem: i32,
}

impl RequestBody for ArchiveCoursesRequest {
    type Response = Json<Vec<Course>>;

    async fn request(
        self,
        state: AppState,
        _user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        if !(self.sem == 1 || self.sem == 2) {
            return Err(AppError::InvalidQuery(format!(
                "semester must be 1 or 2, got {}",
                self.sem
            )));
        }
        let courses = state
            .courses_for_period(Period::new(self.year, self.sem))
            .await?;
        Ok(Json(courses))
    }
}
