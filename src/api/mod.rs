use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::db::{CourseId, Role, User};
use crate::error::AppError;

pub mod admin;
pub mod auth;
pub mod course;
pub mod quiz;
pub mod resource;

/// Bare `{success: true}` acknowledgement.
#[derive(serde::Serialize, Debug)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Ack { success: true }
    }
}

impl IntoResponse for Ack {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Requires a signed-in caller that may administer the given course.
pub fn require_manager(user: Option<User>, course_id: CourseId) -> Result<User, AppError> {
    let user = user.ok_or(AppError::NotLoggedIn)?;
    if !user.may_manage(course_id) {
        return Err(AppError::NotAuthorized);
    }
    Ok(user)
}

/// Requires a signed-in admin.
pub fn require_admin(user: Option<User>) -> Result<User, AppError> {
    let user = user.ok_or(AppError::NotLoggedIn)?;
    if user.role != Role::Admin {
        return Err(AppError::NotAuthorized);
    }
    Ok(user)
}
