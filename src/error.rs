use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub type AppResult<T = ()> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    SqlError(sqlx::Error),
    NotLoggedIn,
    NotAuthorized,
    UserDoesNotExist,
    CourseDoesNotExist,
    PageDoesNotExist,
    QuestionDoesNotExist,
    ResourceDoesNotExist,
    NotAQuiz,
    MissingUpload,
    InvalidQuery(String),

    Other(String),
}

impl AppError {
    pub fn message(&self) -> String {
        match self {
            Self::SqlError(err) => format!("Internal SQL error: {}", err),
            Self::NotLoggedIn => "Not signed in".to_string(),
            Self::NotAuthorized => "Not authorized".to_string(),
            Self::UserDoesNotExist => "User does not exist".to_string(),
            Self::CourseDoesNotExist => "Course does not exist".to_string(),
            Self::PageDoesNotExist => "Course page does not exist".to_string(),
            Self::QuestionDoesNotExist => "Question does not exist".to_string(),
            Self::ResourceDoesNotExist => "Resource does not exist".to_string(),
            Self::NotAQuiz => "Course page is not a quiz".to_string(),
            Self::MissingUpload => "Missing".to_string(),
            Self::InvalidQuery(msg) => msg.to_string(),

            Self::Other(msg) => msg.to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotLoggedIn => StatusCode::UNAUTHORIZED,
            Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::UserDoesNotExist => StatusCode::NOT_FOUND,
            Self::CourseDoesNotExist => StatusCode::NOT_FOUND,
            Self::PageDoesNotExist => StatusCode::NOT_FOUND,
            Self::QuestionDoesNotExist => StatusCode::NOT_FOUND,
            Self::ResourceDoesNotExist => StatusCode::NOT_FOUND,
            Self::NotAQuiz => StatusCode::BAD_REQUEST,
            Self::MissingUpload => StatusCode::BAD_REQUEST,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,

            Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // The upload form expects its validation failure as plain text.
            Self::MissingUpload => (self.status_code(), self.message()).into_response(),
            _ => (
                self.status_code(),
                Json(serde_json::json!({ "error": self.message() })),
            )
                .into_response(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> AppError {
        AppError::SqlError(err)
    }
}
