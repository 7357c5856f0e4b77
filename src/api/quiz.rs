use std::str::FromStr;

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::require_manager;
use crate::db::{CourseId, CoursePage, PageId, Question, QuestionData, QuestionId, User};
use crate::error::AppError;
use crate::traits::RequestBody;
use crate::AppState;

/// The closed set of question operations the quiz-update route accepts.
/// Anything else is rejected at the boundary, before any storage access.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QuizOp {
    Add,
    Update,
    Delete,
}

impl FromStr for QuizOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(()),
        }
    }
}

#[derive(Deserialize)]
pub struct InitQuizRequest {
    pub course_id: CourseId,
    pub name: String,
}

#[derive(Serialize, Debug)]
pub struct InitQuizResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<CoursePage>,
}

impl IntoResponse for InitQuizResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl RequestBody for InitQuizRequest {
    type Response = InitQuizResponse;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        require_manager(user, self.course_id)?;

        match state.create_quiz(&self.name, self.course_id, Vec::new()).await {
            Ok(quiz) => Ok(InitQuizResponse {
                success: true,
                quiz: Some(quiz),
            }),
            Err(err) => {
                warn!(error = %err.message(), "quiz creation failed");
                Ok(InitQuizResponse {
                    success: false,
                    quiz: None,
                })
            }
        }
    }
}

#[derive(Deserialize)]
pub struct QuizQuestionsRequest {
    pub course_id: CourseId,
    pub quiz_id: PageId,
}

impl RequestBody for QuizQuestionsRequest {
    type Response = Json<Vec<Question>>;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        require_manager(user, self.course_id)?;
        Ok(Json(state.questions_for(self.quiz_id).await?))
    }
}

#[derive(Deserialize)]
pub struct DestroyQuizRequest {
    pub course_id: CourseId,
    #[serde(rename = "_id")]
    pub id: PageId,
    pub name: String,
}

impl RequestBody for DestroyQuizRequest {
    type Response = QuizUpdateResponse;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        require_manager(user, self.course_id)?;

        match state.delete_quiz(self.id, &self.name).await {
            Ok(()) => Ok(QuizUpdateResponse::ok()),
            Err(err) => {
                warn!(error = %err.message(), "quiz deletion failed");
                Ok(QuizUpdateResponse::failed())
            }
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateQuizRequest {
    pub course_id: CourseId,
    pub quiz_id: PageId,
    pub question_id: Option<QuestionId>,
    #[serde(rename = "type", default)]
    pub op: String,
    pub data: Option<QuestionData>,
}

#[derive(Serialize, Debug)]
pub struct QuizUpdateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl QuizUpdateResponse {
    fn ok() -> Self {
        QuizUpdateResponse {
            success: true,
            message: None,
        }
    }

    fn failed() -> Self {
        QuizUpdateResponse {
            success: false,
            message: None,
        }
    }

    fn rejected(message: &str) -> Self {
        QuizUpdateResponse {
            success: false,
            message: Some(message.to_string()),
        }
    }
}

impl IntoResponse for QuizUpdateResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl RequestBody for UpdateQuizRequest {
    type Response = QuizUpdateResponse;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        require_manager(user, self.course_id)?;

        let Ok(op) = self.op.parse::<QuizOp>() else {
            return Ok(QuizUpdateResponse::rejected("Invalid/Blank operation type"));
        };

        match self.apply(op, &state).await {
            Ok(()) => Ok(QuizUpdateResponse::ok()),
            Err(err) => {
                warn!(error = %err.message(), "quiz update failed");
                Ok(QuizUpdateResponse::failed())
            }
        }
    }
}

impl UpdateQuizRequest {
    fn missing(field: &str) -> AppError {
        AppError::InvalidQuery(format!("missing {field}"))
    }

    async fn apply(&self, op: QuizOp, state: &AppState) -> Result<(), AppError> {
        match op {
            QuizOp::Add => {
                let data = self.data.as_ref().ok_or_else(|| Self::missing("data"))?;
                state.add_question(self.quiz_id, data).await?;
            }
            QuizOp::Update => {
                let id = self.question_id.ok_or_else(|| Self::missing("question_id"))?;
                let data = self.data.as_ref().ok_or_else(|| Self::missing("data"))?;
                state.update_question(id, data).await?;
            }
            QuizOp::Delete => {
                let id = self.question_id.ok_or_else(|| Self::missing("question_id"))?;
                state.delete_question(self.quiz_id, id).await?;
            }
        }
        Ok(())
    }
}
