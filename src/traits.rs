use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::CookieJar;
use axum_typed_multipart::{TryFromMultipartWithState, TypedMultipart};
use serde::de::DeserializeOwned;

use crate::db::User;
use crate::error::AppError;
use crate::AppState;

/// Object that has a canonical page URL.
pub trait Linkable {
    /// Returns the relative URL. Example: `/course?id=3`
    fn relative_url(&self) -> String;
}

/// Object that can be received as a request.
///
/// Implementors describe one operation: the fields are the request input, and
/// `request` produces the typed response. The provided handler adapters plug
/// an implementor into the router for query-string, JSON, and multipart
/// transport respectively, resolving the calling user from the session cookie
/// first.
pub trait RequestBody {
    type Response;

    async fn request(self, state: AppState, user: Option<User>)
        -> Result<Self::Response, AppError>;

    async fn as_handler_query(
        State(state): State<AppState>,
        jar: CookieJar,
        Query(item): Query<Self>,
    ) -> Result<impl IntoResponse, AppError>
    where
        Self: Sized + DeserializeOwned,
        Self::Response: IntoResponse,
    {
        let (user, headers) = crate::cookies::process_cookies(&state, &jar).await?;
        let response = item.request(state, user).await?;
        Ok((headers, response))
    }

    async fn as_json_handler(
        State(state): State<AppState>,
        jar: CookieJar,
        Json(item): Json<Self>,
    ) -> Result<impl IntoResponse, AppError>
    where
        Self: Sized + DeserializeOwned,
        Self::Response: IntoResponse,
    {
        let (user, headers) = crate::cookies::process_cookies(&state, &jar).await?;
        let response = item.request(state, user).await?;
        Ok((headers, response))
    }

    async fn as_multipart_form_handler(
        State(state): State<AppState>,
        jar: CookieJar,
        TypedMultipart(item): TypedMultipart<Self>,
    ) -> Result<impl IntoResponse, AppError>
    where
        Self: TryFromMultipartWithState<AppState>,
        Self::Response: IntoResponse,
    {
        let (user, headers) = crate::cookies::process_cookies(&state, &jar).await?;
        let response = item.request(state, user).await?;
        Ok((headers, response))
    }
}
