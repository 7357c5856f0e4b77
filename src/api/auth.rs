use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderName;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use super::Ack;
use crate::db::{GoogleProfile, Role, User, UserId};
use crate::error::AppError;
use crate::traits::{Linkable, RequestBody};
use crate::AppState;

const EXPIRED_TOKEN: &str = "token=expired; Expires=Thu, 1 Jan 1970 00:00:00 GMT";
pub const APPEND_EXPIRED_TOKEN: AppendHeaders<Option<(HeaderName, &'static str)>> =
    AppendHeaders(Some((SET_COOKIE, EXPIRED_TOKEN)));
pub const APPEND_NO_TOKEN: AppendHeaders<Option<(HeaderName, &'static str)>> = AppendHeaders(None);

/// Finishes a sign-in whose Google round trip the OAuth front end has already
/// verified: upserts the account and answers with a fresh session cookie.
pub async fn complete_oauth_sign_in(
    state: &AppState,
    profile: &GoogleProfile,
) -> Result<TokenReturn, AppError> {
    let user = state.user_from_oauth(profile).await?;
    let token = state.create_token(user.id).await?;
    Ok(TokenReturn {
        user,
        token: token.string,
    })
}

pub struct TokenReturn {
    pub user: User,
    pub token: String,
}

impl IntoResponse for TokenReturn {
    fn into_response(self) -> Response {
        let cookie = Cookie::build(("token", self.token))
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict);
        let jar = CookieJar::new().add(cookie);

        (jar, Redirect::to(&self.user.id.relative_url())).into_response()
    }
}

#[derive(Deserialize)]
pub struct SelfInfoRequest {}

#[derive(Serialize, Debug)]
pub struct SelfInfoResponse {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub bits_id: Option<String>,
    pub role: Role,
}

impl RequestBody for SelfInfoRequest {
    type Response = Json<SelfInfoResponse>;

    async fn request(
        self,
        _state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        Ok(Json(SelfInfoResponse {
            id: user.id,
            email: user.email,
            name: user.name,
            phone: user.phone,
            bits_id: user.bits_id,
            role: user.role,
        }))
    }
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub bits_id: Option<String>,
}

impl RequestBody for UpdateProfileRequest {
    type Response = Ack;

    async fn request(self, state: AppState, user: Option<User>) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;
        state
            .update_profile(user.id, self.name, self.phone, self.bits_id)
            .await?;
        Ok(Ack::ok())
    }
}

pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let Some(token) = jar.get("token") else {
        return Ok((APPEND_NO_TOKEN, "not signed in"));
    };
    state.remove_token(token.value()).await?;
    Ok((APPEND_EXPIRED_TOKEN, "ok"))
}
