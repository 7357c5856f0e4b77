use axum::response::AppendHeaders;
use axum_extra::extract::CookieJar;

use crate::api::auth::{APPEND_EXPIRED_TOKEN, APPEND_NO_TOKEN};
use crate::db::{TokenStatus, User, UserId};
use crate::{AppError, AppState};

/// Where the current principal comes from.
///
/// The server resolves the signed-in user from the session token cookie;
/// handler tests inject a fixed user instead, so there is no environment-keyed
/// bypass anywhere in the request path.
#[derive(Debug, Clone)]
pub enum PrincipalProvider {
    SessionCookie,
    Fixed(UserId),
}

pub type CookieHeaders = AppendHeaders<Option<(axum::http::HeaderName, &'static str)>>;

pub async fn process_cookies(
    state: &AppState,
    jar: &CookieJar,
) -> Result<(Option<User>, CookieHeaders), AppError> {
    if let PrincipalProvider::Fixed(user_id) = state.principal {
        return Ok((state.get_user(user_id).await?, APPEND_NO_TOKEN));
    }

    let token = jar.get("token").map(|cookie| cookie.value());
    let token_status = state.token_status(token).await?;
    let cookie_header = match &token_status {
        TokenStatus::None | TokenStatus::Valid(_) => APPEND_NO_TOKEN,
        TokenStatus::Expired | TokenStatus::Unknown => APPEND_EXPIRED_TOKEN,
    };
    let user = match token_status {
        TokenStatus::Valid(user) => Some(user),
        _ => None,
    };
    Ok((user, cookie_header))
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;

    #[sqlx::test]
    fn fixed_principal_resolves_without_cookie(pool: PgPool) -> Result<(), AppError> {
        let base = AppState {
            pool,
            principal: PrincipalProvider::SessionCookie,
        };
        let user = base
            .user_from_oauth(&crate::db::GoogleProfile {
                google_id: "g-1".to_string(),
                email: "fixture@example.com".to_string(),
                name: None,
            })
            .await?;

        let state = AppState {
            principal: PrincipalProvider::Fixed(user.id),
            ..base.clone()
        };
        let (resolved, _headers) = process_cookies(&state, &CookieJar::new()).await?;
        assert_eq!(resolved.map(|u| u.id), Some(user.id));

        let (resolved, _headers) = process_cookies(&base, &CookieJar::new()).await?;
        assert!(resolved.is_none());
        Ok(())
    }
}
