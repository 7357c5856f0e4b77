use chrono::{DateTime, TimeDelta, Utc};

use crate::db::{User, UserId};
use crate::AppState;

/// How long a session token is valid for.
const TOKEN_DURATION: TimeDelta = TimeDelta::days(365);
/// Number of characters in a session token.
const TOKEN_LENGTH: usize = 64;

id_struct!(TokenId, "session token");

/// Session token backing the `token` cookie.
#[derive(sqlx::FromRow)]
pub struct Token {
    #[allow(unused)]
    pub id: TokenId,
    pub user_id: UserId,
    pub string: String,
    pub expiry: DateTime<Utc>,
}

impl Token {
    /// Returns whether the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expiry
    }
}

impl AppState {
    /// Returns the status of a token, including the user it belongs to when it
    /// is valid.
    pub async fn token_status(&self, string: Option<&str>) -> sqlx::Result<TokenStatus> {
        let Some(string) = string else {
            return Ok(TokenStatus::None);
        };

        let token = sqlx::query_as::<_, Token>("SELECT * FROM Token WHERE string = $1")
            .bind(string)
            .fetch_optional(&self.pool)
            .await?;

        let Some(token) = token else {
            return Ok(TokenStatus::Unknown);
        };

        if token.is_expired() {
            return Ok(TokenStatus::Expired);
        }

        let Some(user) = self.get_user(token.user_id).await? else {
            return Ok(TokenStatus::Unknown);
        };

        Ok(TokenStatus::Valid(user))
    }

    /// Creates a token for a user and adds it to the database.
    pub async fn create_token(&self, user_id: UserId) -> sqlx::Result<Token> {
        let string = crate::util::random_alphanumeric_string(TOKEN_LENGTH);
        let expiry = Utc::now() + TOKEN_DURATION;

        sqlx::query_as::<_, Token>(
            "INSERT INTO Token (user_id, string, expiry) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(string)
        .bind(expiry)
        .fetch_one(&self.pool)
        .await
    }

    /// Removes a token from the database.
    pub async fn remove_token(&self, string: &str) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM Token WHERE string = $1")
            .bind(string)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub enum TokenStatus {
    /// No token was given.
    #[default]
    None,
    /// The token is valid and the user is signed in.
    Valid(User),
    /// The token has expired.
    Expired,
    /// The token is not recognized.
    Unknown,
}
