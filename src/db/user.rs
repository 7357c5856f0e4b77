use serde::{Deserialize, Serialize};

use crate::db::CourseId;
use crate::traits::Linkable;
use crate::AppState;

id_struct!(UserId, "user account");

impl Linkable for UserId {
    fn relative_url(&self) -> String {
        format!("/user?id={}", self.0)
    }
}

/// Account role, ordered by privilege.
///
/// Role changes made by course management only ever move up this ordering.
#[derive(sqlx::Type, Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

/// Profile fields handed over by the Google sign-in flow once it has verified
/// the account.
#[derive(Deserialize, Debug, Clone)]
pub struct GoogleProfile {
    pub google_id: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub google_id: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub bits_id: Option<String>,
    pub role: Role,
    pub instructor_for: Option<CourseId>,
}

impl User {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => self.email.clone(),
        }
    }

    /// Whether this user may administer the given course.
    pub fn may_manage(&self, course_id: CourseId) -> bool {
        self.role == Role::Admin
            || (self.role == Role::Instructor && self.instructor_for == Some(course_id))
    }
}

impl AppState {
    pub async fn get_user(&self, id: UserId) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM UserAccount WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_user_from_email(&self, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM UserAccount WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// Creates or refreshes an account from a verified Google sign-in.
    ///
    /// The first sign-in creates a student account; later sign-ins update the
    /// profile fields and leave the role alone.
    pub async fn user_from_oauth(&self, profile: &GoogleProfile) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO UserAccount (google_id, email, name) VALUES ($1, $2, $3)
                ON CONFLICT (email) DO UPDATE
                SET google_id = EXCLUDED.google_id,
                    name = COALESCE(EXCLUDED.name, UserAccount.name)
                RETURNING *",
        )
        .bind(&profile.google_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .fetch_one(&self.pool)
        .await
    }

    /// Updates the self-service profile fields; absent fields are kept.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: Option<String>,
        phone: Option<String>,
        bits_id: Option<String>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE UserAccount
                SET name = COALESCE($2, name),
                    phone = COALESCE($3, phone),
                    bits_id = COALESCE($4, bits_id)
                WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .bind(phone)
        .bind(bits_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
