mod course;
mod page;
mod question;
mod resource;
mod setup;
mod token;
mod user;

pub use course::{roster_csv, Course, CourseId, CourseView, NewCourse, UpdateCourse};
pub use page::{CoursePage, PageContent, PageId, PageKind};
pub use question::{Question, QuestionData, QuestionId};
pub use resource::{NewResource, Resource, ResourceId};
pub use token::{Token, TokenStatus};
pub use user::{GoogleProfile, Role, User, UserId};

#[cfg(test)]
pub(crate) mod fixtures {
    use sqlx::PgPool;

    use crate::cookies::PrincipalProvider;
    use crate::db::{Course, Role, User};
    use crate::AppState;

    pub fn state(pool: PgPool) -> AppState {
        AppState {
            pool,
            principal: PrincipalProvider::SessionCookie,
        }
    }

    pub async fn add_user(state: &AppState, email: &str, role: Role) -> User {
        sqlx::query_as::<_, User>("INSERT INTO UserAccount (email, role) VALUES ($1, $2) RETURNING *")
            .bind(email)
            .bind(role)
            .fetch_one(&state.pool)
            .await
            .unwrap()
    }

    pub async fn add_course(state: &AppState, name: &str, year: i32, sem: i32) -> Course {
        sqlx::query_as::<_, Course>(
            "INSERT INTO Course (name, offer_year, offer_sem) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(year)
        .bind(sem)
        .fetch_one(&state.pool)
        .await
        .unwrap()
    }
}
