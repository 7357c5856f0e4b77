use futures::future::join_all;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::{Role, User, UserId};
use crate::error::{AppError, AppResult};
use crate::period::Period;
use crate::traits::Linkable;
use crate::AppState;

id_struct!(CourseId, "course");

impl Linkable for CourseId {
    fn relative_url(&self) -> String {
        format!("/course?id={}", self.0)
    }
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub handout: Option<String>,
    pub cover_image: Option<String>,
    pub offer_year: i32,
    pub offer_sem: i32,
}

impl Course {
    pub fn offer_period(&self) -> Period {
        Period::new(self.offer_year, self.offer_sem)
    }

    /// A course is archived once its offer period is strictly before the
    /// current one.
    pub fn is_archived(&self, current: Period) -> bool {
        self.offer_period() < current
    }
}

/// Read model for a course page.
#[derive(Serialize, Debug, Clone)]
pub struct CourseView {
    pub course: Course,
    /// Instructor display names, in instructor-set order.
    pub instructors: Vec<String>,
    pub is_archive: bool,
    pub is_registered: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewCourse {
    pub name: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub handout: Option<String>,
    pub cover_image: Option<String>,
    pub offer_year: i32,
    pub offer_sem: i32,
    /// Comma-separated instructor emails.
    pub instructors: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateCourse {
    pub name: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub handout: Option<String>,
    pub cover_image: Option<String>,
    pub offer_year: Option<i32>,
    pub offer_sem: Option<i32>,
    /// Comma-separated instructor emails to add on top of the existing set.
    pub instructors: Option<String>,
}

/// Columns of the roster export, in order.
const ROSTER_COLUMNS: [&str; 4] = ["name", "email", "phone", "bits_id"];

/// Renders a student roster as CSV.
///
/// Absent or empty fields become a single space so every row keeps the full
/// column count. Values are joined raw, without quoting, so the output matches
/// what existing consumers of the export parse.
pub fn roster_csv(students: &[User]) -> String {
    let mut out = ROSTER_COLUMNS.join(",");
    out.push('\n');
    for student in students {
        let fields = [
            student.name.as_deref(),
            Some(student.email.as_str()),
            student.phone.as_deref(),
            student.bits_id.as_deref(),
        ];
        let row = fields
            .into_iter()
            .map(|field| field.filter(|s| !s.is_empty()).unwrap_or(" "))
            .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    out
}

impl AppState {
    pub async fn get_course(&self, id: CourseId) -> sqlx::Result<Option<Course>> {
        sqlx::query_as::<_, Course>("SELECT * FROM Course WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_course_by_name(&self, name: &str) -> sqlx::Result<Option<Course>> {
        sqlx::query_as::<_, Course>("SELECT * FROM Course WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn all_courses(&self) -> sqlx::Result<Vec<Course>> {
        sqlx::query_as::<_, Course>("SELECT * FROM Course ORDER BY id LIMIT 10")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn courses_for_period(&self, period: Period) -> sqlx::Result<Vec<Course>> {
        sqlx::query_as::<_, Course>(
            "SELECT * FROM Course WHERE offer_year = $1 AND offer_sem = $2 ORDER BY name",
        )
        .bind(period.year)
        .bind(period.sem)
        .fetch_all(&self.pool)
        .await
    }

    /// Adds a course to a user's enrollment set. Registering twice is a no-op.
    pub async fn register(&self, user_id: UserId, course_id: CourseId) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO Registration (user_id, course_id) VALUES ($1, $2)
                ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(course_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Removes a course from a user's enrollment set, both resolved by their
    /// natural keys. An unknown email or a user that was never enrolled is a
    /// silent no-op; an unknown course is an error.
    pub async fn deregister(&self, user_email: &str, course_name: &str) -> AppResult {
        let course = self
            .get_course_by_name(course_name)
            .await?
            .ok_or(AppError::CourseDoesNotExist)?;

        sqlx::query(
            "DELETE FROM Registration
                WHERE course_id = $1
                AND user_id IN (SELECT id FROM UserAccount WHERE email = $2)",
        )
        .bind(course.id)
        .bind(user_email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Membership test over the enrollment set. Absence of any enrollment is
    /// an ordinary `false`.
    pub async fn is_registered(&self, course_id: CourseId, user_id: UserId) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM Registration WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn instructor_ids(&self, course_id: CourseId) -> sqlx::Result<Vec<UserId>> {
        sqlx::query_scalar::<_, UserId>(
            "SELECT user_id FROM CourseInstructor WHERE course_id = $1 ORDER BY user_id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Assembles the course read model: the record, instructor names resolved
    /// concurrently, the derived archive flag, and the viewer's registration
    /// status (`false` when nobody is signed in).
    pub async fn course_view(
        &self,
        course_id: CourseId,
        viewer: Option<&User>,
    ) -> Result<CourseView, AppError> {
        let course = self
            .get_course(course_id)
            .await?
            .ok_or(AppError::CourseDoesNotExist)?;

        let lookups = self
            .instructor_ids(course_id)
            .await?
            .into_iter()
            .map(|id| self.instructor_name(id));
        let instructors = join_all(lookups)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        let is_registered = match viewer {
            Some(user) => self.is_registered(course_id, user.id).await?,
            None => false,
        };

        let is_archive = course.is_archived(Period::current());
        Ok(CourseView {
            course,
            instructors,
            is_archive,
            is_registered,
        })
    }

    async fn instructor_name(&self, id: UserId) -> Result<String, AppError> {
        Ok(self
            .get_user(id)
            .await?
            .ok_or(AppError::UserDoesNotExist)?
            .display_name())
    }

    /// Enrolled users with role `student`, in account order.
    pub async fn registered_students(&self, course_id: CourseId) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT UserAccount.* FROM UserAccount
                JOIN Registration ON Registration.user_id = UserAccount.id
                WHERE Registration.course_id = $1 AND UserAccount.role = 'student'
                ORDER BY UserAccount.id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn registered_csv(&self, course_id: CourseId) -> sqlx::Result<String> {
        Ok(roster_csv(&self.registered_students(course_id).await?))
    }

    /// Creates a course and grants instructorship for every listed email.
    pub async fn create_course(&self, body: NewCourse) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO Course
                (name, subtitle, description, handout, cover_image, offer_year, offer_sem)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *",
        )
        .bind(&body.name)
        .bind(&body.subtitle)
        .bind(&body.description)
        .bind(&body.handout)
        .bind(&body.cover_image)
        .bind(body.offer_year)
        .bind(body.offer_sem)
        .fetch_one(&self.pool)
        .await?;

        self.apply_instructors(course.id, &body.instructors).await?;

        self.get_course(course.id)
            .await?
            .ok_or(AppError::CourseDoesNotExist)
    }

    /// Replaces the scalar fields present in the patch and, when instructor
    /// emails are given, grants them on top of the existing set. Instructors
    /// are only ever added here, never removed.
    pub async fn update_course(
        &self,
        course_id: CourseId,
        patch: UpdateCourse,
    ) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(
            "UPDATE Course SET
                name = COALESCE($2, name),
                subtitle = COALESCE($3, subtitle),
                description = COALESCE($4, description),
                handout = COALESCE($5, handout),
                cover_image = COALESCE($6, cover_image),
                offer_year = COALESCE($7, offer_year),
                offer_sem = COALESCE($8, offer_sem)
                WHERE id = $1
                RETURNING *",
        )
        .bind(course_id)
        .bind(&patch.name)
        .bind(&patch.subtitle)
        .bind(&patch.description)
        .bind(&patch.handout)
        .bind(&patch.cover_image)
        .bind(patch.offer_year)
        .bind(patch.offer_sem)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CourseDoesNotExist)?;

        if let Some(emails) = &patch.instructors {
            self.apply_instructors(course.id, emails).await?;
        }

        self.get_course(course.id)
            .await?
            .ok_or(AppError::CourseDoesNotExist)
    }

    /// Resolves each listed email and grants instructorship, all concurrently.
    /// Grants are independent: one failing does not undo the others, but the
    /// first failure is reported once all have settled.
    async fn apply_instructors(&self, course_id: CourseId, emails: &str) -> AppResult {
        let emails: Vec<&str> = emails
            .split(',')
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .unique()
            .collect();

        let grants = emails
            .iter()
            .map(|email| self.grant_instructor(email, course_id));
        let mut first_error = None;
        for (email, result) in emails.iter().zip(join_all(grants).await) {
            if let Err(err) = result {
                warn!(%email, error = %err.message(), "instructor grant failed");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Grants a user instructorship of a course.
    ///
    /// Role changes are monotone: students become instructors, instructors
    /// stay instructors, and admins keep their role. The user joins the
    /// course's instructor set either way.
    pub async fn grant_instructor(&self, email: &str, course_id: CourseId) -> AppResult {
        let user = self
            .get_user_from_email(email)
            .await?
            .ok_or(AppError::UserDoesNotExist)?;

        if user.role <= Role::Instructor {
            sqlx::query(
                "UPDATE UserAccount SET role = 'instructor', instructor_for = $1 WHERE id = $2",
            )
            .bind(course_id)
            .bind(user.id)
            .execute(&self.pool)
            .await?;
        }

        sqlx::query(
            "INSERT INTO CourseInstructor (course_id, user_id) VALUES ($1, $2)
                ON CONFLICT DO NOTHING",
        )
        .bind(course_id)
        .bind(user.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Deletes a course and everything scoped to it: every enrolled user's
    /// membership (pulled concurrently), the course's pages (questions follow
    /// their page), its resources, and finally the course row. The statements
    /// are independent; a failure partway leaves the remaining rows for a
    /// retry.
    pub async fn delete_course(&self, course_id: CourseId) -> AppResult {
        let enrolled: Vec<UserId> =
            sqlx::query_scalar::<_, UserId>("SELECT user_id FROM Registration WHERE course_id = $1")
                .bind(course_id)
                .fetch_all(&self.pool)
                .await?;

        let pulls = enrolled.iter().map(|&user_id| async move {
            sqlx::query("DELETE FROM Registration WHERE user_id = $1 AND course_id = $2")
                .bind(user_id)
                .bind(course_id)
                .execute(&self.pool)
                .await
        });
        for result in join_all(pulls).await {
            result?;
        }

        sqlx::query("DELETE FROM CoursePage WHERE course_id = $1")
            .bind(course_id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM Resource WHERE course_id = $1")
            .bind(course_id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM Course WHERE id = $1")
            .bind(course_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Case-insensitive contains-search over course names, capped at five
    /// results. An empty query returns nothing rather than everything.
    pub async fn search_courses(&self, query: &str) -> sqlx::Result<Vec<Course>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Course>("SELECT * FROM Course WHERE name ILIKE $1 ORDER BY id LIMIT 5")
            .bind(format!("%{query}%"))
            .fetch_all(&self.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::db::fixtures::{add_course, add_user, state};

    #[test]
    fn roster_csv_uses_space_placeholder() {
        let students = vec![User {
            id: UserId(1),
            google_id: None,
            email: "a@x".to_string(),
            name: Some("A".to_string()),
            phone: None,
            bits_id: Some("1".to_string()),
            role: Role::Student,
            instructor_for: None,
        }];
        assert_eq!(roster_csv(&students), "name,email,phone,bits_id\nA,a@x, ,1\n");
    }

    #[test]
    fn roster_csv_header_only_for_empty_roster() {
        assert_eq!(roster_csv(&[]), "name,email,phone,bits_id\n");
    }

    #[sqlx::test]
    fn register_is_idempotent(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        let user = add_user(&state, "s@x", Role::Student).await;
        let course = add_course(&state, "Data Structures", 2024, 1).await;

        state.register(user.id, course.id).await?;
        state.register(user.id, course.id).await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM Registration WHERE user_id = $1")
                .bind(user.id)
                .fetch_one(&state.pool)
                .await?;
        assert_eq!(count, 1);
        assert!(state.is_registered(course.id, user.id).await?);
        Ok(())
    }

    #[sqlx::test]
    fn is_registered_is_false_without_enrollment(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        let user = add_user(&state, "s@x", Role::Student).await;
        let course = add_course(&state, "Algorithms", 2024, 1).await;

        assert!(!state.is_registered(course.id, user.id).await?);
        Ok(())
    }

    #[sqlx::test]
    fn deregister_unenrolled_user_is_a_noop(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        let user = add_user(&state, "s@x", Role::Student).await;
        let course = add_course(&state, "Algorithms", 2024, 1).await;

        state.deregister(&user.email, &course.name).await?;
        state.deregister("nobody@x", &course.name).await?;

        state.register(user.id, course.id).await?;
        state.deregister(&user.email, &course.name).await?;
        assert!(!state.is_registered(course.id, user.id).await?);

        let missing = state.deregister(&user.email, "No Such Course").await;
        assert!(matches!(missing, Err(AppError::CourseDoesNotExist)));
        Ok(())
    }

    #[sqlx::test]
    fn create_course_promotes_but_never_demotes(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        let prof = add_user(&state, "a@x", Role::Student).await;
        let admin = add_user(&state, "b@y", Role::Admin).await;

        let course = state
            .create_course(NewCourse {
                name: "Operating Systems".to_string(),
                subtitle: None,
                description: None,
                handout: None,
                cover_image: None,
                offer_year: 2024,
                offer_sem: 1,
                instructors: "a@x,b@y".to_string(),
            })
            .await?;

        let prof = state.get_user(prof.id).await?.unwrap();
        assert_eq!(prof.role, Role::Instructor);
        assert_eq!(prof.instructor_for, Some(course.id));

        let admin = state.get_user(admin.id).await?.unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.instructor_for, None);

        let instructors = state.instructor_ids(course.id).await?;
        assert_eq!(instructors.len(), 2);
        Ok(())
    }

    #[sqlx::test]
    fn create_course_reports_unknown_instructor(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        add_user(&state, "a@x", Role::Student).await;

        let result = state
            .create_course(NewCourse {
                name: "Networks".to_string(),
                subtitle: None,
                description: None,
                handout: None,
                cover_image: None,
                offer_year: 2024,
                offer_sem: 2,
                instructors: "a@x,ghost@x".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::UserDoesNotExist)));

        // The course and the grant that could be applied are still in place.
        let course = state.get_course_by_name("Networks").await?.unwrap();
        assert_eq!(state.instructor_ids(course.id).await?.len(), 1);
        Ok(())
    }

    #[sqlx::test]
    fn update_adds_instructors_without_removing(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        add_user(&state, "a@x", Role::Student).await;
        add_user(&state, "c@z", Role::Student).await;

        let course = state
            .create_course(NewCourse {
                name: "Databases".to_string(),
                subtitle: None,
                description: None,
                handout: None,
                cover_image: None,
                offer_year: 2024,
                offer_sem: 1,
                instructors: "a@x".to_string(),
            })
            .await?;

        let updated = state
            .update_course(
                course.id,
                UpdateCourse {
                    subtitle: Some("Relational systems".to_string()),
                    instructors: Some("c@z".to_string()),
                    ..Default::default()
                },
            )
            .await?;

        assert_eq!(updated.subtitle.as_deref(), Some("Relational systems"));
        assert_eq!(updated.name, "Databases");
        assert_eq!(state.instructor_ids(course.id).await?.len(), 2);
        Ok(())
    }

    #[sqlx::test]
    fn delete_course_cascades(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        let enrolled = add_user(&state, "s@x", Role::Student).await;
        let bystander = add_user(&state, "t@x", Role::Student).await;
        let course = add_course(&state, "Compilers", 2024, 1).await;
        let other = add_course(&state, "Graphics", 2024, 1).await;

        state.register(enrolled.id, course.id).await?;
        state.register(bystander.id, other.id).await?;
        let quiz = state.create_quiz("Week 1", course.id, Vec::new()).await?;
        state
            .add_question(
                quiz.id,
                &crate::db::QuestionData {
                    prompt: "What is a token?".to_string(),
                    options: vec![],
                    answer: None,
                },
            )
            .await?;
        state
            .create_resource(crate::db::NewResource {
                course_id: course.id,
                name: Some("Syllabus".to_string()),
                topic: None,
                description: None,
                url: "/uploads/syllabus.pdf".to_string(),
            })
            .await?;

        state.delete_course(course.id).await?;

        assert!(state.get_course(course.id).await?.is_none());
        assert!(!state.is_registered(course.id, enrolled.id).await?);
        assert!(state.is_registered(other.id, bystander.id).await?);
        assert!(state.get_page(quiz.id).await?.is_none());

        let questions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Question")
            .fetch_one(&state.pool)
            .await?;
        assert_eq!(questions, 0);
        let resources: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Resource")
            .fetch_one(&state.pool)
            .await?;
        assert_eq!(resources, 0);
        Ok(())
    }

    #[sqlx::test]
    fn search_caps_results_and_ignores_case(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        for i in 0..6 {
            add_course(&state, &format!("Data Science {i}"), 2024, 1).await;
        }
        add_course(&state, "Philosophy", 2024, 1).await;

        assert!(state.search_courses("").await?.is_empty());
        assert_eq!(state.search_courses("da").await?.len(), 5);
        assert_eq!(state.search_courses("PHILO").await?.len(), 1);
        assert!(state.search_courses("xyzzy").await?.is_empty());
        Ok(())
    }

    #[sqlx::test]
    fn course_view_resolves_names_and_flags(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        let viewer = add_user(&state, "s@x", Role::Student).await;
        add_user(&state, "prof@x", Role::Student).await;
        sqlx::query("UPDATE UserAccount SET name = 'Prof. P' WHERE email = 'prof@x'")
            .execute(&state.pool)
            .await?;

        let past = state
            .create_course(NewCourse {
                name: "Ancient History".to_string(),
                subtitle: None,
                description: None,
                handout: None,
                cover_image: None,
                offer_year: 2000,
                offer_sem: 1,
                instructors: "prof@x".to_string(),
            })
            .await?;
        let future = add_course(&state, "Time Travel", 3000, 1).await;

        let view = state.course_view(past.id, Some(&viewer)).await?;
        assert!(view.is_archive);
        assert!(!view.is_registered);
        assert_eq!(view.instructors, vec!["Prof. P".to_string()]);

        state.register(viewer.id, past.id).await?;
        let view = state.course_view(past.id, Some(&viewer)).await?;
        assert!(view.is_registered);

        let view = state.course_view(future.id, None).await?;
        assert!(!view.is_archive);
        assert!(!view.is_registered);
        Ok(())
    }

    #[sqlx::test]
    fn registered_csv_only_includes_students(pool: PgPool) -> Result<(), AppError> {
        let state = state(pool);
        let student = add_user(&state, "a@x", Role::Student).await;
        let course = add_course(&state, "Networks", 2024, 1).await;
        sqlx::query("UPDATE UserAccount SET name = 'A', bits_id = '1' WHERE id = $1")
            .bind(student.id)
            .execute(&state.pool)
            .await?;

        let instructor = add_user(&state, "i@x", Role::Instructor).await;
        state.register(student.id, course.id).await?;
        state.register(instructor.id, course.id).await?;

        assert_eq!(
            state.registered_csv(course.id).await?,
            "name,email,phone,bits_id\nA,a@x, ,1\n"
        );
        Ok(())
    }
}
