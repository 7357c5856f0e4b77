use crate::traits::RequestBody;
use crate::{api, AppState};

pub(crate) fn router() -> axum::Router<AppState> {
    use axum::routing::{get, post};

    axum::Router::new()
        // Session
        .route("/self-info", get(api::auth::SelfInfoRequest::as_handler_query))
        .route(
            "/update-profile",
            post(api::auth::UpdateProfileRequest::as_json_handler),
        )
        .route("/sign-out", post(api::auth::sign_out))
        // Courses
        .route("/courses", get(api::course::CourseListRequest::as_handler_query))
        .route("/course", get(api::course::CourseViewRequest::as_handler_query))
        .route(
            "/course/search",
            get(api::course::SearchRequest::as_handler_query),
        )
        .route(
            "/course/pages",
            get(api::course::CoursePagesRequest::as_handler_query),
        )
        .route(
            "/course/resources",
            get(api::course::CourseResourcesRequest::as_handler_query),
        )
        .route(
            "/course/register",
            post(api::course::RegisterRequest::as_json_handler),
        )
        .route(
            "/course/deregister",
            post(api::course::DeregisterRequest::as_json_handler),
        )
        .route("/archives", get(api::course::ArchivesRequest::as_handler_query))
        .route(
            "/archives/courses",
            get(api::course::ArchiveCoursesRequest::as_handler_query),
        )
        // Course administration
        .route(
            "/admin/course/create",
            post(api::admin::CreateCourseRequest::as_json_handler),
        )
        .route(
            "/admin/course/update",
            post(api::admin::UpdateCourseRequest::as_json_handler),
        )
        .route(
            "/admin/course/delete",
            post(api::admin::DeleteCourseRequest::as_json_handler),
        )
        .route(
            "/admin/course/students",
            get(api::admin::StudentsRequest::as_handler_query),
        )
        .route(
            "/admin/course/students/download",
            get(api::admin::StudentsCsvRequest::as_handler_query),
        )
        .route(
            "/admin/course/resource/add",
            post(api::resource::AddResourceRequest::as_multipart_form_handler),
        )
        .route(
            "/admin/course/resource/remove",
            post(api::resource::RemoveResourceRequest::as_json_handler),
        )
        .route(
            "/admin/course/page/add",
            post(api::admin::CreatePageRequest::as_json_handler),
        )
        .route(
            "/admin/course/quiz/questions",
            get(api::quiz::QuizQuestionsRequest::as_handler_query),
        )
        .route(
            "/admin/course/quiz/init",
            post(api::quiz::InitQuizRequest::as_json_handler),
        )
        .route(
            "/admin/course/quiz/destroy",
            post(api::quiz::DestroyQuizRequest::as_json_handler),
        )
        .route(
            "/admin/course/quiz/update",
            post(api::quiz::UpdateQuizRequest::as_json_handler),
        )
}
