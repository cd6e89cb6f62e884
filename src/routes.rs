use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post, MethodRouter},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config;
use crate::handlers::{elevated, protected, public, service};
use crate::middleware::{
    jwt_auth_middleware, require_roles, service_key_middleware, ADMIN_ONLY, FACULTY_ONLY, STAFF, STUDENT_ONLY,
};
use crate::models::{
    AcademicYear, Certificate, College, Course, Department, Division, Exam, Faculty, Internship, Role, Semester,
    Student, Subject,
};
use crate::models::{Creatable, Editable};
use crate::services::student_records::StudentRecord;
use crate::state::AppState;

/// The whole HTTP surface, ready for `axum::serve`
pub fn app(state: AppState) -> Router {
    let server = &config::config().server;
    let api = Router::new()
        .merge(public_routes())
        .merge(protected_routes())
        .nest("/service", service_routes());

    Router::new()
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(server.max_request_size_bytes))
        .layer(RequestBodyLimitLayer::new(server.max_request_size_bytes.max(server.max_upload_size_bytes)))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Restrict a method router to the given roles; the JWT layer must run first
fn guard(roles: &'static [Role], route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(roles, require_roles))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(public::auth::login))
        .route("/auth/register/admin", post(public::auth::register_admin))
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(protected::auth::me))
        .route("/auth/update-password", patch(protected::auth::update_password))
        .route("/auth/register/faculty", guard(ADMIN_ONLY, post(protected::people::create_faculty)))
        .route(
            "/auth/users/:user_id/reset-password",
            guard(ADMIN_ONLY, patch(elevated::auth::reset_password)),
        )
        .nest("/colleges", entity_routes::<College>())
        .nest("/departments", entity_routes::<Department>())
        .nest("/semesters", entity_routes::<Semester>())
        .nest("/divisions", entity_routes::<Division>())
        .nest("/subjects", entity_routes::<Subject>())
        .nest("/courses", course_routes())
        .nest("/academic-years", academic_year_routes())
        .nest("/faculties", faculty_routes())
        .nest("/students", student_routes())
        .nest("/exams", exam_routes())
        .nest("/exam-results", exam_result_routes())
        .route("/analytics/results", guard(STAFF, get(protected::exam_result::statistics)))
        .nest("/attendance", attendance_routes())
        .nest("/assignments", assignment_routes())
        .nest("/submissions", submission_routes())
        .nest("/internships", student_record_routes::<Internship>())
        .nest("/certificates", student_record_routes::<Certificate>())
        .route("/dashboard/summary", get(protected::dashboard::summary))
        .nest("/find", find_routes())
        .nest("/upload", upload_routes())
        .route_layer(from_fn(jwt_auth_middleware))
}

/// Reads for every signed-in user, writes for ADMIN
fn entity_routes<T: Creatable + Editable>() -> Router<AppState> {
    use protected::resource;

    Router::new()
        .route("/", get(resource::list::<T>).merge(guard(ADMIN_ONLY, post(resource::create::<T>))))
        .route("/count", get(resource::count::<T>))
        .route(
            "/:id",
            get(resource::get::<T>)
                .merge(guard(ADMIN_ONLY, patch(resource::update::<T>).delete(resource::soft_delete::<T>))),
        )
        .route("/:id/restore", guard(ADMIN_ONLY, post(resource::restore::<T>)))
        .route("/:id/permanent", guard(ADMIN_ONLY, delete(resource::hard_delete::<T>)))
}

fn course_routes() -> Router<AppState> {
    entity_routes::<Course>().route("/:id/enroll", guard(ADMIN_ONLY, post(protected::course::enroll)))
}

fn academic_year_routes() -> Router<AppState> {
    use protected::{academic_year, resource};

    Router::new()
        .route("/", get(resource::list::<AcademicYear>).merge(guard(ADMIN_ONLY, post(academic_year::create))))
        .route("/count", get(resource::count::<AcademicYear>))
        .route("/active", get(academic_year::active))
        .route(
            "/:id",
            get(resource::get::<AcademicYear>).merge(guard(
                ADMIN_ONLY,
                patch(academic_year::update).delete(resource::soft_delete::<AcademicYear>),
            )),
        )
        .route("/:id/restore", guard(ADMIN_ONLY, post(resource::restore::<AcademicYear>)))
        .route("/:id/permanent", guard(ADMIN_ONLY, delete(resource::hard_delete::<AcademicYear>)))
        .route("/:id/activate", guard(ADMIN_ONLY, post(academic_year::activate)))
        .route("/:id/deactivate", guard(ADMIN_ONLY, post(academic_year::deactivate)))
}

fn faculty_routes() -> Router<AppState> {
    use protected::{people, resource};

    Router::new()
        .route("/", get(resource::list::<Faculty>).post(people::create_faculty))
        .route("/count", get(resource::count::<Faculty>))
        .route(
            "/:id",
            get(resource::get::<Faculty>).patch(resource::update::<Faculty>).delete(resource::soft_delete::<Faculty>),
        )
        .route("/:id/restore", post(resource::restore::<Faculty>))
        .route("/:id/permanent", delete(people::hard_delete_faculty))
        .route_layer(from_fn_with_state(ADMIN_ONLY, require_roles))
}

fn student_routes() -> Router<AppState> {
    use protected::{people, resource};

    Router::new()
        .route("/", get(resource::list::<Student>).post(people::create_student))
        .route("/count", get(resource::count::<Student>))
        .route("/enrollment/:enrollment_number", get(people::student_by_enrollment))
        .route(
            "/:id",
            get(resource::get::<Student>).patch(resource::update::<Student>).delete(resource::soft_delete::<Student>),
        )
        .route("/:id/restore", post(resource::restore::<Student>))
        .route("/:id/permanent", delete(people::hard_delete_student))
        .route_layer(from_fn_with_state(ADMIN_ONLY, require_roles))
}

fn exam_routes() -> Router<AppState> {
    use protected::{exam, resource};

    Router::new()
        .route("/", get(resource::list::<Exam>).post(exam::create))
        .route("/count", get(resource::count::<Exam>))
        .route("/:id", get(resource::get::<Exam>).patch(resource::update::<Exam>).delete(resource::soft_delete::<Exam>))
        .route("/:id/restore", post(resource::restore::<Exam>))
        .route("/:id/permanent", delete(resource::hard_delete::<Exam>))
        .route("/:id/publish", post(exam::publish))
        .route("/:id/unpublish", post(exam::unpublish))
        .route_layer(from_fn_with_state(ADMIN_ONLY, require_roles))
}

fn exam_result_routes() -> Router<AppState> {
    use protected::exam_result;

    Router::new()
        .route("/", get(exam_result::list).merge(guard(ADMIN_ONLY, post(exam_result::create))))
        .route("/statistics", guard(STAFF, get(exam_result::statistics)))
        .route(
            "/:id",
            get(exam_result::get).merge(guard(ADMIN_ONLY, patch(exam_result::update).delete(exam_result::delete))),
        )
}

fn attendance_routes() -> Router<AppState> {
    use protected::attendance;

    Router::new()
        .route("/", guard(STAFF, get(attendance::for_course)))
        .route("/summary", get(attendance::summary))
        .route("/mark", guard(STAFF, post(attendance::mark)))
        .route("/:id", guard(STAFF, patch(attendance::update)))
}

fn assignment_routes() -> Router<AppState> {
    use protected::assignment;

    Router::new()
        .route("/", get(assignment::list).merge(guard(FACULTY_ONLY, post(assignment::create))))
        .route(
            "/:id",
            get(assignment::get).merge(guard(FACULTY_ONLY, patch(assignment::update).delete(assignment::delete))),
        )
        .route("/:id/statistics", guard(STAFF, get(assignment::statistics)))
}

fn submission_routes() -> Router<AppState> {
    use protected::assignment;

    Router::new()
        .route(
            "/",
            guard(STAFF, get(assignment::list_submissions)).merge(guard(STUDENT_ONLY, post(assignment::submit))),
        )
        .route("/me", guard(STUDENT_ONLY, get(assignment::my_submissions)))
        .route(
            "/:id",
            get(assignment::get_submission).merge(guard(
                STUDENT_ONLY,
                patch(assignment::update_submission).delete(assignment::delete_submission),
            )),
        )
        .route("/:id/grade", guard(FACULTY_ONLY, post(assignment::grade)))
}

/// Students own their records; staff read across students
fn student_record_routes<T: StudentRecord>() -> Router<AppState> {
    use protected::student_records as records;

    Router::new()
        .route("/", guard(STUDENT_ONLY, post(records::create::<T>)))
        .route("/me", guard(STUDENT_ONLY, get(records::mine::<T>)))
        .route("/stats", guard(STAFF, get(records::stats::<T>)))
        .route("/student/:student_id", guard(STAFF, get(records::for_student::<T>)))
        .route(
            "/:id",
            get(records::get::<T>).merge(guard(STUDENT_ONLY, patch(records::update::<T>).delete(records::delete::<T>))),
        )
}

fn find_routes() -> Router<AppState> {
    Router::new()
        .route("/:resource", post(elevated::find::find_post))
        .route_layer(from_fn_with_state(ADMIN_ONLY, require_roles))
}

fn upload_routes() -> Router<AppState> {
    use elevated::upload;

    Router::new()
        .route("/faculty", post(upload::faculty))
        .route("/students", post(upload::students))
        .route("/subjects", post(upload::subjects))
        .route("/faculty-matrix", post(upload::faculty_matrix))
        .route("/results", post(upload::results))
        .route("/attendance", post(upload::attendance))
        .layer(DefaultBodyLimit::max(config::config().server.max_upload_size_bytes))
        .route_layer(from_fn_with_state(ADMIN_ONLY, require_roles))
}

fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/process-results", post(service::process_results))
        .route("/process-faculty-matrix", post(service::process_faculty_matrix))
        .route("/health", get(service::health))
        .route_layer(from_fn(service_key_middleware))
}

fn cors_layer() -> CorsLayer {
    let origins = &config::config().security.cors_origins;
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    // an empty list only opens CORS up in development
    if origins.iter().any(|o| o == "*") || (origins.is_empty() && crate::is_development!()) {
        return base.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect();
    base.allow_origin(allowed)
}
