use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::diagnostic::DEFAULT_COUNT;
use crate::error::ApiError;
use crate::models::{KnowledgePoint, NewAttempt, Question};
use crate::service::{PracticeQuery, Tutor};

#[derive(Clone)]
pub struct ApiState {
    pub tutor: Tutor,
}

pub fn app_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/attempts", post(submit_attempt))
        .route("/api/users/:user_id/attempts", get(list_attempts))
        .route("/api/users/:user_id/mastery", get(mastery))
        .route("/api/users/:user_id/mastery/questions", get(question_mastery))
        .route("/api/users/:user_id/plans/:subject", get(get_plan).post(generate_plan))
        .route("/api/users/:user_id/reviews/due", get(due_reviews))
        .route("/api/diagnostic", get(diagnostic))
        .route("/api/practice", get(practice))
        .route("/api/knowledge-points", get(list_knowledge_points).post(create_knowledge_point))
        .route("/api/questions", get(list_questions).post(create_question))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn submit_attempt(
    State(state): State<ApiState>,
    payload: Result<Json<NewAttempt>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let outcome = state.tutor.submit_attempt(payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn list_attempts(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.tutor.attempts(&user_id).await?))
}

#[derive(Deserialize)]
struct SubjectFilter {
    subject: Option<String>,
}

async fn mastery(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    query: Result<Query<SubjectFilter>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(filter) = query?;
    Ok(Json(state.tutor.mastery(&user_id, filter.subject.as_deref()).await?))
}

async fn question_mastery(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    query: Result<Query<SubjectFilter>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(filter) = query?;
    Ok(Json(state.tutor.question_mastery(&user_id, filter.subject.as_deref()).await?))
}

async fn generate_plan(
    State(state): State<ApiState>,
    Path((user_id, subject)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state.tutor.generate_study_plan(&user_id, &subject, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn get_plan(
    State(state): State<ApiState>,
    Path((user_id, subject)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    match state.tutor.study_plan(&user_id, &subject).await? {
        Some(plan) => Ok(Json(plan)),
        None => Err(ApiError::NotFound(format!("no study plan for {} / {}", user_id, subject))),
    }
}

async fn due_reviews(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.tutor.due_review_question_ids(&user_id, Utc::now()).await?))
}

#[derive(Deserialize)]
struct DiagnosticParams {
    subject: String,
    grade: i64,
    count: Option<usize>,
}

async fn diagnostic(
    State(state): State<ApiState>,
    query: Result<Query<DiagnosticParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = query?;
    let count = params.count.unwrap_or(DEFAULT_COUNT);
    Ok(Json(state.tutor.diagnostic_questions(&params.subject, params.grade, count).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PracticeParams {
    subject: String,
    grade: Option<i64>,
    user_id: Option<String>,
    mode: Option<String>,
    limit: Option<usize>,
}

async fn practice(
    State(state): State<ApiState>,
    query: Result<Query<PracticeParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = query?;
    let review_mode = match params.mode.as_deref() {
        None | Some("all") => false,
        Some("review") => true,
        Some(other) => return Err(ApiError::BadRequest(format!("unknown mode '{}'", other))),
    };
    if review_mode && params.user_id.as_deref().map_or(true, str::is_empty) {
        return Err(ApiError::BadRequest("review mode requires userId".to_string()));
    }

    let query = PracticeQuery {
        subject: params.subject,
        grade: params.grade,
        user_id: params.user_id,
        review_mode,
        limit: params.limit,
    };
    Ok(Json(state.tutor.practice_questions(&query, Utc::now()).await?))
}

#[derive(Deserialize)]
struct CatalogFilter {
    subject: String,
    grade: Option<i64>,
}

async fn list_knowledge_points(
    State(state): State<ApiState>,
    query: Result<Query<CatalogFilter>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(filter) = query?;
    Ok(Json(state.tutor.knowledge_points(&filter.subject, filter.grade).await?))
}

async fn create_knowledge_point(
    State(state): State<ApiState>,
    payload: Result<Json<KnowledgePoint>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(kp) = payload?;
    if kp.id.trim().is_empty() || kp.subject.trim().is_empty() {
        return Err(ApiError::BadRequest("id and subject are required".to_string()));
    }
    state.tutor.add_knowledge_point(&kp).await?;
    Ok((StatusCode::CREATED, Json(kp)))
}

async fn list_questions(
    State(state): State<ApiState>,
    query: Result<Query<CatalogFilter>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(filter) = query?;
    Ok(Json(state.tutor.questions(&filter.subject, filter.grade).await?))
}

async fn create_question(
    State(state): State<ApiState>,
    payload: Result<Json<Question>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(q) = payload?;
    if q.id.trim().is_empty() || q.knowledge_point_id.trim().is_empty() {
        return Err(ApiError::BadRequest("id and knowledgePointId are required".to_string()));
    }
    state.tutor.add_question(&q).await?;
    Ok((StatusCode::CREATED, Json(q)))
}
