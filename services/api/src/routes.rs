//! API service routes

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use common::{
    error::{DatabaseError, ServiceError, ServiceResult, UpstreamError},
    policy::{Access, PolicyOverrides, RouteTable, Verb},
};
use serde_json::{Value, json};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::{
    ml::SERVICE_NAME,
    models::{
        analytics::{AttritionSummary, summarize},
        employee::{BulkPredictRequest, Employee, EmployeeFilter, EmployeeInput},
        ml::{FeedbackHistory, SentimentQuery, SentimentReport},
    },
    state::AppState,
};

type EmployeeId = WithRejection<Path<i64>, ServiceError>;

/// Create the router for the API service
///
/// Everything except `/health` requires a bearer token unless opened by
/// `overrides`.
pub fn create_router(state: AppState, overrides: PolicyOverrides) -> Router {
    RouteTable::new(state.authenticator.clone(), overrides)
        .route(Verb::Get, "/health", Access::Public, health_check)
        .route(Verb::Get, "/employees", Access::Protected, list_employees)
        .route(Verb::Post, "/employees", Access::Protected, create_employee)
        .route(Verb::Get, "/employees/:id", Access::Protected, get_employee)
        .route(Verb::Put, "/employees/:id", Access::Protected, update_employee)
        .route(Verb::Delete, "/employees/:id", Access::Protected, delete_employee)
        .route(Verb::Post, "/employees/:id/predict", Access::Protected, predict_employee)
        .route(Verb::Get, "/employees/:id/feedback", Access::Protected, employee_feedback)
        .route(Verb::Post, "/predict/bulk", Access::Protected, predict_bulk)
        .route(Verb::Get, "/analytics/attrition", Access::Protected, attrition_summary)
        .route(Verb::Get, "/sentiment", Access::Protected, sentiment_report)
        .route(Verb::Post, "/feedback/upload", Access::Protected, upload_feedback)
        .into_router()
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Response {
    let database = state.employees.health_check().await.unwrap_or(false);
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "api-service",
            "database": database,
        })),
    )
        .into_response()
}

fn conflict_on(field: &str) -> ServiceError {
    match field {
        "employeeId" => ServiceError::conflict(field, "Employee ID already exists"),
        "email" => ServiceError::conflict(field, "Email already exists"),
        other => ServiceError::conflict(other, format!("{} already exists", other)),
    }
}

fn from_store(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::Conflict { field } => conflict_on(&field),
        other => other.into(),
    }
}

fn employee_not_found(employee_id: i64) -> ServiceError {
    ServiceError::not_found("Employee", employee_id)
}

fn check_risk(risk: f64) -> Result<f64, ServiceError> {
    if (0.0..=100.0).contains(&risk) {
        Ok(risk)
    } else {
        Err(UpstreamError::InvalidResponse {
            service: SERVICE_NAME.to_string(),
            message: format!("attrition risk {} is outside 0..=100", risk),
        }
        .into())
    }
}

/// List employees, optionally filtered by department or search term
pub async fn list_employees(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): WithRejection<Query<EmployeeFilter>, ServiceError>,
) -> ServiceResult<Json<Vec<Employee>>> {
    Ok(Json(state.employees.list(&filter).await?))
}

/// Get one employee
pub async fn get_employee(
    State(state): State<AppState>,
    WithRejection(Path(employee_id), _): EmployeeId,
) -> ServiceResult<Json<Employee>> {
    state
        .employees
        .find(employee_id)
        .await?
        .map(Json)
        .ok_or_else(|| employee_not_found(employee_id))
}

/// Create an employee
pub async fn create_employee(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<EmployeeInput>, ServiceError>,
) -> ServiceResult<(StatusCode, Json<Employee>)> {
    let employee = input.validate()?;

    if state.employees.find(employee.employee_id).await?.is_some() {
        return Err(conflict_on("employeeId"));
    }
    if state
        .employees
        .find_by_email(&employee.email)
        .await?
        .is_some()
    {
        return Err(conflict_on("email"));
    }

    let stored = state.employees.insert(&employee).await.map_err(from_store)?;
    info!("Employee {} created", stored.employee_id);
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Update an employee with a partial record
pub async fn update_employee(
    State(state): State<AppState>,
    WithRejection(Path(employee_id), _): EmployeeId,
    WithRejection(Json(patch), _): WithRejection<Json<Value>, ServiceError>,
) -> ServiceResult<Json<Employee>> {
    let existing = state
        .employees
        .find(employee_id)
        .await?
        .ok_or_else(|| employee_not_found(employee_id))?;

    let updated = existing.merge(patch)?;

    if let Some(owner) = state.employees.find_by_email(&updated.email).await? {
        if owner.employee_id != employee_id {
            return Err(conflict_on("email"));
        }
    }

    let stored = state
        .employees
        .update(&updated)
        .await
        .map_err(from_store)?
        .ok_or_else(|| employee_not_found(employee_id))?;
    info!("Employee {} updated", employee_id);
    Ok(Json(stored))
}

/// Delete an employee
pub async fn delete_employee(
    State(state): State<AppState>,
    WithRejection(Path(employee_id), _): EmployeeId,
) -> ServiceResult<Json<Value>> {
    if !state.employees.delete(employee_id).await? {
        return Err(employee_not_found(employee_id));
    }

    info!("Employee {} deleted", employee_id);
    Ok(Json(json!({ "message": "Employee deleted successfully" })))
}

/// Score one employee with the ML service and store the result
pub async fn predict_employee(
    State(state): State<AppState>,
    WithRejection(Path(employee_id), _): EmployeeId,
) -> ServiceResult<Json<Employee>> {
    let employee = state
        .employees
        .find(employee_id)
        .await?
        .ok_or_else(|| employee_not_found(employee_id))?;

    let prediction = state.ml.predict(&employee).await?;
    let risk = check_risk(prediction.attrition_risk)?;

    let stored = state
        .employees
        .record_scores(employee_id, risk, prediction.sentiment_score)
        .await?
        .ok_or_else(|| employee_not_found(employee_id))?;
    info!("Employee {} scored at {}% risk", employee_id, risk);
    Ok(Json(stored))
}

fn validate_batch(inputs: Vec<EmployeeInput>) -> Result<Vec<Employee>, ServiceError> {
    if inputs.is_empty() {
        return Err(ServiceError::validation("employees", "No employees provided"));
    }

    let mut ids = HashSet::new();
    let mut emails = HashSet::new();
    let mut employees = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.into_iter().enumerate() {
        let employee = input.validate().map_err(|e| match e {
            ServiceError::ValidationFailed { field, reason } => {
                ServiceError::validation(format!("employees[{}].{}", index, field), reason)
            }
            other => other,
        })?;

        if !ids.insert(employee.employee_id) {
            return Err(ServiceError::validation(
                format!("employees[{}].employeeId", index),
                "Duplicate employee ID in batch",
            ));
        }
        if !emails.insert(employee.email.clone()) {
            return Err(ServiceError::validation(
                format!("employees[{}].email", index),
                "Duplicate email in batch",
            ));
        }
        employees.push(employee);
    }
    Ok(employees)
}

/// Score a batch with the ML service and store every record in one transaction
pub async fn predict_bulk(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<BulkPredictRequest>, ServiceError>,
) -> ServiceResult<Json<Value>> {
    let mut employees = validate_batch(request.employees)?;

    let bulk = state.ml.predict_bulk(&employees).await?;

    let mut scored = 0;
    for prediction in &bulk.predictions {
        let Some(employee) = employees
            .iter_mut()
            .find(|e| e.employee_id == prediction.employee_id)
        else {
            warn!(
                "ML service scored unknown employee {}",
                prediction.employee_id
            );
            continue;
        };
        employee.attrition_risk = Some(check_risk(prediction.attrition_risk)?);
        if prediction.sentiment_score.is_some() {
            employee.sentiment_score = prediction.sentiment_score;
        }
        scored += 1;
    }

    let stored = state
        .employees
        .upsert_many(&employees)
        .await
        .map_err(from_store)?;
    info!("Bulk stored {} employees, {} scored", stored, scored);

    Ok(Json(json!({
        "status": "success",
        "message": bulk
            .message
            .unwrap_or_else(|| "Bulk prediction and storage complete".to_string()),
        "stored": stored,
        "scored": scored,
    })))
}

/// Attrition risk summary over all employees
pub async fn attrition_summary(
    State(state): State<AppState>,
) -> ServiceResult<Json<AttritionSummary>> {
    let employees = state.employees.list(&EmployeeFilter::default()).await?;
    Ok(Json(summarize(&employees, state.at_risk_threshold)))
}

/// Sentiment report from the ML service
pub async fn sentiment_report(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SentimentQuery>, ServiceError>,
) -> ServiceResult<Json<SentimentReport>> {
    Ok(Json(state.ml.sentiment(&query).await?))
}

/// Feedback history of one employee from the ML service
pub async fn employee_feedback(
    State(state): State<AppState>,
    WithRejection(Path(employee_id), _): EmployeeId,
) -> ServiceResult<Json<FeedbackHistory>> {
    Ok(Json(state.ml.feedback(employee_id).await?))
}

/// Forward an uploaded feedback file to the ML service
pub async fn upload_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ServiceResult<Json<Value>> {
    if body.is_empty() {
        return Err(ServiceError::validation("file", "No file uploaded"));
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    info!("Forwarding {} byte feedback upload", body.len());
    Ok(Json(state.ml.upload_feedback(content_type, body).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ml::MlClient,
        models::ml::{BulkPrediction, Feedback, Prediction, ScoredEmployee},
        repositories::memory::MemoryEmployeeStore,
    };
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use common::{
        middleware::Authenticator,
        token::{TokenConfig, TokenService},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Clone, Copy)]
    enum Stub {
        Healthy,
        Down,
        Rejecting,
    }

    struct StubMl(Stub);

    impl StubMl {
        fn check(&self) -> Result<(), UpstreamError> {
            match self.0 {
                Stub::Healthy => Ok(()),
                Stub::Down => Err(UpstreamError::Unreachable {
                    service: SERVICE_NAME.to_string(),
                    message: "connection refused".to_string(),
                }),
                Stub::Rejecting => Err(UpstreamError::Status {
                    service: SERVICE_NAME.to_string(),
                    status: 400,
                    message: "Missing columns: ['Age']".to_string(),
                }),
            }
        }
    }

    #[async_trait]
    impl MlClient for StubMl {
        async fn predict(&self, _employee: &Employee) -> Result<Prediction, UpstreamError> {
            self.check()?;
            Ok(Prediction {
                attrition_risk: 55.0,
                sentiment_score: Some(61.0),
            })
        }

        async fn predict_bulk(
            &self,
            employees: &[Employee],
        ) -> Result<BulkPrediction, UpstreamError> {
            self.check()?;
            Ok(BulkPrediction {
                status: Some("success".to_string()),
                message: None,
                predictions: employees
                    .iter()
                    .map(|e| ScoredEmployee {
                        employee_id: e.employee_id,
                        attrition_risk: e.employee_id as f64 * 10.0,
                        sentiment_score: None,
                    })
                    .collect(),
            })
        }

        async fn sentiment(
            &self,
            query: &SentimentQuery,
        ) -> Result<SentimentReport, UpstreamError> {
            self.check()?;
            Ok(SentimentReport {
                total_feedback: if query.department.is_some() { 3 } else { 10 },
                positive_sentiment: 60.0,
                negative_sentiment: 20.0,
                overall_score: 0.4,
                trend_data: vec![],
                department_data: vec![],
                distribution_data: vec![],
                employees_data: vec![],
            })
        }

        async fn feedback(&self, employee_id: i64) -> Result<FeedbackHistory, UpstreamError> {
            self.check()?;
            Ok(FeedbackHistory {
                feedbacks: vec![Feedback {
                    employee_id,
                    feedback_text: "Great team".to_string(),
                    sentiment_score: 0.8,
                    date: "2025-01-15".to_string(),
                }],
            })
        }

        async fn upload_feedback(
            &self,
            content_type: Option<String>,
            body: Bytes,
        ) -> Result<Value, UpstreamError> {
            self.check()?;
            Ok(json!({
                "message": format!("received {} bytes", body.len()),
                "contentType": content_type,
            }))
        }
    }

    struct TestApp {
        router: Router,
        token: String,
    }

    fn test_app(stub: Stub, overrides: PolicyOverrides) -> TestApp {
        let tokens = TokenService::new(&TokenConfig {
            secret: "api-routes-secret".to_string(),
            expiry_seconds: 3600,
        });
        let token = tokens.issue(uuid::Uuid::new_v4()).unwrap().token;
        let state = AppState {
            employees: Arc::new(MemoryEmployeeStore::default()),
            ml: Arc::new(StubMl(stub)),
            authenticator: Authenticator::new(tokens),
            at_risk_threshold: 30.0,
        };
        TestApp {
            router: create_router(state, overrides),
            token,
        }
    }

    fn app() -> TestApp {
        test_app(Stub::Healthy, PolicyOverrides::default())
    }

    impl TestApp {
        async fn request(
            &self,
            method: &str,
            uri: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder()
                .method(method)
                .uri(uri)
                .header("Authorization", format!("Bearer {}", self.token));
            let body = match body {
                Some(json) => {
                    builder = builder.header("Content-Type", "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };
            self.send(builder.body(body).unwrap()).await
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }

        async fn create(&self, id: i64, name: &str, email: &str) -> (StatusCode, Value) {
            self.request(
                "POST",
                "/employees",
                Some(json!({
                    "employeeId": id,
                    "name": name,
                    "email": email,
                    "department": "Sales",
                    "jobRole": "Sales Executive",
                    "yearsAtCompany": 4
                })),
            )
            .await
        }
    }

    #[tokio::test]
    async fn test_employee_routes_require_token() {
        let app = app();
        let request = Request::builder()
            .uri("/employees")
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["reason"], "no_token");

        let request = Request::builder()
            .uri("/employees/1")
            .header("Authorization", "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["reason"], "malformed");
    }

    #[tokio::test]
    async fn test_override_opens_only_listed_route() {
        let app = test_app(Stub::Healthy, PolicyOverrides::parse(["GET /employees"]));
        let open = Request::builder()
            .uri("/employees")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.send(open).await.0, StatusCode::OK);

        let closed = Request::builder()
            .uri("/analytics/attrition")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.send(closed).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let app = app();
        let (status, created) = app.create(1, "Ana Lima", "Ana@X.io").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["email"], "ana@x.io");
        assert_eq!(created["yearsAtCompany"], 4);

        let (status, fetched) = app.request("GET", "/employees/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Ana Lima");
        assert!(fetched["attritionRisk"].is_null());
    }

    #[tokio::test]
    async fn test_duplicate_employee_id_is_conflict() {
        let app = app();
        app.create(1, "Ana", "ana@x.io").await;

        let (status, body) = app.create(1, "Bo", "bo@x.io").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "conflict");
        assert_eq!(body["field"], "employeeId");
        assert_eq!(body["error"], "Employee ID already exists");

        let (status, body) = app.create(2, "Bo", "ana@x.io").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "email");
        assert_eq!(body["error"], "Email already exists");
    }

    #[tokio::test]
    async fn test_create_requires_id_name_and_email() {
        let app = app();
        let (status, body) = app
            .request("POST", "/employees", Some(json!({"employeeId": 3, "email": "c@x.io"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Employee ID, Name, and Email are required");
        assert_eq!(body["field"], "name");
    }

    #[tokio::test]
    async fn test_unknown_employee_is_404() {
        let app = app();
        let (status, body) = app.request("GET", "/employees/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
        assert_eq!(body["key"], "99");

        let (status, _) = app.request("GET", "/employees/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_merges_and_guards_email() {
        let app = app();
        app.create(1, "Ana", "ana@x.io").await;
        app.create(2, "Bo", "bo@x.io").await;

        let (status, updated) = app
            .request("PUT", "/employees/1", Some(json!({"department": "R&D"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["department"], "R&D");
        assert_eq!(updated["jobRole"], "Sales Executive");

        let (status, body) = app
            .request("PUT", "/employees/1", Some(json!({"email": "bo@x.io"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "email");

        let (status, _) = app
            .request("PUT", "/employees/1", Some(json!({"employeeId": 5})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .request("PUT", "/employees/42", Some(json!({"name": "Ghost"})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_then_missing() {
        let app = app();
        app.create(1, "Ana", "ana@x.io").await;

        let (status, body) = app.request("DELETE", "/employees/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Employee deleted successfully");

        let (status, _) = app.request("DELETE", "/employees/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let app = app();
        app.create(1, "Ana Lima", "ana@x.io").await;
        app.create(2, "Bo Chen", "bo@x.io").await;

        let (_, all) = app.request("GET", "/employees", None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (_, found) = app.request("GET", "/employees?search=chen", None).await;
        let found = found.as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["employeeId"], 2);

        let (_, none) = app.request("GET", "/employees?department=HR", None).await;
        assert!(none.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_predict_stores_scores_for_analytics() {
        let app = app();
        app.create(1, "Ana", "ana@x.io").await;
        app.create(2, "Bo", "bo@x.io").await;

        let (status, scored) = app.request("POST", "/employees/1/predict", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(scored["attritionRisk"], 55.0);
        assert_eq!(scored["sentimentScore"], 61.0);

        let (status, summary) = app.request("GET", "/analytics/attrition", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["totalEmployees"], 2);
        assert_eq!(summary["atRiskCount"], 1);
        assert_eq!(summary["attritionRate"], 50.0);
        assert_eq!(summary["departmentData"][0]["riskPercentage"], 55.0);
    }

    #[tokio::test]
    async fn test_upstream_failures_are_distinguishable() {
        let down = test_app(Stub::Down, PolicyOverrides::default());
        down.create(1, "Ana", "ana@x.io").await;
        let (status, body) = down.request("POST", "/employees/1/predict", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["kind"], "upstream_failure");
        assert_eq!(body["service"], SERVICE_NAME);

        let rejecting = test_app(Stub::Rejecting, PolicyOverrides::default());
        rejecting.create(1, "Ana", "ana@x.io").await;
        let (status, body) = rejecting
            .request("POST", "/employees/1/predict", None)
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "upstream_rejected");

        let (_, stored) = rejecting.request("GET", "/employees/1", None).await;
        assert!(stored["attritionRisk"].is_null());
    }

    #[tokio::test]
    async fn test_bulk_predict_upserts_with_scores() {
        let app = app();
        app.create(1, "Ana", "ana@x.io").await;

        let (status, body) = app
            .request(
                "POST",
                "/predict/bulk",
                Some(json!({"employees": [
                    {"employeeId": 1, "name": "Ana Lima", "email": "ana@x.io"},
                    {"employeeId": 2, "name": "Bo", "email": "bo@x.io"}
                ]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stored"], 2);
        assert_eq!(body["scored"], 2);

        let (_, ana) = app.request("GET", "/employees/1", None).await;
        assert_eq!(ana["name"], "Ana Lima");
        assert_eq!(ana["attritionRisk"], 10.0);
        let (_, bo) = app.request("GET", "/employees/2", None).await;
        assert_eq!(bo["attritionRisk"], 20.0);
    }

    #[tokio::test]
    async fn test_bulk_rejects_empty_and_duplicate_batches() {
        let app = app();
        let (status, body) = app
            .request("POST", "/predict/bulk", Some(json!({"employees": []})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "employees");

        let (status, body) = app
            .request(
                "POST",
                "/predict/bulk",
                Some(json!({"employees": [
                    {"employeeId": 1, "name": "Ana", "email": "ana@x.io"},
                    {"employeeId": 1, "name": "Bo", "email": "bo@x.io"}
                ]})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "employees[1].employeeId");
    }

    #[tokio::test]
    async fn test_sentiment_and_feedback_are_proxied() {
        let app = app();
        let (status, report) = app
            .request("GET", "/sentiment?type=all&department=Sales", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["totalFeedback"], 3);

        let (status, history) = app.request("GET", "/employees/4/feedback", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["feedbacks"][0]["employeeId"], 4);
        assert_eq!(history["feedbacks"][0]["feedbackText"], "Great team");
    }

    #[tokio::test]
    async fn test_upload_forwards_raw_body() {
        let app = app();
        let csv = "employeeId,feedbackText\n4,ok\n";
        let request = Request::builder()
            .method("POST")
            .uri("/feedback/upload")
            .header("Authorization", format!("Bearer {}", app.token))
            .header("Content-Type", "text/csv")
            .body(Body::from(csv))
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contentType"], "text/csv");
        assert_eq!(body["message"], format!("received {} bytes", csv.len()));

        let (status, _) = app.request("POST", "/feedback/upload", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = app();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "api-service");
    }
}
