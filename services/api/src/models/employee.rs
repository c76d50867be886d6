//! Employee models for the API service

use chrono::{DateTime, Utc};
use common::error::ServiceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HR attributes used as model features
///
/// Every attribute is optional; the ML service decides which ones it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_travel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_rate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_home: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_satisfaction: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_involvement: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_satisfaction: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_companies_worked: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub over_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_salary_hike: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_satisfaction: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_option_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_working_years: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_times_last_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_life_balance: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_at_company: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_in_current_role: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_since_last_promotion: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_with_curr_manager: Option<i32>,
}

/// Stored employee record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub employee_id: i64,
    pub name: String,
    pub email: String,
    pub department: String,
    pub job_role: String,
    #[serde(flatten)]
    pub profile: EmployeeProfile,
    /// Predicted attrition probability, percent
    pub attrition_risk: Option<f64>,
    pub sentiment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Employee payload as sent by clients, before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub job_role: Option<String>,
    #[serde(flatten)]
    pub profile: EmployeeProfile,
    #[serde(default)]
    pub attrition_risk: Option<f64>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

const REQUIRED_FIELDS: &str = "Employee ID, Name, and Email are required";

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl EmployeeInput {
    /// Check required fields and ranges, producing a storable record
    pub fn validate(self) -> Result<Employee, ServiceError> {
        let employee_id = self
            .employee_id
            .filter(|id| *id > 0)
            .ok_or_else(|| ServiceError::validation("employeeId", REQUIRED_FIELDS))?;
        let name =
            non_blank(self.name).ok_or_else(|| ServiceError::validation("name", REQUIRED_FIELDS))?;
        let email = non_blank(self.email)
            .map(|email| email.to_lowercase())
            .ok_or_else(|| ServiceError::validation("email", REQUIRED_FIELDS))?;

        if !email.contains('@') {
            return Err(ServiceError::validation("email", "Invalid email format"));
        }

        if let Some(risk) = self.attrition_risk {
            if !(0.0..=100.0).contains(&risk) {
                return Err(ServiceError::validation(
                    "attritionRisk",
                    "Attrition risk must be between 0 and 100",
                ));
            }
        }

        if self.sentiment_score.is_some_and(|score| !score.is_finite()) {
            return Err(ServiceError::validation(
                "sentimentScore",
                "Sentiment score must be a number",
            ));
        }

        Ok(Employee {
            employee_id,
            name,
            email,
            department: non_blank(self.department).unwrap_or_default(),
            job_role: non_blank(self.job_role).unwrap_or_default(),
            profile: self.profile,
            attrition_risk: self.attrition_risk,
            sentiment_score: self.sentiment_score,
            created_at: None,
            updated_at: None,
        })
    }
}

impl Employee {
    /// Apply a partial JSON update over this record
    ///
    /// Keys present in `patch` replace stored values; `null` clears optional
    /// attributes. The merged record is validated again.
    pub fn merge(&self, patch: Value) -> Result<Employee, ServiceError> {
        let Value::Object(patch) = patch else {
            return Err(ServiceError::validation("body", "Expected a JSON object"));
        };

        let mut merged = serde_json::to_value(self)
            .map_err(|e| ServiceError::Internal(format!("failed to encode employee: {}", e)))?;
        if let Value::Object(fields) = &mut merged {
            fields.remove("createdAt");
            fields.remove("updatedAt");
            for (key, value) in patch {
                fields.insert(key, value);
            }
        }

        let input: EmployeeInput = serde_json::from_value(merged)
            .map_err(|e| ServiceError::validation("body", e.to_string()))?;
        if input.employee_id != Some(self.employee_id) {
            return Err(ServiceError::validation(
                "employeeId",
                "Employee ID cannot be changed",
            ));
        }

        let mut updated = input.validate()?;
        updated.created_at = self.created_at;
        Ok(updated)
    }
}

/// Query parameters for employee listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeFilter {
    /// Exact department match
    pub department: Option<String>,
    /// Case-insensitive substring of name or email
    pub search: Option<String>,
}

impl EmployeeFilter {
    /// Whether `employee` passes this filter
    pub fn matches(&self, employee: &Employee) -> bool {
        let department_ok = self
            .department
            .as_deref()
            .is_none_or(|department| employee.department == department);
        let search_ok = self.search.as_deref().is_none_or(|term| {
            let term = term.to_lowercase();
            employee.name.to_lowercase().contains(&term)
                || employee.email.to_lowercase().contains(&term)
        });
        department_ok && search_ok
    }
}

/// Request for bulk prediction and storage
#[derive(Debug, Clone, Deserialize)]
pub struct BulkPredictRequest {
    #[serde(default)]
    pub employees: Vec<EmployeeInput>,
}
