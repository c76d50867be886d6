//! Repositories for database operations

use async_trait::async_trait;
use common::error::DatabaseResult;

use crate::models::employee::{Employee, EmployeeFilter};

pub mod employee;

#[cfg(test)]
pub mod memory;

pub use employee::EmployeeRepository;

/// Employee record store keyed by `employeeId`
///
/// Writes that would duplicate an `employeeId` or an email fail with
/// `DatabaseError::Conflict` naming the field.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Employees matching `filter`, ordered by id
    async fn list(&self, filter: &EmployeeFilter) -> DatabaseResult<Vec<Employee>>;

    async fn find(&self, employee_id: i64) -> DatabaseResult<Option<Employee>>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<Employee>>;

    async fn insert(&self, employee: &Employee) -> DatabaseResult<Employee>;

    /// Replace a stored record; `None` when it does not exist
    async fn update(&self, employee: &Employee) -> DatabaseResult<Option<Employee>>;

    /// Remove a record, returning whether it existed
    async fn delete(&self, employee_id: i64) -> DatabaseResult<bool>;

    /// Store prediction results on an existing record
    async fn record_scores(
        &self,
        employee_id: i64,
        attrition_risk: f64,
        sentiment_score: Option<f64>,
    ) -> DatabaseResult<Option<Employee>>;

    /// Insert or replace every record atomically
    async fn upsert_many(&self, employees: &[Employee]) -> DatabaseResult<usize>;

    /// Whether the backing store is reachable
    async fn health_check(&self) -> DatabaseResult<bool>;
}

/// Client-facing field name guarded by a unique constraint
pub fn field_for_constraint(constraint: &str) -> &'static str {
    match constraint {
        "employees_email_key" => "email",
        _ => "employeeId",
    }
}
