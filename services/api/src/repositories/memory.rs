//! In-memory employee store for handler tests

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::EmployeeStore;
use crate::models::employee::{Employee, EmployeeFilter};

#[derive(Default)]
pub struct MemoryEmployeeStore {
    employees: Mutex<BTreeMap<i64, Employee>>,
}

fn conflict(field: &str) -> DatabaseError {
    DatabaseError::Conflict {
        field: field.to_string(),
    }
}

fn email_taken(employees: &BTreeMap<i64, Employee>, email: &str, owner: i64) -> bool {
    employees
        .values()
        .any(|e| e.email == email && e.employee_id != owner)
}

#[async_trait]
impl EmployeeStore for MemoryEmployeeStore {
    async fn list(&self, filter: &EmployeeFilter) -> DatabaseResult<Vec<Employee>> {
        let employees = self.employees.lock().await;
        Ok(employees
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn find(&self, employee_id: i64) -> DatabaseResult<Option<Employee>> {
        Ok(self.employees.lock().await.get(&employee_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<Employee>> {
        let employees = self.employees.lock().await;
        Ok(employees.values().find(|e| e.email == email).cloned())
    }

    async fn insert(&self, employee: &Employee) -> DatabaseResult<Employee> {
        let mut employees = self.employees.lock().await;
        if employees.contains_key(&employee.employee_id) {
            return Err(conflict("employeeId"));
        }
        if email_taken(&employees, &employee.email, employee.employee_id) {
            return Err(conflict("email"));
        }

        let now = Utc::now();
        let stored = Employee {
            created_at: Some(now),
            updated_at: Some(now),
            ..employee.clone()
        };
        employees.insert(stored.employee_id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, employee: &Employee) -> DatabaseResult<Option<Employee>> {
        let mut employees = self.employees.lock().await;
        let Some(created_at) = employees
            .get(&employee.employee_id)
            .map(|stored| stored.created_at)
        else {
            return Ok(None);
        };
        if email_taken(&employees, &employee.email, employee.employee_id) {
            return Err(conflict("email"));
        }

        let stored = Employee {
            created_at,
            updated_at: Some(Utc::now()),
            ..employee.clone()
        };
        employees.insert(stored.employee_id, stored.clone());
        Ok(Some(stored))
    }

    async fn delete(&self, employee_id: i64) -> DatabaseResult<bool> {
        Ok(self.employees.lock().await.remove(&employee_id).is_some())
    }

    async fn record_scores(
        &self,
        employee_id: i64,
        attrition_risk: f64,
        sentiment_score: Option<f64>,
    ) -> DatabaseResult<Option<Employee>> {
        let mut employees = self.employees.lock().await;
        Ok(employees.get_mut(&employee_id).map(|stored| {
            stored.attrition_risk = Some(attrition_risk);
            if sentiment_score.is_some() {
                stored.sentiment_score = sentiment_score;
            }
            stored.updated_at = Some(Utc::now());
            stored.clone()
        }))
    }

    async fn upsert_many(&self, batch: &[Employee]) -> DatabaseResult<usize> {
        let mut employees = self.employees.lock().await;

        // Work on a copy so a conflict leaves the store untouched
        let mut staged = employees.clone();
        let now = Utc::now();
        for employee in batch {
            if email_taken(&staged, &employee.email, employee.employee_id) {
                return Err(conflict("email"));
            }
            let previous = staged.get(&employee.employee_id).cloned();
            let stored = Employee {
                attrition_risk: employee
                    .attrition_risk
                    .or(previous.as_ref().and_then(|p| p.attrition_risk)),
                sentiment_score: employee
                    .sentiment_score
                    .or(previous.as_ref().and_then(|p| p.sentiment_score)),
                created_at: previous.as_ref().and_then(|p| p.created_at).or(Some(now)),
                updated_at: Some(now),
                ..employee.clone()
            };
            staged.insert(stored.employee_id, stored);
        }

        *employees = staged;
        Ok(batch.len())
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        Ok(true)
    }
}
