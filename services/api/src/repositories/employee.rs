//! Employee repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow, types::Json};
use tracing::info;

use super::{EmployeeStore, field_for_constraint};
use crate::models::employee::{Employee, EmployeeFilter, EmployeeProfile};

const COLUMNS: &str = "employee_id, name, email, department, job_role, profile, \
                       attrition_risk, sentiment_score, created_at, updated_at";

/// PostgreSQL-backed employee repository
///
/// HR attributes live in the `profile` JSONB column.
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    /// Create a new employee repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert_one(
        tx: &mut Transaction<'_, Postgres>,
        employee: &Employee,
    ) -> DatabaseResult<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO employees (employee_id, name, email, department, job_role, profile,
                                   attrition_risk, sentiment_score, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            ON CONFLICT (employee_id) DO UPDATE
            SET name = EXCLUDED.name,
                email = EXCLUDED.email,
                department = EXCLUDED.department,
                job_role = EXCLUDED.job_role,
                profile = EXCLUDED.profile,
                attrition_risk = COALESCE(EXCLUDED.attrition_risk, employees.attrition_risk),
                sentiment_score = COALESCE(EXCLUDED.sentiment_score, employees.sentiment_score),
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(employee.employee_id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.department)
        .bind(&employee.job_role)
        .bind(Json(&employee.profile))
        .bind(employee.attrition_risk)
        .bind(employee.sentiment_score)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(|e| DatabaseError::from_query(e, field_for_constraint))?;
        Ok(())
    }
}

fn employee_from_row(row: &PgRow) -> Employee {
    let Json(profile): Json<EmployeeProfile> = row.get("profile");
    Employee {
        employee_id: row.get("employee_id"),
        name: row.get("name"),
        email: row.get("email"),
        department: row.get("department"),
        job_role: row.get("job_role"),
        profile,
        attrition_risk: row.get("attrition_risk"),
        sentiment_score: row.get("sentiment_score"),
        created_at: Some(row.get("created_at")),
        updated_at: Some(row.get("updated_at")),
    }
}

/// `%term%` for ILIKE with wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl EmployeeStore for EmployeeRepository {
    async fn list(&self, filter: &EmployeeFilter) -> DatabaseResult<Vec<Employee>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS}
            FROM employees
            WHERE ($1::TEXT IS NULL OR department = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2 OR email ILIKE $2)
            ORDER BY employee_id
            "#
        ))
        .bind(filter.department.as_deref())
        .bind(filter.search.as_deref().map(like_pattern))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(rows.iter().map(employee_from_row).collect())
    }

    async fn find(&self, employee_id: i64) -> DatabaseResult<Option<Employee>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM employees WHERE employee_id = $1"
        ))
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(employee_from_row))
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<Employee>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM employees WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(employee_from_row))
    }

    async fn insert(&self, employee: &Employee) -> DatabaseResult<Employee> {
        info!("Creating employee {}", employee.employee_id);

        let now = Utc::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO employees (employee_id, name, email, department, job_role, profile,
                                   attrition_risk, sentiment_score, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(employee.employee_id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.department)
        .bind(&employee.job_role)
        .bind(Json(&employee.profile))
        .bind(employee.attrition_risk)
        .bind(employee.sentiment_score)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_query(e, field_for_constraint))?;

        Ok(employee_from_row(&row))
    }

    async fn update(&self, employee: &Employee) -> DatabaseResult<Option<Employee>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE employees
            SET name = $2, email = $3, department = $4, job_role = $5, profile = $6,
                attrition_risk = $7, sentiment_score = $8, updated_at = $9
            WHERE employee_id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(employee.employee_id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.department)
        .bind(&employee.job_role)
        .bind(Json(&employee.profile))
        .bind(employee.attrition_risk)
        .bind(employee.sentiment_score)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_query(e, field_for_constraint))?;

        Ok(row.as_ref().map(employee_from_row))
    }

    async fn delete(&self, employee_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE employee_id = $1")
            .bind(employee_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_scores(
        &self,
        employee_id: i64,
        attrition_risk: f64,
        sentiment_score: Option<f64>,
    ) -> DatabaseResult<Option<Employee>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE employees
            SET attrition_risk = $2,
                sentiment_score = COALESCE($3, sentiment_score),
                updated_at = $4
            WHERE employee_id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(employee_id)
        .bind(attrition_risk)
        .bind(sentiment_score)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(employee_from_row))
    }

    async fn upsert_many(&self, employees: &[Employee]) -> DatabaseResult<usize> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;
        for employee in employees {
            Self::upsert_one(&mut tx, employee).await?;
        }
        tx.commit().await.map_err(DatabaseError::Query)?;

        info!("Upserted {} employees", employees.len());
        Ok(employees.len())
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        common::database::health_check(&self.pool).await
    }
}
