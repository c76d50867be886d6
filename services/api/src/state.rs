//! Application state shared across handlers

use common::middleware::Authenticator;
use std::sync::Arc;

use crate::{ml::MlClient, repositories::EmployeeStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub employees: Arc<dyn EmployeeStore>,
    pub ml: Arc<dyn MlClient>,
    pub authenticator: Authenticator,
    /// Risk (percent) at or above which an employee counts as at risk
    pub at_risk_threshold: f64,
}
