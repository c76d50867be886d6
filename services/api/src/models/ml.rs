//! Payloads exchanged with the ML service

use serde::{Deserialize, Serialize};

/// Score returned for a single employee
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Attrition probability, percent
    pub attrition_risk: f64,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

/// Score for one member of a bulk request
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredEmployee {
    pub employee_id: i64,
    pub attrition_risk: f64,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

/// Acknowledgement of a bulk prediction
///
/// Scores are optional: a service that stores results on its own side may
/// answer with the status line only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BulkPrediction {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "employees")]
    pub predictions: Vec<ScoredEmployee>,
}

/// Filters forwarded to the sentiment report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentQuery {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub month: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentSentiment {
    pub department: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSlice {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSentiment {
    pub employee_id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub department: String,
    pub sentiment_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Sentiment dashboard report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentReport {
    pub total_feedback: u64,
    pub positive_sentiment: f64,
    pub negative_sentiment: f64,
    pub overall_score: f64,
    #[serde(default)]
    pub trend_data: Vec<TrendPoint>,
    #[serde(default)]
    pub department_data: Vec<DepartmentSentiment>,
    #[serde(default)]
    pub distribution_data: Vec<DistributionSlice>,
    #[serde(default)]
    pub employees_data: Vec<EmployeeSentiment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub employee_id: i64,
    pub feedback_text: String,
    pub sentiment_score: f64,
    pub date: String,
}

/// Feedback entries recorded for one employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackHistory {
    #[serde(default)]
    pub feedbacks: Vec<Feedback>,
}
