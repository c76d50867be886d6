//! Attrition analytics computed from stored predictions

use serde::Serialize;

use super::employee::Employee;

/// Risk aggregate for one department or job role
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRisk {
    pub name: String,
    pub at_risk_count: usize,
    pub total_count: usize,
    /// Average attrition risk of the scored members; `None` when none are scored
    pub risk_percentage: Option<f64>,
}

/// One scored employee plotted by tenure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearsVsRisk {
    pub id: String,
    pub years_at_company: Option<i32>,
    pub risk_score: f64,
    pub department: String,
}

/// Dashboard summary of attrition risk
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttritionSummary {
    pub total_employees: usize,
    pub scored_employees: usize,
    pub at_risk_count: usize,
    /// Share of all employees at risk, percent
    pub attrition_rate: f64,
    pub at_risk_threshold: f64,
    pub department_data: Vec<GroupRisk>,
    pub job_role_data: Vec<GroupRisk>,
    pub years_vs_risk_data: Vec<YearsVsRisk>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Default)]
struct Accumulator {
    name: String,
    total: usize,
    scored: usize,
    at_risk: usize,
    risk_sum: f64,
}

fn group_by<'a>(
    employees: &'a [Employee],
    threshold: f64,
    key: impl Fn(&'a Employee) -> &'a str,
) -> Vec<GroupRisk> {
    // Groups keep the order in which they are first seen
    let mut groups: Vec<Accumulator> = Vec::new();
    for employee in employees {
        let name = key(employee);
        let index = match groups.iter().position(|g| g.name == name) {
            Some(index) => index,
            None => {
                groups.push(Accumulator {
                    name: name.to_string(),
                    ..Default::default()
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[index];
        group.total += 1;
        if let Some(risk) = employee.attrition_risk {
            group.scored += 1;
            group.risk_sum += risk;
            if risk >= threshold {
                group.at_risk += 1;
            }
        }
    }

    groups
        .into_iter()
        .map(|g| GroupRisk {
            risk_percentage: (g.scored > 0).then(|| round1(g.risk_sum / g.scored as f64)),
            name: g.name,
            at_risk_count: g.at_risk,
            total_count: g.total,
        })
        .collect()
}

/// Summarise attrition risk; employees at or above `threshold` count as at risk
pub fn summarize(employees: &[Employee], threshold: f64) -> AttritionSummary {
    let total_employees = employees.len();
    let scored: Vec<&Employee> = employees
        .iter()
        .filter(|e| e.attrition_risk.is_some())
        .collect();
    let at_risk_count = scored
        .iter()
        .filter(|e| e.attrition_risk.is_some_and(|risk| risk >= threshold))
        .count();

    let attrition_rate = if total_employees == 0 {
        0.0
    } else {
        round1(at_risk_count as f64 / total_employees as f64 * 100.0)
    };

    let years_vs_risk_data = scored
        .iter()
        .filter_map(|e| {
            Some(YearsVsRisk {
                id: e.employee_id.to_string(),
                years_at_company: e.profile.years_at_company,
                risk_score: e.attrition_risk?,
                department: e.department.clone(),
            })
        })
        .collect();

    AttritionSummary {
        total_employees,
        scored_employees: scored.len(),
        at_risk_count,
        attrition_rate,
        at_risk_threshold: threshold,
        department_data: group_by(employees, threshold, |e| e.department.as_str()),
        job_role_data: group_by(employees, threshold, |e| e.job_role.as_str()),
        years_vs_risk_data,
    }
}
