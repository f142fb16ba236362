// ── Sales dashboard ──
//
// Four independent summaries. Each loads on its own; one failing
// leaves that panel empty without affecting the others.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::backend::Backend;
use crate::error::CoreError;
use crate::session::Session;

pub const LEAD_DASHBOARD_PATH: &str = "api/lead/dashboard/";
pub const CUSTOMER_DASHBOARD_PATH: &str = "api/customer/dashboard/";
pub const DISPATCH_DASHBOARD_PATH: &str = "api/invoice/dispatch-dashboard/";
/// Forecast of the signed-in user.
pub const FORECAST_PATH: &str = "api/dashboard/forecast/";
/// Forecast across every user, for staff.
pub const TEAM_FORECAST_PATH: &str = "api/dashboard/team-forecast/";

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn count(body: &Value, key: &str) -> u64 {
    body.get(key).and_then(Value::as_u64).unwrap_or(0)
}

// ── Lead funnel ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelStage {
    pub name: &'static str,
    pub label: &'static str,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadFunnel {
    pub stages: Vec<FunnelStage>,
}

impl LeadFunnel {
    const STAGES: [(&'static str, &'static str); 6] = [
        ("new", "New"),
        ("open", "Open"),
        ("opportunity", "Opportunity"),
        ("potential", "Potential"),
        ("not_interested", "Not Interested"),
        ("converted", "Converted"),
    ];

    pub fn from_json(body: &Value) -> Self {
        Self {
            stages: Self::STAGES
                .iter()
                .map(|&(name, label)| FunnelStage {
                    name,
                    label,
                    value: count(body, name),
                })
                .collect(),
        }
    }

    pub fn total(&self) -> u64 {
        self.stages.iter().map(|s| s.value).sum()
    }
}

// ── Customers ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CustomerSummary {
    pub active: u64,
    pub dead: u64,
    pub new: u64,
}

impl CustomerSummary {
    pub fn from_json(body: &Value) -> Self {
        Self {
            active: count(body, "active_customers"),
            dead: count(body, "dead_customers"),
            new: count(body, "new_customers"),
        }
    }

    /// Nothing worth charting.
    pub fn is_empty(&self) -> bool {
        self.active == 0 && self.dead == 0 && self.new == 0
    }
}

// ── Dispatch ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchBar {
    /// `LR` or `POD`.
    pub kind: &'static str,
    /// `M1`, `M2` or `D1`.
    pub unit: &'static str,
    pub value: u64,
}

impl DispatchBar {
    pub fn name(&self) -> String {
        format!("{}-{}", self.kind, self.unit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub bars: Vec<DispatchBar>,
}

impl DispatchSummary {
    pub fn from_json(body: &Value) -> Self {
        let bars = ["LR", "POD"]
            .into_iter()
            .flat_map(|kind| {
                ["M1", "M2", "D1"].into_iter().map(move |unit| DispatchBar {
                    kind,
                    unit,
                    value: count(body, &format!("{kind}_{unit}")),
                })
            })
            .collect();
        Self { bars }
    }
}

// ── Forecast ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ForecastRow {
    month: usize,
    year: i32,
    #[serde(default)]
    actual: f64,
    #[serde(default)]
    total_forecast: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// `"Mar - 2024"`.
    pub period: String,
    pub actual: f64,
    pub forecast: f64,
}

/// The response is an object of arrays, one array per product group.
pub fn parse_forecast(body: &Value) -> Vec<ForecastPoint> {
    let Some(groups) = body.as_object() else {
        return Vec::new();
    };
    groups
        .values()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|row| serde_json::from_value::<ForecastRow>(row.clone()).ok())
        .map(|row| {
            let month = row
                .month
                .checked_sub(1)
                .and_then(|i| MONTHS.get(i))
                .copied()
                .unwrap_or("?");
            ForecastPoint {
                period: format!("{month} - {}", row.year),
                actual: row.actual,
                forecast: row.total_forecast,
            }
        })
        .collect()
}

// ── Loading ──────────────────────────────────────────────────────────

/// Every panel of the dashboard; `None` where that panel failed to load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dashboard {
    pub funnel: Option<LeadFunnel>,
    pub customers: Option<CustomerSummary>,
    pub dispatch: Option<DispatchSummary>,
    pub forecast: Option<Vec<ForecastPoint>>,
}

impl Dashboard {
    /// Load all panels concurrently. Staff see the team forecast.
    pub async fn load<B: Backend>(backend: &B, session: &Session) -> Self {
        let forecast_path = if session.is_staff() {
            TEAM_FORECAST_PATH
        } else {
            FORECAST_PATH
        };
        let (funnel, customers, dispatch, forecast) = tokio::join!(
            panel(backend, LEAD_DASHBOARD_PATH),
            panel(backend, CUSTOMER_DASHBOARD_PATH),
            panel(backend, DISPATCH_DASHBOARD_PATH),
            panel(backend, forecast_path),
        );
        Self {
            funnel: funnel.as_ref().map(LeadFunnel::from_json),
            customers: customers.as_ref().map(CustomerSummary::from_json),
            dispatch: dispatch.as_ref().map(DispatchSummary::from_json),
            forecast: forecast.as_ref().map(parse_forecast),
        }
    }
}

/// Forecast for one assigned user, as staff filter it.
pub async fn forecast_for<B: Backend>(
    backend: &B,
    assign_to: &str,
) -> Result<Vec<ForecastPoint>, CoreError> {
    let params = [("assign_to".to_owned(), assign_to.to_owned())];
    let body = backend.get(FORECAST_PATH, &params).await?;
    Ok(parse_forecast(&body))
}

async fn panel<B: Backend>(backend: &B, path: &str) -> Option<Value> {
    match backend.get(path, &[]).await {
        Ok(body) => Some(body),
        Err(e) => {
            warn!(path, error = %e, "dashboard panel failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn funnel_keeps_stage_order_and_defaults_missing() {
        let funnel = LeadFunnel::from_json(&json!({"new": 4, "open": 2, "converted": 1}));
        let labels: Vec<_> = funnel.stages.iter().map(|s| s.label).collect();
        assert_eq!(
            labels,
            vec!["New", "Open", "Opportunity", "Potential", "Not Interested", "Converted"]
        );
        assert_eq!(funnel.stages[2].value, 0);
        assert_eq!(funnel.total(), 7);
    }

    #[test]
    fn customer_summary_empty_when_all_zero() {
        assert!(CustomerSummary::from_json(&json!({"total_customers": 9})).is_empty());
        assert!(!CustomerSummary::from_json(&json!({"dead_customers": 1})).is_empty());
    }

    #[test]
    fn dispatch_bars_cover_lr_and_pod() {
        let summary = DispatchSummary::from_json(&json!({"LR_M1": 3, "POD_D1": 5}));
        let names: Vec<_> = summary.bars.iter().map(DispatchBar::name).collect();
        assert_eq!(names, vec!["LR-M1", "LR-M2", "LR-D1", "POD-M1", "POD-M2", "POD-D1"]);
        assert_eq!(summary.bars[0].value, 3);
        assert_eq!(summary.bars[5].value, 5);
    }

    #[test]
    fn forecast_rows_are_flattened_with_month_names() {
        let body = json!({
            "tapes": [{"month": 1, "year": 2024, "actual": 10.0, "total_forecast": 12.5}],
            "glue": [{"month": 12, "year": 2023, "total_forecast": 3.0}, {"bad": true}],
        });
        let points = parse_forecast(&body);
        assert_eq!(points.len(), 2);
        assert!(points.iter().any(|p| p.period == "Jan - 2024" && (p.forecast - 12.5).abs() < f64::EPSILON));
        assert!(points.iter().any(|p| p.period == "Dec - 2023" && p.actual.abs() < f64::EPSILON));
    }
}
