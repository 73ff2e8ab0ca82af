//! JSON surface over [`DashboardSession`] for hosts that talk in strings

use crate::session::{Action, DashboardSession, DispatchOutcome};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read-only views a host can request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewRequest {
    Selection,
    ValidatorRows,
    Frame,
    Tooltip,
    Proposals,
    Comparison,
    ChainMetrics { chain: String },
    AllChainMetrics,
    Chains,
    DataStats,
    Config,
}

/// Serializable summary of a dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub has_changes: bool,
    pub viewport_changed: bool,
    pub needs_redraw: bool,
    pub changes: Vec<String>,
}

impl From<DispatchOutcome> for DispatchSummary {
    fn from(outcome: DispatchOutcome) -> Self {
        Self {
            has_changes: outcome.selection.has_changes,
            viewport_changed: outcome.viewport_changed,
            needs_redraw: outcome.needs_redraw(),
            changes: outcome.selection.change_summary,
        }
    }
}

pub fn dispatch_json(
    session: &mut DashboardSession,
    action: &str,
    now_ms: f64,
) -> Result<DispatchSummary> {
    let action: Action = serde_json::from_str(action)?;
    Ok(session.dispatch(action, now_ms).into())
}

pub fn query(session: &mut DashboardSession, request: &ViewRequest, now_ms: f64) -> Result<Value> {
    let value = match request {
        ViewRequest::Selection => serde_json::to_value(session.snapshot())?,
        ViewRequest::ValidatorRows => serde_json::to_value(session.validator_rows().as_ref())?,
        ViewRequest::Frame => serde_json::to_value(session.frame(now_ms))?,
        ViewRequest::Tooltip => serde_json::to_value(session.tooltip(now_ms))?,
        ViewRequest::Proposals => serde_json::to_value(session.proposal_view())?,
        ViewRequest::Comparison => serde_json::to_value(session.comparison())?,
        ViewRequest::ChainMetrics { chain } => serde_json::to_value(session.chain_metrics(chain))?,
        ViewRequest::AllChainMetrics => serde_json::to_value(session.all_chain_metrics())?,
        ViewRequest::Chains => serde_json::to_value(session.data().chains())?,
        ViewRequest::DataStats => serde_json::to_value(session.data().stats())?,
        ViewRequest::Config => serde_json::to_value(session.config().as_ref())?,
    };
    Ok(value)
}

pub fn query_json(session: &mut DashboardSession, request: &str, now_ms: f64) -> Result<String> {
    let request: ViewRequest = serde_json::from_str(request)?;
    Ok(serde_json::to_string(&query(session, &request, now_ms)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use govmap_config::DashboardConfig;

    #[test]
    fn test_view_request_format() {
        let request: ViewRequest =
            serde_json::from_str(r#"{"view":"chain_metrics","chain":"cosmos"}"#).unwrap();
        assert_eq!(
            request,
            ViewRequest::ChainMetrics {
                chain: "cosmos".to_string()
            }
        );
    }

    #[test]
    fn test_dispatch_json_rejects_malformed_action() {
        let mut session = DashboardSession::new(DashboardConfig::default()).unwrap();
        assert!(dispatch_json(&mut session, "{\"kind\":\"nope\"}", 0.0).is_err());
    }

    #[test]
    fn test_select_chain_through_json() {
        let mut session = DashboardSession::new(DashboardConfig::default()).unwrap();
        let summary = dispatch_json(
            &mut session,
            r#"{"kind":"selection","payload":{"type":"selectChain","payload":"cosmos"}}"#,
            0.0,
        )
        .unwrap();
        assert!(summary.has_changes);
        assert!(summary.viewport_changed);

        let selection = query(&mut session, &ViewRequest::Selection, 0.0).unwrap();
        assert_eq!(selection["selected_chain"], "cosmos");
        assert_eq!(selection["layout_mode"]["mode"], "chain_projection");
    }
}
