//! Validation report types.

use crate::loops::Loop;
use crate::paths::Playthrough;
use branchtale_story::StoryNode;
use serde::{Deserialize, Serialize};

pub const CHECK_KIND: &str = "branchtale.story_check.v1";

/// How a flagged check affects the overall result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Required,
    Warning,
    Off,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Required => "required",
            Severity::Warning => "warning",
            Severity::Off => "off",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skipped",
        }
    }
}

/// Something a check pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Offender {
    Node {
        group: String,
        #[serde(rename = "sourceId")]
        source_id: String,
    },
    Loop {
        groups: Vec<String>,
        #[serde(rename = "sourceIds")]
        source_ids: Vec<String>,
    },
    Playthrough {
        groups: Vec<String>,
        #[serde(rename = "sourceIds")]
        source_ids: Vec<String>,
    },
}

impl Offender {
    pub fn describe(&self) -> String {
        match self {
            Offender::Node { source_id, .. } => source_id.clone(),
            Offender::Loop { groups, .. } => groups.join(" -> "),
            Offender::Playthrough { groups, .. } => {
                format!("{} ({} steps)", groups.join(" -> "), groups.len())
            }
        }
    }
}

impl From<&StoryNode> for Offender {
    fn from(node: &StoryNode) -> Self {
        Offender::Node {
            group: node.group.clone(),
            source_id: node.source_id.clone(),
        }
    }
}

impl From<&Loop<'_>> for Offender {
    fn from(found: &Loop<'_>) -> Self {
        Offender::Loop {
            groups: found.canonical().to_vec(),
            source_ids: found
                .nodes()
                .iter()
                .map(|node| node.source_id.clone())
                .collect(),
        }
    }
}

impl From<&Playthrough<'_>> for Offender {
    fn from(path: &Playthrough<'_>) -> Self {
        Offender::Playthrough {
            groups: path
                .group_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            source_ids: path
                .nodes()
                .iter()
                .map(|node| node.source_id.clone())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub name: String,
    pub label: String,
    pub severity: Severity,
    pub status: CheckStatus,
    pub offenders: Vec<Offender>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub group_count: usize,
    pub variant_count: usize,
    pub check_count: usize,
    pub failure_count: usize,
    pub warning_count: usize,
    pub skipped_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryReport {
    pub check_kind: String,
    pub result: String,
    pub summary: ReportSummary,
    pub checks: Vec<CheckOutcome>,
}

impl StoryReport {
    pub(crate) fn from_outcomes(
        group_count: usize,
        variant_count: usize,
        checks: Vec<CheckOutcome>,
    ) -> Self {
        let count = |status: CheckStatus| checks.iter().filter(|c| c.status == status).count();
        let summary = ReportSummary {
            group_count,
            variant_count,
            check_count: checks.len(),
            failure_count: count(CheckStatus::Fail),
            warning_count: count(CheckStatus::Warn),
            skipped_count: count(CheckStatus::Skipped),
        };
        Self {
            check_kind: CHECK_KIND.to_string(),
            result: if summary.failure_count == 0 {
                "accepted".to_string()
            } else {
                "rejected".to_string()
            },
            summary,
            checks,
        }
    }

    pub fn accepted(&self) -> bool {
        self.result == "accepted"
    }

    /// Names of the checks that failed, in run order.
    pub fn failed_checks(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|outcome| outcome.status == CheckStatus::Fail)
            .map(|outcome| outcome.name.as_str())
            .collect()
    }
}
