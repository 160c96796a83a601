//! The ordered check list and the runner that turns it into a report.
//!
//! Checks run in a fixed order. A check is flagged when it found offenders,
//! or, for raise-on-empty checks, when it found none. Flagged required checks
//! fail the run; flagged warnings only warn. Export is allowed only when no
//! check failed.

use crate::loops::{LoopClassification, classify_loops};
use crate::markers::{Concern, MarkerValidator};
use crate::paths::{DEFAULT_PATH_DEVIATION, abnormal_paths_with};
use crate::reach::unreachable_nodes;
use crate::report::{CheckOutcome, CheckStatus, Offender, Severity, StoryReport};
use crate::structure;
use branchtale_story::{StoryGraph, StoryNode};
use std::cell::OnceCell;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown check `{name}`")]
pub struct UnknownCheck {
    pub name: String,
}

/// Everything an analyzer may read.
///
/// The loop classification is computed on first use and shared by both loop
/// checks.
#[derive(Debug, Clone)]
pub struct CheckContext<'a> {
    pub graph: &'a StoryGraph,
    pub markers: &'a MarkerValidator,
    pub path_deviation: f64,
    loops: OnceCell<LoopClassification<'a>>,
}

impl<'a> CheckContext<'a> {
    pub fn new(graph: &'a StoryGraph, markers: &'a MarkerValidator) -> Self {
        Self {
            graph,
            markers,
            path_deviation: DEFAULT_PATH_DEVIATION,
            loops: OnceCell::new(),
        }
    }

    pub fn loops(&self) -> &LoopClassification<'a> {
        self.loops.get_or_init(|| classify_loops(self.graph))
    }

    pub fn with_path_deviation(mut self, path_deviation: f64) -> Self {
        self.path_deviation = path_deviation;
        self
    }
}

type NodeCheck = fn(&StoryGraph) -> Vec<&StoryNode>;

#[derive(Debug, Clone, Copy)]
pub enum Analyzer {
    Structure(NodeCheck),
    Unreachable,
    EscapableLoops,
    InescapableLoops,
    AbnormalPaths,
    MarkerMetadata(Concern),
    MarkerLines(Concern),
    MarkerExcessive(Concern),
}

impl Analyzer {
    pub fn offenders(self, context: &CheckContext<'_>) -> Vec<Offender> {
        let graph = context.graph;
        let nodes = |found: Vec<&StoryNode>| -> Vec<Offender> {
            found.into_iter().map(Offender::from).collect()
        };
        match self {
            Analyzer::Structure(check) => nodes(check(graph)),
            Analyzer::Unreachable => nodes(unreachable_nodes(graph)),
            Analyzer::EscapableLoops => context
                .loops()
                .escapable
                .iter()
                .map(Offender::from)
                .collect(),
            Analyzer::InescapableLoops => context
                .loops()
                .inescapable
                .iter()
                .map(Offender::from)
                .collect(),
            Analyzer::AbnormalPaths => abnormal_paths_with(graph, context.path_deviation)
                .iter()
                .map(Offender::from)
                .collect(),
            Analyzer::MarkerMetadata(concern) => {
                nodes(context.markers.metadata_violations(graph, concern))
            }
            Analyzer::MarkerLines(concern) => {
                nodes(context.markers.marker_violations(graph, concern))
            }
            Analyzer::MarkerExcessive(concern) => {
                nodes(context.markers.excessive_usage(graph, concern))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StoryCheck {
    pub name: &'static str,
    pub label: &'static str,
    pub severity: Severity,
    pub raise_on_empty: bool,
    pub analyzer: Analyzer,
}

impl StoryCheck {
    fn required(name: &'static str, label: &'static str, analyzer: Analyzer) -> Self {
        Self {
            name,
            label,
            severity: Severity::Required,
            raise_on_empty: false,
            analyzer,
        }
    }

    fn warning(name: &'static str, label: &'static str, analyzer: Analyzer) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::required(name, label, analyzer)
        }
    }

    fn expect_some(self) -> Self {
        Self {
            raise_on_empty: true,
            ..self
        }
    }

    /// Run the analyzer and classify the result.
    pub fn evaluate(&self, context: &CheckContext<'_>) -> CheckOutcome {
        let (status, offenders) = if self.severity == Severity::Off {
            (CheckStatus::Skipped, Vec::new())
        } else {
            let offenders = self.analyzer.offenders(context);
            let flagged = offenders.is_empty() == self.raise_on_empty;
            let status = match (flagged, self.severity) {
                (false, _) => CheckStatus::Pass,
                (true, Severity::Required) => CheckStatus::Fail,
                (true, _) => CheckStatus::Warn,
            };
            (status, offenders)
        };
        tracing::debug!(
            check = self.name,
            severity = self.severity.as_str(),
            status = status.as_str(),
            offenders = offenders.len(),
            "ran story check"
        );
        CheckOutcome {
            name: self.name.to_string(),
            label: self.label.to_string(),
            severity: self.severity,
            status,
            offenders,
        }
    }
}

/// Every check in run order with its default severity.
pub fn default_checks() -> Vec<StoryCheck> {
    use Analyzer::{
        AbnormalPaths, EscapableLoops, InescapableLoops, MarkerExcessive, MarkerLines,
        MarkerMetadata, Structure, Unreachable,
    };
    use Concern::{Colour, Effect, Message, MessageTitle, Pace, Pov};
    type C = StoryCheck;

    vec![
        C::required(
            "starting_nodes",
            "at least one starting part",
            Structure(structure::starting_nodes),
        )
        .expect_some(),
        C::required(
            "ending_nodes",
            "at least one ending part",
            Structure(structure::ending_nodes),
        )
        .expect_some(),
        C::required(
            "start_end_nodes",
            "parts that are both start and end points",
            Structure(structure::start_end_nodes),
        ),
        C::required("empty_nodes", "parts without text", Structure(structure::empty_nodes)),
        C::required(
            "duplicate_nodes",
            "parts with duplicate text",
            Structure(structure::duplicate_nodes),
        ),
        C::warning(
            "invalid_links",
            "parts with missing or invalid links",
            Structure(structure::invalid_links),
        ),
        C::required("dead_ends", "parts with no choices", Structure(structure::dead_ends)),
        C::required(
            "continuing_ends",
            "ending parts that contain choices",
            Structure(structure::continuing_ends),
        ),
        C::required(
            "noncontinuing_variants",
            "parts with choices on only some variants",
            Structure(structure::noncontinuing_variants),
        ),
        C::required(
            "revisit_variants",
            "parts that forbid revisits while siblings allow them",
            Structure(structure::revisit_variants),
        ),
        C::warning(
            "single_choice",
            "parts with a single choice",
            Structure(structure::single_choice),
        ),
        C::warning(
            "duplicate_choices",
            "parts with duplicate choice paths",
            Structure(structure::duplicate_choices),
        ),
        C::warning(
            "divergent_flags",
            "parts whose variants disagree on start or end",
            Structure(structure::divergent_flags),
        ),
        C::required("unreachable_nodes", "parts that cannot be reached", Unreachable),
        C::warning("escapable_loops", "parts with looping choices", EscapableLoops),
        C::required(
            "inescapable_loops",
            "parts with inescapable looping choices",
            InescapableLoops,
        ),
        C::warning(
            "abnormal_paths",
            "playthroughs far shorter or longer than average",
            AbnormalPaths,
        ),
        C::required("colour_metadata", "parts with invalid colour options", MarkerMetadata(Colour)),
        C::required("colour_markers", "parts with misplaced colour markers", MarkerLines(Colour)),
        C::required(
            "excessive_colours",
            "parts overusing one colour marker",
            MarkerExcessive(Colour),
        ),
        C::required("pace_metadata", "parts with invalid pace options", MarkerMetadata(Pace)),
        C::required("pace_markers", "parts with misplaced pace markers", MarkerLines(Pace)),
        C::required("excessive_pacing", "parts overusing one pace marker", MarkerExcessive(Pace)),
        C::required("effect_metadata", "parts with invalid effect options", MarkerMetadata(Effect)),
        C::required("effect_markers", "parts with misplaced effect markers", MarkerLines(Effect)),
        C::required(
            "excessive_effects",
            "parts overusing one effect marker",
            MarkerExcessive(Effect),
        ),
        C::required("pov_metadata", "parts with invalid pov options", MarkerMetadata(Pov)),
        C::required("pov_markers", "parts with misplaced pov markers", MarkerLines(Pov)),
        C::required("excessive_povs", "parts overusing one pov marker", MarkerExcessive(Pov)),
        C::required(
            "message_metadata",
            "parts with invalid message-pov options",
            MarkerMetadata(Message),
        ),
        C::required("message_markers", "parts with misplaced message markers", MarkerLines(Message)),
        C::required(
            "message_title_metadata",
            "parts with invalid message-title options",
            MarkerMetadata(MessageTitle),
        ),
        C::required(
            "message_title_markers",
            "parts with misplaced message title markers",
            MarkerLines(MessageTitle),
        ),
    ]
}

pub fn check_names() -> Vec<&'static str> {
    default_checks().iter().map(|check| check.name).collect()
}

/// Replace default severities by check name.
pub fn apply_overrides(
    checks: &mut [StoryCheck],
    overrides: &BTreeMap<String, Severity>,
) -> Result<(), UnknownCheck> {
    for (name, severity) in overrides {
        let check = checks
            .iter_mut()
            .find(|check| check.name == name.as_str())
            .ok_or_else(|| UnknownCheck { name: name.clone() })?;
        check.severity = *severity;
    }
    Ok(())
}

pub fn run_checks(checks: &[StoryCheck], context: &CheckContext<'_>) -> StoryReport {
    let outcomes = checks
        .iter()
        .map(|check| check.evaluate(context))
        .collect();
    StoryReport::from_outcomes(context.graph.len(), context.graph.node_count(), outcomes)
}

/// Run the default checks with `overrides` applied.
pub fn check_story(
    context: &CheckContext<'_>,
    overrides: &BTreeMap<String, Severity>,
) -> Result<StoryReport, UnknownCheck> {
    let mut checks = default_checks();
    apply_overrides(&mut checks, overrides)?;
    Ok(run_checks(&checks, context))
}
