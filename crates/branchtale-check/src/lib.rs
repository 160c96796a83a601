//! # branchtale-check
//!
//! Validators for a compiled `StoryGraph`.
//!
//! - `reach`: variants no start group can reach
//! - `loops`: canonical loop discovery, split into escapable and inescapable
//! - `paths`: playthrough enumeration and length outliers
//! - `markers`: inline style markers against their metadata and vocabulary
//! - `structure`: per-group shape checks (dead ends, duplicate text, ...)
//! - `registry`: the ordered check list, severities, and the report runner
//!
//! Analyzers are total functions over an immutable graph. Traversals carry
//! depth bounds proportional to the group count; branches past the bound are
//! abandoned rather than treated as errors.

pub mod loops;
pub mod markers;
pub mod paths;
pub mod reach;
pub mod registry;
pub mod report;
pub mod structure;

#[cfg(test)]
mod testing;

pub use loops::{
    Loop, LoopClassification, can_escape, canonical_cycle, classify_loops, escapable_loops,
    find_loops, inescapable_loops,
};
pub use markers::{Concern, ConcernRules, MarkerError, MarkerValidator, Thresholds, Vocabulary};
pub use paths::{
    Playthrough, PlaythroughSearch, abnormal_paths, abnormal_paths_with, enumerate_playthroughs,
    playthroughs,
};
pub use reach::unreachable_nodes;
pub use registry::{
    Analyzer, CheckContext, StoryCheck, UnknownCheck, apply_overrides, check_names, check_story,
    default_checks, run_checks,
};
pub use report::{
    CHECK_KIND, CheckOutcome, CheckStatus, Offender, ReportSummary, Severity, StoryReport,
};
