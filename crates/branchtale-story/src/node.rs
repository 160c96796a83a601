//! Story variants and the groups (pathnames) that bucket them.

use std::collections::BTreeMap;

/// One concrete rendering of a narrative beat.
///
/// Created once from a single source document and never mutated by the
/// checks. `source_id` is the identity used for visited-set bookkeeping and
/// for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryNode {
    pub source_id: String,
    pub group: String,
    pub text: String,
    /// Display label → target group name.
    pub choices: BTreeMap<String, String>,
    pub pace: Option<String>,
    pub colour: Option<String>,
    pub effect: Option<String>,
    pub pov: Option<String>,
    pub message_pov: Option<String>,
    pub message_title: Option<String>,
    pub revisit_override: Option<bool>,
}

impl StoryNode {
    pub fn new(source_id: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            group: group.into(),
            text: String::new(),
            choices: BTreeMap::new(),
            pace: None,
            colour: None,
            effect: None,
            pov: None,
            message_pov: None,
            message_title: None,
            revisit_override: None,
        }
    }

    /// Effective revisit flag given the owning group's default.
    pub fn revisit(&self, group_default: bool) -> bool {
        self.revisit_override.unwrap_or(group_default)
    }

    /// Choice targets in label order. Targets may name missing groups.
    pub fn choice_targets(&self) -> impl Iterator<Item = &str> {
        self.choices.values().map(String::as_str)
    }

    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }
}

/// A named bucket of narratively interchangeable variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub is_start: bool,
    pub is_end: bool,
    pub revisit_default: bool,
    pub variants: Vec<StoryNode>,
    /// Set when variant documents declared `start` or `end` inconsistently.
    pub divergent_flags: bool,
}

impl Group {
    pub fn new(name: impl Into<String>, revisit_default: bool) -> Self {
        Self {
            name: name.into(),
            is_start: false,
            is_end: false,
            revisit_default,
            variants: Vec::new(),
            divergent_flags: false,
        }
    }

    /// True only if every variant may be revisited.
    pub fn revisit(&self) -> bool {
        self.variants
            .iter()
            .all(|variant| variant.revisit(self.revisit_default))
    }

    /// Whether any variant has at least one choice.
    pub fn any_choices(&self) -> bool {
        self.variants.iter().any(StoryNode::has_choices)
    }
}
