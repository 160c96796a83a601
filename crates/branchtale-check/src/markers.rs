//! Inline style markers and their metadata counterparts.
//!
//! Prose may switch style mid-node with slash markers such as `/fast`,
//! `/colour #ff00ff` or `/pov mara`. A marker must open its line, most
//! concerns allow one marker per line, and a marker repeated on most lines of
//! a node belongs in the node's metadata instead.

use branchtale_story::{StoryGraph, StoryNode};
use regex::Regex;
use std::collections::BTreeMap;

pub const DEFAULT_SPEEDS: &[&str] = &["fastest", "faster", "fast", "slowest", "slower", "slow"];

pub const DEFAULT_EFFECTS: &[&str] = &[
    "shake",
    "nudge",
    "bounce",
    "slide-left",
    "slide-right",
    "pulse",
    "blink",
    "grow",
    "pop",
    "glow",
    "tilt",
    "wobble",
    "wave",
];

/// CSS named colours, lower case.
pub const DEFAULT_COLOURS: &[&str] = &[
    "aliceblue",
    "antiquewhite",
    "aqua",
    "aquamarine",
    "azure",
    "beige",
    "bisque",
    "black",
    "blanchedalmond",
    "blue",
    "blueviolet",
    "brown",
    "burlywood",
    "cadetblue",
    "chartreuse",
    "chocolate",
    "coral",
    "cornflowerblue",
    "cornsilk",
    "crimson",
    "cyan",
    "darkblue",
    "darkcyan",
    "darkgoldenrod",
    "darkgray",
    "darkgreen",
    "darkgrey",
    "darkkhaki",
    "darkmagenta",
    "darkolivegreen",
    "darkorange",
    "darkorchid",
    "darkred",
    "darksalmon",
    "darkseagreen",
    "darkslateblue",
    "darkslategray",
    "darkslategrey",
    "darkturquoise",
    "darkviolet",
    "deeppink",
    "deepskyblue",
    "dimgray",
    "dimgrey",
    "dodgerblue",
    "firebrick",
    "floralwhite",
    "forestgreen",
    "fuchsia",
    "gainsboro",
    "ghostwhite",
    "gold",
    "goldenrod",
    "gray",
    "green",
    "greenyellow",
    "grey",
    "honeydew",
    "hotpink",
    "indianred",
    "indigo",
    "ivory",
    "khaki",
    "lavender",
    "lavenderblush",
    "lawngreen",
    "lemonchiffon",
    "lightblue",
    "lightcoral",
    "lightcyan",
    "lightgoldenrodyellow",
    "lightgray",
    "lightgreen",
    "lightgrey",
    "lightpink",
    "lightsalmon",
    "lightseagreen",
    "lightskyblue",
    "lightslategray",
    "lightslategrey",
    "lightsteelblue",
    "lightyellow",
    "lime",
    "limegreen",
    "linen",
    "magenta",
    "maroon",
    "mediumaquamarine",
    "mediumblue",
    "mediumorchid",
    "mediumpurple",
    "mediumseagreen",
    "mediumslateblue",
    "mediumspringgreen",
    "mediumturquoise",
    "mediumvioletred",
    "midnightblue",
    "mintcream",
    "mistyrose",
    "moccasin",
    "navajowhite",
    "navy",
    "oldlace",
    "olive",
    "olivedrab",
    "orange",
    "orangered",
    "orchid",
    "palegoldenrod",
    "palegreen",
    "paleturquoise",
    "palevioletred",
    "papayawhip",
    "peachpuff",
    "peru",
    "pink",
    "plum",
    "powderblue",
    "purple",
    "rebeccapurple",
    "red",
    "rosybrown",
    "royalblue",
    "saddlebrown",
    "salmon",
    "sandybrown",
    "seagreen",
    "seashell",
    "sienna",
    "silver",
    "skyblue",
    "slateblue",
    "slategray",
    "slategrey",
    "snow",
    "springgreen",
    "steelblue",
    "tan",
    "teal",
    "thistle",
    "tomato",
    "turquoise",
    "violet",
    "wheat",
    "white",
    "whitesmoke",
    "yellow",
    "yellowgreen",
];

const HEX_COLOUR: &str = r"#(?:[0-9a-fA-F]{6}|[0-9a-fA-F]{3})";

#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    #[error("{concern} vocabulary is empty")]
    EmptyVocabulary { concern: &'static str },

    #[error("invalid {concern} pattern: {source}")]
    Pattern {
        concern: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Words accepted after a slash, per concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub colours: Vec<String>,
    pub effects: Vec<String>,
    pub speeds: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let owned = |words: &[&str]| words.iter().map(|word| word.to_string()).collect();
        Self {
            colours: owned(DEFAULT_COLOURS),
            effects: owned(DEFAULT_EFFECTS),
            speeds: owned(DEFAULT_SPEEDS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Most-frequent-marker share above which pace, effect and pov are flagged.
    pub excessive: f64,
    pub excessive_colour: f64,
    /// Nodes with this many non-blank lines or fewer are never flagged.
    pub min_lines: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            excessive: 0.5,
            excessive_colour: 0.25,
            min_lines: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Concern {
    Pace,
    Colour,
    Effect,
    Pov,
    Message,
    MessageTitle,
}

impl Concern {
    pub const ALL: [Concern; 6] = [
        Concern::Pace,
        Concern::Colour,
        Concern::Effect,
        Concern::Pov,
        Concern::Message,
        Concern::MessageTitle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Concern::Pace => "pace",
            Concern::Colour => "colour",
            Concern::Effect => "effect",
            Concern::Pov => "pov",
            Concern::Message => "message",
            Concern::MessageTitle => "message-title",
        }
    }

    /// The metadata value this concern validates, if the node declared one.
    pub fn metadata_value(self, node: &StoryNode) -> Option<&str> {
        let value = match self {
            Concern::Pace => &node.pace,
            Concern::Colour => &node.colour,
            Concern::Effect => &node.effect,
            Concern::Pov => &node.pov,
            Concern::Message => &node.message_pov,
            Concern::MessageTitle => &node.message_title,
        };
        value.as_deref().filter(|value| !value.is_empty())
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Compiled patterns and limits for one concern.
///
/// The marker pattern captures the marker value in group 1; excessive usage
/// counts occurrences per value.
#[derive(Debug, Clone)]
pub struct ConcernRules {
    pub metadata: Regex,
    pub marker: Regex,
    pub allow_multiple: bool,
    pub excessive: Option<f64>,
}

impl ConcernRules {
    pub fn metadata_valid(&self, value: &str) -> bool {
        self.metadata.is_match(value)
    }

    /// Every non-blank line carries markers only at its start, and at most
    /// one unless the concern allows several.
    pub fn line_markers_valid(&self, text: &str) -> bool {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .all(|line| {
                let count = self.marker.find_iter(line).count();
                if count == 0 {
                    return true;
                }
                (self.allow_multiple || count == 1) && line.starts_with('/')
            })
    }

    pub fn is_excessive(&self, text: &str, min_lines: usize) -> bool {
        let Some(threshold) = self.excessive else {
            return false;
        };
        let lines = text.lines().filter(|line| !line.trim().is_empty()).count();
        if lines <= min_lines {
            return false;
        }

        let mut frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for captures in self.marker.captures_iter(text) {
            let value = captures.get(1).or_else(|| captures.get(0));
            if let Some(value) = value {
                *frequency.entry(value.as_str()).or_default() += 1;
            }
        }
        let most_used = frequency.values().copied().max().unwrap_or(0);
        most_used as f64 / lines as f64 > threshold
    }
}

/// Validates metadata values and inline markers for every concern.
#[derive(Debug, Clone)]
pub struct MarkerValidator {
    rules: Vec<ConcernRules>,
    min_lines: usize,
}

impl MarkerValidator {
    pub fn new(vocabulary: &Vocabulary, thresholds: Thresholds) -> Result<Self, MarkerError> {
        let rules = Concern::ALL
            .iter()
            .map(|&concern| build_rules(concern, vocabulary, thresholds))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rules,
            min_lines: thresholds.min_lines,
        })
    }

    pub fn rules(&self, concern: Concern) -> &ConcernRules {
        &self.rules[concern.index()]
    }

    /// Nodes whose declared value for `concern` is not accepted.
    pub fn metadata_violations<'g>(
        &self,
        graph: &'g StoryGraph,
        concern: Concern,
    ) -> Vec<&'g StoryNode> {
        let rules = self.rules(concern);
        graph
            .nodes()
            .filter(|node| {
                concern
                    .metadata_value(node)
                    .is_some_and(|value| !rules.metadata_valid(value))
            })
            .collect()
    }

    /// Nodes with a misplaced or repeated inline marker.
    pub fn marker_violations<'g>(
        &self,
        graph: &'g StoryGraph,
        concern: Concern,
    ) -> Vec<&'g StoryNode> {
        let rules = self.rules(concern);
        graph
            .nodes()
            .filter(|node| !rules.line_markers_valid(&node.text))
            .collect()
    }

    /// Nodes leaning on one marker value across most of their lines.
    pub fn excessive_usage<'g>(
        &self,
        graph: &'g StoryGraph,
        concern: Concern,
    ) -> Vec<&'g StoryNode> {
        let rules = self.rules(concern);
        graph
            .nodes()
            .filter(|node| rules.is_excessive(&node.text, self.min_lines))
            .collect()
    }
}

fn build_rules(
    concern: Concern,
    vocabulary: &Vocabulary,
    thresholds: Thresholds,
) -> Result<ConcernRules, MarkerError> {
    let (metadata, marker, allow_multiple, excessive) = match concern {
        Concern::Pace => {
            let speeds = alternation(concern, &vocabulary.speeds)?;
            (
                format!(r"^(?:{speeds}|\d+\s?ms)$"),
                format!(r"/({speeds}|speed \d+\s?ms)"),
                false,
                Some(thresholds.excessive),
            )
        }
        Concern::Colour => {
            let colours = alternation(concern, &vocabulary.colours)?;
            (
                format!(r"^(?:{colours}|{HEX_COLOUR})$"),
                format!(r"/({colours}|colour {HEX_COLOUR})"),
                false,
                Some(thresholds.excessive_colour),
            )
        }
        Concern::Effect => {
            let effects = alternation(concern, &vocabulary.effects)?;
            (
                format!(r"^(?:{effects})$"),
                format!(r"/({effects})"),
                true,
                Some(thresholds.excessive),
            )
        }
        Concern::Pov => (
            r"^\w+$".to_string(),
            r"/pov (\w+)".to_string(),
            false,
            Some(thresholds.excessive),
        ),
        Concern::Message => (
            r"^\w+$".to_string(),
            r"/message(?:-unsent)? (\w+)".to_string(),
            false,
            None,
        ),
        Concern::MessageTitle => (
            r"^[^/\n]+$".to_string(),
            r"/message-title ([^/]+)".to_string(),
            false,
            None,
        ),
    };

    let compile = |pattern: &str| {
        Regex::new(pattern).map_err(|source| MarkerError::Pattern {
            concern: concern.as_str(),
            source,
        })
    };
    Ok(ConcernRules {
        metadata: compile(&metadata)?,
        marker: compile(&marker)?,
        allow_multiple,
        excessive,
    })
}

/// Escaped words joined longest first, so `/faster` never stops at `/fast`.
fn alternation(concern: Concern, words: &[String]) -> Result<String, MarkerError> {
    let mut words: Vec<&str> = words
        .iter()
        .map(|word| word.trim())
        .filter(|word| !word.is_empty())
        .collect();
    if words.is_empty() {
        return Err(MarkerError::EmptyVocabulary {
            concern: concern.as_str(),
        });
    }
    words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    words.dedup();
    Ok(words
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::story;

    fn validator() -> MarkerValidator {
        MarkerValidator::new(&Vocabulary::default(), Thresholds::default())
            .expect("default vocabulary compiles")
    }

    fn ids<'a>(nodes: &[&'a StoryNode]) -> Vec<&'a str> {
        nodes.iter().map(|node| node.source_id.as_str()).collect()
    }

    #[test]
    fn colour_marker_must_open_its_line() {
        let rules = validator();
        let rules = rules.rules(Concern::Colour);
        assert!(rules.line_markers_valid("/colour #ff00ff\nThe sky burned."));
        assert!(!rules.line_markers_valid("it turned /colour #ff00ff today"));
    }

    #[test]
    fn one_marker_per_line_unless_concern_allows_several() {
        let validator = validator();
        assert!(!validator.rules(Concern::Pace).line_markers_valid("/fast /slow"));
        assert!(validator.rules(Concern::Effect).line_markers_valid("/shake /glow boom"));
        assert!(!validator.rules(Concern::Effect).line_markers_valid("boom /shake"));
    }

    #[test]
    fn longer_speed_words_win_over_prefixes() {
        let validator = validator();
        let pace = validator.rules(Concern::Pace);
        let captured: Vec<&str> = pace
            .marker
            .captures_iter("/faster")
            .filter_map(|captures| captures.get(1))
            .map(|value| value.as_str())
            .collect();
        assert_eq!(captured, vec!["faster"]);
        assert!(pace.metadata_valid("slowest"));
        assert!(pace.metadata_valid("120 ms"));
        assert!(pace.metadata_valid("80ms"));
        assert!(!pace.metadata_valid("quick"));
    }

    #[test]
    fn colour_metadata_accepts_names_and_hex() {
        let validator = validator();
        let colour = validator.rules(Concern::Colour);
        assert!(colour.metadata_valid("rebeccapurple"));
        assert!(colour.metadata_valid("#fff"));
        assert!(colour.metadata_valid("#FF00ff"));
        assert!(!colour.metadata_valid("#ffff"));
        assert!(!colour.metadata_valid("Red"));
    }

    #[test]
    fn effect_metadata_must_be_a_single_effect() {
        let validator = validator();
        let effect = validator.rules(Concern::Effect);
        assert!(effect.metadata_valid("slide-left"));
        assert!(!effect.metadata_valid("shake wildly"));
    }

    #[test]
    fn message_metadata_and_titles() {
        let validator = validator();
        assert!(validator.rules(Concern::Message).metadata_valid("mara"));
        assert!(!validator.rules(Concern::Message).metadata_valid("two words"));
        assert!(validator.rules(Concern::MessageTitle).metadata_valid("Group chat"));
        assert!(!validator.rules(Concern::MessageTitle).metadata_valid("a/b"));
        assert!(
            validator
                .rules(Concern::MessageTitle)
                .line_markers_valid("/message-title Late night")
        );
        assert!(
            !validator
                .rules(Concern::MessageTitle)
                .line_markers_valid("then /message-title Late night")
        );
        assert!(
            validator
                .rules(Concern::Message)
                .line_markers_valid("/message-unsent mara")
        );
    }

    #[test]
    fn repeated_pace_marker_is_excessive_on_long_nodes_only() {
        let validator = validator();
        let pace = validator.rules(Concern::Pace);
        let long = "/slow one\n/slow two\n/slow three\n/slow four\nfive";
        assert!(pace.is_excessive(long, 4));

        let short = "/slow one\n/slow two\n/slow three";
        assert!(!pace.is_excessive(short, 4));
    }

    #[test]
    fn colour_uses_the_lower_threshold() {
        let validator = validator();
        let text = "/red a\nb\nc\nd\ne\n/red f\ng\nh";
        // 2 of 8 lines: not above 0.25.
        assert!(!validator.rules(Concern::Colour).is_excessive(text, 4));
        let text = "/red a\nb\nc\nd\ne\n/red f\n/red g\nh";
        assert!(validator.rules(Concern::Colour).is_excessive(text, 4));
    }

    #[test]
    fn message_concerns_have_no_excessive_threshold() {
        let validator = validator();
        let text = "/message mara\n/message mara\n/message mara\n/message mara\n/message mara";
        assert!(!validator.rules(Concern::Message).is_excessive(text, 4));
    }

    #[test]
    fn custom_vocabulary_replaces_defaults() {
        let vocabulary = Vocabulary {
            effects: vec!["sparkle".to_string()],
            ..Vocabulary::default()
        };
        let validator =
            MarkerValidator::new(&vocabulary, Thresholds::default()).expect("compiles");
        let effect = validator.rules(Concern::Effect);
        assert!(effect.metadata_valid("sparkle"));
        assert!(!effect.metadata_valid("shake"));
    }

    #[test]
    fn empty_vocabulary_is_rejected() {
        let vocabulary = Vocabulary {
            effects: Vec::new(),
            ..Vocabulary::default()
        };
        let error = MarkerValidator::new(&vocabulary, Thresholds::default())
            .expect_err("empty effects rejected");
        assert!(matches!(
            error,
            MarkerError::EmptyVocabulary { concern: "effect" }
        ));
    }

    #[test]
    fn graph_level_checks_report_offending_variants() {
        let graph = story(&[
            (
                "a.md",
                "---\nstart: true\npace: brisk\ncolour: red\nchoices:\n  go: b\n---\nHello /pov mara",
            ),
            ("b.md", "---\nend: true\npov: mara\n---\n/pov mara\nFine."),
        ]);
        let validator = validator();

        assert_eq!(ids(&validator.metadata_violations(&graph, Concern::Pace)), vec!["a.md"]);
        assert!(validator.metadata_violations(&graph, Concern::Colour).is_empty());
        assert_eq!(ids(&validator.marker_violations(&graph, Concern::Pov)), vec!["a.md"]);
        assert!(validator.excessive_usage(&graph, Concern::Pov).is_empty());
    }
}
