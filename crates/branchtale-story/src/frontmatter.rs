//! Front-matter splitting for story documents.
//!
//! A document is `---\n<yaml>\n---\n<prose>`. Anything without a leading
//! `---` is all prose. Backslashes in prose are normalized to `/` so that
//! `\shake` and `/shake` are the same marker.

use serde_yaml::{Mapping, Value};

#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("front matter opened with `---` but never closed")]
    Unterminated,

    #[error("invalid yaml front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping")]
    NotAMapping,
}

/// A document split into its raw metadata block and prose body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter<'a> {
    pub yaml: Option<&'a str>,
    pub body: String,
}

/// Split `content` into front matter and body.
pub fn split_front_matter(content: &str) -> Result<FrontMatter<'_>, FrontMatterError> {
    let content = content.trim_start_matches('\u{feff}').trim();
    let Some(rest) = content.strip_prefix("---") else {
        return Ok(FrontMatter {
            yaml: None,
            body: content.to_string(),
        });
    };

    let close = rest.find("---").ok_or(FrontMatterError::Unterminated)?;
    let yaml = &rest[..close];
    let body = rest[close + 3..].trim().replace('\\', "/");
    Ok(FrontMatter {
        yaml: Some(yaml),
        body,
    })
}

/// Parse a YAML metadata block into a mapping. An empty block is an empty mapping.
pub fn parse_metadata(yaml: &str) -> Result<Mapping, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(FrontMatterError::NotAMapping),
    }
}
