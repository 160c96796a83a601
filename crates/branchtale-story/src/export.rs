//! The compiled story document handed to the renderer.
//!
//! One JSON object keyed by group name. Optional style fields appear only when
//! the source variant declared a non-empty value.

use crate::graph::StoryGraph;
use crate::node::StoryNode;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to render story document: {0}")]
    Render(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ExportDocument = BTreeMap<String, ExportedGroup>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedGroup {
    pub start: bool,
    pub end: bool,
    pub revisit: bool,
    pub variants: Vec<ExportedVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedVariant {
    pub choices: BTreeMap<String, String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pov: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messagepov: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messagetitle: Option<String>,
}

impl From<&StoryNode> for ExportedVariant {
    fn from(node: &StoryNode) -> Self {
        Self {
            choices: node.choices.clone(),
            text: node.text.clone(),
            pace: non_empty(&node.pace),
            colour: non_empty(&node.colour),
            effect: non_empty(&node.effect),
            pov: non_empty(&node.pov),
            messagepov: non_empty(&node.message_pov),
            messagetitle: non_empty(&node.message_title),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|text| !text.is_empty()).cloned()
}

/// Where a document was written and what it hashed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub digest: String,
    pub bytes: usize,
}

pub fn export_document(graph: &StoryGraph) -> ExportDocument {
    graph
        .groups()
        .map(|group| {
            (
                group.name.clone(),
                ExportedGroup {
                    start: group.is_start,
                    end: group.is_end,
                    revisit: group.revisit(),
                    variants: group.variants.iter().map(ExportedVariant::from).collect(),
                },
            )
        })
        .collect()
}

/// Pretty JSON with two-space indentation.
pub fn render_document(document: &ExportDocument) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Render and atomically write the export document for `graph`.
pub fn write_document(
    path: impl AsRef<Path>,
    graph: &StoryGraph,
) -> Result<ExportSummary, ExportError> {
    let path = path.as_ref();
    let rendered = render_document(&export_document(graph))?;
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ExportError::Io { path, source }
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), ExportError> {
        let mut file = File::create(&tmp_path).map_err(io_error(&tmp_path))?;
        file.write_all(rendered.as_bytes())
            .map_err(io_error(&tmp_path))?;
        file.sync_all().map_err(io_error(&tmp_path))?;
        Ok(())
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let digest = Sha256::digest(rendered.as_bytes());
    tracing::debug!(path = %path.display(), bytes = rendered.len(), "wrote story document");
    Ok(ExportSummary {
        path: path.to_path_buf(),
        digest: format!("{digest:x}"),
        bytes: rendered.len(),
    })
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::MemoryCorpus;
    use crate::graph::GraphOptions;

    fn sample_graph() -> StoryGraph {
        let corpus = MemoryCorpus::new()
            .with_document(
                "intro.md",
                "---\nstart: true\npace: slow\ncolour: \"\"\nchoices:\n  Open the door: hall\n---\nA door.",
            )
            .with_document("hall/lit.md", "---\nend: true\neffect: glow\n---\nLight.")
            .with_document("hall/dark.md", "---\nend: true\nrevisit: false\n---\nDark.");
        StoryGraph::build(&corpus, GraphOptions::default()).expect("memory corpus never fails")
    }

    #[test]
    fn renders_groups_in_name_order_with_optional_fields() {
        let rendered = render_document(&export_document(&sample_graph())).expect("renders");
        insta::assert_snapshot!(rendered, @r#"
{
  "hall": {
    "start": false,
    "end": true,
    "revisit": false,
    "variants": [
      {
        "choices": {},
        "text": "Light.",
        "effect": "glow"
      },
      {
        "choices": {},
        "text": "Dark."
      }
    ]
  },
  "intro": {
    "start": true,
    "end": false,
    "revisit": true,
    "variants": [
      {
        "choices": {
          "Open the door": "hall"
        },
        "text": "A door.",
        "pace": "slow"
      }
    ]
  }
}
"#);
    }

    #[test]
    fn writes_document_and_reports_digest() {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let root = std::env::temp_dir().join(format!("branchtale-export-{unique}"));
        let path = root.join("out").join("story.json");

        let summary = write_document(&path, &sample_graph()).expect("export writes");
        let written = fs::read_to_string(&path).expect("export readable");
        assert_eq!(summary.bytes, written.len());
        assert_eq!(summary.digest.len(), 64);

        let parsed: serde_json::Value = serde_json::from_str(&written).expect("valid json");
        assert_eq!(parsed["intro"]["variants"][0]["choices"]["Open the door"], "hall");

        let _ = fs::remove_dir_all(&root);
    }
}
