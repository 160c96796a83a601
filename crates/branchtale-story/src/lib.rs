//! # branchtale-story
//!
//! Story layer for branching narratives.
//!
//! This crate provides:
//! - `SourceDocument` and the `Corpus` trait (directory and in-memory corpora)
//! - front-matter splitting and lenient metadata extraction
//! - `StoryNode` / `Group` (the variants and the pathnames that bucket them)
//! - `StoryGraph` (deterministic in-memory multigraph of groups)
//! - the export document handed to the renderer
//!
//! It does not validate anything. Checks live in `branchtale-check`.
//!
//! ## Data model
//!
//! ```text
//! story/**/*.md (front matter + prose)
//!     │  Corpus::documents
//! SourceDocument
//!     │  StoryGraph::from_documents
//! StoryGraph { group name → Group { variants: [StoryNode] } }
//!     │  export_document
//! story.json
//! ```

pub mod corpus;
pub mod export;
pub mod frontmatter;
pub mod graph;
pub mod metadata;
pub mod node;

pub use corpus::{Corpus, CorpusError, DirectoryCorpus, MemoryCorpus, SourceDocument};
pub use export::{
    ExportDocument, ExportError, ExportSummary, ExportedGroup, ExportedVariant, export_document,
    render_document, write_document,
};
pub use frontmatter::{FrontMatter, FrontMatterError, parse_metadata, split_front_matter};
pub use graph::{GraphOptions, StoryGraph};
pub use metadata::NodeMetadata;
pub use node::{Group, StoryNode};
