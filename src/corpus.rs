//! Guideline corpus loading.
//!
//! The corpus is a single JSON array of [`GuidelineDocument`] records, read
//! wholesale each time the store has to be rebuilt.

use std::path::PathBuf;

use crate::error::{RagError, Result};
use crate::models::GuidelineDocument;

/// Where the store gets its documents from.
#[derive(Debug, Clone)]
pub enum Corpus {
    /// A JSON file containing an array of guideline documents.
    File(PathBuf),
    /// Documents supplied directly by the caller.
    Inline(Vec<GuidelineDocument>),
}

impl Corpus {
    /// Load every document, in corpus order.
    pub fn load(&self) -> Result<Vec<GuidelineDocument>> {
        match self {
            Corpus::File(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| RagError::Corpus(format!("{}: {}", path.display(), e)))?;
                parse_corpus(&content)
                    .map_err(|e| RagError::Corpus(format!("{}: {}", path.display(), e)))
            }
            Corpus::Inline(docs) => Ok(docs.clone()),
        }
    }
}

fn parse_corpus(content: &str) -> std::result::Result<Vec<GuidelineDocument>, serde_json::Error> {
    serde_json::from_str(content)
}
