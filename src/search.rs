//! Prompt-ready guideline search.
//!
//! [`search_guidelines`] is the single entry point the chat layer depends
//! on. It never fails: store or embedding errors are logged and replaced by
//! [`FALLBACK_TEXT`], so a broken retrieval path degrades the answer
//! instead of aborting it. Compare [`VectorStore::initialize`], which
//! surfaces every error so startup can detect a broken corpus.
//!
//! # Output
//!
//! ```text
//! Relevant UDL Guidelines:
//!
//! [Result 1] (Relevance: 83.1%)
//! **UDL Guideline 7.1**: Optimize individual choice and autonomy
//! Principle: Engagement
//! Sub-guideline: Welcoming Interests & Identities
//! Source: Recruiting Interest
//! URL: https://udlguidelines.cast.org/engagement/interests-identities/
//! Content:
//! <chunk text>
//! ---
//! ```

use std::fmt::Write as _;
use std::time::Duration;
use tracing::error;

use crate::models::SearchResult;
use crate::store::VectorStore;

/// Returned when retrieval fails or times out.
pub const FALLBACK_TEXT: &str = "Unable to retrieve UDL guidelines at this time. Please proceed with general instructional design principles.";

/// Returned when the search succeeds but matches nothing.
pub const NO_RESULTS_TEXT: &str = "No relevant UDL guidelines found.";

/// Search the guideline store and render the hits for prompt injection.
pub async fn search_guidelines(store: &VectorStore, query: &str, top_k: usize) -> String {
    match store.search(query, top_k).await {
        Ok(results) if results.is_empty() => NO_RESULTS_TEXT.to_string(),
        Ok(results) => format_results(&results),
        Err(e) => {
            error!(error = %e, "error searching UDL guidelines");
            FALLBACK_TEXT.to_string()
        }
    }
}

/// [`search_guidelines`] bounded by `deadline`; past it, the search is
/// abandoned and [`FALLBACK_TEXT`] returned.
pub async fn search_guidelines_with_timeout(
    store: &VectorStore,
    query: &str,
    top_k: usize,
    deadline: Duration,
) -> String {
    match tokio::time::timeout(deadline, search_guidelines(store, query, top_k)).await {
        Ok(text) => text,
        Err(_) => {
            error!(
                deadline_ms = deadline.as_millis() as u64,
                "guideline search timed out"
            );
            FALLBACK_TEXT.to_string()
        }
    }
}

/// Render ranked results as one text block, best first.
pub fn format_results(results: &[SearchResult]) -> String {
    let blocks: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, result)| format_result(i + 1, result))
        .collect();

    format!("Relevant UDL Guidelines:\n\n{}", blocks.join("\n"))
}

fn format_result(rank: usize, result: &SearchResult) -> String {
    let meta = &result.chunk.metadata;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "[Result {}] (Relevance: {:.1}%)",
        rank,
        result.score * 100.0
    );

    if let Some(number) = &meta.guideline_number {
        let _ = write!(out, "**UDL Guideline {}**", number);
        if let Some(name) = &meta.guideline_name {
            let _ = write!(out, ": {}", name);
        }
        out.push('\n');
    } else if let Some(label) = &meta.guideline {
        let _ = writeln!(out, "**{}**", label);
    }

    if let Some(principle) = &meta.principle {
        let _ = writeln!(out, "Principle: {}", principle);
    }
    if let Some(sub) = &meta.sub_guideline {
        let _ = writeln!(out, "Sub-guideline: {}", sub);
    }

    let _ = writeln!(out, "Source: {}", meta.title);
    let _ = writeln!(out, "URL: {}", meta.url);
    let _ = writeln!(out, "Content:\n{}", result.chunk.text);
    out.push_str("---\n");
    out
}
