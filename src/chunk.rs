//! Sentence-boundary text chunker.
//!
//! Splits guideline content into overlapping [`Chunk`]s sized for
//! embedding, and stamps each one with metadata inherited from its
//! parent document.
//!
//! # Algorithm
//!
//! 1. Split content into sentences at `.`, `!` or `?` followed by
//!    whitespace. Content with no such boundary is split on blank lines.
//! 2. Accumulate sentences into a buffer joined by single spaces.
//! 3. Close the buffer when the next sentence would push it past
//!    `max_chars` **and** the buffer already holds at least `min_chars`.
//!    Below `min_chars` the sentence is absorbed even if that overshoots
//!    `max_chars`.
//! 4. Seed the next buffer with the last `overlap_chars / 10` words of the
//!    closed chunk, followed by the sentence that did not fit.
//! 5. Flush the final buffer, then drop every chunk shorter than
//!    `min_chars`.
//!
//! Lengths are measured in characters, not bytes.
//!
//! # Example
//!
//! ```rust
//! use udl_rag::chunk::chunk_text;
//! use udl_rag::config::ChunkingConfig;
//!
//! let sentence = "Learners differ in the ways they are engaged or motivated to learn. ";
//! let text = sentence.repeat(30);
//! let chunks = chunk_text(&text, &ChunkingConfig::default());
//! assert!(chunks.len() > 1);
//! assert!(chunks.iter().all(|c| c.chars().count() >= 500));
//! ```

use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

use crate::config::ChunkingConfig;
use crate::models::{Chunk, ChunkMetadata, GuidelineDocument};

/// Rough characters-per-word ratio used to turn the overlap budget into a
/// word count.
const CHARS_PER_WORD: usize = 10;

/// Title used when a document has none.
const DEFAULT_TITLE: &str = "UDL Guidelines";

fn sentence_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").expect("valid sentence regex"))
}

fn blank_lines() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid blank-line regex"))
}

fn guideline_number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)guideline\s+(\d+(?:\.\d+)?)").expect("valid guideline regex")
    })
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split text into trimmed, non-empty sentences.
///
/// Terminal punctuation stays attached to its sentence. When the text has
/// no sentence boundary at all, blank lines are used instead.
pub fn split_into_sentences(text: &str) -> Vec<&str> {
    let re = sentence_end();
    if !re.is_match(text) {
        return blank_lines()
            .split(text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in re.find_iter(text) {
        // The punctuation mark is a single ASCII byte.
        let piece = text[start..m.start() + 1].trim();
        if !piece.is_empty() {
            sentences.push(piece);
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Split text into overlapping chunk strings.
///
/// Every returned string is at least `config.min_chars` characters long.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let overlap_words = config.overlap_chars / CHARS_PER_WORD;
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_into_sentences(text) {
        let current_len = char_len(&current);
        let would_be = if current.is_empty() {
            char_len(sentence)
        } else {
            current_len + 1 + char_len(sentence)
        };

        if would_be > config.max_chars && current_len >= config.min_chars {
            chunks.push(current.trim().to_string());

            let words: Vec<&str> = current.split_whitespace().collect();
            let overlap = &words[words.len().saturating_sub(overlap_words)..];
            let mut next = overlap.join(" ");
            if !next.is_empty() {
                next.push(' ');
            }
            next.push_str(sentence);
            current = next;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        chunks.push(tail.to_string());
    }

    chunks.retain(|c| char_len(c) >= config.min_chars);
    chunks
}

/// Build the metadata shared by all chunks of `doc`.
///
/// Structured fields on the document win. If none is present, the
/// principle is inferred from the URL path and the guideline number from a
/// `guideline <n>` mention in the content.
pub fn extract_metadata(doc: &GuidelineDocument) -> ChunkMetadata {
    let title = if doc.title.trim().is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        doc.title.clone()
    };

    let has_structured = doc.principle.is_some()
        || doc.guideline_number.is_some()
        || doc.guideline_name.is_some()
        || doc.sub_guideline.is_some();

    if has_structured {
        return ChunkMetadata {
            title,
            url: doc.url.clone(),
            guideline: doc
                .guideline_number
                .as_ref()
                .map(|n| format!("Guideline {}", n)),
            guideline_number: doc.guideline_number.clone(),
            guideline_name: doc.guideline_name.clone(),
            sub_guideline: doc.sub_guideline.clone(),
            principle: doc.principle.clone(),
        };
    }

    let url = doc.url.to_lowercase();
    let principle = if url.contains("/engagement/") {
        Some("Engagement")
    } else if url.contains("/representation/") {
        Some("Representation")
    } else if url.contains("/action-expression/") {
        Some("Action & Expression")
    } else {
        None
    };

    let number = guideline_number_pattern()
        .captures(&doc.content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    ChunkMetadata {
        title,
        url: doc.url.clone(),
        guideline: number.as_ref().map(|n| format!("Guideline {}", n)),
        guideline_number: number,
        guideline_name: None,
        sub_guideline: None,
        principle: principle.map(str::to_string),
    }
}

/// Chunk one document. Documents whose content is shorter than
/// `min_chars` yield nothing.
pub fn chunk_document(doc: &GuidelineDocument, config: &ChunkingConfig) -> Vec<Chunk> {
    if char_len(doc.content.trim()) < config.min_chars {
        return Vec::new();
    }

    let metadata = extract_metadata(doc);
    chunk_text(&doc.content, config)
        .into_iter()
        .map(|text| Chunk {
            text,
            metadata: metadata.clone(),
        })
        .collect()
}

/// Chunk a whole corpus, preserving document order.
pub fn chunk_corpus(docs: &[GuidelineDocument], config: &ChunkingConfig) -> Vec<Chunk> {
    let chunks: Vec<Chunk> = docs
        .iter()
        .flat_map(|doc| chunk_document(doc, config))
        .collect();
    info!(
        chunks = chunks.len(),
        documents = docs.len(),
        "chunked guideline corpus"
    );
    chunks
}
