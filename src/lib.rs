//! # UDL RAG
//!
//! Retrieval core for grounding instructional-design answers in the
//! Universal Design for Learning guidelines.
//!
//! The guideline corpus is cut into overlapping sentence-aligned chunks,
//! each chunk is embedded once, and the chunk/embedding pairs are persisted
//! as a versioned snapshot. Queries are embedded on demand, ranked by
//! cosine similarity, and rendered as a prompt-ready text block.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌─────────────┐
//! │  Corpus  │──▶│ Chunker  │──▶│ Embedding  │──▶│ VectorStore │
//! │  (JSON)  │   │          │   │  Client    │   │ cache + k-NN│
//! └──────────┘   └──────────┘   └────────────┘   └──────┬──────┘
//!                                                       │
//!                                                       ▼
//!                                               ┌──────────────┐
//!                                               │ search façade│
//!                                               │ (never fails)│
//!                                               └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! udl init                                  # embed corpus, write cache
//! udl search "multiple means of engagement" # prompt-ready guidelines
//! udl stats                                 # counts without initializing
//! udl cache rebuild                         # re-embed after corpus edits
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`logging`] | Tracing subscriber setup |
//! | [`models`] | Core data types |
//! | [`corpus`] | Guideline corpus loading |
//! | [`chunk`] | Sentence-aligned chunking and metadata extraction |
//! | [`embedding`] | Embedding providers, batching, cosine ranking |
//! | [`cache`] | Snapshot persistence backends |
//! | [`store`] | Vector store lifecycle and search |
//! | [`search`] | Prompt-ready search façade |

pub mod cache;
pub mod chunk;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod logging;
pub mod models;
pub mod search;
pub mod store;

pub use error::{RagError, Result};
pub use search::{search_guidelines, search_guidelines_with_timeout};
pub use store::VectorStore;
