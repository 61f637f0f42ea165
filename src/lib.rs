//! # PlainDoc
//!
//! A legal document simplification backend. Clients upload documents (PDF,
//! DOCX, plain text, or images), the service extracts text, asks an external
//! generative model to rewrite it in plain language — falling back to a
//! deterministic jargon-substitution pass when the model is unavailable —
//! persists the result in SQLite, and answers questions about stored
//! documents.
//!
//! ## Pipeline
//!
//! ```text
//! upload ──▶ validate ──▶ extract ──▶ simplify ──▶ persist (terminal status)
//!                                       │
//!                                       └── fallback on model failure
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core record types |
//! | [`extract`] | Multi-format text extraction |
//! | [`ai`] | External chat-completion client |
//! | [`simplify`] | Prompt construction and rule-based fallback |
//! | [`qa`] | Question answering and clause heuristics |
//! | [`store`] | SQLite persistence |
//! | [`ingest`] | Upload validation and pipeline orchestration |
//! | [`server`] | HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod ai;
pub mod config;
pub mod db;
pub mod extract;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod qa;
pub mod server;
pub mod simplify;
pub mod stats;
pub mod store;
