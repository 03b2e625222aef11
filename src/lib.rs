//! Punctuation repair for live-caption speech fragments.
//!
//! Fragments arrive as ~8-word chunks of continuous speech from a streaming
//! transcription/translation source, so most of them are syntactically
//! incomplete. A remote completion model proposes a corrected string and a
//! deterministic rule engine enforces the safety net: internal punctuation is
//! added freely, sentence-closing punctuation is treated with suspicion, and
//! wording is never allowed to change.
//!
//! - `config`: process-wide settings, loaded once
//! - `patterns`: language-keyed rule tables with an English fallback
//! - `client`: remote completion client (prompt, timeout, bounded retries)
//! - `postprocess`: the ordered rule-engine passes
//! - `cache`: bounded FIFO result cache with hit/miss stats
//! - `corrector`: the orchestrator and public entry points

pub mod cache;
pub mod client;
pub mod config;
pub mod corrector;
pub mod error;
pub mod patterns;
pub mod postprocess;

pub use cache::CacheStats;
pub use client::{CompletionBackend, HttpCompletionClient};
pub use config::CorrectorConfig;
pub use corrector::{estimate_cost, CorrectionRequest, PunctuationCorrector};
pub use error::CorrectionError;
