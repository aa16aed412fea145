//! autoposter adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `sources`: Reddit and X search item sources
//! - `llm`: Draft generator adapters (OpenAI, Gemini, stub)
//! - `publish`: LinkedIn and X publishers
//! - `ledger`: SQLite and in-memory post ledgers
//! - `oauth`: X OAuth 2.0 PKCE helper for obtaining user tokens

mod ledger_memory;
mod ledger_sqlite;

pub mod llm;
pub mod oauth;
pub mod publish;
pub mod sources;

/// Re-exports for ledger adapters
pub mod ledger {
    pub use crate::ledger_memory::InMemoryLedger;
    pub use crate::ledger_sqlite::SqliteLedger;
}
