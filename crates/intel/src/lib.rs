//! Threat classification gateway for Repsignal.
//!
//! This crate provides:
//! - An inference provider abstraction over hosted completion endpoints
//! - Threat classification and summarization of monitored content
//! - Entity memory recall/search for historical context
//! - A tagged error taxonomy separating transport, remote, and
//!   malformed-response failures

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod gateway;
pub mod memory;
pub mod prompts;
pub mod provider;
pub mod remote;

// Re-export main types
pub use error::{IntelError, IntelResult};
pub use gateway::{ThreatAnalysis, ThreatClassifier, ThreatSeverity};
pub use memory::{EntityMemoryClient, EntityRef, MemoryConfig, MemoryEntry, MemoryRecall};
pub use provider::{ChatMessage, ChatRole, Completion, GenerateOptions, InferenceProvider};
pub use remote::{RemoteProvider, DEFAULT_MODEL};
