//! Sidekick: context-aware coding assistant
//!
//! Screen, voice and hotkey sensors feed a shared context; an activation
//! state machine gates when suggestions are produced; the suggestion
//! orchestrator turns context into suggestion batches from an AI provider,
//! with caching, rate limiting and in-flight deduplication.

pub mod activation;
pub mod assistant;
pub mod cli;
pub mod command;
pub mod config;
pub mod console;
pub mod context;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod presentation;
pub mod provider;
pub mod rules;
pub mod sensor;
pub mod types;
