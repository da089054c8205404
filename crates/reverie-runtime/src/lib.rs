//! `reverie-runtime` – Reflection and the model server connection.
//!
//! Everything that sits between a [`MemoryStore`][reverie_memory::MemoryStore]
//! and a live language model.
//!
//! # Modules
//!
//! - [`reflection`] – [`Reflector`][reflection::Reflector]: asks the model
//!   for salient questions about recent memories, retrieves evidence for each
//!   and writes the resulting insights back into the store.
//! - [`parser`] – [`parse_list`][parser::parse_list]: tolerant extraction of
//!   numbered or bulleted items from free-form replies.
//! - [`llm_driver`] – [`LlmDriver`][llm_driver::LlmDriver]: a blocking
//!   OpenAI-compatible [`Reasoner`][reverie_types::Reasoner] for chat
//!   completions and embeddings.
//! - [`config`] – [`ReverieConfig`][config::ReverieConfig]: endpoint, models
//!   and reflection window, loaded from `~/.reverie/config.toml` with
//!   `REVERIE_*` overrides.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with optional OTLP span export.

pub mod config;
pub mod llm_driver;
pub mod parser;
pub mod reflection;
pub mod telemetry;

pub use config::{ConfigError, ReverieConfig};
pub use llm_driver::{LlmDriver, LlmError};
pub use parser::{ListMode, parse_list};
pub use reflection::{DEFAULT_REFLECTION_WINDOW, ReflectionReport, Reflector};
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing};
