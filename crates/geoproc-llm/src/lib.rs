//! GeoProc LLM - Text generation port
//!
//! This crate defines the port the operation planner talks to, along with an
//! Ollama adapter.

pub mod ollama;
pub mod ports;

pub use ollama::OllamaGenerator;
pub use ports::Generator;
