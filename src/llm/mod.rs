//! LLM client contract (§6) and the tolerant JSON-envelope parser every
//! classifier and phase-3/4/5 component relies on.

mod client;
mod json;

pub use client::{GenerateResponseOutcome, HttpLlmClient, LlmClient};
pub use json::parse_json_envelope;
