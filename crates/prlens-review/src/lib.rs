//! Pull request analysis: fetch a PR from GitHub, ask an LLM for a cited
//! review, and validate what comes back.
//!
//! Provides the URL parser, GitHub client, prompt contract, review schema
//! with citation checks, LLM client, and the [`pipeline::Analyzer`] that ties
//! them together.

pub mod citation;
pub mod github;
pub mod llm;
pub mod patch;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod schema;
pub mod url;
