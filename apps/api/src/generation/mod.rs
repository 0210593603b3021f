//! Content generation: the LLM boundary that fills resume templates and
//! applies edit instructions, returning well-formed LaTeX or a classified
//! error.

pub mod generator;
pub mod handlers;
pub mod prompts;

pub use generator::{ContentGenerator, GenerationError, LlmGenerator, ResumeProfile};
