//! External text-generation service
//!
//! - `GenerationService` - the three operations the interview core consumes
//! - `GenerationClient` - OpenAI-compatible HTTP implementation
//! - prompt construction per topic

mod client;
mod prompts;
mod service;

pub use client::{parse_evaluation, GenerationClient, GenerationClientConfig};
pub use prompts::{evaluation_prompt, explanation_prompt, question_prompt};
pub use service::{GenerationError, GenerationService};
