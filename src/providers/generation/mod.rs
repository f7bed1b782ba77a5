//! Text-generation backends.
//!
//! The subject evaluator only needs "prompt in, text out", so the seam is a
//! single [`TextGenerator`] trait. [`ChatCompletionsClient`] implements it
//! for OpenAI and compatible servers.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowscope::providers::generation::{
//!     ChatCompletionsClient, GenerationRequest, TextGenerator, OPENAI_BASE_URL,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client =
//!     ChatCompletionsClient::new(OPENAI_BASE_URL, Some("sk-...".to_string()), "gpt-3.5-turbo");
//! let request = GenerationRequest::new("Hello!").with_temperature(0.6);
//!
//! let generation = client.generate(&request).await?;
//! println!("{}", generation.text);
//! # Ok(())
//! # }
//! ```

mod chat_completions;
mod traits;

pub use chat_completions::{ChatCompletionsClient, OPENAI_BASE_URL};
#[cfg(test)]
pub use traits::MockTextGenerator;
pub use traits::{
    Generation, GenerationError, GenerationRequest, GenerationResult, TextGenerator, Usage,
};
