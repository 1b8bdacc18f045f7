//! Model provider clients.

pub mod openai;

pub use openai::OpenAiModel;
