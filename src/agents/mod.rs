//! Agent System
//!
//! - **Document Q&A Agent**: turns a document and a question into one
//!   completion request and returns the model's answer.

pub mod document_qa;

pub use document_qa::{DocumentQaAgent, DOCUMENT_INSTRUCTION};
