//! Language-model seam and prompt assembly.
//!
//! The model is a black-box text-completion function; this module owns the
//! fixed prompt templates and the context/history concatenation.

use async_trait::async_trait;

use crate::error::RagError;
use crate::types::Chunk;

/// Black-box completion interface. Failures propagate as query failures.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, RagError>;
}

/// Builds the question-answering prompt: conversation history, retrieved
/// context and the question, per the fixed template.
pub fn qa_prompt(question: &str, context: &str, history: &str) -> String {
    format!(
        "Conversation History:\n{history}\n\nContext:\n{context}\n\nQuestion: {question}\nAnswer:"
    )
}

pub fn summary_prompt(text: &str) -> String {
    format!("Summarize this in 3-5 bullet points:\n\n{text}")
}

pub fn translation_prompt(text: &str, target_language: &str) -> String {
    format!("Translate this to {target_language}:\n\n{text}")
}

/// Answers a question grounded in the retrieved chunks, with the rendered
/// memory transcript as dialogue context. Chunk contents are joined by a
/// blank line.
pub async fn answer_question(
    model: &dyn ChatModel,
    question: &str,
    chunks: &[Chunk],
    history: &str,
) -> Result<String, RagError> {
    let context = join_contents(chunks.iter().map(|chunk| chunk.content.as_str()));
    model.complete(&qa_prompt(question, &context, history)).await
}

pub async fn summarize_text(model: &dyn ChatModel, text: &str) -> Result<String, RagError> {
    model.complete(&summary_prompt(text)).await
}

pub async fn translate_text(
    model: &dyn ChatModel,
    text: &str,
    target_language: &str,
) -> Result<String, RagError> {
    model.complete(&translation_prompt(text, target_language)).await
}

/// Joins text fragments with a blank-line separator.
pub fn join_contents<'a>(contents: impl Iterator<Item = &'a str>) -> String {
    contents.collect::<Vec<_>>().join("\n\n")
}
