//! Grounded answer composition

use tracing::debug;

use scholar_core::{ChatMessage, DocumentChunk, GenerationConfig, LLMProvider, Result};

/// Instruction binding the model to the retrieved context
pub const SYSTEM_PROMPT: &str = "You are an assistant for answering questions based on academic papers. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, say that you don't know. \
Use three sentences maximum and keep the answer concise.";

/// Answer given when nothing relevant has been ingested
pub const NO_CONTEXT_ANSWER: &str =
    "I don't know. No ingested documents contain information relevant to this question.";

/// Builds the grounded prompt and asks the model for a short answer
pub struct AnswerComposer<L: LLMProvider> {
    llm: L,
    config: GenerationConfig,
}

impl<L: LLMProvider> AnswerComposer<L> {
    /// Create a composer that queries `llm` at temperature 0
    pub fn new(llm: L) -> Self {
        let config = GenerationConfig {
            model_id: llm.model_id().to_string(),
            temperature: 0.0,
            ..Default::default()
        };
        Self { llm, config }
    }

    pub fn llm(&self) -> &L {
        &self.llm
    }

    /// Build the system and user messages for `question`
    pub fn build_messages(&self, question: &str, context: &[DocumentChunk]) -> Vec<ChatMessage> {
        let context_text = context
            .iter()
            .map(|chunk| chunk.text.trim())
            .collect::<Vec<_>>()
            .join("\n\n");

        vec![
            ChatMessage::system(format!("{}\n\n{}", SYSTEM_PROMPT, context_text)),
            ChatMessage::user(question),
        ]
    }

    /// Answer `question` from `context` only
    ///
    /// With an empty context the model is not consulted and the fixed
    /// `NO_CONTEXT_ANSWER` is returned. Model failures are returned as errors.
    pub async fn compose(&self, question: &str, context: &[DocumentChunk]) -> Result<String> {
        if context.is_empty() {
            debug!("No context retrieved, declining to answer");
            return Ok(NO_CONTEXT_ANSWER.to_string());
        }

        let messages = self.build_messages(question, context);
        let result = self.llm.chat_with_config(&messages, &self.config).await?;
        Ok(result.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{EchoLLM, FailingLLM};
    use scholar_core::{ChatRole, Error};

    fn chunks() -> Vec<DocumentChunk> {
        vec![
            DocumentChunk::new("We train on the Cora citation graph.", "gcn.pdf", 3),
            DocumentChunk::new("  Accuracy reaches 81.5%.  ", "gcn.pdf", 5),
        ]
    }

    #[tokio::test]
    async fn test_compose_sends_grounded_prompt_at_temperature_zero() {
        let composer = AnswerComposer::new(EchoLLM::default());

        let answer = composer.compose("Which dataset?", &chunks()).await.unwrap();

        assert!(answer.contains("Cora"));
        let requests = composer.llm().requests.lock().unwrap();
        let (messages, temperature) = &requests[0];
        assert_eq!(*temperature, 0.0);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.starts_with(SYSTEM_PROMPT));
        assert!(messages[0].content.ends_with("Cora citation graph.\n\nAccuracy reaches 81.5%."));
        assert_eq!(messages[1], ChatMessage::user("Which dataset?"));
    }

    #[tokio::test]
    async fn test_empty_context_does_not_call_model() {
        let composer = AnswerComposer::new(EchoLLM::default());

        let answer = composer.compose("Which dataset?", &[]).await.unwrap();

        assert_eq!(answer, NO_CONTEXT_ANSWER);
        assert_eq!(composer.llm().request_count(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let composer = AnswerComposer::new(FailingLLM);

        let err = composer.compose("Which dataset?", &chunks()).await.unwrap_err();

        assert!(matches!(err, Error::LLMProvider(_)));
    }

    #[test]
    fn test_prompt_limits_answer_length() {
        assert!(SYSTEM_PROMPT.contains("say that you don't know"));
        assert!(SYSTEM_PROMPT.contains("three sentences maximum"));
    }
}
