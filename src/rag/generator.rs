//! Prompt assembly and answer generation.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::chunker::Segment;
use crate::core::errors::RagError;
use crate::llm::{ensure_backend_available, GenerationParams, LlmProvider};
use crate::memory::ConversationMemory;

pub const EMPTY_ANSWER_FALLBACK: &str = "I couldn't generate a response for this question.";

const INSTRUCTIONS: &str = "You are an assistant answering questions about a professional profile.\n\
Use the context below as your source of facts. If it does not contain the answer, say that the profile does not provide that information.";

const NO_CONTEXT: &str = "(No relevant context was found in the profile.)";

/// Result of one generation attempt. A failed attempt carries a readable
/// error message as its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub answer: String,
    pub success: bool,
}

#[derive(Clone)]
pub struct AnswerGenerator {
    provider: Arc<dyn LlmProvider>,
    model: String,
    params: GenerationParams,
    timeout: Duration,
    history_window: usize,
}

impl AnswerGenerator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        params: GenerationParams,
        timeout: Duration,
        history_window: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            params,
            timeout,
            history_window,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn generate(
        &self,
        question: &str,
        evidence: &[Segment],
        history: &ConversationMemory,
    ) -> Generation {
        let prompt = self.build_prompt(question, evidence, history);

        match self.call_backend(&prompt).await {
            Ok(text) => {
                let answer = text.trim();
                if answer.is_empty() {
                    warn!(model = %self.model, "Backend returned an empty answer");
                    Generation {
                        answer: EMPTY_ANSWER_FALLBACK.to_string(),
                        success: true,
                    }
                } else {
                    info!(model = %self.model, evidence = evidence.len(), "Generated answer");
                    Generation {
                        answer: answer.to_string(),
                        success: true,
                    }
                }
            }
            Err(err) => {
                warn!(model = %self.model, "Generation failed: {}", err);
                Generation {
                    answer: format!("Error processing question: {}", err),
                    success: false,
                }
            }
        }
    }

    async fn call_backend(&self, prompt: &str) -> Result<String, RagError> {
        ensure_backend_available(self.provider.as_ref()).await?;
        match tokio::time::timeout(
            self.timeout,
            self.provider.generate(prompt, &self.params, &self.model),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RagError::BackendTimeout(self.timeout.as_secs())),
        }
    }

    /// Instructions, ranked evidence, the bounded history window, then the
    /// question.
    pub fn build_prompt(
        &self,
        question: &str,
        evidence: &[Segment],
        history: &ConversationMemory,
    ) -> String {
        let mut prompt = String::new();
        prompt.push_str(INSTRUCTIONS);
        prompt.push_str("\n\nContext:\n");

        if evidence.is_empty() {
            prompt.push_str(NO_CONTEXT);
            prompt.push('\n');
        } else {
            for (rank, segment) in evidence.iter().enumerate() {
                let _ = writeln!(prompt, "[{}] {}", rank + 1, segment.text.trim_end());
            }
        }

        let window = history.recent_answered(self.history_window);
        if !window.is_empty() {
            prompt.push_str("\nConversation so far:\n");
            for turn in window {
                let _ = writeln!(prompt, "Q: {}\nA: {}", turn.question, turn.answer);
            }
        }

        let _ = write!(prompt, "\nQuestion: {}\nAnswer:", question.trim());
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::llm::ProviderModel;
    use crate::memory::ConversationMemory;

    enum Behavior {
        Reply(&'static str),
        Fail,
        Hang,
        Down,
    }

    struct StubProvider {
        behavior: Behavior,
        prompts: Mutex<Vec<String>>,
    }

    impl StubProvider {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn health_check(&self) -> Result<bool, RagError> {
            Ok(!matches!(self.behavior, Behavior::Down))
        }

        async fn list_models(&self) -> Result<Vec<ProviderModel>, RagError> {
            Ok(Vec::new())
        }

        async fn generate(
            &self,
            prompt: &str,
            _params: &GenerationParams,
            _model_id: &str,
        ) -> Result<String, RagError> {
            self.prompts.lock().expect("lock").push(prompt.to_string());
            match self.behavior {
                Behavior::Reply(text) => Ok(text.to_string()),
                Behavior::Fail => Err(RagError::BackendUnreachable("connection refused".to_string())),
                Behavior::Down => Ok("unreachable".to_string()),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok("too late".to_string())
                }
            }
        }

        async fn embed(&self, _inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, RagError> {
            Ok(Vec::new())
        }
    }

    fn params() -> GenerationParams {
        GenerationParams {
            temperature: 0.7,
            top_p: 0.9,
            max_output_tokens: 500,
        }
    }

    fn generator(provider: Arc<StubProvider>, window: usize) -> AnswerGenerator {
        AnswerGenerator::new(provider, "llama2", params(), Duration::from_secs(2), window)
    }

    fn segment(index: usize, text: &str) -> Segment {
        Segment {
            index,
            text: text.to_string(),
            start_offset: 0,
            end_offset: text.chars().count(),
        }
    }

    #[test]
    fn prompt_lists_evidence_in_rank_order() {
        let gen = generator(StubProvider::new(Behavior::Reply("ok")), 10);
        let prompt = gen.build_prompt(
            "What did Alice study?",
            &[segment(2, "Alice studied physics."), segment(0, "Alice is an engineer.\n")],
            &ConversationMemory::new(),
        );

        let first = prompt.find("[1] Alice studied physics.").expect("first evidence");
        let second = prompt.find("[2] Alice is an engineer.").expect("second evidence");
        assert!(first < second);
        assert!(prompt.ends_with("Question: What did Alice study?\nAnswer:"));
        assert!(!prompt.contains("Conversation so far"));
    }

    #[test]
    fn prompt_without_evidence_is_still_well_formed() {
        let gen = generator(StubProvider::new(Behavior::Reply("ok")), 10);
        let prompt = gen.build_prompt("Anything?", &[], &ConversationMemory::new());
        assert!(prompt.contains(NO_CONTEXT));
        assert!(prompt.contains("Question: Anything?"));
    }

    #[test]
    fn history_is_bounded_to_the_window() {
        let gen = generator(StubProvider::new(Behavior::Reply("ok")), 2);
        let mut memory = ConversationMemory::new();
        for i in 0..4 {
            let handle = memory.append(format!("question {i}"));
            memory.set_answer(handle, format!("answer {i}"), Vec::new()).expect("answer");
        }

        let prompt = gen.build_prompt("next", &[], &memory);
        assert!(!prompt.contains("question 1"));
        assert!(prompt.contains("Q: question 2\nA: answer 2"));
        assert!(prompt.contains("Q: question 3\nA: answer 3"));
    }

    #[test]
    fn failed_turns_stay_out_of_the_prompt() {
        let gen = generator(StubProvider::new(Behavior::Reply("ok")), 10);
        let mut memory = ConversationMemory::new();
        let answered = memory.append("Where does Alice work?");
        memory.set_answer(answered, "At Acme.", Vec::new()).expect("answer");
        let failed = memory.append("Where was Bob born?");
        memory
            .set_failure(failed, "Error processing question: down", Vec::new())
            .expect("failure");

        let prompt = gen.build_prompt("next", &[], &memory);
        assert!(prompt.contains("Q: Where does Alice work?\nA: At Acme."));
        assert!(!prompt.contains("Where was Bob born?"));
    }

    #[tokio::test]
    async fn empty_evidence_still_calls_backend() {
        let provider = StubProvider::new(Behavior::Reply("The profile does not say."));
        let gen = generator(provider.clone(), 10);

        let result = gen.generate("Where was Bob born?", &[], &ConversationMemory::new()).await;
        assert!(result.success);
        assert_eq!(result.answer, "The profile does not say.");
        assert_eq!(provider.prompts.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn blank_reply_uses_fallback_answer() {
        let gen = generator(StubProvider::new(Behavior::Reply("  \n")), 10);
        let result = gen.generate("q", &[], &ConversationMemory::new()).await;
        assert!(result.success);
        assert_eq!(result.answer, EMPTY_ANSWER_FALLBACK);
    }

    #[tokio::test]
    async fn backend_failure_becomes_readable_answer() {
        let gen = generator(StubProvider::new(Behavior::Fail), 10);
        let result = gen.generate("q", &[], &ConversationMemory::new()).await;
        assert!(!result.success);
        assert!(result.answer.starts_with("Error processing question:"));
        assert!(result.answer.contains("connection refused"));
    }

    #[tokio::test]
    async fn stopped_backend_is_not_sent_the_prompt() {
        let provider = StubProvider::new(Behavior::Down);
        let gen = generator(provider.clone(), 10);

        let result = gen.generate("q", &[], &ConversationMemory::new()).await;
        assert!(!result.success);
        assert!(result.answer.contains("stub is not running"));
        assert!(provider.prompts.lock().expect("lock").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let gen = generator(StubProvider::new(Behavior::Hang), 10);
        let result = gen.generate("q", &[], &ConversationMemory::new()).await;
        assert!(!result.success);
        assert!(result.answer.contains("timed out after 2s"));
    }
}
