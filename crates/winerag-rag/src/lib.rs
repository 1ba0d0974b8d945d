//! Wine RAG - Retrieval-Augmented Generation pipeline
//!
//! One question flows through three strictly sequential stages:
//! - Search: top hits from the search backend
//! - Context selection: hits reduced to one context string
//! - Completion: question plus context sent to the chat model
//!
//! Each outbound call is bounded by a timeout. Nothing is cached or retried.

use std::sync::Arc;
use std::time::{Duration, Instant};
use winerag_core::{
    CompletionClient, ContextPolicy, RagConfig, RagError, Result, SearchBackend, SearchConfig,
};

pub mod context;
pub mod llm;

pub use context::{select_context, NO_RESULTS_CONTEXT};
pub use llm::{build_messages, CompletionParams, OpenAiChatClient, SYSTEM_PERSONA};

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct RagAnswer {
    /// Model output, verbatim
    pub answer: String,
    /// Context handed to the model
    pub context: String,
    /// Number of search hits consumed
    pub hits: usize,
}

/// Search, select, complete
pub struct RagPipeline {
    search: Arc<dyn SearchBackend>,
    completion: Arc<dyn CompletionClient>,
    policy: ContextPolicy,
    top_k: usize,
    timeout: Duration,
}

impl RagPipeline {
    /// Create a pipeline with default settings
    pub fn new(search: Arc<dyn SearchBackend>, completion: Arc<dyn CompletionClient>) -> Self {
        let rag = RagConfig::default();
        Self {
            search,
            completion,
            policy: rag.context_policy,
            top_k: SearchConfig::default().top,
            timeout: Duration::from_secs(rag.upstream_timeout_secs),
        }
    }

    /// Apply pipeline and search settings
    pub fn with_config(mut self, rag: &RagConfig, search: &SearchConfig) -> Self {
        self.policy = rag.context_policy;
        self.timeout = Duration::from_secs(rag.upstream_timeout_secs);
        self.top_k = search.top;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn policy(&self) -> ContextPolicy {
        self.policy
    }

    /// Answer a question
    pub async fn ask(&self, question: &str) -> Result<String> {
        self.run(question).await.map(|r| r.answer)
    }

    /// Answer a question, keeping the intermediate context
    pub async fn run(&self, question: &str) -> Result<RagAnswer> {
        let start = Instant::now();

        let results = self
            .bounded("search", self.search.search(question, self.top_k))
            .await?;
        tracing::debug!(
            backend = self.search.name(),
            hits = results.len(),
            "search stage finished"
        );

        let context = select_context(self.policy, &results);
        tracing::debug!(
            policy = %self.policy,
            context_chars = context.len(),
            "context selected"
        );

        let messages = build_messages(question, &context);
        let answer = self
            .bounded("completion", self.completion.chat(&messages))
            .await?;

        tracing::info!(
            hits = results.len(),
            answer_chars = answer.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "RAG query answered"
        );

        Ok(RagAnswer {
            answer,
            context,
            hits: results.len(),
        })
    }

    async fn bounded<T, F>(&self, stage: &'static str, call: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(stage, error = %e, "upstream call failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(
                    stage,
                    timeout_secs = self.timeout.as_secs(),
                    "upstream call timed out"
                );
                Err(RagError::Timeout {
                    stage,
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use winerag_core::{ChatMessage, ChatRole, SearchResult};

    struct FixedSearch {
        results: Vec<SearchResult>,
        delay: Option<Duration>,
        queries: Mutex<Vec<(String, usize)>>,
    }

    impl FixedSearch {
        fn new(contents: &[&str]) -> Self {
            Self {
                results: contents.iter().map(|c| SearchResult::new(*c)).collect(),
                delay: None,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchBackend for FixedSearch {
        async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
            self.queries
                .lock()
                .unwrap()
                .push((query.to_string(), limit));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.results.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl SearchBackend for FailingSearch {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>> {
            Err(RagError::Search("index unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[derive(Default)]
    struct RecordingLlm {
        calls: Mutex<Vec<Vec<ChatMessage>>>,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl CompletionClient for RecordingLlm {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
            self.calls.lock().unwrap().push(messages.to_vec());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(RagError::Llm("quota exceeded".to_string()));
            }
            Ok(format!("answer based on: {}", messages[2].content))
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_first_result_context_reaches_assistant_message() {
        let search = Arc::new(FixedSearch::new(&[
            "Wine A: bold and fruity",
            "Wine B: dry and oaky",
        ]));
        let llm = Arc::new(RecordingLlm::default());
        let pipeline = RagPipeline::new(search.clone(), llm.clone());

        let result = pipeline
            .run("What is the best Cabernet Sauvignon?")
            .await
            .unwrap();

        assert_eq!(result.context, "Wine A: bold and fruity");
        assert_eq!(result.hits, 2);
        assert_eq!(
            search.queries.lock().unwrap()[0],
            ("What is the best Cabernet Sauvignon?".to_string(), 20)
        );

        let calls = llm.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][1].content, "What is the best Cabernet Sauvignon?");
        assert_eq!(calls[0][2].role, ChatRole::Assistant);
        assert_eq!(calls[0][2].content, "Wine A: bold and fruity");
    }

    #[tokio::test]
    async fn test_empty_results_use_sentinel() {
        let search = Arc::new(FixedSearch::new(&[]));
        let llm = Arc::new(RecordingLlm::default());
        let pipeline = RagPipeline::new(search, llm.clone());

        let answer = pipeline.ask("anything").await.unwrap();

        assert_eq!(answer, "answer based on: No relevant documents found.");
        assert_eq!(
            llm.calls.lock().unwrap()[0][2].content,
            NO_RESULTS_CONTEXT
        );
    }

    #[tokio::test]
    async fn test_search_failure_skips_completion() {
        let llm = Arc::new(RecordingLlm::default());
        let pipeline = RagPipeline::new(Arc::new(FailingSearch), llm.clone());

        let err = pipeline.ask("anything").await.unwrap_err();

        assert!(matches!(err, RagError::Search(_)));
        assert!(llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_completion_failure_returns_no_partial_answer() {
        let llm = Arc::new(RecordingLlm {
            fail: true,
            ..Default::default()
        });
        let pipeline = RagPipeline::new(Arc::new(FixedSearch::new(&["Wine A"])), llm);

        assert!(matches!(
            pipeline.ask("anything").await,
            Err(RagError::Llm(msg)) if msg == "quota exceeded"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_search_times_out() {
        let search = Arc::new(FixedSearch {
            delay: Some(Duration::from_secs(120)),
            ..FixedSearch::new(&["Wine A"])
        });
        let llm = Arc::new(RecordingLlm::default());
        let pipeline =
            RagPipeline::new(search, llm.clone()).with_timeout(Duration::from_secs(5));

        let err = pipeline.ask("anything").await.unwrap_err();

        assert!(matches!(err, RagError::Timeout { stage: "search", secs: 5 }));
        assert!(llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_completion_times_out() {
        let llm = Arc::new(RecordingLlm {
            delay: Some(Duration::from_secs(120)),
            ..Default::default()
        });
        let pipeline = RagPipeline::new(Arc::new(FixedSearch::new(&["Wine A"])), llm.clone())
            .with_timeout(Duration::from_secs(5));

        let err = pipeline.ask("anything").await.unwrap_err();

        assert!(matches!(
            err,
            RagError::Timeout {
                stage: "completion",
                secs: 5
            }
        ));
        assert_eq!(llm.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_config_applies_policy_and_top_k() {
        let search = Arc::new(FixedSearch::new(&["Wine A"]));
        let llm = Arc::new(RecordingLlm::default());
        let rag = RagConfig {
            context_policy: ContextPolicy::StringifyAll,
            upstream_timeout_secs: 10,
        };
        let search_config = SearchConfig {
            top: 7,
            ..Default::default()
        };
        let pipeline = RagPipeline::new(search.clone(), llm).with_config(&rag, &search_config);

        let result = pipeline.run("q").await.unwrap();

        assert_eq!(pipeline.policy(), ContextPolicy::StringifyAll);
        assert_eq!(result.context, r#"[{"content":"Wine A"}]"#);
        assert_eq!(search.queries.lock().unwrap()[0].1, 7);
    }
}
