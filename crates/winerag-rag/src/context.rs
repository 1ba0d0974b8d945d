//! Context selection
//!
//! Reduces a ranked list of search hits to the single string placed in
//! the prompt.

use winerag_core::{ContextPolicy, SearchResult};

/// Context used when the search service returns nothing
pub const NO_RESULTS_CONTEXT: &str = "No relevant documents found.";

/// Build the prompt context from search results according to `policy`
pub fn select_context(policy: ContextPolicy, results: &[SearchResult]) -> String {
    match policy {
        ContextPolicy::FirstResult => results
            .first()
            .map(|r| r.content.clone())
            .unwrap_or_else(|| NO_RESULTS_CONTEXT.to_string()),
        // Unbounded: a full page of hits can exceed the model's input limit.
        ContextPolicy::StringifyAll => {
            serde_json::to_string(results).unwrap_or_else(|_| format!("{results:?}"))
        }
    }
}
