//! Knowledge-first troubleshooting.
//!
//! Looks for a stored solution before the agent goes elsewhere. When the best
//! internal match scores at or below [`SIMILARITY_THRESHOLD`], the returned
//! guidance tells the agent to research externally and then persist what it
//! finds with `add_knowledge`. Nothing here performs the research or checks
//! that the follow-up happens.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::knowledge::{KnowledgeBase, KnowledgeMatch, search_internal};
use crate::clients::normalize_collection_name;
use crate::tools::tool::{Tool, ToolError, ToolOutcome, int_or, optional_str, require_str};

/// Best scores at or below this count as "no useful internal knowledge".
pub const SIMILARITY_THRESHOLD: f32 = 0.3;

pub const DEFAULT_SOLUTIONS_COLLECTION: &str = "solutions";

/// Search stored solutions and advise whether to look further.
pub struct TroubleshootTool {
    kb: KnowledgeBase,
}

impl TroubleshootTool {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }
}

/// Highest score among `matches`, if any.
pub fn best_score(matches: &[KnowledgeMatch]) -> Option<f32> {
    matches.iter().map(|m| m.score).reduce(f32::max)
}

fn guidance(collection: &str, best: Option<f32>) -> (bool, String) {
    match best {
        Some(score) if score > SIMILARITY_THRESHOLD => (
            true,
            format!(
                "Found a stored solution (similarity {score:.2}). Apply the best match first; \
                 if it does not resolve the problem, research further and record the working \
                 fix with add_knowledge in '{collection}'."
            ),
        ),
        _ => (
            false,
            format!(
                "No strong match in internal knowledge (threshold {SIMILARITY_THRESHOLD}). \
                 Search external sources for a solution, then call add_knowledge with \
                 collection='{collection}' to save the fix for next time."
            ),
        ),
    }
}

#[async_trait]
impl Tool for TroubleshootTool {
    fn name(&self) -> &str {
        "troubleshoot"
    }

    fn description(&self) -> &str {
        "Look up a problem in stored solutions first. Returns matching solutions and \
         guidance on whether to research externally and save the result."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "problem": {"type": "string", "description": "Description of the problem or error message"},
                "collection": {"type": "string", "description": "Collection holding solutions (default: solutions)", "default": DEFAULT_SOLUTIONS_COLLECTION},
                "limit": {"type": "integer", "description": "Maximum matches (default: 3)", "default": 3}
            },
            "required": ["problem"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let problem = require_str(&params, "problem")?;
        let collection = normalize_collection_name(
            optional_str(&params, "collection").unwrap_or(DEFAULT_SOLUTIONS_COLLECTION),
        );
        let limit = int_or(&params, "limit", 3, 1, 20) as usize;

        let matches = search_internal(&self.kb, &collection, problem, limit).await;
        let best = best_score(&matches);
        let (found_internal, guidance) = guidance(&collection, best);

        tracing::info!(
            found_internal,
            best_score = best.unwrap_or(0.0),
            "troubleshoot lookup in '{}'",
            collection
        );
        Ok(ToolOutcome::Success(json!({
            "problem": problem,
            "collection": collection,
            "matches": matches,
            "best_score": best,
            "found_internal": found_internal,
            "guidance": guidance,
        })))
    }
}
