//! Canned example queries over the Zuozhuan index

use super::{QueryEngine, QueryOutcome, QueryResult, SearchType};
use crate::graph::truncate_chars;
use std::fmt::Write;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExampleQuery {
    pub question: &'static str,
    pub search_type: SearchType,
    /// What the example demonstrates
    pub description: &'static str,
}

pub const EXAMPLE_QUERIES: [ExampleQuery; 5] = [
    ExampleQuery {
        question: "鄭莊公和共叔段之間發生了什麼？",
        search_type: SearchType::Local,
        description: "Local search - a specific relationship between people",
    },
    ExampleQuery {
        question: "春秋時期各國之間的盟約關係如何？",
        search_type: SearchType::Global,
        description: "Global search - alliances across states",
    },
    ExampleQuery {
        question: "左傳中提到了哪些國家？",
        search_type: SearchType::Basic,
        description: "Basic search - simple enumeration",
    },
    ExampleQuery {
        question: "春秋時期的政治格局有什麼特點？",
        search_type: SearchType::Global,
        description: "Global search - historical analysis",
    },
    ExampleQuery {
        question: "穎考叔這個人物做了什麼？",
        search_type: SearchType::Local,
        description: "Local search - a single person",
    },
];

/// How much of a result to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    pub context_items: usize,
    pub snippet_chars: usize,
    /// Zero hides the entity line
    pub entity_items: usize,
}

impl RenderLimits {
    pub const EXAMPLES: Self = Self {
        context_items: 3,
        snippet_chars: 200,
        entity_items: 5,
    };

    pub const INTERACTIVE: Self = Self {
        context_items: 2,
        snippet_chars: 300,
        entity_items: 0,
    };
}

/// Human-readable rendering of a query result
pub fn render_result(result: &QueryResult, limits: RenderLimits) -> String {
    let mut out = String::new();

    let Some(answer) = result.answer.as_deref().filter(|_| result.has_answer()) else {
        out.push_str("No answer found");
        return out;
    };
    let _ = write!(out, "Answer: {}", answer.trim());

    if limits.context_items > 0 && !result.context.is_empty() {
        out.push_str("\n\nContext:");
        for (i, snippet) in result.context.iter().take(limits.context_items).enumerate() {
            let short = truncate_chars(snippet, limits.snippet_chars);
            let ellipsis = if short.len() < snippet.len() { "..." } else { "" };
            let _ = write!(out, "\n  {}. {}{}", i + 1, short, ellipsis);
        }
    }

    if limits.entity_items > 0 && !result.entities.is_empty() {
        let names: Vec<&str> = result
            .entities
            .iter()
            .take(limits.entity_items)
            .map(String::as_str)
            .collect();
        let _ = write!(out, "\n\nEntities: {}", names.join(", "));
    }

    out
}

/// Result of one example run
#[derive(Debug)]
pub struct ExampleOutcome {
    pub example: ExampleQuery,
    pub result: QueryOutcome<QueryResult>,
}

/// Run every example in order; a failing query does not stop the rest
pub async fn run_examples(engine: &dyn QueryEngine, examples: &[ExampleQuery]) -> Vec<ExampleOutcome> {
    let mut outcomes = Vec::with_capacity(examples.len());
    for example in examples {
        let result = engine.query(example.question, example.search_type).await;
        if let Err(e) = &result {
            warn!("Example query failed ({}): {}", example.question, e);
        }
        outcomes.push(ExampleOutcome {
            example: *example,
            result,
        });
    }
    outcomes
}
