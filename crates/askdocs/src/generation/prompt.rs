//! Prompt templates for grounded answers

use crate::types::Retrieval;

/// Builds the prompt handed to the answer generator
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build a grounded prompt from a question and its retrieval result.
    pub fn build(question: &str, retrieval: &Retrieval) -> String {
        format!(
            r#"You are a document-grounded assistant that ONLY uses information from provided documents.

RULES:
1. ONLY use information that is explicitly stated in the CONTEXT below.
2. If the answer is not in the context, respond with "This information is not available in the provided documents."
3. NEVER use external knowledge or make inferences beyond what is stated.
4. Cite the source document for every claim: [Source: filename]

CONTEXT FROM DOCUMENTS:
{context}

AVAILABLE SOURCES:
{sources}

QUESTION: {question}

Provide a grounded answer using ONLY the document content above:"#,
            context = retrieval.context,
            sources = Self::format_sources(retrieval),
            question = question
        )
    }

    /// Format the numbered source list for the prompt
    fn format_sources(retrieval: &Retrieval) -> String {
        retrieval
            .sources
            .iter()
            .enumerate()
            .map(|(i, source)| format!("[{}] {}", i + 1, source.filename))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceRef;

    #[test]
    fn test_prompt_carries_question_context_and_sources() {
        let retrieval = Retrieval {
            context: "Leave policy: 20 days annual leave.".to_string(),
            sources: vec![
                SourceRef {
                    filename: "policy.pdf".to_string(),
                    score: 0.91,
                    chunk_index: 0,
                },
                SourceRef {
                    filename: "handbook.md".to_string(),
                    score: 0.47,
                    chunk_index: 3,
                },
            ],
            match_count: 2,
        };

        let prompt = PromptBuilder::build("How many vacation days?", &retrieval);
        assert!(prompt.contains("QUESTION: How many vacation days?"));
        assert!(prompt.contains("Leave policy: 20 days annual leave."));
        assert!(prompt.contains("[1] policy.pdf"));
        assert!(prompt.contains("[2] handbook.md"));
    }
}
