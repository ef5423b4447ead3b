pub const NO_CONTEXT_MARKER: &str = "No related documents found in the vector store.";
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";
pub const UNKNOWN_ANSWER: &str = "I don't know based on the provided documents.";

/// Builds the instruction handed to the answer generator. The answer must come only from `contexts`;
/// an empty slice yields an explicit no-context marker instead of a blank block.
pub fn build_grounded_prompt(contexts: &[String], question: &str) -> String {
    let context_block = if contexts.is_empty() {
        NO_CONTEXT_MARKER.to_string()
    } else {
        contexts.join(CONTEXT_SEPARATOR)
    };

    format!(
        "You are a strict Retrieval-Augmented QA assistant.\n\
         \n\
         RULES:\n\
         1. You must answer ONLY using the information provided in the CONTEXT.\n\
         2. If the answer is not present in the context, reply ONLY with:\n   \"{UNKNOWN_ANSWER}\"\n\
         3. Do NOT use outside knowledge.\n\
         4. Do NOT guess, speculate, or hallucinate.\n\
         5. Do NOT add extra details not grounded in the context.\n\
         \n\
         CONTEXT:\n\
         {context_block}\n\
         \n\
         QUESTION:\n\
         {question}\n\
         \n\
         Your answer must strictly follow the rules above."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_uses_marker() {
        let prompt = build_grounded_prompt(&[], "X");

        assert!(prompt.contains(NO_CONTEXT_MARKER));
        assert!(!prompt.contains(CONTEXT_SEPARATOR));
        assert!(prompt.contains("QUESTION:\nX"));
    }

    #[test]
    fn contexts_and_question_are_embedded() {
        let contexts = vec!["ctx1".to_string(), "ctx2".to_string()];
        let prompt = build_grounded_prompt(&contexts, "X");

        assert!(prompt.contains("ctx1\n\n---\n\nctx2"));
        assert!(prompt.contains("QUESTION:\nX"));
        assert!(prompt.contains(UNKNOWN_ANSWER));
        assert!(!prompt.contains(NO_CONTEXT_MARKER));
    }

    #[test]
    fn prompt_is_pure() {
        let contexts = vec!["same".to_string()];
        assert_eq!(
            build_grounded_prompt(&contexts, "q"),
            build_grounded_prompt(&contexts, "q")
        );
    }
}
