//! Prompt Composer
//!
//! Pure functions rendering the text prompts sent to the classifier, the writer
//! and the critic. None of them perform I/O.

use crate::conductor::types::Transcript;
use regex::Regex;
use std::sync::OnceLock;

/// Critique instruction embedded in every reflection message
pub const REFLECTION_INSTRUCTION: &str = "Review the researcher's response above against the user's request. \
Check that it answers exactly what was asked, that every statement is supported by the cited sources, \
and that the Summary, Detailed Analysis and Citations sections are present and in that order. \
Point out missing information, unsupported claims and citations that do not match a source, \
and give concrete suggestions to improve the response.";

/// Render the synthesis prompt for the writer responder.
///
/// The context is embedded verbatim between `<context>` tags and the question
/// between `<question>` tags as `User: "<question>"`, which is the marker
/// [`extract_user_question`] looks for.
pub fn compose_answer_prompt(context: &str, question: &str) -> String {
    format!(
        r#"You are an expert research assistant that extracts information from the CONTEXT provided between <context> and </context> tags.
When answering the question contained between <question> and </question> tags be concise and do not hallucinate.
If the CONTEXT does not contain the information, say that you do not have it.
Only answer the question if you can extract the answer from the CONTEXT provided.

Do not mention the CONTEXT in your answer. Respond in this format:
1. Summary: A brief summary of the findings from the documents, explicitly referencing the sources.
2. Detailed Analysis: An in-depth explanation based on the documents, with citations for each piece of information.
3. Citations: A numbered list of the referenced sources. Only cite paths or filenames that appear in the CONTEXT.

Example Response:
- Summary: Key insights from the documents include X, Y, and Z (sourced from 'reports/annual.pdf').
- Detailed Analysis: The document 'reports/annual.pdf' highlights that [analysis of X]. Additionally, 'notes/q1.md' explains [analysis of Y].
- Citations:
   1. reports/annual.pdf
   2. notes/q1.md

<context>
{context}
</context>
<question>
User: "{question}"
</question>
Answer:
"#
    )
}

/// Render the prompt asking the intent classifier whether web search is needed.
pub fn compose_search_verdict_prompt(search_result: &str, question: &str) -> String {
    format!(
        r#"User's message: '{question}'
Search Result: {search_result}

If the search result is empty or states that the retrieved documents do not provide direct information about the user's message, reply 'yes'.
Otherwise, if the documents contain relevant information, reply 'no'.
"#
    )
}

fn user_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r#"User:\s"(.*?)""#).expect("marker regex is valid"))
}

/// Extract the question embedded as `User: "<question>"` in rendered text.
pub fn extract_user_question(text: &str) -> Option<&str> {
    user_marker()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Build the critic's seed message from the writer step's transcript.
///
/// The user's request is re-derived from the first transcript entry. When the
/// `User: "..."` marker is missing the whole first message is used instead.
pub fn build_reflection_message(transcript: &Transcript) -> String {
    build_reflection_message_for(None, transcript)
}

/// Build the critic's seed message, preferring the question when it is known.
pub fn build_reflection_message_for(question: Option<&str>, transcript: &Transcript) -> String {
    let last_message = transcript
        .last()
        .map(|m| m.content.as_str())
        .unwrap_or_default();
    let first_message = transcript
        .first()
        .map(|m| m.content.as_str())
        .unwrap_or_default();

    let user_said = match question {
        Some(question) => question,
        None => match extract_user_question(first_message) {
            Some(extracted) => extracted,
            None => {
                tracing::debug!("No user marker in writer transcript, using the raw first message");
                first_message
            }
        },
    };

    format!(
        "Researcher's response: \n{} \n\n{} \n\nUser: {} \n",
        last_message, REFLECTION_INSTRUCTION, user_said
    )
}
