//! Prompt template for retrieval-grounded answers.
//!
//! The template and its slot names are compile-time constants. Only the
//! retrieved context and the question are ever substituted into it.

use crate::vector_store::Passage;

/// Slot receiving the concatenated passage text.
pub const CONTEXT_SLOT: &str = "{context}";

/// Slot receiving the user's question.
pub const QUESTION_SLOT: &str = "{question}";

/// Instruction template for the Ayurveda advisor.
pub const QA_PROMPT_TEMPLATE: &str = r#"
You are an Ayurveda Advisor. Use the following pieces of information to answer the user's question in detail. When discussing
medicines and remedies, ensure to include precautions and exceptions where necessary. Don't include references section.
Create a stand-alone question from follow-up questions while retaining context from the previous exchanges.
Format the entire answer in markdown format, with bolds, italics, and pointers wherever required.
Only return the helpful answer below and nothing else. For answers exceeding 120 tokens, answer in points.
Context: {context}
Question: {question}
"#;

/// Separator placed between passages in the context slot.
const PASSAGE_SEPARATOR: &str = "\n\n";

/// Render the QA prompt for the given passages and question.
pub fn build_prompt(context_passages: &[Passage], question: &str) -> String {
    let context = context_passages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR);

    render(QA_PROMPT_TEMPLATE, &context, question)
}

/// Fill both slots in a single left-to-right pass over the template.
///
/// Substituted values are never rescanned, so slot markers appearing inside
/// the context or the question stay literal.
fn render(template: &str, context: &str, question: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with(CONTEXT_SLOT) {
            out.push_str(context);
            rest = &tail[CONTEXT_SLOT.len()..];
        } else if tail.starts_with(QUESTION_SLOT) {
            out.push_str(question);
            rest = &tail[QUESTION_SLOT.len()..];
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
