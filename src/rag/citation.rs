//! Numbered reference list appended to answers.

use crate::vector_store::Passage;

/// Default excerpt length, in characters.
pub const DEFAULT_EXCERPT_CHARS: usize = 300;

/// Heading placed before the reference list.
pub const REFERENCES_HEADING: &str = "\n#### References\n";

/// File name of `source` without directories or a `.pdf` extension.
///
/// Both `/` and `\` are treated as separators so snapshots built on either
/// platform cite the same name.
pub fn file_stem(source: &str) -> &str {
    let name = source.rsplit(['/', '\\']).next().unwrap_or(source);
    name.strip_suffix(".pdf")
        .or_else(|| name.strip_suffix(".PDF"))
        .unwrap_or(name)
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

/// Render one citation as a markdown block.
pub fn format_citation(ordinal: usize, passage: &Passage, max_chars: usize) -> String {
    format!(
        "##### {}.{}\nSource Content: _{}_\n",
        ordinal,
        file_stem(&passage.metadata.source),
        excerpt(&passage.content, max_chars)
    )
}

/// Append a numbered reference list for `passages` to `answer`.
///
/// The answer is returned unchanged when there are no passages.
pub fn add_sources_to_answer(answer: &str, passages: &[Passage], max_chars: usize) -> String {
    if passages.is_empty() {
        return answer.to_string();
    }

    let mut out = String::with_capacity(answer.len() + passages.len() * (max_chars + 64));
    out.push_str(answer);
    out.push_str(REFERENCES_HEADING);
    for (i, passage) in passages.iter().enumerate() {
        out.push_str(&format_citation(i + 1, passage, max_chars));
    }
    out
}
