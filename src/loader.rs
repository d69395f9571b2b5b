//! Source document discovery and text extraction.
//!
//! PDFs are read page by page so passages can cite a page number. Plain
//! text and markdown files are treated as a single unpaginated page.

use crate::error::{Result, VedabotError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Supported paginated document extensions.
const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// Supported plain text extensions.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Text extracted from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number, `None` for unpaginated sources.
    pub page: Option<u32>,
    pub text: String,
}

/// A document with its extracted pages.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Provenance identifier recorded on every passage.
    pub source: String,
    pub pages: Vec<PageText>,
}

impl LoadedDocument {
    /// Total extracted characters.
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if path is a supported source document.
pub fn is_supported(path: &Path) -> bool {
    has_extension(path, PDF_EXTENSIONS) || has_extension(path, TEXT_EXTENSIONS)
}

/// List supported documents in `dir`, sorted by path.
pub fn discover_documents(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(VedabotError::InvalidInput(format!(
            "Corpus directory not found: {}",
            dir.display()
        )));
    }

    // symlinks are not followed, so a link back into the corpus cannot loop
    let mut found = WalkDir::new(dir)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_supported(entry.path()))
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();

    found.sort();
    debug!("Discovered {} documents under {:?}", found.len(), dir);
    Ok(found)
}

/// Extract the text of a single document.
pub fn load_document(path: &Path) -> Result<LoadedDocument> {
    let parse_error = |reason: String| VedabotError::DocumentParse {
        path: path.to_path_buf(),
        reason,
    };

    let pages = if has_extension(path, PDF_EXTENSIONS) {
        let pages = load_pdf_pages(path).map_err(|e| parse_error(e.to_string()))?;
        if pages.is_empty() {
            return Err(parse_error("PDF has no pages".to_string()));
        }
        pages
    } else if has_extension(path, TEXT_EXTENSIONS) {
        let bytes = std::fs::read(path).map_err(|e| parse_error(e.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|e| parse_error(e.to_string()))?;
        vec![PageText {
            page: None,
            text: normalize_whitespace(&text),
        }]
    } else {
        return Err(parse_error("unsupported file type".to_string()));
    };

    Ok(LoadedDocument {
        source: path.to_string_lossy().into_owned(),
        pages,
    })
}

fn load_pdf_pages(path: &Path) -> std::result::Result<Vec<PageText>, lopdf::Error> {
    let document = lopdf::Document::load(path)?;

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    Ok(extract_pages(&page_numbers, |n| document.extract_text(&[n])))
}

/// Extract each page, skipping pages whose text cannot be decoded.
fn extract_pages<F>(page_numbers: &[u32], mut extract: F) -> Vec<PageText>
where
    F: FnMut(u32) -> std::result::Result<String, lopdf::Error>,
{
    let mut pages = Vec::with_capacity(page_numbers.len());
    for &page_number in page_numbers {
        match extract(page_number) {
            Ok(text) => pages.push(PageText {
                page: Some(page_number),
                text: normalize_whitespace(&text),
            }),
            Err(e) => warn!("Skipping page {}: {}", page_number, e),
        }
    }
    pages
}

/// Collapse runs of spaces and tabs, and more than two consecutive newlines.
pub fn normalize_whitespace(text: &str) -> String {
    static INLINE: OnceLock<Regex> = OnceLock::new();
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();

    let inline = INLINE.get_or_init(|| Regex::new(r"[ \t\u{a0}]+").expect("Invalid regex"));
    let blank_lines =
        BLANK_LINES.get_or_init(|| Regex::new(r"\n[ \t]*(\n[ \t]*)+").expect("Invalid regex"));

    let text = text.replace("\r\n", "\n");
    let text = inline.replace_all(&text, " ");
    let text = blank_lines.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("Ginger  \t reduces\r\n\r\n\n\nnausea.  "),
            "Ginger reduces\n\nnausea."
        );
        assert_eq!(normalize_whitespace("a\nb"), "a\nb");
    }

    #[test]
    fn test_discover_documents_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.PDF"), "a").unwrap();
        std::fs::write(dir.path().join("notes.docx"), "x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.md"), "c").unwrap();

        let flat = discover_documents(dir.path(), false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.txt"]);

        let deep = discover_documents(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_does_not_follow_symlink_loops() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub").join("back")).unwrap();

        let docs = discover_documents(dir.path(), true).unwrap();
        assert_eq!(docs, vec![dir.path().join("a.txt")]);
    }

    #[test]
    fn test_unreadable_page_is_skipped() {
        let pages = extract_pages(&[1, 2, 3], |n| {
            if n == 2 {
                Err(lopdf::Error::PageNumberNotFound(n))
            } else {
                Ok(format!("page  {}", n))
            }
        });

        let numbers: Vec<_> = pages.iter().map(|p| p.page).collect();
        assert_eq!(numbers, vec![Some(1), Some(3)]);
        assert_eq!(pages[1].text, "page 3");
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_documents(&dir.path().join("nope"), false).unwrap_err();
        assert!(matches!(err, VedabotError::InvalidInput(_)));
    }

    #[test]
    fn test_load_text_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ginger.txt");
        std::fs::write(&path, "Ginger reduces nausea.   Take 1g twice daily.\n").unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].page, None);
        assert_eq!(doc.pages[0].text, "Ginger reduces nausea. Take 1g twice daily.");
        assert!(doc.source.ends_with("ginger.txt"));
    }

    #[test]
    fn test_corrupt_pdf_is_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4 this is not really a pdf").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, VedabotError::DocumentParse { .. }));
    }

    #[test]
    fn test_non_utf8_text_is_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        std::fs::write(&path, [0xffu8, 0xfe, 0x00, 0xc3]).unwrap();

        assert!(matches!(load_document(&path), Err(VedabotError::DocumentParse { .. })));
    }
}
