//! Document Loading
//!
//! Page-marked plain-text access to disclosure documents, plus the chunked
//! keyword index that narrows document excerpts before context assembly.
//! A production deployment would stand a PDF/OCR extraction backend behind
//! the same [`DocumentSource`] trait; the shipped source reads UTF-8 text
//! files and is what local runs and tests use.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::services::agent::{ScoredSnippet, SimilaritySearch};
use crate::utils::error::{AppError, AppResult};
use crate::utils::text::{extract_keywords, keyword_hits};

/// Target chunk size for the similarity index, in characters
pub const CHUNK_CHARS: usize = 800;

fn page_marker_re() -> &'static Regex {
    static PAGE_MARKER: OnceLock<Regex> = OnceLock::new();
    PAGE_MARKER.get_or_init(|| Regex::new(r"(?m)^\[Page \d+\]\s*$").unwrap())
}

/// One loaded document, split into pages
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// File stem, used as the document id in snippets and facts
    pub id: String,
    pub path: PathBuf,
    /// Page texts in order; unpaginated sources load as a single page
    pub pages: Vec<String>,
}

impl LoadedDocument {
    /// Full text with `[Page N]` markers reinserted
    pub fn marked_text(&self) -> String {
        self.pages
            .iter()
            .enumerate()
            .map(|(i, page)| format!("[Page {}]\n{}", i + 1, page.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// True when no page carries any non-whitespace text
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

/// Source of page-marked plain text for a document path
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Load one document. Blank text is returned as-is; deciding whether
    /// that fails a pipeline phase is the caller's business.
    async fn load(&self, path: &Path) -> AppResult<LoadedDocument>;
}

/// Reads UTF-8 text files, splitting pages on form feeds or existing
/// `[Page N]` markers
#[derive(Debug, Default)]
pub struct PlainTextSource;

#[async_trait]
impl DocumentSource for PlainTextSource {
    async fn load(&self, path: &Path) -> AppResult<LoadedDocument> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        if extension == "pdf" {
            return Err(AppError::document(format!(
                "{} is a PDF; this source reads plain text only. Extract the text first (scanned documents need OCR).",
                path.display()
            )));
        }

        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::document(format!("Could not read {}: {}", path.display(), e))
        })?;

        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        let pages = split_pages(&raw);
        debug!(document = %id, pages = pages.len(), "Loaded document");

        Ok(LoadedDocument {
            id,
            path: path.to_path_buf(),
            pages,
        })
    }
}

/// Split raw text into pages. Form feeds win; otherwise pre-existing
/// `[Page N]` marker lines; otherwise the whole text is one page.
fn split_pages(raw: &str) -> Vec<String> {
    if raw.contains('\u{c}') {
        return raw.split('\u{c}').map(|p| p.trim().to_string()).collect();
    }
    if page_marker_re().is_match(raw) {
        return page_marker_re()
            .split(raw)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
    }
    vec![raw.trim().to_string()]
}

// ============================================================================
// Keyword similarity index
// ============================================================================

#[derive(Debug, Clone)]
struct IndexedChunk {
    document_id: String,
    page: usize,
    text: String,
}

/// Keyword-scored chunk index over loaded documents.
///
/// Build it once before a run, then share it read-only. Scores are the
/// fraction of query keywords present in the chunk, so they land in [0, 1]
/// like embedding cosine scores would.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    chunks: Vec<IndexedChunk>,
}

impl DocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunk a document's pages into the index
    pub fn add(&mut self, doc: &LoadedDocument) {
        for (page_no, page) in doc.pages.iter().enumerate() {
            for chunk in chunk_text(page, CHUNK_CHARS) {
                self.chunks.push(IndexedChunk {
                    document_id: doc.id.clone(),
                    page: page_no + 1,
                    text: chunk,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Accumulate paragraphs into chunks of at most `max_chars`. Paragraphs
/// longer than the budget become their own oversized chunk rather than
/// being split mid-sentence.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        if !current.is_empty() && current.chars().count() + paragraph.chars().count() > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl SimilaritySearch for DocumentIndex {
    async fn search(
        &self,
        query: &str,
        document_id: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<ScoredSnippet>> {
        let keywords = extract_keywords(query);
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .chunks
            .iter()
            .filter(|c| document_id.map_or(true, |id| c.document_id == id))
            .filter_map(|c| {
                let hits = keyword_hits(&keywords, &c.text);
                if hits == 0 {
                    None
                } else {
                    Some((hits as f32 / keywords.len() as f32, c))
                }
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(score, chunk)| ScoredSnippet {
                document_id: chunk.document_id.clone(),
                text: format!("[Page {}] {}", chunk.page, chunk.text),
                score,
            })
            .collect())
    }
}
