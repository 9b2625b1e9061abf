//! LexGraph Parser - Statute source ingestion
//!
//! Reads statute text and metadata out of source files:
//! - PDF documents
//! - Markdown files
//! - Plain text files
//!
//! Each parser implements the [`SourceParser`] trait and produces a
//! [`SourceText`] that becomes a [`LegalDocument`] for extraction.

use std::path::{Path, PathBuf};

use lexgraph_core::LegalDocument;
use thiserror::Error;

pub mod pdf;

pub use pdf::{PdfInfo, PdfParser};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while reading a source file
#[derive(Error, Debug)]
pub enum ParserError {
    /// File format is not supported
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// IO error while reading the file
    #[error("IO error reading file: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// PDF parsing error
    #[error("PDF parsing error: {0}")]
    PdfError(String),

    /// File holds no extractable text
    #[error("No text could be extracted from {0}")]
    EmptyDocument(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

// ============================================================================
// Source Types
// ============================================================================

/// Supported source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    Markdown,
    PlainText,
    Unknown,
}

impl SourceFormat {
    /// Detect format from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "md" | "markdown" => Self::Markdown,
            "txt" => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    /// Detect format from path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Markdown => write!(f, "markdown"),
            Self::PlainText => write!(f, "text"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Metadata read alongside the text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub page_count: Option<u32>,
    /// File name without directories
    pub file_name: String,
}

/// Text of a statute source with its metadata
#[derive(Debug, Clone)]
pub struct SourceText {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub text: String,
    pub metadata: SourceMetadata,
}

impl SourceText {
    /// Title from metadata, else subject, else the file stem
    pub fn title(&self) -> String {
        non_blank(self.metadata.title.as_deref())
            .or_else(|| non_blank(self.metadata.subject.as_deref()))
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
    }

    /// Build the document handed to the extraction pipeline
    pub fn into_document(self, law_number: impl Into<String>) -> LegalDocument {
        let title = self.title();
        LegalDocument::new(title, law_number, self.text)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// Parser Trait
// ============================================================================

/// Trait for source parsers
pub trait SourceParser: Send + Sync {
    /// Read a source file
    fn parse(&self, path: &Path) -> Result<SourceText>;

    /// Formats this parser reads
    fn supported_formats(&self) -> &[SourceFormat];

    fn can_parse(&self, format: SourceFormat) -> bool {
        self.supported_formats().contains(&format)
    }
}

/// Plain text and Markdown parser
pub struct PlainTextParser;

impl SourceParser for PlainTextParser {
    fn parse(&self, path: &Path) -> Result<SourceText> {
        let text = std::fs::read_to_string(path).map_err(|e| ParserError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let format = SourceFormat::from_path(path);
        let title = match format {
            SourceFormat::Markdown => text
                .lines()
                .find_map(|l| l.trim().strip_prefix("# "))
                .map(|t| t.trim().to_string()),
            _ => None,
        };

        Ok(SourceText {
            path: path.to_path_buf(),
            format,
            metadata: SourceMetadata {
                title,
                file_name: file_name(path),
                ..SourceMetadata::default()
            },
            text,
        })
    }

    fn supported_formats(&self) -> &[SourceFormat] {
        &[SourceFormat::PlainText, SourceFormat::Markdown]
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read a statute source, picking the parser by extension
pub fn load_source(path: impl AsRef<Path>) -> Result<SourceText> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path);

    let parsers: [&dyn SourceParser; 2] = [&PdfParser, &PlainTextParser];
    let parser = parsers
        .into_iter()
        .find(|p| p.can_parse(format))
        .ok_or_else(|| {
            ParserError::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("none")
                    .to_string(),
            )
        })?;

    let source = parser.parse(path)?;
    if source.text.trim().is_empty() {
        return Err(ParserError::EmptyDocument(path.display().to_string()));
    }
    Ok(source)
}

/// Supported source files in `dir`, sorted by path
///
/// A missing directory yields an empty list.
pub fn list_sources(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ParserError::IoError {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut sources: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && SourceFormat::from_path(p) != SourceFormat::Unknown)
        .collect();
    sources.sort();
    Ok(sources)
}

/// Page count of a source file; only PDFs have pages
pub fn page_count(path: impl AsRef<Path>) -> Option<u32> {
    let path = path.as_ref();
    match SourceFormat::from_path(path) {
        SourceFormat::Pdf => pdf::page_count(path).ok(),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
