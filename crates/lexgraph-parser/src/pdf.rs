//! PDF statute parser using pdf-extract
//!
//! Extracts text from every page and joins non-empty pages with blank
//! lines. Title, author, subject and page count come from the document
//! information dictionary, read with lopdf.

use std::path::Path;

use lopdf::{Dictionary, Document, Object};

use crate::{file_name, ParserError, Result, SourceFormat, SourceMetadata, SourceParser, SourceText};

/// Longest first line still taken as a title
const MAX_TITLE_CHARS: usize = 100;

/// PDF statute parser
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfParser;

/// Fields of the PDF information dictionary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub page_count: u32,
}

/// Read the information dictionary and page tree of a PDF
pub fn read_info(bytes: &[u8]) -> Result<PdfInfo> {
    let doc = Document::load_mem(bytes).map_err(|e| ParserError::PdfError(e.to_string()))?;

    let page_count = u32::try_from(doc.get_pages().len()).unwrap_or(u32::MAX);
    let Some(info) = info_dictionary(&doc) else {
        return Ok(PdfInfo {
            page_count,
            ..PdfInfo::default()
        });
    };

    Ok(PdfInfo {
        title: text_entry(info, b"Title"),
        author: text_entry(info, b"Author"),
        subject: text_entry(info, b"Subject"),
        page_count,
    })
}

/// Page count of the PDF at `path`
pub fn page_count(path: &Path) -> Result<u32> {
    read_info(&read_bytes(path)?).map(|info| info.page_count)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| ParserError::IoError {
        path: path.display().to_string(),
        source: e,
    })
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        direct => direct,
    };
    info.as_dict().ok()
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => {
            let text = decode_pdf_string(bytes);
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, else UTF-8, else Latin-1
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Split on form feeds, drop blank pages, join with blank lines
fn join_pages(raw: &str) -> (String, Option<u32>) {
    let pages: Vec<&str> = raw.split('\x0C').collect();
    let page_count = u32::try_from(pages.len()).ok();

    let text = pages
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    (text, page_count)
}

/// First short line that is not an article heading
fn guess_title(text: &str) -> Option<String> {
    let first = text.lines().map(str::trim).find(|l| !l.is_empty())?;

    let is_article = first
        .strip_prefix('제')
        .and_then(|rest| rest.trim_start().chars().next())
        .is_some_and(|c| c.is_ascii_digit());

    if is_article || first.chars().count() > MAX_TITLE_CHARS {
        None
    } else {
        Some(first.to_string())
    }
}

impl SourceParser for PdfParser {
    fn parse(&self, path: &Path) -> Result<SourceText> {
        let bytes = read_bytes(path)?;

        let raw = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| ParserError::PdfError(e.to_string()))?;
        let (text, estimated_pages) = join_pages(&raw);

        let info = read_info(&bytes).unwrap_or_else(|e| {
            tracing::debug!(path = %path.display(), "PDF info unavailable: {e}");
            PdfInfo::default()
        });

        let metadata = SourceMetadata {
            title: info.title.or_else(|| guess_title(&text)),
            author: info.author,
            subject: info.subject,
            page_count: (info.page_count > 0)
                .then_some(info.page_count)
                .or(estimated_pages),
            file_name: file_name(path),
        };

        Ok(SourceText {
            path: path.to_path_buf(),
            format: SourceFormat::Pdf,
            text,
            metadata,
        })
    }

    fn supported_formats(&self) -> &[SourceFormat] {
        &[SourceFormat::Pdf]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_join_pages() {
        let (text, pages) = join_pages("개인정보 보호법\n\x0C\n  \x0C제1조(목적) ...\n");

        assert_eq!(pages, Some(3));
        assert_eq!(text, "개인정보 보호법\n\n제1조(목적) ...");
    }

    #[test]
    fn test_single_page() {
        let (text, pages) = join_pages("제1조(목적)");
        assert_eq!(pages, Some(1));
        assert_eq!(text, "제1조(목적)");
    }

    #[test]
    fn test_guess_title() {
        assert_eq!(
            guess_title("\n  개인정보 보호법\n제1조(목적)"),
            Some("개인정보 보호법".to_string())
        );
        assert_eq!(guess_title("제1조(목적) 이 법은 ..."), None);
        assert_eq!(guess_title("제 12 조"), None);
        assert_eq!(guess_title(""), None);
        assert_eq!(guess_title(&"가".repeat(101)), None);
    }

    #[test]
    fn test_supported_formats() {
        assert!(PdfParser.can_parse(SourceFormat::Pdf));
        assert!(!PdfParser.can_parse(SourceFormat::Markdown));
    }

    /// Minimal PDF with `pages` empty pages and the given info entries
    fn sample_pdf(pages: usize, info: Option<Dictionary>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                doc.add_object(lopdf::dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(lopdf::dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(lopdf::dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        if let Some(info) = info {
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_read_info_dictionary() {
        let bytes = sample_pdf(
            3,
            Some(lopdf::dictionary! {
                "Title" => Object::string_literal("개인정보 보호법"),
                "Author" => Object::string_literal("법제처"),
                "Subject" => Object::string_literal("  "),
            }),
        );

        let info = read_info(&bytes).unwrap();

        assert_eq!(info.page_count, 3);
        assert_eq!(info.title.as_deref(), Some("개인정보 보호법"));
        assert_eq!(info.author.as_deref(), Some("법제처"));
        assert_eq!(info.subject, None);
    }

    #[test]
    fn test_read_info_without_dictionary() {
        let info = read_info(&sample_pdf(2, None)).unwrap();
        assert_eq!(
            info,
            PdfInfo {
                page_count: 2,
                ..PdfInfo::default()
            }
        );
    }

    #[test]
    fn test_page_count_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("law.pdf");
        std::fs::write(&path, sample_pdf(4, None)).unwrap();

        assert_eq!(page_count(&path).unwrap(), 4);
    }

    #[test]
    fn test_read_info_rejects_garbage() {
        assert!(matches!(read_info(b"not a pdf"), Err(ParserError::PdfError(_))));
    }

    #[test]
    fn test_decode_pdf_string() {
        let utf16: Vec<u8> = [0xFE, 0xFF]
            .into_iter()
            .chain("근로기준법".encode_utf16().flat_map(u16::to_be_bytes))
            .collect();
        assert_eq!(decode_pdf_string(&utf16), "근로기준법");
        assert_eq!(decode_pdf_string("법률".as_bytes()), "법률");
        assert_eq!(decode_pdf_string(&[0x43, 0xE9]), "Cé");
    }

    #[test]
    fn test_missing_pdf() {
        let result = PdfParser.parse(Path::new("/nonexistent/law.pdf"));
        assert!(matches!(result, Err(ParserError::IoError { .. })));
    }
}
