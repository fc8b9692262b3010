//! Multi-format text extraction behind a format registry
//!
//! Each supported format maps to a `TextExtractor` strategy; adding a format
//! means registering a new strategy, the chunker is untouched.

use std::collections::HashMap;
use std::path::Path;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::error::{Error, Result};
use crate::types::SourceFormat;

/// Strategy for turning one document format into plain text
pub trait TextExtractor: Send + Sync {
    /// The format this extractor handles
    fn format(&self) -> SourceFormat;

    /// Extract raw text from the file at `path`
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Plain text files are read as-is
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Txt
    }

    fn extract(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path)
            .map_err(|e| Error::extraction(path.to_string_lossy(), e.to_string()))
    }
}

/// PDF extraction via pdf-extract
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Pdf
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let text = pdf_extract::extract_text(path)
            .map_err(|e| Error::extraction(path.to_string_lossy(), e.to_string()))?;
        // Strip nulls and collapse the per-line whitespace pdf-extract leaves behind
        let cleaned = text
            .replace('\0', "")
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(cleaned)
    }
}

/// Word (.docx) extraction via docx-rs, paragraph runs joined by newlines
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Docx
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let data = std::fs::read(path)
            .map_err(|e| Error::extraction(path.to_string_lossy(), e.to_string()))?;
        let doc = docx_rs::read_docx(&data)
            .map_err(|e| Error::extraction(path.to_string_lossy(), e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }
        Ok(content)
    }
}

/// Markdown rendered to plain text with markup stripped
pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Markdown
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::extraction(path.to_string_lossy(), e.to_string()))?;
        Ok(markdown_to_text(&source))
    }
}

/// Strip Markdown markup, keeping text and code content with paragraph breaks
pub fn markdown_to_text(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::empty());
    let mut text = String::new();

    for event in parser {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::CodeBlock) => {
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push('\n');
            }
            Event::Start(Tag::Item) => {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            _ => {}
        }
    }

    text.trim_end().to_string()
}

/// Registry mapping each supported format to its extraction strategy
pub struct ExtractorRegistry {
    extractors: HashMap<SourceFormat, Box<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    /// Registry with the four built-in formats: txt, pdf, docx, md
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            extractors: HashMap::new(),
        };
        registry.register(Box::new(PlainTextExtractor));
        registry.register(Box::new(PdfExtractor));
        registry.register(Box::new(DocxExtractor));
        registry.register(Box::new(MarkdownExtractor));
        registry
    }

    /// Register an extractor, replacing any previous one for the same format
    pub fn register(&mut self, extractor: Box<dyn TextExtractor>) {
        self.extractors.insert(extractor.format(), extractor);
    }

    /// Whether the registry can handle this format
    pub fn supports(&self, format: SourceFormat) -> bool {
        self.extractors.contains_key(&format)
    }

    /// Extract text from a file, dispatching on its declared extension.
    ///
    /// Returns `UnsupportedFormat` for extensions outside the registry and
    /// `Extraction` for read/parse failures; callers on the batch path treat
    /// both as recoverable.
    pub fn extract_path(&self, path: &Path) -> Result<(SourceFormat, String)> {
        let format = SourceFormat::from_path(path).ok_or_else(|| {
            Error::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("<none>")
                    .to_string(),
            )
        })?;

        let extractor = self
            .extractors
            .get(&format)
            .ok_or_else(|| Error::UnsupportedFormat(format.display_name().to_string()))?;

        let text = extractor.extract(path)?;
        Ok((format, text))
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn markdown_markup_is_stripped() {
        let md = "# Title\n\nSome **bold** and *italic* text with `code`.\n\n- item one\n- item two\n";
        let text = markdown_to_text(md);
        assert!(text.contains("Title"));
        assert!(text.contains("Some bold and italic text with code."));
        assert!(text.contains("item one"));
        assert!(!text.contains('#'));
        assert!(!text.contains('*'));
        assert!(!text.contains('`'));
    }

    #[test]
    fn plain_text_round_trips() {
        let mut file = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        write!(file, "hello extraction").unwrap();
        let registry = ExtractorRegistry::with_defaults();
        let (format, text) = registry.extract_path(file.path()).unwrap();
        assert_eq!(format, SourceFormat::Txt);
        assert_eq!(text, "hello extraction");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let registry = ExtractorRegistry::with_defaults();
        let err = registry
            .extract_path(Path::new("/tmp/spreadsheet.xlsx"))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_file_is_an_extraction_error() {
        let registry = ExtractorRegistry::with_defaults();
        let err = registry
            .extract_path(Path::new("/nonexistent/notes.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn registry_reports_supported_formats() {
        let registry = ExtractorRegistry::with_defaults();
        assert!(registry.supports(SourceFormat::Txt));
        assert!(registry.supports(SourceFormat::Pdf));
        assert!(registry.supports(SourceFormat::Docx));
        assert!(registry.supports(SourceFormat::Markdown));
    }
}
