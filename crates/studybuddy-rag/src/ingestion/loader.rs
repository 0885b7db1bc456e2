//! Document loaders keyed by file extension

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::{extension_of, normalize_extension};
use crate::error::{Error, Result};

/// Text of one page (or the whole file for flat formats)
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// 1-based page number for page-oriented formats
    pub page_number: Option<u32>,
    /// Extracted text
    pub text: String,
}

/// Everything a loader extracted from one file
#[derive(Debug, Clone, Default)]
pub struct LoadedText {
    /// Pages in document order
    pub pages: Vec<PageText>,
    /// Total pages for page-oriented formats
    pub page_count: Option<u32>,
}

impl LoadedText {
    /// A flat document with a single unnumbered page
    pub fn flat(text: String) -> Self {
        Self {
            pages: vec![PageText {
                page_number: None,
                text,
            }],
            page_count: None,
        }
    }

    /// Whether no page carries any non-whitespace text
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }

    /// All page texts joined, used for content hashing
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Extracts text from one file format
pub trait DocumentLoader: Send + Sync {
    /// Read and extract the file at `path`
    fn load(&self, path: &Path) -> Result<LoadedText>;

    /// Loader name for logging
    fn name(&self) -> &str;
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// UTF-8 plain text and markdown
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<LoadedText> {
        let bytes = std::fs::read(path).map_err(|e| Error::ingestion(file_label(path), e.to_string()))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| Error::ingestion(file_label(path), "file is not valid UTF-8"))?;
        Ok(LoadedText::flat(text))
    }

    fn name(&self) -> &str {
        "text"
    }
}

/// PDF loader producing one text per page
#[cfg(feature = "pdf")]
pub struct PdfLoader;

#[cfg(feature = "pdf")]
impl PdfLoader {
    /// Per-page extraction through lopdf
    fn extract_pages(data: &[u8]) -> std::result::Result<Vec<PageText>, String> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| format!("Failed to load PDF: {}", e))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            let text = match doc.extract_text(&[*page_number]) {
                Ok(text) => cleanup_pdf_text(&text),
                Err(e) => {
                    tracing::debug!("Could not extract text from page {}: {}", page_number, e);
                    String::new()
                }
            };
            pages.push(PageText {
                page_number: Some(*page_number),
                text,
            });
        }
        Ok(pages)
    }

    /// Whole-document extraction through pdf-extract; it panics on some fonts
    fn extract_whole(data: &[u8]) -> std::result::Result<String, String> {
        match contain_panic(|| pdf_extract::extract_text_from_mem(data))? {
            Ok(text) => Ok(cleanup_pdf_text(&text)),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Run a parser call, turning a panic into an error message
///
/// Relies on the unwinding panic strategy, which every profile in this
/// workspace keeps.
#[cfg(feature = "pdf")]
fn contain_panic<T>(f: impl FnOnce() -> T + std::panic::UnwindSafe) -> std::result::Result<T, String> {
    std::panic::catch_unwind(f).map_err(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown cause".to_string());
        format!("PDF parser panicked: {}", detail)
    })
}

#[cfg(feature = "pdf")]
impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> Result<LoadedText> {
        let label = file_label(path);
        let data = std::fs::read(path).map_err(|e| Error::ingestion(&label, e.to_string()))?;

        match Self::extract_pages(&data) {
            Ok(pages) if pages.iter().any(|p| !p.text.trim().is_empty()) => {
                let page_count = Some(pages.len() as u32);
                return Ok(LoadedText { pages, page_count });
            }
            Ok(_) => tracing::warn!("{}: per-page extraction found no text, trying fallback", label),
            Err(e) => tracing::warn!("{}: {}, trying fallback", label, e),
        }

        let text = Self::extract_whole(&data).map_err(|e| Error::ingestion(&label, e))?;
        Ok(LoadedText::flat(text))
    }

    fn name(&self) -> &str {
        "pdf"
    }
}

/// Normalize extracted PDF text: ligatures, odd spaces, NULs and blank lines
#[cfg(feature = "pdf")]
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lookup table from lowercase extension to loader
#[derive(Clone, Default)]
pub struct LoaderRegistry {
    loaders: HashMap<String, Arc<dyn DocumentLoader>>,
}

impl LoaderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in loaders for every extension in `extensions`
    /// that one of them understands
    pub fn with_defaults(extensions: &[String]) -> Self {
        let mut registry = Self::new();
        let text: Arc<dyn DocumentLoader> = Arc::new(TextLoader);
        #[cfg(feature = "pdf")]
        let pdf: Arc<dyn DocumentLoader> = Arc::new(PdfLoader);

        for ext in extensions.iter().map(|e| normalize_extension(e)) {
            match ext.as_str() {
                "txt" | "md" => registry.register(&ext, text.clone()),
                #[cfg(feature = "pdf")]
                "pdf" => registry.register(&ext, pdf.clone()),
                other => tracing::warn!("No loader available for configured extension '.{}'", other),
            }
        }
        registry
    }

    /// Map an extension (with or without the dot) to a loader
    pub fn register(&mut self, extension: &str, loader: Arc<dyn DocumentLoader>) {
        self.loaders.insert(normalize_extension(extension), loader);
    }

    /// Whether a loader exists for the file's extension
    pub fn supports(&self, path: &Path) -> bool {
        self.loader_for(path).is_some()
    }

    fn loader_for(&self, path: &Path) -> Option<&Arc<dyn DocumentLoader>> {
        extension_of(path).and_then(|ext| self.loaders.get(&ext))
    }

    /// Load a file with the loader registered for its extension
    pub fn load(&self, path: &Path) -> Result<LoadedText> {
        let loader = self.loader_for(path).ok_or_else(|| {
            Error::UnsupportedFileType(
                extension_of(path)
                    .map(|e| format!(".{}", e))
                    .unwrap_or_else(|| file_label(path)),
            )
        })?;
        tracing::debug!("Loading {} with the {} loader", path.display(), loader.name());
        loader.load(path)
    }
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use tempfile::tempdir;

    fn defaults() -> LoaderRegistry {
        LoaderRegistry::with_defaults(&[".pdf".to_string(), ".txt".to_string(), ".md".to_string()])
    }

    #[test]
    fn test_text_loader_flat() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Cells\n\nThe cell is the unit of life.").unwrap();

        let loaded = defaults().load(&path).unwrap();
        assert_eq!(loaded.pages.len(), 1);
        assert_eq!(loaded.pages[0].page_number, None);
        assert!(loaded.pages[0].text.contains("unit of life"));
        assert_eq!(loaded.page_count, None);
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("NOTES.TXT");
        std::fs::write(&path, "hello").unwrap();
        assert!(defaults().supports(&path));
        assert!(defaults().load(&path).is_ok());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grades.csv");
        std::fs::write(&path, "a,b").unwrap();

        assert!(!defaults().supports(&path));
        assert!(matches!(defaults().load(&path), Err(Error::UnsupportedFileType(_))));
    }

    #[test]
    fn test_invalid_utf8_is_ingestion_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();

        assert!(matches!(defaults().load(&path), Err(Error::Ingestion { .. })));
    }

    #[test]
    fn test_restricted_extension_set() {
        let registry = LoaderRegistry::with_defaults(&["txt".to_string()]);
        assert!(registry.supports(Path::new("a.txt")));
        assert!(!registry.supports(Path::new("a.md")));
    }

    #[test]
    fn test_blank_detection() {
        assert!(LoadedText::flat("  \n\t".to_string()).is_blank());
        assert!(!LoadedText::flat("x".to_string()).is_blank());
    }

    /// Two-page PDF with one line of Courier text per page
    #[cfg(feature = "pdf")]
    pub(crate) fn two_page_pdf(first: &str, second: &str) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in [first, second] {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 2,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_pdf_text_is_extracted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lecture.pdf");
        std::fs::write(&path, two_page_pdf("Photosynthesis", "Respiration")).unwrap();

        let loaded = defaults().load(&path).unwrap();
        assert!(!loaded.is_blank());
        let text = loaded.full_text();
        assert!(text.contains("Photosynthesis"));
        assert!(text.contains("Respiration"));

        if let Some(count) = loaded.page_count {
            assert_eq!(count, 2);
            let numbers: Vec<_> = loaded.pages.iter().map(|p| p.page_number).collect();
            assert_eq!(numbers, vec![Some(1), Some(2)]);
        }
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_parser_panic_becomes_error() {
        let result: std::result::Result<String, String> = contain_panic(|| panic!("unsupported font"));
        assert_eq!(result.unwrap_err(), "PDF parser panicked: unsupported font");

        assert_eq!(contain_panic(|| 7), Ok(7));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_corrupt_pdf_is_ingestion_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        assert!(matches!(defaults().load(&path), Err(Error::Ingestion { .. })));
    }
}
