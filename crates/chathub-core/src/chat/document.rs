//! Document classification and size helpers for imports.

use std::path::Path;

/// Largest document accepted for import (4 MB).
pub const MAX_DOCUMENT_SIZE_BYTES: usize = 4_000_000;

/// How an uploaded document's text is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    /// Decoded directly as UTF-8.
    Text,
    /// Run through the OCR engine. Carries the image MIME type.
    Image(&'static str),
    /// Not importable. Carries the lowercased extension.
    Unsupported(String),
}

/// Classify a document by its file extension.
pub fn classify(file_name: &str) -> DocumentKind {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "txt" | "md" | "markdown" | "csv" | "json" | "xml" | "yaml" | "yml" | "log" => {
            DocumentKind::Text
        }
        "png" => DocumentKind::Image("image/png"),
        "jpg" | "jpeg" => DocumentKind::Image("image/jpeg"),
        "tif" | "tiff" => DocumentKind::Image("image/tiff"),
        "bmp" => DocumentKind::Image("image/bmp"),
        "gif" => DocumentKind::Image("image/gif"),
        _ => DocumentKind::Unsupported(ext),
    }
}

/// Approximate token count: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// Human-readable size, e.g. `"1.5 KB"`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("notes.txt"), DocumentKind::Text);
        assert_eq!(classify("README.MD"), DocumentKind::Text);
        assert_eq!(classify("scan.PNG"), DocumentKind::Image("image/png"));
        assert_eq!(classify("photo.jpeg"), DocumentKind::Image("image/jpeg"));
        assert_eq!(
            classify("report.pdf"),
            DocumentKind::Unsupported("pdf".to_string())
        );
        assert_eq!(
            classify("no_extension"),
            DocumentKind::Unsupported(String::new())
        );
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
