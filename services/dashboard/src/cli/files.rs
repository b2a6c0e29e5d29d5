use std::path::Path;

use bytes::Bytes;
use jaison_core::domain::DocumentFile;
use serde_json::Value;
use tracing::debug;

use crate::error::DashboardError;

/// Reads a local file for upload, sniffing its content type from the bytes and
/// falling back to the file extension.
pub async fn load_document(path: &Path) -> Result<DocumentFile, DashboardError> {
    let data = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    let content_type = detect_content_type(&filename, &data);
    debug!("Read {} ({} bytes, {})", filename, data.len(), content_type);

    Ok(DocumentFile {
        filename,
        content_type,
        bytes: Bytes::from(data),
    })
}

pub async fn load_schema(path: &Path) -> Result<Value, DashboardError> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

fn detect_content_type(filename: &str, data: &[u8]) -> String {
    infer::get(data)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| content_type_from_extension(filename).to_string())
}

fn content_type_from_extension(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[test]
    fn sniffs_the_bytes_before_the_extension() {
        assert_eq!(detect_content_type("scan.txt", PNG_HEADER), "image/png");
        assert_eq!(detect_content_type("invoice", b"%PDF-1.7\n%"), "application/pdf");
    }

    #[test]
    fn falls_back_to_the_extension() {
        assert_eq!(detect_content_type("notes.TXT", b"plain words"), "text/plain");
        assert_eq!(detect_content_type("photo.jpeg", b""), "image/jpeg");
        assert_eq!(detect_content_type("data.bin", b"??"), "application/octet-stream");
    }

    #[tokio::test]
    async fn loads_a_document_from_disk() {
        let path = std::env::temp_dir().join(format!("jaison-{}.pdf", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"%PDF-1.4 test").await.unwrap();

        let file = load_document(&path).await.unwrap();
        assert_eq!(file.content_type, "application/pdf");
        assert_eq!(file.size(), 13);
        assert!(file.filename.ends_with(".pdf"));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
