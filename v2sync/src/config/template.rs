use crate::config::FileError;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The daemon's native config, treated as an untyped tree.
///
/// Object keys are kept sorted, so the same document always serializes to the
/// same bytes.
pub type ConfigDocument = serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

pub fn load_template(path: &Path) -> Result<ConfigDocument, FileError> {
    let name = path.to_string_lossy().to_string();
    let content = fs::read_to_string(path).map_err(|e| FileError::Io(name.clone(), e))?;
    match DocumentFormat::from_path(path) {
        DocumentFormat::Json => {
            serde_json::from_str(content.as_str()).map_err(|e| FileError::Json(name, e))
        }
        DocumentFormat::Yaml => {
            serde_yaml::from_str(content.as_str()).map_err(|e| FileError::Yaml(name, e))
        }
    }
}

/// Serialize for writing: JSON is pretty-printed with a 4-space indent.
pub fn render_document(
    document: &ConfigDocument,
    format: DocumentFormat,
) -> Result<Vec<u8>, FileError> {
    match format {
        DocumentFormat::Json => {
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            document
                .serialize(&mut serializer)
                .map_err(|e| FileError::Json("rendered config".to_string(), e))?;
            buf.push(b'\n');
            Ok(buf)
        }
        DocumentFormat::Yaml => serde_yaml::to_string(document)
            .map(String::into_bytes)
            .map_err(|e| FileError::Yaml("rendered config".to_string(), e)),
    }
}

/// Overwrite `path` with the rendered document.
pub fn persist_document(document: &ConfigDocument, path: &Path) -> Result<(), FileError> {
    let content = render_document(document, DocumentFormat::from_path(path))?;
    fs::write(path, content).map_err(|e| FileError::Io(path.to_string_lossy().to_string(), e))
}
