use axum::body::Bytes;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::UploadRejection;

/// Formats the widget lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pptx,
    Docx,
    Pdf,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 3] =
        [DocumentFormat::Pptx, DocumentFormat::Docx, DocumentFormat::Pdf];

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pptx => ".pptx",
            DocumentFormat::Docx => ".docx",
            DocumentFormat::Pdf => ".pdf",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            DocumentFormat::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::Pdf => "application/pdf",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| lower.ends_with(format.extension()))
    }

    /// Value for the file input's `accept` attribute.
    pub fn accept_attribute() -> String {
        Self::ALL
            .iter()
            .flat_map(|f| [f.extension(), f.mime()])
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A file as it arrives from a drop or picker event, before filtering.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// The file the controller holds for a translation attempt.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub format: DocumentFormat,
    pub bytes: Bytes,
}

impl SelectedFile {
    /// Size in megabytes with two decimals, e.g. `1.50 MB`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size as f64 / 1024.0 / 1024.0)
    }
}

/// Drop zone / file picker. Accepts at most one file from the allow-list.
#[derive(Debug, Default, Clone, Copy)]
pub struct UploadWidget;

impl UploadWidget {
    /// Filter one drop or selection event.
    ///
    /// `Ok(None)` means the event carried no file and nothing should change.
    /// A rejection is returned to the caller; the controller's selection is
    /// never touched by it.
    pub fn accept(
        &self,
        mut files: Vec<IncomingFile>,
    ) -> Result<Option<SelectedFile>, UploadRejection> {
        if files.is_empty() {
            return Ok(None);
        }
        if files.len() > 1 {
            warn!("Rejected drop with {} files", files.len());
            return Err(UploadRejection::TooManyFiles);
        }

        let file = files.remove(0);
        let format = DocumentFormat::from_file_name(&file.name).ok_or_else(|| {
            warn!("Rejected unsupported file: {}", file.name);
            UploadRejection::UnsupportedType(file.name.clone())
        })?;

        let mime = match file.content_type.as_deref().map(str::trim) {
            None | Some("") | Some("application/octet-stream") => format.mime().to_string(),
            Some(mime) if mime.eq_ignore_ascii_case(format.mime()) => format.mime().to_string(),
            Some(mime) => {
                warn!("Rejected {} with mismatched type {}", file.name, mime);
                return Err(UploadRejection::MimeMismatch {
                    name: file.name,
                    mime: mime.to_string(),
                });
            }
        };

        debug!("Accepted {} ({} bytes, {})", file.name, file.bytes.len(), mime);
        Ok(Some(SelectedFile {
            size: file.bytes.len() as u64,
            name: file.name,
            mime,
            format,
            bytes: file.bytes,
        }))
    }

    /// What the drop zone shows for the given selection, error and notice.
    pub fn view(
        &self,
        selected: Option<&SelectedFile>,
        error: Option<&str>,
        notice: Option<&str>,
    ) -> UploadView {
        let content = match selected {
            Some(file) => UploadContent::Selected {
                name: file.name.clone(),
                size_label: file.size_label(),
                status: "Ready to translate",
            },
            None => UploadContent::Prompt {
                headline: "Drag & drop PPTX, DOCX, or PDF",
                hint: "or click to browse",
            },
        };
        UploadView {
            content,
            error: error.map(str::to_string),
            notice: notice.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadContent {
    Selected {
        name: String,
        size_label: String,
        status: &'static str,
    },
    Prompt {
        headline: &'static str,
        hint: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadView {
    pub content: UploadContent,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incoming(name: &str, content_type: Option<&str>) -> IncomingFile {
        IncomingFile {
            name: name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: Bytes::from_static(b"PK\x03\x04 fake"),
        }
    }

    #[test]
    fn accepts_allowed_extensions() {
        let widget = UploadWidget;
        let pptx = widget
            .accept(vec![incoming("Deck.PPTX", None)])
            .unwrap()
            .unwrap();
        assert_eq!(pptx.format, DocumentFormat::Pptx);
        assert_eq!(pptx.mime, DocumentFormat::Pptx.mime());
        assert_eq!(pptx.size, 9);

        let pdf = widget
            .accept(vec![incoming("report.pdf", Some("application/pdf"))])
            .unwrap()
            .unwrap();
        assert_eq!(pdf.format, DocumentFormat::Pdf);
    }

    #[test]
    fn generic_mime_falls_back_to_extension() {
        let file = UploadWidget
            .accept(vec![incoming("notes.docx", Some("application/octet-stream"))])
            .unwrap()
            .unwrap();
        assert_eq!(file.mime, DocumentFormat::Docx.mime());
    }

    #[test]
    fn empty_event_is_noop() {
        assert!(UploadWidget.accept(Vec::new()).unwrap().is_none());
    }

    #[test]
    fn rejects_disallowed_files() {
        let widget = UploadWidget;
        assert_eq!(
            widget.accept(vec![incoming("photo.png", None)]).unwrap_err(),
            UploadRejection::UnsupportedType("photo.png".into())
        );
        assert_eq!(
            widget
                .accept(vec![incoming("a.pptx", None), incoming("b.pptx", None)])
                .unwrap_err(),
            UploadRejection::TooManyFiles
        );
        assert!(matches!(
            widget.accept(vec![incoming("fake.pdf", Some("image/png"))]),
            Err(UploadRejection::MimeMismatch { .. })
        ));
    }

    #[test]
    fn view_shows_selection_or_prompt() {
        let widget = UploadWidget;
        let idle = widget.view(None, Some("boom"), None);
        assert!(matches!(idle.content, UploadContent::Prompt { .. }));
        assert_eq!(idle.error.as_deref(), Some("boom"));

        let file = SelectedFile {
            name: "deck.pptx".into(),
            size: 1_572_864,
            mime: DocumentFormat::Pptx.mime().into(),
            format: DocumentFormat::Pptx,
            bytes: Bytes::new(),
        };
        let view = widget.view(Some(&file), None, None);
        assert_eq!(
            view.content,
            UploadContent::Selected {
                name: "deck.pptx".into(),
                size_label: "1.50 MB".into(),
                status: "Ready to translate",
            }
        );
    }

    #[test]
    fn accept_attribute_lists_extensions_and_mimes() {
        let accept = DocumentFormat::accept_attribute();
        assert!(accept.contains(".pptx"));
        assert!(accept.contains("application/pdf"));
    }
}
