use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};

use crate::config::ProgressConfig;
use crate::error::{UploadRejection, TRANSLATION_FAILED};
use crate::language::TargetLanguage;
use crate::service::{TranslatedDocument, TranslationService};
use crate::upload::{DocumentFormat, SelectedFile, UploadView, UploadWidget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Selected,
    Translating,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// No file selected, or an attempt is already running. No request was sent.
    Skipped,
    Completed,
    Failed,
    /// The selection changed or was reset while the request was outstanding.
    Discarded,
}

/// What the user saves when clicking download.
#[derive(Debug, Clone)]
pub struct DownloadArtifact {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size: u64,
    pub size_label: String,
    pub mime: String,
}

/// Observable controller state, used by the page renderer and `/state`.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerSnapshot {
    pub phase: Phase,
    pub file: Option<FileSummary>,
    pub target_lang: TargetLanguage,
    pub target_lang_label: &'static str,
    pub in_translation: bool,
    /// Simulated; advances on a timer, not with transfer progress.
    pub progress: u8,
    pub error: Option<String>,
    pub upload_notice: Option<String>,
    pub download_name: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub upload: UploadView,
}

#[derive(Default)]
struct ControllerState {
    selected_file: Option<SelectedFile>,
    target_lang: TargetLanguage,
    in_translation: bool,
    progress: u8,
    error: Option<String>,
    upload_notice: Option<String>,
    result: Option<TranslatedDocument>,
    // Bumped by select_file and reset; stale attempts compare against it.
    generation: u64,
    task: Option<AbortHandle>,
}

impl ControllerState {
    fn phase(&self) -> Phase {
        if self.in_translation {
            Phase::Translating
        } else if self.result.is_some() {
            Phase::Complete
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.selected_file.is_some() {
            Phase::Selected
        } else {
            Phase::Idle
        }
    }

    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.task.take() {
            handle.abort();
        }
        self.in_translation = false;
        self.generation += 1;
    }
}

struct Attempt {
    file: SelectedFile,
    target_lang: TargetLanguage,
    generation: u64,
}

/// Owns the translate workflow for one browser session.
pub struct TranslationController {
    service: Arc<dyn TranslationService>,
    progress: ProgressConfig,
    widget: UploadWidget,
    state: RwLock<ControllerState>,
}

impl TranslationController {
    pub fn new(service: Arc<dyn TranslationService>, progress: ProgressConfig) -> Self {
        Self {
            service,
            progress,
            widget: UploadWidget,
            state: RwLock::new(ControllerState::default()),
        }
    }

    pub fn widget(&self) -> &UploadWidget {
        &self.widget
    }

    /// Replace the selection and clear any previous error, result and progress.
    /// An outstanding attempt for the old file is aborted.
    pub async fn select_file(&self, file: SelectedFile) {
        let mut state = self.state.write().await;
        state.abort_in_flight();
        info!("Selected {} ({})", file.name, file.size_label());
        state.selected_file = Some(file);
        state.error = None;
        state.upload_notice = None;
        state.result = None;
        state.progress = 0;
    }

    /// Record a widget rejection. The current selection stays as it is.
    pub async fn note_rejection(&self, rejection: &UploadRejection) {
        let mut state = self.state.write().await;
        state.upload_notice = Some(rejection.to_string());
    }

    /// Returns false when the change was ignored because a translation is running.
    pub async fn set_target_language(&self, lang: TargetLanguage) -> bool {
        let mut state = self.state.write().await;
        if state.in_translation {
            debug!("Ignoring language change to {} while translating", lang);
            return false;
        }
        state.target_lang = lang;
        true
    }

    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.abort_in_flight();
        state.selected_file = None;
        state.result = None;
        state.error = None;
        state.upload_notice = None;
        state.progress = 0;
        debug!("Controller reset");
    }

    fn begin(&self, state: &mut ControllerState) -> Option<Attempt> {
        let file = match &state.selected_file {
            Some(file) if !state.in_translation => file.clone(),
            Some(_) => {
                debug!("Translation already in progress");
                return None;
            }
            None => {
                debug!("Translate requested without a selected file");
                return None;
            }
        };

        state.in_translation = true;
        state.error = None;
        state.result = None;
        state.progress = self.progress.start;
        Some(Attempt {
            file,
            target_lang: state.target_lang,
            generation: state.generation,
        })
    }

    /// Run one translation attempt to completion.
    pub async fn translate(&self) -> AttemptOutcome {
        let attempt = {
            let mut state = self.state.write().await;
            self.begin(&mut state)
        };
        match attempt {
            Some(attempt) => self.run(attempt).await,
            None => AttemptOutcome::Skipped,
        }
    }

    /// Start an attempt on a background task. Returns false if nothing was started.
    pub async fn spawn_translate(self: &Arc<Self>) -> bool {
        let mut state = self.state.write().await;
        let Some(attempt) = self.begin(&mut state) else {
            return false;
        };
        let controller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            controller.run(attempt).await;
        });
        state.task = Some(handle.abort_handle());
        true
    }

    async fn run(&self, attempt: Attempt) -> AttemptOutcome {
        info!(
            "Translating {} to {}",
            attempt.file.name,
            attempt.target_lang.label()
        );

        let period = Duration::from_millis(self.progress.interval_ms.max(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        let request = self.service.translate(&attempt.file, attempt.target_lang);
        tokio::pin!(request);

        let result = loop {
            tokio::select! {
                result = &mut request => break result,
                _ = ticker.tick() => self.advance_progress(attempt.generation).await,
            }
        };

        let mut state = self.state.write().await;
        if state.generation != attempt.generation {
            debug!("Discarding result for {}; selection changed", attempt.file.name);
            return AttemptOutcome::Discarded;
        }
        state.in_translation = false;
        state.task = None;

        match result {
            Ok(doc) => {
                info!("Translation of {} complete ({} bytes)", attempt.file.name, doc.bytes.len());
                state.progress = 100;
                state.result = Some(doc);
                AttemptOutcome::Completed
            }
            Err(e) => {
                error!("Translation of {} failed: {}", attempt.file.name, e);
                state.error = Some(TRANSLATION_FAILED.to_string());
                state.progress = 0;
                AttemptOutcome::Failed
            }
        }
    }

    async fn advance_progress(&self, generation: u64) {
        let mut state = self.state.write().await;
        if state.generation != generation || !state.in_translation {
            return;
        }
        let ceiling = self.progress.ceiling.min(99);
        if state.progress < ceiling {
            state.progress = state.progress.saturating_add(self.progress.step).min(ceiling);
        }
    }

    /// The translated file with its derived name, once an attempt completed.
    pub async fn download(&self) -> Option<DownloadArtifact> {
        let state = self.state.read().await;
        let (Some(file), Some(doc)) = (&state.selected_file, &state.result) else {
            warn!("Download requested without a completed translation");
            return None;
        };
        // PDFs come back as Word documents.
        let output_format = match file.format {
            DocumentFormat::Pptx => DocumentFormat::Pptx,
            DocumentFormat::Docx | DocumentFormat::Pdf => DocumentFormat::Docx,
        };
        Some(DownloadArtifact {
            filename: download_file_name(&file.name),
            content_type: doc
                .content_type
                .clone()
                .unwrap_or_else(|| output_format.mime().to_string()),
            bytes: doc.bytes.clone(),
        })
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        let state = self.state.read().await;
        let upload = self.widget.view(
            state.selected_file.as_ref(),
            state.error.as_deref(),
            state.upload_notice.as_deref(),
        );
        ControllerSnapshot {
            phase: state.phase(),
            file: state.selected_file.as_ref().map(|f| FileSummary {
                name: f.name.clone(),
                size: f.size,
                size_label: f.size_label(),
                mime: f.mime.clone(),
            }),
            target_lang: state.target_lang,
            target_lang_label: state.target_lang.label(),
            in_translation: state.in_translation,
            progress: state.progress,
            error: state.error.clone(),
            upload_notice: state.upload_notice.clone(),
            download_name: state
                .result
                .as_ref()
                .zip(state.selected_file.as_ref())
                .map(|(_, f)| download_file_name(&f.name)),
            completed_at: state.result.as_ref().map(|doc| doc.received_at),
            upload,
        }
    }

    /// Abort any outstanding attempt; used when the session is dropped.
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        state.abort_in_flight();
    }
}

/// `translated_<stem>.<ext>` where ext is `docx` for .docx/.pdf input, else `pptx`.
pub fn download_file_name(original: &str) -> String {
    let lower = original.to_lowercase();
    let extension = if lower.ends_with(".docx") || lower.ends_with(".pdf") {
        "docx"
    } else {
        "pptx"
    };
    let stem = match original.rfind('.') {
        Some(idx) => &original[..idx],
        None => original,
    };
    format!("translated_{}.{}", stem, extension)
}
