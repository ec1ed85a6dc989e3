use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{multipart, Client};
use std::time::Duration;
use tracing::debug;

use crate::error::ServiceError;
use crate::language::TargetLanguage;
use crate::upload::SelectedFile;

/// Translated file returned by the service, kept in memory until downloaded.
#[derive(Debug, Clone)]
pub struct TranslatedDocument {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// The external backend that does the actual document translation.
#[async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate(
        &self,
        file: &SelectedFile,
        target_lang: TargetLanguage,
    ) -> Result<TranslatedDocument, ServiceError>;
}

/// HTTP client for `POST {base_url}/translate`
#[derive(Debug, Clone)]
pub struct TranslationServiceClient {
    client: Client,
    base_url: String,
}

impl TranslationServiceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn form(file: &SelectedFile, target_lang: TargetLanguage) -> Result<multipart::Form, ServiceError> {
        let part = multipart::Part::stream_with_length(file.bytes.clone(), file.size)
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|e| ServiceError::Payload(e.to_string()))?;

        Ok(multipart::Form::new()
            .part("file", part)
            .text("target_lang", target_lang.code()))
    }
}

#[async_trait]
impl TranslationService for TranslationServiceClient {
    async fn translate(
        &self,
        file: &SelectedFile,
        target_lang: TargetLanguage,
    ) -> Result<TranslatedDocument, ServiceError> {
        let url = format!("{}/translate", self.base_url);
        debug!(
            "Sending translate request: url={}, file={}, size={}, target_lang={}",
            url, file.name, file.size, target_lang
        );

        let form = Self::form(file, target_lang)?;
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ServiceError::EmptyBody);
        }

        debug!("Received translated file: {} bytes", bytes.len());
        Ok(TranslatedDocument {
            bytes,
            content_type,
            received_at: Utc::now(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::upload::DocumentFormat;
    use axum::extract::Multipart;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;

    pub(crate) fn sample_file(name: &str) -> SelectedFile {
        let format = DocumentFormat::from_file_name(name).unwrap_or(DocumentFormat::Pptx);
        let bytes = Bytes::from_static(b"original slides");
        SelectedFile {
            name: name.to_string(),
            size: bytes.len() as u64,
            mime: format.mime().to_string(),
            format,
            bytes,
        }
    }

    /// Starts a stand-in translation backend and returns its base URL.
    pub(crate) async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Echoes `<target_lang>|<file name>|<mime>|<bytes>` back to the caller.
    pub(crate) async fn echo_translate(mut multipart: Multipart) -> (StatusCode, Vec<u8>) {
        let mut lang = String::new();
        let mut meta = String::new();
        let mut data = Vec::new();
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("target_lang") => lang = field.text().await.unwrap_or_default(),
                Some("file") => {
                    meta = format!(
                        "{}|{}",
                        field.file_name().unwrap_or_default(),
                        field.content_type().unwrap_or_default()
                    );
                    data = field.bytes().await.unwrap_or_default().to_vec();
                }
                _ => {}
            }
        }
        let mut body = format!("{}|{}|", lang, meta).into_bytes();
        body.extend(data);
        (StatusCode::OK, body)
    }

    fn client(base_url: &str) -> TranslationServiceClient {
        TranslationServiceClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn trims_trailing_slash() {
        let client = client("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn sends_file_and_target_lang() {
        let url = spawn_backend(Router::new().route("/translate", post(echo_translate))).await;
        let doc = client(&url)
            .translate(&sample_file("deck.pptx"), TargetLanguage::Hindi)
            .await
            .unwrap();
        let body = String::from_utf8(doc.bytes.to_vec()).unwrap();
        assert_eq!(
            body,
            format!("hi|deck.pptx|{}|original slides", DocumentFormat::Pptx.mime())
        );
    }

    #[tokio::test]
    async fn server_error_is_status_error() {
        let router = Router::new().route(
            "/translate",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let url = spawn_backend(router).await;
        let err = client(&url)
            .translate(&sample_file("deck.pptx"), TargetLanguage::Odia)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Status(500)));
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let router = Router::new().route("/translate", post(|| async { StatusCode::OK }));
        let url = spawn_backend(router).await;
        let err = client(&url)
            .translate(&sample_file("deck.pptx"), TargetLanguage::Odia)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::EmptyBody));
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = client(&format!("http://{}", addr))
            .translate(&sample_file("deck.pptx"), TargetLanguage::Odia)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)));
    }
}
