//! Document parser client: forwards uploaded files and returns extracted fields.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::resume::ExtractedResume;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Failed to parse {kind}: {message}")]
    Rejected { kind: &'static str, message: String },

    #[error("Parser service unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

/// Which upload a file is, and therefore where it goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Resume,
    LinkedInExport,
}

impl UploadKind {
    fn path(self) -> &'static str {
        match self {
            UploadKind::Resume => "/parse-resume",
            UploadKind::LinkedInExport => "/api/parse-linkedin",
        }
    }

    /// Multipart field name the parser expects.
    pub fn field(self) -> &'static str {
        match self {
            UploadKind::Resume => "resume",
            UploadKind::LinkedInExport => "linkedinExport",
        }
    }

    fn label(self) -> &'static str {
        match self {
            UploadKind::Resume => "resume",
            UploadKind::LinkedInExport => "LinkedIn export",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    extracted: Option<ExtractedResume>,
}

#[derive(Debug, Default, Deserialize)]
struct ParseErrorBody {
    error: Option<String>,
    message: Option<String>,
}

#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(
        &self,
        kind: UploadKind,
        file: UploadedFile,
    ) -> Result<ExtractedResume, ParserError>;
}

/// HTTP parser client. Résumé files and LinkedIn archives may be served by
/// different hosts.
#[derive(Clone)]
pub struct HttpDocumentParser {
    client: Client,
    resume_base_url: String,
    linkedin_base_url: String,
}

impl HttpDocumentParser {
    pub fn new(
        resume_base_url: impl Into<String>,
        linkedin_base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ParserError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            resume_base_url: resume_base_url.into().trim_end_matches('/').to_string(),
            linkedin_base_url: linkedin_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, kind: UploadKind) -> String {
        let base = match kind {
            UploadKind::Resume => &self.resume_base_url,
            UploadKind::LinkedInExport => &self.linkedin_base_url,
        };
        format!("{base}{}", kind.path())
    }
}

#[async_trait]
impl DocumentParser for HttpDocumentParser {
    async fn parse(
        &self,
        kind: UploadKind,
        file: UploadedFile,
    ) -> Result<ExtractedResume, ParserError> {
        let url = self.url(kind);
        debug!(
            "Uploading {} ({} bytes) to {url}",
            file.file_name,
            file.data.len()
        );

        let mut part = Part::bytes(file.data.to_vec()).file_name(file.file_name);
        if let Some(content_type) = file.content_type {
            part = part.mime_str(&content_type)?;
        }
        let form = Form::new().part(kind.field(), part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Parser returned {status}: {body}");
            return Err(rejection(kind, status.as_u16(), &body));
        }

        let body = response.text().await?;
        decode_extracted(kind, &body)
    }
}

/// A 200 whose body does not decode is the parser's fault, not a transport
/// failure.
fn decode_extracted(kind: UploadKind, body: &str) -> Result<ExtractedResume, ParserError> {
    let parsed: ParseResponse = serde_json::from_str(body).map_err(|e| {
        warn!("Undecodable parser response for {}: {e}", kind.label());
        ParserError::Rejected {
            kind: kind.label(),
            message: format!("unexpected response from parser ({e})"),
        }
    })?;
    Ok(parsed.extracted.unwrap_or_default())
}

fn rejection(kind: UploadKind, status: u16, body: &str) -> ParserError {
    let parsed: ParseErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error
        .or(parsed.message)
        .unwrap_or_else(|| format!("status {status}"));
    ParserError::Rejected {
        kind: kind.label(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_per_upload_kind() {
        let parser = HttpDocumentParser::new(
            "http://parser:8080/",
            "http://api:3001",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            parser.url(UploadKind::Resume),
            "http://parser:8080/parse-resume"
        );
        assert_eq!(
            parser.url(UploadKind::LinkedInExport),
            "http://api:3001/api/parse-linkedin"
        );
    }

    #[test]
    fn test_rejection_prefers_error_then_message() {
        let err = rejection(UploadKind::LinkedInExport, 400, r#"{"error":"Not a zip"}"#);
        assert_eq!(err.to_string(), "Failed to parse LinkedIn export: Not a zip");

        let err = rejection(UploadKind::Resume, 422, r#"{"message":"Unreadable PDF"}"#);
        assert_eq!(err.to_string(), "Failed to parse resume: Unreadable PDF");
    }

    #[test]
    fn test_rejection_with_unparseable_body() {
        let err = rejection(UploadKind::Resume, 500, "<html>oops</html>");
        assert_eq!(err.to_string(), "Failed to parse resume: status 500");
    }

    #[test]
    fn test_parse_response_without_extracted() {
        let extracted = decode_extracted(UploadKind::Resume, "{}").unwrap();
        assert!(extracted.full_name.is_none());
        assert!(extracted.education.is_none());
    }

    #[test]
    fn test_education_without_degree_still_imports() {
        let body = r#"{"extracted":{"fullName":"Ada","education":[{"institution":"MIT","startYear":"2010"}]}}"#;
        let extracted = decode_extracted(UploadKind::Resume, body).unwrap();
        assert_eq!(extracted.full_name.as_deref(), Some("Ada"));
        let education = extracted.education.unwrap();
        assert_eq!(education[0].school, "MIT");
        assert_eq!(education[0].degree, "");
        assert_eq!(education[0].start_year.as_deref(), Some("2010"));
    }

    #[test]
    fn test_projects_without_name_still_import() {
        let body = r#"{"extracted":{"projects":[{"description":"CLI tool"}]}}"#;
        let extracted = decode_extracted(UploadKind::LinkedInExport, body).unwrap();
        assert_eq!(extracted.projects.unwrap()[0].name, "");
    }

    #[test]
    fn test_undecodable_success_body_is_rejected() {
        let err = decode_extracted(UploadKind::Resume, "<html>ok</html>").unwrap_err();
        assert!(matches!(err, ParserError::Rejected { kind: "resume", .. }));
        assert!(err.to_string().starts_with("Failed to parse resume: unexpected response"));
    }
}
