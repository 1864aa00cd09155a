use crate::error::UploadError;
use crate::session::ResumeFile;
use reqwest::header::{HeaderMap, SET_COOKIE};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Multipart part name the backend reads the resume from.
pub const FORM_FIELD: &str = "file";

const PDF: &str = "application/pdf";
const DOC: &str = "application/msword";
const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// What the backend handed back on a successful upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReceipt {
    /// `Cookie` header value built from the response's `Set-Cookie` headers.
    pub cookie: Option<String>,
}

/// The declared type wins; otherwise the type is inferred from the extension.
pub fn media_type_for(name: &str, declared: Option<&str>) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|value| !value.is_empty()) {
        return declared.to_ascii_lowercase();
    }

    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => PDF.to_string(),
        Some("doc") => DOC.to_string(),
        Some("docx") => DOCX.to_string(),
        _ => "application/octet-stream".to_string(),
    }
}

pub fn is_supported_media_type(media_type: &str) -> bool {
    media_type == PDF || media_type.contains("document")
}

/// Validates a dropped or picked file and captures what the UI shows about it.
pub fn accept_file(path: &Path, declared: Option<&str>) -> Result<ResumeFile, UploadError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = media_type_for(&name, declared);
    if !is_supported_media_type(&media_type) {
        return Err(UploadError::UnsupportedMediaType { name, media_type });
    }

    let metadata = fs::metadata(path).map_err(|source| UploadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ResumeFile {
        name,
        path: path.to_path_buf(),
        media_type,
        size_bytes: metadata.len(),
    })
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

/// Posts the resume as `multipart/form-data`. Attempted once; any non-2xx is a failure.
pub async fn upload(
    client: &reqwest::Client,
    url: &str,
    file: &ResumeFile,
) -> Result<UploadReceipt, UploadError> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|source| UploadError::Read {
            path: file.path.clone(),
            source,
        })?;
    debug!(name = %file.name, bytes = bytes.len(), "uploading resume");

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file.name.clone())
        .mime_str(&file.media_type)?;
    let form = reqwest::multipart::Form::new().part(FORM_FIELD, part);

    let response = client.post(url).multipart(form).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UploadError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let cookie = session_cookie(response.headers());
    info!(name = %file.name, %status, has_cookie = cookie.is_some(), "resume uploaded");
    Ok(UploadReceipt { cookie })
}
