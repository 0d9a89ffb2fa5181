//! HTTP handlers for the upload form and the upload endpoint.
//! File bodies are streamed straight to disk; naming and writing are
//! delegated to `StorageService`.

use crate::{
    errors::AppError,
    models::stored_file::StoredFile,
    services::storage_service::{StorageError, StorageService},
};
use axum::{
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    response::Html,
};
use futures::StreamExt;
use std::io;
use tracing::info;

/// Multipart field that carries the upload.
pub const FILE_FIELD: &str = "file";

pub const NO_FILE_MESSAGE: &str = "No file uploaded.";

const FORM_PAGE: &str = include_str!("../../static/index.html");
const SUCCESS_TEMPLATE: &str = include_str!("../../static/upload_success.html");

/// `GET /`: the upload form. Always the same document.
pub async fn index_page() -> Html<&'static str> {
    Html(FORM_PAGE)
}

/// `POST /upload`: accept exactly one file under the `file` field.
///
/// Text fields are ignored, as are file parts with an empty filename (what a
/// browser sends when nothing was picked). A file part under any other name,
/// or a second `file` part, rejects the whole request and removes the file
/// already written for it. So does a body that breaks off or fails to parse,
/// including in the middle of the file part.
pub async fn upload_file(
    State(service): State<StorageService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, AppError> {
    // A body that is not multipart at all has no file in it either.
    let Ok(mut multipart) = multipart else {
        return Err(AppError::bad_request(NO_FILE_MESSAGE));
    };

    let mut stored: Option<StoredFile> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                discard(&service, stored).await;
                return Err(AppError::new(err.status(), err.body_text()));
            }
        };

        let original_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name != FILE_FIELD || stored.is_some() {
            discard(&service, stored).await;
            return Err(AppError::bad_request(format!(
                "Unexpected field: {}",
                field_name
            )));
        }

        let content_type = field.content_type().map(str::to_string);
        let stream = field.map(|chunk| chunk.map_err(io::Error::other));
        let file = match service
            .store_stream(&field_name, &original_name, content_type, stream)
            .await
        {
            Ok(file) => file,
            Err(StorageError::Source { path, source }) => {
                service.remove(&path).await;
                return Err(body_error(&source));
            }
            Err(err) => return Err(err.into()),
        };
        stored = Some(file);
    }

    let Some(file) = stored else {
        return Err(AppError::bad_request(NO_FILE_MESSAGE));
    };

    info!(
        field = %file.field_name,
        generated = %file.generated_name,
        original = %file.original_name,
        content_type = ?file.content_type,
        size_bytes = file.size_bytes,
        "stored upload"
    );

    Ok(Html(success_page(&file.original_name)))
}

async fn discard(service: &StorageService, stored: Option<StoredFile>) {
    if let Some(file) = stored {
        service.remove(&file.path).await;
    }
}

/// Client-facing error for a file part whose body could not be read.
fn body_error(source: &io::Error) -> AppError {
    match source
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<MultipartError>())
    {
        Some(err) => AppError::new(err.status(), err.body_text()),
        None => AppError::bad_request(source.to_string()),
    }
}

fn success_page(original_name: &str) -> String {
    SUCCESS_TEMPLATE.replace("{{filename}}", &html_escape(original_name))
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_page_names_the_file_and_links_home() {
        let page = success_page("report.pdf");

        assert!(page.contains("<strong>report.pdf</strong>"));
        assert!(page.contains(r#"href="/""#));
        assert!(!page.contains("{{filename}}"));
    }

    #[test]
    fn markup_in_filenames_is_escaped() {
        let page = success_page(r#"<script>alert("x")</script>.html"#);

        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;.html"));
    }

    #[test]
    fn unreadable_body_without_parser_error_is_a_bad_request() {
        let err = body_error(&io::Error::new(io::ErrorKind::UnexpectedEof, "body ended early"));

        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "body ended early");
    }

    #[test]
    fn form_posts_multipart_to_upload() {
        assert!(FORM_PAGE.contains(r#"action="/upload""#));
        assert!(FORM_PAGE.contains(r#"enctype="multipart/form-data""#));
        assert!(FORM_PAGE.contains(r#"name="file""#));
    }
}
