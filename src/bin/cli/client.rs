use std::path::{Path, PathBuf};

use bazaar::dto::{CreateListingDto, ListingDto, ListingStats, StatusDto};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;

/// Error type for CLI client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server returned an error status with a message body
    #[error("Server error ({}): {message}", .status.as_u16())]
    Server { status: reqwest::StatusCode, message: String },
    /// Network/connection/request error
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    /// A local image file could not be read
    #[error("Could not read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Turns an error body into one line
///
/// Understands `{"detail": "..."}` and field maps such as
/// `{"title": ["This field is required."]}`.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return format!("HTTP {}", status);
    };

    if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
        return detail.to_string();
    }

    match value.as_object() {
        Some(fields) if !fields.is_empty() => fields
            .iter()
            .map(|(field, messages)| {
                let text = match messages.as_array() {
                    Some(list) => list
                        .iter()
                        .filter_map(|m| m.as_str())
                        .collect::<Vec<_>>()
                        .join(" "),
                    None => messages.to_string(),
                };
                format!("{}: {}", field, text)
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => format!("HTTP {}", status),
    }
}

/// Extension trait for checking HTTP responses and extracting server error messages
trait ResponseExt {
    /// Checks for error status and extracts the server's error message body
    async fn check(self) -> Result<reqwest::Response, ClientError>;
}

impl ResponseExt for reqwest::Response {
    async fn check(self) -> Result<reqwest::Response, ClientError> {
        if self.status().is_success() {
            return Ok(self);
        }
        let status = self.status();
        let body = self.text().await.unwrap_or_default();
        Err(ClientError::Server { status, message: error_message(status, &body) })
    }
}

/// HTTP client wrapper for communicating with the Bazaar server
pub struct BazaarClient {
    /// The base URL of the server (e.g. "http://localhost:8000")
    base_url: String,
    /// The underlying HTTP client
    client: Client,
}

impl BazaarClient {
    /// Creates a new BazaarClient
    ///
    /// ### Arguments
    ///
    /// * `base_url` - The base URL of the Bazaar server
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ── Read endpoints ───────────────────────────────────────────────

    /// Lists listings, optionally only those with one status
    pub async fn list_listings(&self, status: Option<&str>) -> Result<Vec<ListingDto>, ClientError> {
        let mut request = self.client.get(self.url("/listings/"));
        if let Some(status) = status {
            request = request.query(&[("status", status)]);
        }
        let response = request.send().await?.check().await?;
        Ok(response.json().await?)
    }

    /// Lists approved listings
    pub async fn list_approved(&self) -> Result<Vec<ListingDto>, ClientError> {
        let response = self.client.get(self.url("/listings/approved/")).send().await?.check().await?;
        Ok(response.json().await?)
    }

    /// Lists listings awaiting moderation
    pub async fn list_pending(&self) -> Result<Vec<ListingDto>, ClientError> {
        let response = self.client.get(self.url("/listings/pending/")).send().await?.check().await?;
        Ok(response.json().await?)
    }

    /// Lists the listings submitted by one person
    pub async fn list_mine(&self, listed_by: &str) -> Result<Vec<ListingDto>, ClientError> {
        let response = self
            .client
            .get(self.url("/listings/mine/"))
            .query(&[("listed_by", listed_by)])
            .send()
            .await?
            .check()
            .await?;
        Ok(response.json().await?)
    }

    // ── Write endpoints ──────────────────────────────────────────────

    /// Submits a listing, as multipart when there are images to upload
    pub async fn create_listing(
        &self,
        dto: &CreateListingDto,
        images: &[PathBuf],
    ) -> Result<ListingDto, ClientError> {
        let request = self.client.post(self.url("/listings/create/"));

        let request = if images.is_empty() {
            request.json(dto)
        } else {
            let mut form = Form::new();
            for (name, value) in dto.to_fields() {
                form = form.text(name, value);
            }
            for path in images {
                form = form.part("images", image_part(path).await?);
            }
            request.multipart(form)
        };

        let response = request.send().await?.check().await?;
        Ok(response.json().await?)
    }

    // ── Moderation endpoints ─────────────────────────────────────────

    /// Approves a listing
    pub async fn approve_listing(&self, id: i32) -> Result<StatusDto, ClientError> {
        let url = self.url(&format!("/listings/{}/approve/", id));
        let response = self.client.patch(url).send().await?.check().await?;
        Ok(response.json().await?)
    }

    /// Rejects a listing
    pub async fn reject_listing(&self, id: i32) -> Result<StatusDto, ClientError> {
        let url = self.url(&format!("/listings/{}/reject/", id));
        let response = self.client.patch(url).send().await?.check().await?;
        Ok(response.json().await?)
    }

    /// Gets the moderation counters
    pub async fn stats(&self) -> Result<ListingStats, ClientError> {
        let response = self.client.get(self.url("/listings/stats/")).send().await?.check().await?;
        Ok(response.json().await?)
    }
}

/// Reads a local image into a multipart part named after the file
async fn image_part(path: &Path) -> Result<Part, ClientError> {
    let data = tokio::fs::read(path).await.map_err(|source| ClientError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    Ok(Part::bytes(data).file_name(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_error_message_detail() {
        let body = r#"{"detail": "Authentication required or provide listed_by parameter."}"#;
        assert_eq!(
            error_message(StatusCode::FORBIDDEN, body),
            "Authentication required or provide listed_by parameter."
        );
    }

    #[test]
    fn test_error_message_field_map() {
        let body = r#"{"listing_type": ["\"x\" is not a valid choice."], "title": ["This field is required."]}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "listing_type: \"x\" is not a valid choice.; title: This field is required."
        );
    }

    #[test]
    fn test_error_message_without_json() {
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "HTTP 404 Not Found");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = BazaarClient::new("http://localhost:8000/".to_string());
        assert_eq!(client.url("/listings/"), "http://localhost:8000/listings/");
    }
}
