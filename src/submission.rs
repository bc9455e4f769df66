/// Listing submissions
///
/// A submission is whatever the client sent to the create endpoint, parsed
/// from JSON, a urlencoded form, or a multipart form, but not yet trusted.
/// `validate` turns it into a [`NewListing`] or a full set of field errors;
/// nothing is written anywhere until validation has passed.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde_json::Value;
use tracing::debug;

use crate::errors::{ApiError, FieldErrors};
use crate::models::{ListingType, NewListing, Price};

/// Name of the repeatable multipart field carrying image files
pub const IMAGES_FIELD: &str = "images";

/// Submitter recorded when neither an identity nor a `listed_by` field is given
pub const ANONYMOUS: &str = "anonymous";

const TITLE_MAX_CHARS: usize = 200;
const LISTED_BY_MAX_CHARS: usize = 150;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";
const NOT_STRING: &str = "Not a valid string.";

/// A single submitted value, before any interpretation
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// JSON `null`, or an empty nullable field in a form
    Null,
    Text(String),
    Number(serde_json::Number),
    /// A JSON boolean (`True`/`False`), array or object (kept as its JSON text)
    Other(String),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::String(s) => FieldValue::Text(s),
            Value::Number(n) => FieldValue::Number(n),
            // Quoted as `True`/`False` in error messages
            Value::Bool(b) => FieldValue::Other(if b { "True" } else { "False" }.to_string()),
            other => FieldValue::Other(other.to_string()),
        }
    }
}

/// An image file attached to a submission
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Name the client gave the file, used only for its extension
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// An unvalidated create request: named fields plus image files in the
/// order they were sent
#[derive(Debug, Clone, Default)]
pub struct ListingSubmission {
    fields: HashMap<String, FieldValue>,
    images: Vec<UploadedImage>,
}

impl ListingSubmission {
    /// Builds a submission from a JSON body
    ///
    /// Anything other than a JSON object is refused the same way a form with
    /// no usable fields would be, as a `non_field_errors` entry.
    pub fn from_json(value: Value) -> Result<Self, FieldErrors> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                let kind = match other {
                    Value::Array(_) => "list",
                    Value::String(_) => "str",
                    Value::Number(_) => "number",
                    Value::Bool(_) => "bool",
                    _ => "null",
                };
                let mut errors = FieldErrors::default();
                errors.add(
                    "non_field_errors",
                    format!("Invalid data. Expected a dictionary, but got {}.", kind),
                );
                return Err(errors);
            }
        };

        Ok(Self {
            fields: map.into_iter().map(|(k, v)| (k, FieldValue::from(v))).collect(),
            images: Vec::new(),
        })
    }

    /// Builds a submission from form pairs; a later duplicate key wins
    ///
    /// Forms cannot express null, so an empty `price` is read as "no price".
    pub fn from_form<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut submission = Self::default();
        for (name, value) in pairs {
            submission.set_form_field(name, value);
        }
        submission
    }

    fn set_form_field(&mut self, name: String, value: String) {
        let value = if name == "price" && value.is_empty() {
            FieldValue::Null
        } else {
            FieldValue::Text(value)
        };
        self.fields.insert(name, value);
    }

    /// Attaches an image, keeping submission order
    pub fn push_image(&mut self, image: UploadedImage) {
        self.images.push(image);
    }

    /// Gets the attached images in submission order
    pub fn images(&self) -> &[UploadedImage] {
        &self.images
    }

    /// Takes the attached images out of the submission
    pub fn into_images(self) -> Vec<UploadedImage> {
        self.images
    }

    /// Works out who the listing will be recorded against
    ///
    /// An authenticated identity always wins. Without one the client's own
    /// `listed_by` field is used as sent (and validated like any other
    /// field), falling back to "anonymous" when the field is absent.
    pub fn resolve_listed_by(&self, current_user: Option<&str>) -> FieldValue {
        match current_user {
            Some(user) => FieldValue::Text(user.to_string()),
            None => self
                .fields
                .get("listed_by")
                .cloned()
                .unwrap_or_else(|| FieldValue::Text(ANONYMOUS.to_string())),
        }
    }

    /// Validates every field and builds the listing to insert
    ///
    /// All fields are checked before returning, so the error report covers
    /// every problem at once. Any client-supplied `status`, `id`, timestamps
    /// or `images` data field is ignored.
    pub fn validate(&self, current_user: Option<&str>) -> Result<NewListing, FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = text_field(&mut errors, "title", self.fields.get("title"), true, false, Some(TITLE_MAX_CHARS));
        let description = text_field(&mut errors, "description", self.fields.get("description"), false, true, None);
        let listing_type = listing_type_field(&mut errors, self.fields.get("listing_type"));
        let price = price_field(&mut errors, self.fields.get("price"));
        let listed_by_value = self.resolve_listed_by(current_user);
        let listed_by = text_field(&mut errors, "listed_by", Some(&listed_by_value), true, false, Some(LISTED_BY_MAX_CHARS));

        match (title, description, listing_type, price, listed_by) {
            (Some(title), Some(description), Some(listing_type), Ok(price), Some(listed_by)) if errors.is_empty() => {
                Ok(NewListing::new(title, description, listing_type, price, listed_by))
            }
            _ => Err(errors),
        }
    }
}

/// Checks a free-text field, returning its trimmed value when valid
///
/// A missing optional field yields an empty string.
fn text_field(
    errors: &mut FieldErrors,
    name: &str,
    value: Option<&FieldValue>,
    required: bool,
    allow_blank: bool,
    max_chars: Option<usize>,
) -> Option<String> {
    let text = match value {
        None if required => {
            errors.add(name, REQUIRED);
            return None;
        }
        None => return Some(String::new()),
        Some(FieldValue::Null) => {
            errors.add(name, NOT_NULL);
            return None;
        }
        Some(FieldValue::Other(_)) => {
            errors.add(name, NOT_STRING);
            return None;
        }
        Some(FieldValue::Text(s)) => s.trim().to_string(),
        Some(FieldValue::Number(n)) => n.to_string(),
    };

    if text.is_empty() && !allow_blank {
        errors.add(name, NOT_BLANK);
        return None;
    }
    if let Some(max) = max_chars {
        if text.chars().count() > max {
            errors.add(name, format!("Ensure this field has no more than {} characters.", max));
            return None;
        }
    }
    Some(text)
}

fn listing_type_field(errors: &mut FieldErrors, value: Option<&FieldValue>) -> Option<ListingType> {
    let raw = match value {
        None => {
            errors.add("listing_type", REQUIRED);
            return None;
        }
        Some(FieldValue::Null) => {
            errors.add("listing_type", NOT_NULL);
            return None;
        }
        Some(FieldValue::Text(s)) => s.clone(),
        Some(FieldValue::Number(n)) => n.to_string(),
        Some(FieldValue::Other(json)) => json.clone(),
    };

    raw.parse::<ListingType>()
        .map_err(|err| errors.add("listing_type", err.to_string()))
        .ok()
}

/// Checks the optional price; `Ok(None)` means no price was given
fn price_field(errors: &mut FieldErrors, value: Option<&FieldValue>) -> Result<Option<Price>, ()> {
    let raw = match value {
        None | Some(FieldValue::Null) => return Ok(None),
        Some(FieldValue::Text(s)) => s.clone(),
        Some(FieldValue::Number(n)) => n.to_string(),
        Some(FieldValue::Other(json)) => json.clone(),
    };

    raw.parse::<Price>().map(Some).map_err(|err| {
        errors.add("price", err.to_string());
    })
}

fn rejected(status: axum::http::StatusCode, message: String) -> ApiError {
    ApiError::Rejected { status, message }
}

impl<S> FromRequest<S> for ListingSubmission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let mime = content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase());

        match mime.as_deref() {
            None | Some("application/json") => json_submission(req, state).await,
            Some(m) if m.ends_with("+json") => json_submission(req, state).await,
            Some("application/x-www-form-urlencoded") => {
                let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                debug!("Parsed urlencoded submission with {} fields", pairs.len());
                Ok(Self::from_form(pairs))
            }
            Some("multipart/form-data") => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                multipart_submission(multipart).await
            }
            Some(_) => Err(ApiError::UnsupportedMediaType(content_type.unwrap_or_default())),
        }
    }
}

async fn json_submission<S>(req: Request, state: &S) -> Result<ListingSubmission, ApiError>
where
    S: Send + Sync,
{
    let body = Bytes::from_request(req, state)
        .await
        .map_err(|e| rejected(e.status(), e.body_text()))?;

    // An empty body is an empty submission, not a parse error
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ListingSubmission::default());
    }

    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        rejected(axum::http::StatusCode::BAD_REQUEST, format!("JSON parse error - {}", e))
    })?;
    ListingSubmission::from_json(value).map_err(ApiError::Validation)
}

async fn multipart_submission(mut multipart: Multipart) -> Result<ListingSubmission, ApiError> {
    let mut submission = ListingSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejected(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        match (name.as_str(), file_name) {
            // An empty file input still sends a part, with a blank file name
            (IMAGES_FIELD, Some(file_name)) if !file_name.is_empty() => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                debug!("Received image {:?} ({} bytes)", file_name, data.len());
                submission.push_image(UploadedImage {
                    file_name: Some(file_name),
                    content_type,
                    data,
                });
            }
            // Files under any other name, blank uploads and non-file `images` parts are not listing data
            (_, Some(_)) | (IMAGES_FIELD, None) => {}
            (_, None) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                submission.set_form_field(name, text);
            }
        }
    }

    Ok(submission)
}
