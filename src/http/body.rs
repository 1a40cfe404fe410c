//! Request body resolution.
//!
//! Form data wins over JSON data, which wins over the raw body. The resolved
//! bytes land in `Options::body`; after each attempt [`release`] clears the
//! payload fields and the orchestrator restores them from a
//! [`PayloadSource`] before the next attempt that still carries a body.

use crate::base::neterror::NetError;
use crate::http::RequestBody;
use crate::options::{Form, Json, Options};
use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Resolve the payload of `options` into `options.body`.
///
/// Returns the body that will be sent, if any. A failing marshal function
/// yields [`NetError::BodyEncoding`].
pub fn resolve(options: &mut Options) -> Result<Option<RequestBody>, NetError> {
    if let Some(form) = options.form.as_ref().filter(|f| !f.is_empty()) {
        let encoded = form.encode();
        set_default_content_type(options, FORM_CONTENT_TYPE);
        options.body = Some(RequestBody::from(encoded));
    } else if let Some(json) = options.json.as_ref().filter(|j| !j.is_empty()) {
        let bytes = marshal(options, json)?;
        set_default_content_type(options, JSON_CONTENT_TYPE);
        options.body = Some(RequestBody::from(bytes));
    }

    Ok(options.body.clone().filter(|b| !b.is_empty()))
}

fn marshal(options: &Options, json: &Json) -> Result<Vec<u8>, NetError> {
    let result = match options.marshal_json.as_ref() {
        Some(f) => f(json),
        None => serde_json::to_vec(json).map_err(Into::into),
    };
    result.map_err(|e| NetError::BodyEncoding {
        reason: e.to_string(),
    })
}

fn set_default_content_type(options: &mut Options, value: &'static str) {
    if !options.headers.contains_key(CONTENT_TYPE) {
        options
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(value));
    }
}

/// Clear the resolved body and its form/JSON sources.
pub fn release(options: &mut Options) {
    options.body = None;
    options.json = None;
    options.form = None;
}

/// Drop the payload and the headers describing it. Used when a redirect
/// rewrites the method to GET.
pub fn clear_payload(options: &mut Options) {
    release(options);
    options.headers.remove(CONTENT_LENGTH);
    options.headers.remove(CONTENT_TYPE);
}

/// The caller's payload as it stood before the first attempt.
#[derive(Debug, Clone, Default)]
pub struct PayloadSource {
    body: Option<RequestBody>,
    json: Option<Json>,
    form: Option<Form>,
}

impl PayloadSource {
    pub fn capture(options: &Options) -> Self {
        Self {
            body: options.body.clone(),
            json: options.json.clone(),
            form: options.form.clone(),
        }
    }

    /// Put the captured payload back. Fields already set on `options`
    /// (a hook may have supplied a new payload) are left alone.
    pub fn restore(&self, options: &mut Options) {
        if options.body.is_none() {
            options.body = self.body.clone();
        }
        if options.json.is_none() {
            options.json = self.json.clone();
        }
        if options.form.is_none() {
            options.form = self.form.clone();
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_none() && self.json.is_none() && self.form.is_none()
    }
}
