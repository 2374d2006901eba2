//! Blocking HTTP transport backed by `reqwest`.

use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::CONTENT_TYPE;

use crate::{
    AnalysisTransport, ClientError, FormField, HttpMethod, RequestBody, TransportRequest,
    TransportResponse,
};

/// Real network transport. One call to [`AnalysisTransport::execute`] is one
/// HTTP exchange; there is no retry.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Builds a transport with the given request timeout.
    ///
    /// # Errors
    /// Returns [`ClientError::Transport`] when the HTTP client cannot be
    /// initialized (for example TLS backend failure).
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("deepfake-lens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| {
                ClientError::Transport(format!("http client setup failed: {error}"))
            })?;

        Ok(Self { client })
    }
}

impl AnalysisTransport for HttpTransport {
    fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ClientError> {
        let TransportRequest {
            operation,
            method,
            url,
            body,
        } = request;

        let builder = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };

        let builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(json) => builder.header(CONTENT_TYPE, "application/json").body(json),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        let response = builder.send().map_err(|error| {
            ClientError::Transport(format!("{operation} request failed: {error}"))
        })?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|error| {
            ClientError::Transport(format!("{operation} response body unreadable: {error}"))
        })?;

        Ok(TransportResponse { status, body })
    }
}

fn build_form(fields: Vec<FormField>) -> Result<Form, ClientError> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name, value),
            FormField::File {
                name,
                file_name,
                mime,
                bytes,
            } => {
                let part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&mime)
                    .map_err(|error| {
                        ClientError::Transport(format!("invalid mime {mime}: {error}"))
                    })?;
                form.part(name, part)
            }
        };
    }

    Ok(form)
}
