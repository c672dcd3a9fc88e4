// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! WAPI HTTP client.
//!
//! All calls into the NIOS appliance go through the [`WapiApi`] trait. The production
//! implementation is [`WapiClient`], a `reqwest` client that speaks the WAPI
//! conventions:
//!
//! - `_return_fields+=<list>` to request extra fields
//! - `_return_as_object=1` to get `{"result": ...}` wrapped responses
//! - `*<attribute>=<value>` to filter by extensible attribute
//! - `_paging=1`, `_max_results`, `_page_id` for paged lists
//!
//! Tests substitute spy or in-memory implementations of the trait.

#[cfg(test)]
pub(crate) mod mock;
pub mod pagination;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::ProviderConfig;
use crate::constants::{
    EXT_ATTR_FILTER_PREFIX, PARAM_MAX_RESULTS, PARAM_PAGE_ID, PARAM_PAGING,
    PARAM_RETURN_AS_OBJECT, PARAM_RETURN_FIELDS_PLUS, RESULT_FIELD, WAPI_PATH_PREFIX,
};
use crate::errors::ClientError;
use crate::http_errors::{error_message, WapiErrorBody};
use crate::retry::{is_retryable_create_status, is_retryable_status, RetryPolicy};
use pagination::{list_all_pages, Page};

/// Query options shared by every WAPI call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Extra fields to return on top of the defaults
    pub return_fields_plus: Option<String>,
    /// Ask for a `{"result": ...}` wrapped response
    pub return_as_object: bool,
    /// Field filters (`name=www.example.com`)
    pub filters: BTreeMap<String, String>,
    /// Extensible attribute filters (`*Site=nyc`)
    pub ext_attr_filters: BTreeMap<String, String>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn return_fields_plus(mut self, fields: impl Into<String>) -> Self {
        self.return_fields_plus = Some(fields.into());
        self
    }

    #[must_use]
    pub fn return_as_object(mut self) -> Self {
        self.return_as_object = true;
        self
    }

    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn ext_attr_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.ext_attr_filters.insert(name.into(), value.into());
        self
    }

    /// Append these options to a request URL as query parameters.
    pub fn apply(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        if let Some(fields) = &self.return_fields_plus {
            pairs.append_pair(PARAM_RETURN_FIELDS_PLUS, fields);
        }
        if self.return_as_object {
            pairs.append_pair(PARAM_RETURN_AS_OBJECT, "1");
        }
        for (field, value) in &self.filters {
            pairs.append_pair(field, value);
        }
        for (name, value) in &self.ext_attr_filters {
            pairs.append_pair(&format!("{EXT_ATTR_FILTER_PREFIX}{name}"), value);
        }
        drop(pairs);
        if url.query() == Some("") {
            url.set_query(None);
        }
    }
}

/// Operations the provider needs from the WAPI.
///
/// References are the opaque `_ref` strings returned by the appliance. All payloads
/// are untyped JSON; typing happens in the resource layer.
#[async_trait]
pub trait WapiApi: Send + Sync {
    /// Read one object by reference.
    async fn read(&self, reference: &str, options: &RequestOptions) -> Result<Value, ClientError>;

    /// List objects of a type, following pages until exhausted.
    async fn list(
        &self,
        object_type: &str,
        options: &RequestOptions,
    ) -> Result<Vec<Value>, ClientError>;

    /// Create an object and return it as stored by the appliance.
    async fn create(
        &self,
        object_type: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<Value, ClientError>;

    /// Update an object by reference and return it as stored by the appliance.
    async fn update(
        &self,
        reference: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<Value, ClientError>;

    /// Delete an object by reference.
    async fn delete(&self, reference: &str) -> Result<(), ClientError>;
}

/// Build the WAPI base URL from the grid master URL and version.
///
/// Converts `https://gm.example.com/` and `v2.13.6` into
/// `https://gm.example.com/wapi/v2.13.6/`. A URL without scheme is assumed to be HTTPS.
///
/// # Errors
///
/// Returns an error if the grid master URL does not parse or has no host.
pub fn build_api_url(host: &str, wapi_version: &str) -> Result<Url, ClientError> {
    let host = host.trim();
    let base = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    let invalid = |reason: String| {
        ClientError::InvalidRequest(format!("invalid WAPI base URL '{base}': {reason}"))
    };

    let mut url = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    let prefix = url.path().trim_end_matches('/').to_string();
    let version = wapi_version.trim_matches('/');
    url.set_path(&format!("{prefix}/{WAPI_PATH_PREFIX}/{version}/"));
    Ok(url)
}

/// Strip the `{"result": ...}` wrapper from a `_return_as_object=1` response.
#[must_use]
pub fn unwrap_result(response: Value) -> Value {
    match response {
        Value::Object(mut map) if map.contains_key(RESULT_FIELD) => {
            map.remove(RESULT_FIELD).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// `reqwest` backed WAPI client.
#[derive(Clone)]
pub struct WapiClient {
    http: HttpClient,
    base_url: Url,
    authorization: String,
    page_size: u32,
    retry: RetryPolicy,
}

impl WapiClient {
    /// Build a client from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, ClientError> {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()
            .map_err(|e| ClientError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        let credentials = format!("{}:{}", config.nios_username, config.nios_password);
        let authorization = format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        );

        Ok(Self {
            http,
            base_url: build_api_url(&config.nios_host_url, &config.wapi_version)?,
            authorization,
            page_size: config.page_size,
            retry: RetryPolicy::default().with_max_elapsed(config.max_retry_elapsed()),
        })
    }

    /// Base URL every request path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the full URL for an object type or reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not form a valid URL.
    pub fn object_url(&self, path: &str, options: &RequestOptions) -> Result<Url, ClientError> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(ClientError::InvalidRequest(
                "empty object type or reference".to_string(),
            ));
        }
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| ClientError::InvalidRequest(format!("invalid WAPI path '{path}': {e}")))?;
        options.apply(&mut url);
        Ok(url)
    }

    /// Execute a request with automatic retry.
    ///
    /// # Retry Behavior
    /// - Retries on HTTP 429, 500, 502, 503, 504 and connection failures
    /// - A POST is only retried on 429 or when no connection was made, since a
    ///   create that failed later may already have been committed
    /// - Fails immediately on other statuses, including 404
    /// - Gives up once the configured retry window has elapsed
    async fn request(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
        subject: &str,
    ) -> Result<Value, ClientError> {
        let mut backoff = self.retry.start();
        let creates = method == Method::POST;

        loop {
            let failure = match self.request_once(&method, url, body, subject).await {
                Ok(value) => {
                    if backoff.retries() > 0 {
                        debug!(
                            method = %method,
                            url = %url,
                            retries = backoff.retries(),
                            elapsed = ?backoff.elapsed(),
                            "WAPI call succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            let (err, retryable) = match failure {
                RequestFailure::Status(err, status) if creates => {
                    (err, is_retryable_create_status(status.as_u16()))
                }
                RequestFailure::Status(err, status) => (err, is_retryable_status(status.as_u16())),
                RequestFailure::Connect(err) => (err, true),
                RequestFailure::Transport(err) => (err, !creates),
                RequestFailure::Fatal(err) => (err, false),
            };

            if !retryable {
                if !err.is_not_found() {
                    error!(
                        method = %method,
                        url = %url,
                        error = %err,
                        "Non-retryable WAPI error, failing immediately"
                    );
                }
                return Err(err);
            }

            let Some(delay) = backoff.next_delay() else {
                error!(
                    method = %method,
                    url = %url,
                    retries = backoff.retries(),
                    elapsed = ?backoff.elapsed(),
                    error = %err,
                    "Retry window exhausted, giving up"
                );
                return Err(err);
            };

            warn!(
                method = %method,
                url = %url,
                retry = backoff.retries(),
                retry_after = ?delay,
                error = %err,
                "Retryable WAPI error, will retry"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn request_once(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
        subject: &str,
    ) -> Result<Value, RequestFailure> {
        debug!(method = %method, url = %url, "WAPI request");

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json");
        if let Some(body) = body {
            debug!(method = %method, url = %url, body = %body, "WAPI request body");
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            let err = ClientError::Connection {
                url: url.to_string(),
                reason: e.to_string(),
            };
            if e.is_connect() {
                RequestFailure::Connect(err)
            } else {
                RequestFailure::Transport(err)
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            RequestFailure::Transport(ClientError::Connection {
                url: url.to_string(),
                reason: format!("failed to read response body: {e}"),
            })
        })?;

        if !status.is_success() {
            let not_found = status == StatusCode::NOT_FOUND
                || WapiErrorBody::parse(&text).is_some_and(|b| b.is_not_found());
            if not_found {
                debug!(method = %method, url = %url, status = %status, "WAPI object not found");
                return Err(RequestFailure::Fatal(ClientError::NotFound {
                    reference: subject.to_string(),
                    status: status.as_u16(),
                }));
            }
            return Err(RequestFailure::Status(
                ClientError::Api {
                    method: method.to_string(),
                    url: url.to_string(),
                    status: status.as_u16(),
                    message: error_message(status.as_u16(), &text),
                },
                status,
            ));
        }

        debug!(
            method = %method,
            url = %url,
            status = %status,
            response_len = text.len(),
            "WAPI request successful"
        );

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            RequestFailure::Fatal(ClientError::InvalidResponse {
                url: url.to_string(),
                reason: e.to_string(),
            })
        })
    }
}

/// Classification of a single failed attempt, used to decide on retries.
enum RequestFailure {
    /// Non-success HTTP status
    Status(ClientError, StatusCode),
    /// No connection could be made; the request never reached the appliance
    Connect(ClientError),
    /// Failure after the request may have been sent
    Transport(ClientError),
    /// Never retried
    Fatal(ClientError),
}

#[async_trait]
impl WapiApi for WapiClient {
    async fn read(&self, reference: &str, options: &RequestOptions) -> Result<Value, ClientError> {
        let url = self.object_url(reference, options)?;
        let response = self.request(Method::GET, &url, None, reference).await?;
        Ok(unwrap_result(response))
    }

    async fn list(
        &self,
        object_type: &str,
        options: &RequestOptions,
    ) -> Result<Vec<Value>, ClientError> {
        let options = options.clone().return_as_object();
        let page_size = self.page_size.to_string();
        let options = &options;
        let page_size = page_size.as_str();

        list_all_pages(move |page_id: Option<String>| {
            async move {
                let mut url = self.object_url(object_type, options)?;
                {
                    let mut pairs = url.query_pairs_mut();
                    pairs.append_pair(PARAM_PAGING, "1");
                    pairs.append_pair(PARAM_MAX_RESULTS, page_size);
                    if let Some(page_id) = &page_id {
                        pairs.append_pair(PARAM_PAGE_ID, page_id);
                    }
                }
                let response = self.request(Method::GET, &url, None, object_type).await?;
                Page::from_response(response, &url)
            }
        })
        .await
    }

    async fn create(
        &self,
        object_type: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<Value, ClientError> {
        let url = self.object_url(object_type, options)?;
        let response = self
            .request(Method::POST, &url, Some(body), object_type)
            .await?;
        Ok(unwrap_result(response))
    }

    async fn update(
        &self,
        reference: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<Value, ClientError> {
        let url = self.object_url(reference, options)?;
        let response = self
            .request(Method::PUT, &url, Some(body), reference)
            .await?;
        Ok(unwrap_result(response))
    }

    async fn delete(&self, reference: &str) -> Result<(), ClientError> {
        let url = self.object_url(reference, &RequestOptions::new())?;
        self.request(Method::DELETE, &url, None, reference).await?;
        Ok(())
    }
}
