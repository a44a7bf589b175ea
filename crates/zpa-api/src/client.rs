// Async HTTP client for the ZPA management API.
//
// Base path: /mgmtconfig/v1/admin/customers/{customerId}/
// Auth: bearer token from POST /signin (form-encoded client credentials)
//
// Endpoint groups (segment groups, application segments, policy sets, ...)
// are inherent methods implemented in sibling modules; this file only holds
// the transport mechanics.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::{AuthToken, Cloud, Credentials};
use crate::error::Error;
use crate::models::ListPage;
use crate::transport::{RetryPolicy, TransportConfig};

/// Page size used by every list endpoint.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the ZPA management API.
///
/// Cheap to clone: clones share the HTTP connection pool and the cached
/// bearer token. A clone produced by [`scoped`](Self::scoped) adds a
/// `microtenantId` query parameter to every call.
#[derive(Clone)]
pub struct ZpaClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<Credentials>,
    token: Arc<RwLock<Option<SecretString>>>,
    retry: RetryPolicy,
    microtenant_id: Option<String>,
}

impl std::fmt::Debug for ZpaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZpaClient")
            .field("base_url", &self.base_url.as_str())
            .field("customer_id", &self.credentials.customer_id)
            .field("microtenant_id", &self.microtenant_id)
            .finish_non_exhaustive()
    }
}

impl ZpaClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for one of the public ZPA clouds.
    pub fn new(
        credentials: Credentials,
        cloud: Cloud,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Self::with_base_url(cloud.base_url(), credentials, transport)
    }

    /// Build a client against an explicit base URL (private clouds, tests).
    pub fn with_base_url(
        base_url: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            credentials: Arc::new(credentials),
            token: Arc::new(RwLock::new(None)),
            retry: transport.retry,
            microtenant_id: None,
        })
    }

    /// Ensure the base URL ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// A handle whose calls are scoped to one microtenant.
    ///
    /// Blank ids yield an unscoped handle.
    pub fn scoped(&self, microtenant_id: Option<&str>) -> Self {
        let mut scoped = self.clone();
        scoped.microtenant_id = microtenant_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from);
        scoped
    }

    /// The microtenant this handle is scoped to, if any.
    pub fn microtenant_id(&self) -> Option<&str> {
        self.microtenant_id.as_deref()
    }

    /// The tenant's customer id.
    pub fn customer_id(&self) -> &str {
        &self.credentials.customer_id
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a customer-relative path (e.g. `"segmentGroup/42"`).
    fn url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "mgmtconfig/v1/admin/customers/{}/{}",
            self.credentials.customer_id,
            path.trim_start_matches('/')
        );
        Ok(self.base_url.join(&full)?)
    }

    // ── Token cache ──────────────────────────────────────────────────

    /// Exchange the client credentials for a bearer token.
    ///
    /// Called lazily on the first request and again after a `401`.
    pub async fn sign_in(&self) -> Result<(), Error> {
        let token = self.request_token().await?;
        *self.token.write().await = Some(token);
        Ok(())
    }

    async fn request_token(&self) -> Result<SecretString, Error> {
        let url = self.base_url.join("signin")?;
        debug!("POST {url} (client_id={})", self.credentials.client_id);

        let form = [
            ("client_id", self.credentials.client_id.as_str()),
            (
                "client_secret",
                self.credentials.client_secret.expose_secret(),
            ),
        ];
        let resp = self.http.post(url).form(&form).send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("sign-in failed (HTTP {status}): {body}"),
            });
        }

        let token: AuthToken =
            serde_json::from_str(&body).map_err(|e| Error::Authentication {
                message: format!("unreadable sign-in response: {e}"),
            })?;
        if token.access_token.is_empty() {
            return Err(Error::Authentication {
                message: "sign-in response carried no access token".into(),
            });
        }

        debug!(token_type = %token.token_type, "sign-in successful");
        Ok(SecretString::from(token.access_token))
    }

    async fn bearer(&self) -> Result<SecretString, Error> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.request_token().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    async fn forget_token(&self) {
        *self.token.write().await = None;
    }

    // ── Request execution ────────────────────────────────────────────

    /// Send an authenticated request.
    ///
    /// Re-signs in once on `401`, retries `429` per the retry policy.
    async fn send<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path)?;
        let mut reauthenticated = false;
        let mut attempt: u32 = 0;

        loop {
            let token = self.bearer().await?;
            let mut req = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(token.expose_secret())
                .query(params);
            if let Some(ref microtenant) = self.microtenant_id {
                req = req.query(&[("microtenantId", microtenant)]);
            }
            if let Some(body) = body {
                req = req.json(body);
            }

            debug!("{method} {url} params={params:?}");
            let resp = req.send().await?;

            match resp.status() {
                StatusCode::UNAUTHORIZED if !reauthenticated => {
                    trace!("bearer token rejected, signing in again");
                    self.forget_token().await;
                    reauthenticated = true;
                }
                StatusCode::UNAUTHORIZED => return Err(Error::InvalidCredentials),
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = resp
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.trim().parse::<u64>().ok());
                    let wait = self.retry.wait_for(retry_after);

                    if attempt >= self.retry.max_retries {
                        return Err(Error::RateLimited {
                            retry_after_secs: wait.as_secs(),
                        });
                    }
                    attempt += 1;
                    warn!(
                        attempt,
                        wait_secs = wait.as_secs(),
                        "rate limited on {method} {url}, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
                _ => return Ok(resp),
            }
        }
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let resp = self.send::<()>(Method::GET, path, &[], None).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let resp = self.send::<()>(Method::GET, path, params, None).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let resp = self.send(Method::POST, path, &[], Some(body)).await?;
        self.handle_response(resp).await
    }

    /// PUT endpoints answer `204 No Content`.
    pub(crate) async fn put<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let resp = self.send(Method::PUT, path, &[], Some(body)).await?;
        self.handle_empty(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let resp = self.send::<()>(Method::DELETE, path, &[], None).await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
            Error::Api {
                status: status.as_u16(),
                message: err
                    .reason
                    .or(err.message)
                    .unwrap_or_else(|| status.to_string()),
                code: err.id,
            }
        } else {
            Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                code: None,
            }
        }
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Collect every page of a list endpoint.
    pub(crate) async fn get_all_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        search: Option<&str>,
    ) -> Result<Vec<T>, Error> {
        let mut all = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut params = vec![
                ("page", page.to_string()),
                ("pagesize", DEFAULT_PAGE_SIZE.to_string()),
            ];
            if let Some(search) = search {
                params.push(("search", search.to_owned()));
            }

            let batch: ListPage<T> = self.get_with_params(path, &params).await?;
            let received = batch.list.len();
            all.extend(batch.list);

            if received == 0 || page >= batch.total_pages {
                break;
            }
            page += 1;
        }

        Ok(all)
    }
}
