// File: src/client/core.rs
use crate::client::middleware::{DefaultHeadersLayer, DefaultHeadersService};
use crate::error::{Result, TimelineError};
use crate::model::raw::{
    ListMetadata, PostedComment, RawComment, RawCommentList, RawTask, RawTaskList,
};

use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method, Request, Uri};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use std::future::Future;
use tower::{ServiceBuilder, ServiceExt};

pub const DEFAULT_API_URL: &str = "https://api.clickup.com/api/v2";

type HttpsClient =
    DefaultHeadersService<Client<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>>;

/// Read/write calls against the task provider. One network request per call.
///
/// Implemented by [`ProviderClient`]; tests substitute in-memory fakes.
pub trait ProviderApi: Send + Sync {
    fn list_tasks(
        &self,
        credential: &str,
        list_id: &str,
    ) -> impl Future<Output = Result<Vec<RawTask>>> + Send;

    fn get_list_metadata(
        &self,
        credential: &str,
        list_id: &str,
    ) -> impl Future<Output = Result<ListMetadata>> + Send;

    fn list_comments(
        &self,
        credential: &str,
        task_id: &str,
    ) -> impl Future<Output = Result<Vec<RawComment>>> + Send;

    fn post_comment(
        &self,
        credential: &str,
        task_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<PostedComment>> + Send;
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TimelineError::Config(format!("{what} is empty")));
    }
    Ok(())
}

/// Identifiers end up in the URL path; refuse anything that would change its shape.
fn require_path_segment(value: &str, what: &str) -> Result<()> {
    require(value, what)?;
    if value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%'))
    {
        return Err(TimelineError::Config(format!(
            "{what} contains characters not allowed in an identifier: {value:?}"
        )));
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct ProviderClient {
    base_url: String,
    http: HttpsClient,
}

impl ProviderClient {
    pub fn new(api_url: &str, user_agent: &str) -> Result<Self> {
        let base_url = api_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(TimelineError::Config("provider API URL is empty".to_string()));
        }
        base_url
            .parse::<Uri>()
            .map_err(|e| TimelineError::Config(format!("invalid provider API URL: {e}")))?;

        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        for err in &result.errors {
            log::debug!("Skipping native certificate: {}", err);
        }
        root_store.add_parsable_certificates(result.certs);
        if root_store.is_empty() {
            log::warn!("No valid system certificates found; HTTPS requests will fail");
        }
        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let client: Client<_, Full<Bytes>> =
            Client::builder(TokioExecutor::new()).build(https_connector);
        let http = ServiceBuilder::new()
            .layer(DefaultHeadersLayer::new(user_agent))
            .service(client);

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Uri> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        url.parse::<Uri>()
            .map_err(|e| TimelineError::Config(format!("invalid request URL '{url}': {e}")))
    }

    async fn send(&self, request: Request<Full<Bytes>>) -> Result<Bytes> {
        let method = request.method().clone();
        let uri = request.uri().clone();
        log::debug!("{} {}", method, uri.path());

        let response = self
            .http
            .clone()
            .oneshot(request)
            .await
            .map_err(|e: hyper_util::client::legacy::Error| {
                log::warn!("{} {} failed: {}", method, uri.path(), e);
                TimelineError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TimelineError::Transport(format!("response read failed: {e}")))?
            .to_bytes();

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            log::warn!("{} {} returned {}: {}", method, uri.path(), status, body);
            return Err(TimelineError::Provider {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        credential: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let token = HeaderValue::from_str(credential.trim()).map_err(|_| {
            TimelineError::Config("credential contains characters not allowed in a header".into())
        })?;
        let mut builder = Request::builder()
            .method(method)
            .uri(self.endpoint(path)?)
            .header(AUTHORIZATION, token);

        let payload = match body {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                let bytes = serde_json::to_vec(&value)
                    .map_err(|e| TimelineError::Transport(format!("encode request: {e}")))?;
                Full::new(Bytes::from(bytes))
            }
            None => Full::new(Bytes::new()),
        };
        let request = builder
            .body(payload)
            .map_err(|e| TimelineError::Config(format!("build request: {e}")))?;

        let bytes = self.send(request).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| TimelineError::Transport(format!("malformed provider response: {e}")))
    }
}

impl ProviderApi for ProviderClient {
    async fn list_tasks(&self, credential: &str, list_id: &str) -> Result<Vec<RawTask>> {
        require(credential, "credential")?;
        require_path_segment(list_id, "list id")?;
        let list: RawTaskList = self
            .request_json(
                Method::GET,
                &format!("list/{list_id}/task?include_comments=true"),
                credential,
                None,
            )
            .await?;
        log::info!("Fetched {} task(s) from list {}", list.tasks.len(), list_id);
        Ok(list.tasks)
    }

    async fn get_list_metadata(&self, credential: &str, list_id: &str) -> Result<ListMetadata> {
        require(credential, "credential")?;
        require_path_segment(list_id, "list id")?;
        self.request_json(Method::GET, &format!("list/{list_id}"), credential, None)
            .await
    }

    async fn list_comments(&self, credential: &str, task_id: &str) -> Result<Vec<RawComment>> {
        require(credential, "credential")?;
        require_path_segment(task_id, "task id")?;
        let list: RawCommentList = self
            .request_json(
                Method::GET,
                &format!("task/{task_id}/comment"),
                credential,
                None,
            )
            .await?;
        Ok(list.comments)
    }

    async fn post_comment(
        &self,
        credential: &str,
        task_id: &str,
        text: &str,
    ) -> Result<PostedComment> {
        require(credential, "credential")?;
        require_path_segment(task_id, "task id")?;
        let posted: PostedComment = self
            .request_json(
                Method::POST,
                &format!("task/{task_id}/comment"),
                credential,
                Some(serde_json::json!({ "comment_text": text })),
            )
            .await?;
        log::info!("Posted comment on task {}", task_id);
        Ok(posted)
    }
}
