use reqwest::{header, Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::errors::{GraphError, GraphResult};

pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";

/// Short lived access token for Graph, valid for one turn only
#[derive(Clone)]
pub struct DelegatedCredential(String);

impl DelegatedCredential {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DelegatedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DelegatedCredential(***)")
    }
}

/// A binary Graph resource together with its reported content type
#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct GraphClient {
    http: Client,
    base_url: String,
    credential: DelegatedCredential,
}

impl GraphClient {
    pub fn new(endpoint: &str, credential: DelegatedCredential) -> GraphResult<Self> {
        let http = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            http,
            base_url: endpoint.trim().trim_end_matches('/').to_string(),
            credential,
        })
    }

    pub fn url_with_segments(&self, segments: &[&str]) -> GraphResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON resource, `None` when it does not exist
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        extra_headers: &[(&str, &str)],
    ) -> GraphResult<Option<T>> {
        let mut request = self.http.get(url).query(query);
        for (key, value) in extra_headers {
            request = request.header(*key, *value);
        }

        match self.send_request(request).await? {
            Some(response) => Self::decode(response).await,
            None => Ok(None),
        }
    }

    /// GET a binary resource, `None` when it does not exist
    pub async fn get_bytes(&self, url: Url) -> GraphResult<Option<Binary>> {
        let request = self.http.get(url);
        let Some(response) = self.send_request(request).await? else {
            return Ok(None);
        };

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }

        Ok(Some(Binary {
            content_type,
            bytes: bytes.to_vec(),
        }))
    }

    /// POST a JSON body and decode the created resource
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> GraphResult<Option<T>> {
        let request = self.http.post(url).json(body);
        match self.send_request(request).await? {
            Some(response) => Self::decode(response).await,
            None => Ok(None),
        }
    }

    /// POST a JSON body to an action that answers without content. Any HTTP
    /// answer is returned as its status; only transport failures are errors.
    pub async fn post_action<B: Serialize>(&self, url: Url, body: &B) -> GraphResult<StatusCode> {
        let request = self.http.post(url).json(body);
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, body = %body, "graph action rejected");
        }
        Ok(status)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> GraphResult<Option<T>> {
        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&body)?))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(self.credential.token())
            .header(header::ACCEPT, "application/json")
    }

    /// Send with the delegated credential. A 404 is reported as `None`, any
    /// other unsuccessful status as an error.
    async fn send_request(&self, request: RequestBuilder) -> GraphResult<Option<Response>> {
        let response = self.authorized(request).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(Some(response))
        } else if status == StatusCode::NOT_FOUND {
            tracing::debug!(url = %response.url(), "graph resource not found");
            Ok(None)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(GraphError::Status { status, body })
        }
    }
}
