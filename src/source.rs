//! Where runs come from. The grid only sees the [`RunSource`] trait; the
//! binary plugs in [`HttpRunSource`], tests plug in scripted stubs.

use crate::error::FetchError;
use crate::page::Query;
use crate::plot::PlotRequest;
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;

#[async_trait]
pub trait RunSource: Send + Sync {
    /// Raw JSON body of one list request.
    async fn list_runs(&self, query: &Query) -> Result<String, FetchError>;

    /// Raw JSON body of a metrics-plot request.
    async fn plot_metrics(&self, request: &PlotRequest) -> Result<String, FetchError>;
}

pub fn validate_endpoint(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL '{raw}': {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}' in '{raw}' (use http or https)")),
    }
}

pub struct HttpRunSource {
    client: reqwest::Client,
    endpoint: Url,
    plot_endpoint: Option<Url>,
    timeout_secs: u64,
}

impl HttpRunSource {
    pub fn new(
        endpoint: Url,
        plot_endpoint: Option<Url>,
        timeout_secs: u64,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("runboard/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            plot_endpoint,
            timeout_secs,
        })
    }

    pub fn list_url(&self, query: &Query) -> Url {
        with_pairs(&self.endpoint, query.to_pairs())
    }

    pub fn plot_url(&self, request: &PlotRequest) -> Option<Url> {
        self.plot_endpoint
            .as_ref()
            .map(|base| with_pairs(base, request.to_pairs()))
    }

    async fn get_text(&self, url: Url) -> Result<String, FetchError> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        Ok(body)
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Transport(err)
        }
    }
}

#[async_trait]
impl RunSource for HttpRunSource {
    async fn list_runs(&self, query: &Query) -> Result<String, FetchError> {
        self.get_text(self.list_url(query)).await
    }

    async fn plot_metrics(&self, request: &PlotRequest) -> Result<String, FetchError> {
        let url = self
            .plot_url(request)
            .ok_or_else(|| FetchError::Unavailable("no plot endpoint configured".to_string()))?;
        self.get_text(url).await
    }
}

fn with_pairs(base: &Url, pairs: Vec<(String, String)>) -> Url {
    let mut url = base.clone();
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(&key, &value);
        }
    }
    url
}

const MAX_ERROR_BODY: usize = 200;

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
