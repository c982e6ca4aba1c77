use crate::model::{Program, ProgramsResponse};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

const ANNICT_API_BASE: &str = "https://api.annict.com/";

// Backstop against a server that keeps handing out next_page links.
const MAX_PAGES: u32 = 20;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("annict rejected the access token (HTTP {0})")]
    Unauthorized(StatusCode),
    #[error("annict error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to reach annict: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid annict URL: {0}")]
    InvalidUrl(String),
}

/// Source of candidate broadcast occurrences for one run.
#[async_trait]
pub trait ProgramSource: Send + Sync {
    /// Fetch the unwatched occurrences the upstream considers candidates as
    /// of `today`. An empty vec means "nothing to notify", never an error.
    async fn fetch(&self, today: NaiveDate) -> Result<Vec<Program>, SourceError>;
}

#[derive(Clone)]
pub struct AnnictClient {
    http: Client,
    base_url: Url,
    token: String,
    per_page: u32,
    fetch_all_pages: bool,
}

impl fmt::Debug for AnnictClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnictClient")
            .field("base_url", &self.base_url)
            .field("per_page", &self.per_page)
            .finish_non_exhaustive()
    }
}

impl AnnictClient {
    pub fn new(token: String, per_page: u32, fetch_all_pages: bool) -> Self {
        let base_url = Url::parse(ANNICT_API_BASE).expect("valid default Annict URL");
        Self::with_base_url(token, per_page, fetch_all_pages, base_url)
    }

    pub fn with_base_url(
        token: String,
        per_page: u32,
        fetch_all_pages: bool,
        base_url: Url,
    ) -> Self {
        let http = Client::builder()
            .user_agent("annict-notify/0.1")
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            token,
            per_page,
            fetch_all_pages,
        }
    }

    /// Build the GET request for one page of `/v1/me/programs`. The upstream
    /// filters only bound the payload; same-day matching happens client-side.
    pub fn build_request(&self, today: NaiveDate, page: u32) -> Result<reqwest::Request, SourceError> {
        let mut endpoint = self
            .base_url
            .join("v1/me/programs")
            .map_err(|err| SourceError::InvalidUrl(err.to_string()))?;
        {
            let mut query = endpoint.query_pairs_mut();
            query
                .append_pair("filter_unwatched", "true")
                .append_pair("sort_started_at", "desc")
                .append_pair("filter_started_at_lt", &today.format("%Y-%m-%d").to_string())
                .append_pair("per_page", &self.per_page.to_string());
            if page > 1 {
                query.append_pair("page", &page.to_string());
            }
        }
        self.http
            .get(endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .build()
            .map_err(SourceError::from)
    }

    async fn fetch_page(&self, today: NaiveDate, page: u32) -> Result<ProgramsResponse, SourceError> {
        let request = self.build_request(today, page)?;
        debug!(url = %request.url(), "fetching annict programs");
        let res = self.http.execute(request).await?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SourceError::Unauthorized(status));
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body });
        }

        // A null or undeserializable body is "nothing to notify", not an error.
        match res.json::<Option<ProgramsResponse>>().await {
            Ok(Some(body)) => Ok(body),
            Ok(None) => Ok(ProgramsResponse::default()),
            Err(err) => {
                warn!(%err, "unusable annict response body; treating as zero items");
                Ok(ProgramsResponse::default())
            }
        }
    }
}

#[async_trait]
impl ProgramSource for AnnictClient {
    async fn fetch(&self, today: NaiveDate) -> Result<Vec<Program>, SourceError> {
        let first = self.fetch_page(today, 1).await?;
        let mut programs = first.programs;
        if !self.fetch_all_pages {
            return Ok(programs);
        }

        let mut fetched_pages = 1;
        let mut next = first.next_page;
        while let Some(page) = next {
            fetched_pages += 1;
            if fetched_pages > MAX_PAGES {
                warn!(page, "stopping pagination at {MAX_PAGES} pages");
                break;
            }
            let body = self.fetch_page(today, page).await?;
            programs.extend(body.programs);
            next = body.next_page;
        }
        Ok(programs)
    }
}
