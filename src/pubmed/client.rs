use crate::config::ClientConfig;
use crate::demo::demonstration_articles;
use crate::error::{AssistantError, Result};
use crate::notice::Notice;
use crate::pubmed::models::ArticleRecord;
use crate::pubmed::parser::{pair_with_requested, parse_articles_from_xml};
use crate::pubmed::responses::ESearchResult;
use reqwest::{Client, Response};
use tracing::{debug, info, instrument, warn};

/// Client for the PubMed ESearch and EFetch endpoints
#[derive(Clone, Debug)]
pub struct PubMedClient {
    client: Client,
    base_url: String,
    config: ClientConfig,
}

/// Result count with any notice raised while fetching it
#[derive(Debug, Clone, PartialEq)]
pub struct CountOutcome {
    pub count: u64,
    pub notices: Vec<Notice>,
}

/// Articles for a query, with notices describing any degradation
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub articles: Vec<ArticleRecord>,
    /// True when `articles` is the demonstration set rather than PubMed data
    pub demonstration: bool,
    pub notices: Vec<Notice>,
}

impl PubMedClient {
    /// Create a new PubMed client with default configuration (10 second timeout)
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_assistant::PubMedClient;
    ///
    /// let client = PubMedClient::new().unwrap();
    /// ```
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::new())
    }

    /// Create a new PubMed client with custom configuration
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_assistant::{ClientConfig, PubMedClient};
    ///
    /// let config = ClientConfig::new()
    ///     .with_api_key("your_api_key_here")
    ///     .with_email("researcher@university.edu");
    ///
    /// let client = PubMedClient::with_config(config).unwrap();
    /// ```
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.effective_user_agent())
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        let base_url = config.effective_base_url().to_string();
        Self {
            client,
            base_url,
            config,
        }
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}/{}?", self.base_url, endpoint);

        let api_params = self.config.build_api_params();
        let all = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .chain(api_params);

        for (i, (key, value)) in all.enumerate() {
            if i > 0 {
                url.push('&');
            }
            url.push_str(&key);
            url.push('=');
            url.push_str(&urlencoding::encode(&value));
        }

        url
    }

    async fn get(&self, url: &str) -> Result<Response> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            warn!("API request failed with status: {}", response.status());
            return Err(AssistantError::ApiError {
                message: format!(
                    "HTTP {}: {}",
                    response.status(),
                    response
                        .status()
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                ),
            });
        }

        Ok(response)
    }

    /// Total number of PubMed records matching a query
    ///
    /// # Errors
    ///
    /// * `AssistantError::RequestError` - If the HTTP request fails
    /// * `AssistantError::JsonError` - If the response is not ESearch JSON
    /// * `AssistantError::InvalidCount` - If the count is missing or not an integer
    #[instrument(skip(self), fields(query = %query))]
    pub async fn fetch_count(&self, query: &str) -> Result<u64> {
        let url = self.endpoint_url(
            "esearch.fcgi",
            &[("db", "pubmed"), ("term", query), ("retmode", "json")],
        );

        debug!("Making ESearch count request");
        let body = self.get(&url).await?.text().await?;
        let search_result: ESearchResult = serde_json::from_str(&body)?;

        let raw = search_result.esearchresult.count.unwrap_or_default();
        let count = raw
            .trim()
            .parse::<u64>()
            .map_err(|_| AssistantError::InvalidCount { value: raw.clone() })?;

        info!(count, "Result count fetched");
        Ok(count)
    }

    /// PMIDs of up to `max_results` matching records, in PubMed's order
    #[instrument(skip(self), fields(query = %query, max_results = max_results))]
    pub async fn search_ids(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        if query.trim().is_empty() {
            debug!("Empty query provided, returning empty results");
            return Ok(Vec::new());
        }

        let retmax = max_results.to_string();
        let url = self.endpoint_url(
            "esearch.fcgi",
            &[
                ("db", "pubmed"),
                ("term", query),
                ("retmax", &retmax),
                ("retmode", "json"),
            ],
        );

        debug!("Making ESearch request");
        let body = self.get(&url).await?.text().await?;
        let search_result: ESearchResult = serde_json::from_str(&body)?;
        let pmids = search_result.esearchresult.idlist;

        info!(results_found = pmids.len(), "Search completed successfully");
        Ok(pmids)
    }

    /// Fetch and normalize the records for a list of PMIDs in one EFetch call
    ///
    /// The returned list follows the order of `pmids`; records are matched by
    /// the PMID inside each `<PubmedArticle>`.
    #[instrument(skip(self, pmids), fields(requested = pmids.len()))]
    pub async fn fetch_records(&self, pmids: &[String]) -> Result<Vec<ArticleRecord>> {
        if pmids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = pmids.join(",");
        let url = self.endpoint_url(
            "efetch.fcgi",
            &[("db", "pubmed"), ("id", &ids), ("retmode", "xml")],
        );

        debug!("Making EFetch request");
        let xml = self.get(&url).await?.text().await?;
        let records = parse_articles_from_xml(&xml)?;
        let parsed = records.len();
        let paired = pair_with_requested(records, pmids);

        info!(parsed, paired = paired.len(), "Fetched article records");
        Ok(paired)
    }

    /// Paired records and the number of PMIDs requested; `None` when the search matched nothing
    async fn search_then_fetch(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Option<(Vec<ArticleRecord>, usize)>> {
        let pmids = self.search_ids(query, max_results).await?;
        if pmids.is_empty() {
            return Ok(None);
        }
        let records = self.fetch_records(&pmids).await?;
        Ok(Some((records, pmids.len())))
    }

    /// Result count that degrades to `0` with an error notice on any failure
    pub async fn result_count(&self, query: &str) -> CountOutcome {
        match self.fetch_count(query).await {
            Ok(count) => CountOutcome {
                count,
                notices: Vec::new(),
            },
            Err(e) => {
                warn!(error = %e, "Result count unavailable");
                CountOutcome {
                    count: 0,
                    notices: vec![Notice::error(format!("Error fetching result count: {e}"))],
                }
            }
        }
    }

    /// Search and fetch articles, never failing
    ///
    /// With `use_demo_data`, an empty result or any failure yields the fixed
    /// demonstration articles; otherwise an empty list. Either way the caller
    /// receives notices to show the user. Requested PMIDs missing from the
    /// EFetch response are reported as a warning; when none survive, the
    /// result is treated as empty.
    pub async fn search_and_fetch(
        &self,
        query: &str,
        max_results: usize,
        use_demo_data: bool,
    ) -> FetchOutcome {
        match self.search_then_fetch(query, max_results).await {
            Ok(Some((articles, requested))) => {
                let mut notices = Vec::new();
                let missing = requested.saturating_sub(articles.len());
                if missing > 0 {
                    warn!(requested, missing, "EFetch did not return every requested record");
                    notices.push(Notice::warning(format!(
                        "{missing} of {requested} articles could not be retrieved from PubMed."
                    )));
                }

                if articles.is_empty() {
                    no_articles(use_demo_data, notices)
                } else {
                    FetchOutcome {
                        articles,
                        demonstration: false,
                        notices,
                    }
                }
            }
            Ok(None) => no_articles(use_demo_data, Vec::new()),
            Err(e) => {
                warn!(error = %e, "PubMed fetch failed");
                let mut notices = vec![Notice::error(format!("Error during PubMed fetch: {e}"))];
                if use_demo_data {
                    notices.push(Notice::warning("An error occurred. Showing simulated data."));
                }
                FetchOutcome {
                    articles: if use_demo_data {
                        demonstration_articles()
                    } else {
                        Vec::new()
                    },
                    demonstration: use_demo_data,
                    notices,
                }
            }
        }
    }
}

/// Outcome for a search that produced no usable records
fn no_articles(use_demo_data: bool, mut notices: Vec<Notice>) -> FetchOutcome {
    if use_demo_data {
        notices.push(Notice::warning("No articles found. Showing simulated data."));
        FetchOutcome {
            articles: demonstration_articles(),
            demonstration: true,
            notices,
        }
    } else {
        notices.push(Notice::info("No articles found."));
        FetchOutcome {
            articles: Vec::new(),
            demonstration: false,
            notices,
        }
    }
}
