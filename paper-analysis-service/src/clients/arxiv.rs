use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::PaperLookup;
use crate::error::ServiceError;

pub const DEFAULT_ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Upper bound on the formatted record handed back to callers.
const MAX_RECORD_CHARS: usize = 4000;

/// arXiv asks API clients for no more than three requests per second.
pub const ARXIV_REQUEST_INTERVAL: Duration = Duration::from_millis(334);

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// arXiv lookup by identifier, returning a plain-text record of the form
///
/// ```text
/// Published: 2023-01-17
/// Title: ...
/// Authors: A, B
/// Summary: ...
/// ```
///
/// Requests are spaced by a limiter shared between clones, so concurrent
/// citation lookups queue instead of bursting.
#[derive(Clone)]
pub struct ArxivClient {
    client: Client,
    base_url: String,
    limiter: Arc<DirectLimiter>,
}

impl ArxivClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self::with_interval(client, base_url, ARXIV_REQUEST_INTERVAL)
    }

    /// Client allowing one request per `interval`.
    pub fn with_interval(client: Client, base_url: impl Into<String>, interval: Duration) -> Self {
        let quota =
            Quota::with_period(interval).unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN));
        Self {
            client,
            base_url: base_url.into(),
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

impl Default for ArxivClient {
    fn default() -> Self {
        Self::new(Client::new(), DEFAULT_ARXIV_API_URL)
    }
}

#[async_trait]
impl PaperLookup for ArxivClient {
    async fn lookup(&self, identifier: &str) -> Result<String, ServiceError> {
        let url = format!(
            "{}?id_list={}&max_results=1",
            self.base_url,
            urlencoding::encode(identifier)
        );
        self.limiter.until_ready().await;
        debug!(%url, "Querying arXiv");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::Status {
                service: "arXiv",
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let entry = parse_first_entry(&body)?.ok_or_else(|| {
            ServiceError::InvalidResponse(format!("no arXiv entry for {}", identifier))
        })?;

        info!(identifier, title = %entry.title, "arXiv record found");
        Ok(entry.format_record())
    }
}

#[derive(Debug, Default, PartialEq)]
struct ArxivEntry {
    id: String,
    published: String,
    title: String,
    authors: Vec<String>,
    summary: String,
}

impl ArxivEntry {
    fn format_record(&self) -> String {
        let published = self.published.split('T').next().unwrap_or_default();
        let record = format!(
            "Published: {}\nTitle: {}\nAuthors: {}\nSummary: {}",
            published,
            collapse(&self.title),
            self.authors.join(", "),
            self.summary.trim()
        );
        record.chars().take(MAX_RECORD_CHARS).collect()
    }

    /// arXiv answers unknown ids with a pseudo-entry pointing at its error API.
    fn is_error(&self) -> bool {
        self.id.contains("/api/errors") || self.title.trim() == "Error"
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    None,
    Id,
    Published,
    Title,
    Summary,
    AuthorName,
}

/// Parse the Atom feed and return its first entry, if any.
fn parse_first_entry(xml: &str) -> Result<Option<ArxivEntry>, ServiceError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut in_entry = false;
    let mut in_author = false;
    let mut field = Field::None;
    let mut entry = ArxivEntry::default();
    let mut author_name = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"entry" => {
                    in_entry = true;
                    entry = ArxivEntry::default();
                }
                b"id" if in_entry && !in_author => field = Field::Id,
                b"published" if in_entry => field = Field::Published,
                b"title" if in_entry => field = Field::Title,
                b"summary" if in_entry => field = Field::Summary,
                b"author" if in_entry => {
                    in_author = true;
                    author_name.clear();
                }
                b"name" if in_author => field = Field::AuthorName,
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default();
                match field {
                    Field::Id => entry.id.push_str(&text),
                    Field::Published => entry.published.push_str(&text),
                    Field::Title => entry.title.push_str(&text),
                    Field::Summary => entry.summary.push_str(&text),
                    Field::AuthorName => author_name.push_str(&text),
                    Field::None => {}
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"entry" => {
                    return Ok(if entry.is_error() { None } else { Some(entry) });
                }
                b"author" => {
                    let name = author_name.trim();
                    if !name.is_empty() {
                        entry.authors.push(name.to_string());
                    }
                    in_author = false;
                }
                _ => field = Field::None,
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ServiceError::InvalidResponse(format!(
                    "arXiv XML parse error: {}",
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(None)
}
