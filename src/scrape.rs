//! LeetCode problem scraping
//!
//! Resolves a problem URL to its slug, fetches the problem record from the
//! public GraphQL endpoint, and converts the HTML description to plain text
//! for context injection and the on-disk problem dump.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// GraphQL endpoint for problem lookups
const GRAPHQL_URL: &str = "https://leetcode.com/graphql";

/// Request timeout for problem fetches
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Known path shape of a problem URL
static SLUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"leetcode\.com/problems/([\w-]+)/?").expect("slug pattern is valid")
});

const PROBLEM_QUERY: &str = r"
query getQuestionDetail($titleSlug: String!) {
  question(titleSlug: $titleSlug) {
    title
    content
    exampleTestcases
    difficulty
    likes
    dislikes
    hints
  }
}
";

/// Extract the stable problem identifier from a URL
///
/// Returns `None` when the URL does not match the known problem path shape;
/// callers must treat that as an invalid reference and skip the network call.
#[must_use]
pub fn extract_slug(url: &str) -> Option<String> {
    SLUG_PATTERN
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// A scraped problem record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub title: String,
    /// HTML-formatted problem description
    pub content: String,
    pub example_testcases: String,
    pub difficulty: String,
    pub likes: i64,
    pub dislikes: i64,
    pub hints: Vec<String>,
}

impl Problem {
    /// Problem description with HTML markup stripped
    #[must_use]
    pub fn description_text(&self) -> String {
        html_to_text(&self.content)
    }

    /// Render the plain-text dump (title, difficulty, votes, description,
    /// example testcases, hints)
    #[must_use]
    pub fn dump(&self) -> String {
        let hints = if self.hints.is_empty() {
            "None".to_string()
        } else {
            self.hints.join("\n")
        };

        format!(
            "Title: {}\nDifficulty: {}\nLikes: {}, Dislikes: {}\n\n\
             Description:\n{}\n\n\
             Example Testcases:\n{}\n\n\
             Follow-up Questions / Hints:\n{}",
            self.title,
            self.difficulty,
            self.likes,
            self.dislikes,
            self.description_text(),
            self.example_testcases,
            hints,
        )
    }

    /// Write the plain-text dump to `path`, overwriting any previous scrape
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.dump())?;
        tracing::info!(path = %path.display(), title = %self.title, "saved problem dump");
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: SlugVariables<'a>,
}

#[derive(serde::Serialize)]
struct SlugVariables<'a> {
    #[serde(rename = "titleSlug")]
    title_slug: &'a str,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<QuestionData>,
}

#[derive(Deserialize)]
struct QuestionData {
    question: Option<Problem>,
}

/// Fetches problem records from LeetCode
pub struct LeetCodeClient {
    client: reqwest::Client,
}

impl LeetCodeClient {
    /// Create a new scraping client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch the problem record for `slug`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the problem does not exist.
    pub async fn fetch_problem(&self, slug: &str) -> Result<Problem> {
        tracing::debug!(slug, "fetching problem record");

        let request = GraphQlRequest {
            query: PROBLEM_QUERY,
            variables: SlugVariables { title_slug: slug },
        };

        let response = self
            .client
            .post(GRAPHQL_URL)
            .header("Content-Type", "application/json")
            .header("Referer", format!("https://leetcode.com/problems/{slug}/"))
            .header("User-Agent", "Mozilla/5.0")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, slug, "problem fetch failed");
                Error::Scrape(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Scrape(format!(
                "failed to fetch problem data (status {status})"
            )));
        }

        let body: GraphQlResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse GraphQL response");
            Error::Scrape(e.to_string())
        })?;

        let problem = body
            .data
            .and_then(|d| d.question)
            .ok_or_else(|| Error::Scrape(format!("no problem found for slug '{slug}'")))?;

        tracing::info!(slug, title = %problem.title, "fetched problem");
        Ok(problem)
    }
}

/// Strip HTML markup, keeping text content with entities decoded
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let fragment = scraper::Html::parse_fragment(html);
    fragment.root_element().text().collect()
}
