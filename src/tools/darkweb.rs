//! Dark-web index search
//!
//! Public indexes (IntelX, Ahmia, ExploitDB) are fetched and scraped.
//! Providers that need credentials are emitted as manual references with a
//! deep link, and a scrape that finds nothing falls back to the same.

use crate::dispatch::{Dispatcher, ProviderError, ProviderJob};
use crate::model::{AggregatedReport, NormalizedRecord, Outcome, QueryRequest};
use crate::parse::html::{element_text, first_attr, first_text, resolve_link, selector};
use crate::parse::ParseError;
use crate::registry::{self, DarkWebProvider, DarkWebRule, SearchType, DARK_WEB_PROVIDERS};
use crate::validate::validate_query;
use scraper::Html;
use std::sync::Arc;
use url::Url;

/// Searches the dark-web providers that serve `search_type`
///
/// # Arguments
///
/// * `dispatcher` - Shared query dispatcher
/// * `request` - Search query, provider selection and per-provider limit
/// * `search_type` - Which provider scopes to include
///
/// # Returns
///
/// * `Ok(AggregatedReport)` - Records per provider, or a single "General"
///   no-results record when no provider applies
/// * `Err(OsintError)` - Empty query or unknown provider
pub async fn search(
    dispatcher: Arc<Dispatcher>,
    request: &QueryRequest,
    search_type: SearchType,
) -> crate::Result<AggregatedReport> {
    let query = validate_query(&request.subject)?;
    let providers: Vec<&'static DarkWebProvider> =
        registry::select(DARK_WEB_PROVIDERS, &request.providers)?
            .into_iter()
            .filter(|p| p.serves(search_type))
            .collect();

    tracing::info!(
        "Dark-web search ({}) for '{}' across {} providers",
        search_type,
        query,
        providers.len()
    );

    let limit = request.limit;
    let jobs = providers
        .into_iter()
        .map(|provider| {
            let dispatcher = dispatcher.clone();
            let query = query.clone();
            ProviderJob::new(provider.descriptor.id, async move {
                let mut records = query_provider(&dispatcher, provider, &query).await?;
                records.truncate(limit.max(1));
                Ok(records)
            })
        })
        .collect();

    let mut report = dispatcher.fan_out().run(jobs).await;
    report.ensure_not_empty(&format!(
        "No results found for '{}' with search type '{}'",
        query, search_type
    ));

    Ok(report)
}

async fn query_provider(
    dispatcher: &Dispatcher,
    provider: &DarkWebProvider,
    query: &str,
) -> Result<Vec<NormalizedRecord>, ProviderError> {
    if !provider.rule.is_live() {
        return Ok(vec![offline_record(provider, query)]);
    }

    let url = provider.descriptor.render_encoded(query);
    let response = dispatcher.get_ok(&url).await?;

    let records = match provider.rule {
        DarkWebRule::IntelX => extract_intelx(&response.body)?,
        DarkWebRule::Ahmia => {
            let base = Url::parse(&response.final_url)
                .map_err(|e| ParseError::Shape(format!("bad final URL: {}", e)))?;
            extract_ahmia(&response.body, &base)?
        }
        DarkWebRule::ExploitDb => extract_exploitdb(&response.body)?,
        DarkWebRule::Manual | DarkWebRule::Dork | DarkWebRule::NoteOnly => Vec::new(),
    };

    if records.is_empty() {
        tracing::warn!(
            "{} returned no parseable results, falling back to manual search",
            provider.descriptor.id
        );
        return Ok(vec![manual_record(provider, query)]);
    }

    Ok(records)
}

/// Deep link to run the search by hand
fn manual_record(provider: &DarkWebProvider, query: &str) -> NormalizedRecord {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    NormalizedRecord::manual_reference(
        provider.descriptor.id,
        provider.manual_title,
        provider.description.replace("{subject}", query),
        provider.manual_url.replace("{subject}", &encoded),
        provider
            .descriptor
            .note
            .unwrap_or("Automated extraction found no structured results."),
    )
}

/// Record for providers that are never fetched
fn offline_record(provider: &DarkWebProvider, query: &str) -> NormalizedRecord {
    match provider.rule {
        DarkWebRule::NoteOnly => NormalizedRecord::unsupported(
            provider.descriptor.id,
            provider.descriptor.note.unwrap_or_default(),
        )
        .with("title", provider.manual_title)
        .with("description", provider.description.replace("{subject}", query))
        .with("note", provider.descriptor.note.unwrap_or_default()),
        _ => manual_record(provider, query),
    }
}

/// Extracts IntelX result cards
pub fn extract_intelx(html: &str) -> Result<Vec<NormalizedRecord>, ParseError> {
    let document = Html::parse_document(html);
    let item_sel = selector(".results-container .result-item")?;
    let title_sel = selector("h4")?;
    let desc_sel = selector("p.description")?;
    let date_sel = selector("span.date")?;

    Ok(document
        .select(&item_sel)
        .map(|item| {
            NormalizedRecord::data("IntelX", Outcome::Present)
                .with(
                    "title",
                    first_text(item, &title_sel).unwrap_or_else(|| "Unknown".to_string()),
                )
                .with(
                    "description",
                    first_text(item, &desc_sel)
                        .unwrap_or_else(|| "No description available".to_string()),
                )
                .with(
                    "date",
                    first_text(item, &date_sel).unwrap_or_else(|| "Unknown date".to_string()),
                )
        })
        .collect())
}

/// Extracts Ahmia results, unwrapping redirect links to the onion URL
pub fn extract_ahmia(html: &str, base_url: &Url) -> Result<Vec<NormalizedRecord>, ParseError> {
    let document = Html::parse_document(html);
    let item_sel = selector("li.result")?;
    let title_sel = selector("h4")?;
    let link_sel = selector("a.onion-link, h4 a")?;
    let desc_sel = selector("p.description, p")?;

    Ok(document
        .select(&item_sel)
        .map(|item| {
            let url = first_attr(item, &link_sel, "href")
                .and_then(|href| resolve_link(&href, base_url))
                .map(|link| unwrap_redirect(&link))
                .unwrap_or_else(|| "#".to_string());

            NormalizedRecord::data("Ahmia", Outcome::Present)
                .with(
                    "title",
                    first_text(item, &title_sel).unwrap_or_else(|| "Unknown".to_string()),
                )
                .with("url", url)
                .with(
                    "description",
                    first_text(item, &desc_sel)
                        .unwrap_or_else(|| "No description available".to_string()),
                )
        })
        .collect())
}

/// Returns the target of a search-engine redirect link, or the link itself
fn unwrap_redirect(link: &str) -> String {
    let Ok(parsed) = Url::parse(link) else {
        return link.to_string();
    };
    if !parsed.path().contains("redirect") {
        return link.to_string();
    }
    parsed
        .query_pairs()
        .find(|(key, _)| key == "redirect_url" || key == "url")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| link.to_string())
}

/// Extracts ExploitDB table rows; rows with fewer than six cells are skipped
pub fn extract_exploitdb(html: &str) -> Result<Vec<NormalizedRecord>, ParseError> {
    let document = Html::parse_document(html);
    let row_sel = selector("table#exploits-table tbody tr")?;
    let cell_sel = selector("td")?;

    let mut records = Vec::new();
    for row in document.select(&row_sel) {
        let cells: Vec<String> = row.select(&cell_sel).map(element_text).collect();
        if cells.len() < 6 {
            continue;
        }
        let id = &cells[0];
        records.push(
            NormalizedRecord::data("ExploitDB", Outcome::Present)
                .with("id", id.as_str())
                .with("title", cells[2].as_str())
                .with("date", cells[3].as_str())
                .with("type", cells[5].as_str())
                .with("url", format!("https://www.exploit-db.com/exploits/{}", id)),
        );
    }
    Ok(records)
}
