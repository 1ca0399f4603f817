//! Posting cards from a rendered search-result page.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

use super::selectors::SelectorPolicy;
use crate::browser::{DriverResult, ElementHandle, PageDriver};

/// Scroll-and-reharvest passes before giving up on list growth.
pub const MAX_SCROLL_PASSES: usize = 5;
const SCROLL_STEP_PX: i64 = 1200;
const SNIPPET_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostingDescriptor {
    /// Re-resolvable selector of the card's link in the live page.
    #[serde(skip)]
    pub handle: Option<ElementHandle>,
    /// Absolute URL without query string.
    pub detail_url: String,
    pub platform_id: Option<String>,
    pub title: Option<String>,
    pub employer: Option<String>,
    pub location: Option<String>,
    pub eligibility_hint: bool,
    pub already_applied_hint: bool,
    #[serde(skip)]
    pub raw_html_snippet: String,
}

/// Path segment after `view`, else the last non-empty segment.
pub fn platform_id_from_url(url: &str) -> Option<String> {
    let path = match url::Url::parse(url) {
        Ok(u) => u.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(pos) = segments.iter().position(|s| *s == "view") {
        if let Some(id) = segments.get(pos + 1) {
            return Some(id.to_string());
        }
    }
    segments.last().map(|s| s.to_string())
}

fn strip_query(url: &str) -> String {
    url.split(['?', '#']).next().unwrap_or_default().to_string()
}

fn absolutize(base: &str, href: &str) -> Option<String> {
    let base = url::Url::parse(base).ok()?;
    base.join(href.trim()).ok().map(|u| u.to_string())
}

fn first_text(card: &ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    for sel in selectors {
        if let Some(el) = card.select(sel).next() {
            let text = el
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn first_href(card: &ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    for sel in selectors {
        if let Some(href) = card
            .select(sel)
            .filter_map(|a| a.value().attr("href"))
            .find(|h| !h.trim().is_empty())
        {
            return Some(href.to_string());
        }
    }
    // The card itself may be the anchor.
    card.value().attr("href").map(|h| h.to_string())
}

fn parse_all(raw: &[String]) -> Vec<Selector> {
    raw.iter().filter_map(|s| Selector::parse(s).ok()).collect()
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Parse up to `limit` distinct postings out of `html`.
pub fn harvest(html: &str, policy: &SelectorPolicy, limit: usize) -> Vec<PostingDescriptor> {
    let document = Html::parse_document(html);

    let mut cards: Vec<ElementRef<'_>> = Vec::new();
    for raw in &policy.card_selectors {
        let Ok(sel) = Selector::parse(raw) else {
            continue;
        };
        cards = document.select(&sel).collect();
        if !cards.is_empty() {
            debug!("harvester: {} cards via '{}'", cards.len(), raw);
            break;
        }
    }

    let links = parse_all(&policy.card_link_selectors);
    let titles = parse_all(&policy.card_title_selectors);
    let employers = parse_all(&policy.card_employer_selectors);
    let locations = parse_all(&policy.card_location_selectors);

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for card in cards {
        if out.len() >= limit {
            break;
        }
        let Some(href) = first_href(&card, &links) else {
            continue;
        };
        let Some(absolute) = absolutize(&policy.base_url, &href) else {
            continue;
        };
        let detail_url = strip_query(&absolute);
        if !seen.insert(detail_url.clone()) {
            continue;
        }

        let outer = card.html();
        let folded = outer.to_lowercase();
        let platform_id = platform_id_from_url(&detail_url);

        out.push(PostingDescriptor {
            handle: platform_id
                .as_deref()
                .map(|id| ElementHandle::new(policy.posting_link(id).css_part())),
            detail_url,
            platform_id,
            title: first_text(&card, &titles),
            employer: first_text(&card, &employers),
            location: first_text(&card, &locations),
            eligibility_hint: policy.one_click_tokens.iter().any(|t| folded.contains(t.as_str())),
            already_applied_hint: policy.applied_tokens.iter().any(|t| folded.contains(t.as_str())),
            raw_html_snippet: truncate_chars(&outer, SNIPPET_MAX_CHARS),
        });
    }
    out
}

/// Harvest, then scroll and re-harvest while the list keeps growing.
pub async fn harvest_with_scroll(
    driver: &dyn PageDriver,
    policy: &SelectorPolicy,
    limit: usize,
) -> DriverResult<Vec<PostingDescriptor>> {
    let mut postings = harvest(&driver.page_source().await?, policy, limit);
    for pass in 0..MAX_SCROLL_PASSES {
        if postings.len() >= limit {
            break;
        }
        driver.scroll_page(SCROLL_STEP_PX).await?;
        driver.safe_sleep(1.0, "list lazy-load").await;
        let next = harvest(&driver.page_source().await?, policy, limit);
        if next.len() <= postings.len() {
            debug!("harvester: no growth after scroll pass {}", pass + 1);
            break;
        }
        postings = next;
    }
    info!("📝 {} postings harvested (limit={})", postings.len(), limit);
    Ok(postings)
}
