//! Filtered job-search URLs.
//!
//! The site's filter UI is built from query parameters, so the engine skips
//! it and navigates straight to the URL built here.

use serde::{Deserialize, Serialize};
use url::Url;

pub const SEARCH_BASE_URL: &str = "https://www.linkedin.com/jobs/search/";

/// Region label used when a configured region is not in [`GEO_IDS`].
pub const FALLBACK_REGION: &str = "Brasil";

/// Known region ids. Lookup is exact (case-insensitive, trimmed).
pub const GEO_IDS: &[(&str, &str)] = &[
    ("Brasil", "1047466682"),
    ("São Paulo", "106057199"),
    ("São Paulo, SP", "104176396"),
];

const ORIGIN: &str = "JOB_SEARCH_PAGE_JOB_FILTER";

#[derive(Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    Date,
}

impl SortOrder {
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::Relevance => "R",
            SortOrder::Date => "DD",
        }
    }

    pub fn from_param(raw: &str) -> Option<Self> {
        match raw {
            "R" => Some(SortOrder::Relevance),
            "DD" => Some(SortOrder::Date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keywords: String,
    pub region: String,
    pub distance_km: Option<u32>,
    pub one_click_only: bool,
    pub sort: SortOrder,
}

/// Decoded form of a search URL. `geo_id` is the mapped region id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub keywords: String,
    pub geo_id: String,
    pub distance_km: Option<u32>,
    pub one_click_only: bool,
    pub sort: SortOrder,
}

/// Map a region label to its id, falling back to the whole country.
pub fn geo_id_for(region: &str) -> &'static str {
    let wanted = region.trim().to_lowercase();
    GEO_IDS
        .iter()
        .find(|(name, _)| name.to_lowercase() == wanted)
        .or_else(|| GEO_IDS.iter().find(|(name, _)| *name == FALLBACK_REGION))
        .map(|(_, id)| *id)
        .unwrap_or("1047466682")
}

pub fn build_search_url(query: &SearchQuery) -> String {
    let mut url = match Url::parse(SEARCH_BASE_URL) {
        Ok(u) => u,
        Err(_) => return SEARCH_BASE_URL.to_string(),
    };
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("keywords", &query.keywords);
        pairs.append_pair("geoId", geo_id_for(&query.region));
        if let Some(d) = query.distance_km {
            pairs.append_pair("distance", &d.to_string());
        }
        if query.one_click_only {
            pairs.append_pair("f_AL", "true");
        }
        pairs.append_pair("origin", ORIGIN);
        pairs.append_pair("refresh", "true");
        pairs.append_pair("sortBy", query.sort.as_param());
    }
    url.to_string()
}

/// Inverse of [`build_search_url`]. `None` when the URL is not a job search.
pub fn parse_search_url(raw: &str) -> Option<SearchParams> {
    let url = Url::parse(raw).ok()?;
    if !url.path().starts_with("/jobs/search") {
        return None;
    }
    let mut params = SearchParams {
        keywords: String::new(),
        geo_id: String::new(),
        distance_km: None,
        one_click_only: false,
        sort: SortOrder::Relevance,
    };
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            "keywords" => params.keywords = v.into_owned(),
            "geoId" => params.geo_id = v.into_owned(),
            "distance" => params.distance_km = v.parse().ok(),
            "f_AL" => params.one_click_only = v == "true",
            "sortBy" => params.sort = SortOrder::from_param(&v).unwrap_or_default(),
            _ => {}
        }
    }
    Some(params)
}
