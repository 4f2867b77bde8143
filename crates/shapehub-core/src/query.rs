//! Query engine: filtered, sorted views over the catalog.
//!
//! [`view`] is a pure function of the record set and the query parameters.
//! Filters never fail: blank or unrecognized parameters impose no constraint.
//!
//! # Matching
//!
//! - `search_text`: case-insensitive substring of the name or keyword text
//! - `category`: some normalized keyword token contains the category
//! - `user_filter`: exact uploader id
//!
//! # Ordering
//!
//! Every sort is stable, so records with equal keys keep catalog order.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use shapehub_domain::{ShapeId, ShapeRecord};

/// Sort order of a view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Catalog order as delivered by the service
    #[default]
    Catalog,
    RatingAsc,
    RatingDesc,
    DateAsc,
    DateDesc,
    /// Most downloaded first; ranked by the service
    Popular,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Catalog,
        SortKey::RatingAsc,
        SortKey::RatingDesc,
        SortKey::DateAsc,
        SortKey::DateDesc,
        SortKey::Popular,
    ];

    /// Parse a sort key; unknown values fall back to catalog order.
    ///
    /// Accepts both `date-desc` and `date_desc` spellings.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().replace('_', "-").as_str() {
            "rating-asc" => SortKey::RatingAsc,
            "rating-desc" => SortKey::RatingDesc,
            "date-asc" => SortKey::DateAsc,
            "date-desc" => SortKey::DateDesc,
            "popular" => SortKey::Popular,
            _ => SortKey::Catalog,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Catalog => "catalog",
            SortKey::RatingAsc => "rating-asc",
            SortKey::RatingDesc => "rating-desc",
            SortKey::DateAsc => "date-asc",
            SortKey::DateDesc => "date-desc",
            SortKey::Popular => "popular",
        }
    }

    /// Value of the service's `sort` parameter, if any
    pub fn service_param(&self) -> Option<&'static str> {
        match self {
            SortKey::Catalog => None,
            other => Some(other.as_str()),
        }
    }

    /// Whether the ranking must come from the service
    pub fn is_remote(&self) -> bool {
        matches!(self, SortKey::Popular)
    }

    fn compare(&self, a: &ShapeRecord, b: &ShapeRecord) -> Ordering {
        match self {
            SortKey::Catalog => Ordering::Equal,
            SortKey::RatingAsc => a.rating_value().total_cmp(&b.rating_value()),
            SortKey::RatingDesc => b.rating_value().total_cmp(&a.rating_value()),
            // Undated records sort as earliest.
            SortKey::DateAsc => a.upload_date.cmp(&b.upload_date),
            SortKey::DateDesc => b.upload_date.cmp(&a.upload_date),
            SortKey::Popular => b.download_count.cmp(&a.download_count),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SortKey {
    fn from(s: &str) -> Self {
        SortKey::parse(s)
    }
}

/// Current query of a browse session
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct QueryParameters {
    pub search_text: String,
    pub category: String,
    pub sort_key: SortKey,
    pub user_filter: String,
}

impl QueryParameters {
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_sort(mut self, sort_key: SortKey) -> Self {
        self.sort_key = sort_key;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user_filter = user.into();
        self
    }

    /// Whether no filter is active (sort order aside)
    pub fn is_unfiltered(&self) -> bool {
        self.search_text.trim().is_empty()
            && self.category.trim().is_empty()
            && self.user_filter.trim().is_empty()
    }

    /// Whether `record` passes every active filter
    pub fn matches(&self, record: &ShapeRecord) -> bool {
        Matcher::new(self).matches(record)
    }
}

/// How a query change is served
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryMode {
    /// Recompute from the records already in memory
    Local,
    /// Reload the catalog with the service-side sort first
    Remote,
}

impl QueryMode {
    /// Mode for moving from `previous` to `next`.
    ///
    /// Only switching *into* a service-ranked sort needs a reload; leaving it
    /// or changing filters under it reuses the loaded records.
    pub fn for_change(previous: &QueryParameters, next: &QueryParameters) -> Self {
        if next.sort_key.is_remote() && previous.sort_key != next.sort_key {
            QueryMode::Remote
        } else {
            QueryMode::Local
        }
    }
}

/// Query parameters normalized once per view computation
struct Matcher {
    search: String,
    category: String,
    user: String,
}

impl Matcher {
    fn new(query: &QueryParameters) -> Self {
        Self {
            search: query.search_text.trim().to_lowercase(),
            category: query.category.trim().to_lowercase(),
            user: query.user_filter.trim().to_string(),
        }
    }

    fn matches(&self, record: &ShapeRecord) -> bool {
        self.matches_search(record) && self.matches_category(record) && self.matches_user(record)
    }

    fn matches_search(&self, record: &ShapeRecord) -> bool {
        self.search.is_empty()
            || record.name.to_lowercase().contains(&self.search)
            || record.keywords.to_lowercase().contains(&self.search)
    }

    fn matches_category(&self, record: &ShapeRecord) -> bool {
        self.category.is_empty()
            || record
                .keyword_tokens()
                .any(|token| token.contains(&self.category))
    }

    fn matches_user(&self, record: &ShapeRecord) -> bool {
        self.user.is_empty() || record.uploader_id == self.user
    }
}

/// An ordered selection of catalog records
#[derive(Clone, Debug, Default)]
pub struct CatalogView {
    entries: Vec<Arc<ShapeRecord>>,
}

impl CatalogView {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<ShapeRecord>> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<ShapeRecord>> {
        self.entries.iter()
    }

    /// Entries in `range`, clamped to the view
    pub fn slice(&self, range: Range<usize>) -> &[Arc<ShapeRecord>] {
        let end = range.end.min(self.entries.len());
        let start = range.start.min(end);
        &self.entries[start..end]
    }

    pub fn ids(&self) -> Vec<ShapeId> {
        self.entries.iter().map(|r| r.id).collect()
    }
}

impl<'a> IntoIterator for &'a CatalogView {
    type Item = &'a Arc<ShapeRecord>;
    type IntoIter = std::slice::Iter<'a, Arc<ShapeRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Derive the view of `records` under `query`
pub fn view(records: &[Arc<ShapeRecord>], query: &QueryParameters) -> CatalogView {
    let matcher = Matcher::new(query);
    let mut entries: Vec<Arc<ShapeRecord>> = records
        .iter()
        .filter(|r| matcher.matches(r))
        .cloned()
        .collect();

    // slice::sort_by is stable; ties keep catalog order.
    if query.sort_key != SortKey::Catalog {
        entries.sort_by(|a, b| query.sort_key.compare(a, b));
    }

    CatalogView { entries }
}
