use crate::models::IndexEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Empty query: go back to the first page.
    Restore,
    Matches(Vec<IndexEntry>),
    NoMatches,
}

pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Parsed id for an all-digit query; `None` for anything else.
fn numeric(query: &str) -> Option<u32> {
    if !query.is_empty() && query.bytes().all(|b| b.is_ascii_digit()) {
        query.parse().ok()
    } else {
        None
    }
}

/// Entries whose name contains the query, or whose id equals it when the
/// query is a number. Index order is kept.
pub fn filter_index(index: &[IndexEntry], query: &str) -> Filter {
    let q = normalize(query);
    if q.is_empty() {
        return Filter::Restore;
    }
    let id = numeric(&q);

    let matches: Vec<IndexEntry> = index
        .iter()
        .filter(|e| e.name.to_lowercase().contains(&q) || (id.is_some() && e.id() == id))
        .cloned()
        .collect();

    if matches.is_empty() {
        Filter::NoMatches
    } else {
        Filter::Matches(matches)
    }
}
