//! Filtered list host
//!
//! Fuzzy-filters a provider's item keys against the current query, orders
//! the survivors by the provider's own score and renders rows. Filtering is
//! only redone on [`FilteredList::refresh`] or a query change.

use std::cmp::Ordering;
use std::ops::Range;

use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use unicode_segmentation::UnicodeSegmentation;

use crate::provider::QuickOpenProvider;

/// A piece of rendered text with highlighted byte ranges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRegion {
    pub text: String,
    pub highlights: Vec<Range<usize>>,
}

impl TextRegion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlights: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.highlights.clear();
    }

    /// Text with highlighted ranges wrapped in `[` `]`
    pub fn marked(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + self.highlights.len() * 2);
        let mut pos = 0;
        for range in &self.highlights {
            let (Some(before), Some(hit)) = (
                self.text.get(pos..range.start),
                self.text.get(range.clone()),
            ) else {
                continue;
            };
            out.push_str(before);
            out.push('[');
            out.push_str(hit);
            out.push(']');
            pos = range.end;
        }
        out.push_str(self.text.get(pos..).unwrap_or_default());
        out
    }
}

fn query_atom(query: &str) -> Atom {
    Atom::new(
        query,
        CaseMatching::Ignore,
        Normalization::Smart,
        AtomKind::Fuzzy,
        false,
    )
}

/// Byte ranges of `text` matched by the fuzzy `query`, merged when adjacent
pub fn highlight_ranges(text: &str, query: &str) -> Vec<Range<usize>> {
    if query.is_empty() || text.is_empty() {
        return Vec::new();
    }

    let mut matcher = Matcher::new(Config::DEFAULT);
    let mut buf = Vec::new();
    let mut indices = Vec::new();
    let haystack = Utf32Str::new(text, &mut buf);
    if query_atom(query)
        .indices(haystack, &mut matcher, &mut indices)
        .is_none()
    {
        return Vec::new();
    }
    indices.sort_unstable();
    indices.dedup();

    // Matcher indices count bytes for ASCII text and grapheme clusters otherwise
    let offsets: Vec<(usize, usize)> = if text.is_ascii() {
        (0..text.len()).map(|start| (start, start + 1)).collect()
    } else {
        text.grapheme_indices(true)
            .map(|(start, grapheme)| (start, start + grapheme.len()))
            .collect()
    };

    let mut ranges: Vec<Range<usize>> = Vec::new();
    for index in indices {
        let Some(&(start, end)) = offsets.get(index as usize) else {
            continue;
        };
        match ranges.last_mut() {
            Some(last) if last.end == start => last.end = end,
            _ => ranges.push(start..end),
        }
    }
    ranges
}

/// One rendered row of the list
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    /// Provider index of the item
    pub index: usize,
    pub score: f64,
    pub title: TextRegion,
    pub subtitle: TextRegion,
}

pub struct FilteredList {
    query: String,
    /// Provider indices of matching items, best first
    rows: Vec<usize>,
    matcher: Matcher,
    refreshes: usize,
}

impl Default for FilteredList {
    fn default() -> Self {
        Self::new()
    }
}

impl FilteredList {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            rows: Vec::new(),
            matcher: Matcher::new(Config::DEFAULT),
            refreshes: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str, provider: &dyn QuickOpenProvider) {
        self.query = query.to_string();
        self.refresh(provider);
    }

    /// Provider indices of the visible rows, best first
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// How many times the list was rebuilt
    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    /// Re-filter and re-rank every item of the provider
    pub fn refresh(&mut self, provider: &dyn QuickOpenProvider) {
        self.refreshes += 1;
        let atom = query_atom(&self.query);
        let mut buf = Vec::new();

        let mut scored: Vec<(usize, f64)> = (0..provider.item_count())
            .filter(|&index| {
                if self.query.is_empty() {
                    return true;
                }
                let key = provider.item_key_at(index);
                atom.score(Utf32Str::new(&key, &mut buf), &mut self.matcher)
                    .is_some()
            })
            .map(|index| (index, provider.item_score_at(index, &self.query)))
            .collect();

        // Stable: equal scores keep provider order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        self.rows = scored.into_iter().map(|(index, _)| index).collect();

        tracing::trace!(
            "Filtered {} items to {} rows for {:?}",
            provider.item_count(),
            self.rows.len(),
            self.query
        );
    }

    /// Render up to `limit` rows
    pub fn render(&self, provider: &dyn QuickOpenProvider, limit: usize) -> Vec<RenderedRow> {
        self.rows
            .iter()
            .take(limit)
            .map(|&index| {
                let mut title = TextRegion::default();
                let mut subtitle = TextRegion::default();
                provider.render_item(index, &self.query, &mut title, &mut subtitle);
                RenderedRow {
                    index,
                    score: provider.item_score_at(index, &self.query),
                    title,
                    subtitle,
                }
            })
            .collect()
    }

    /// Select the row at `row` (an index into [`Self::rows`])
    pub fn select(&self, provider: &dyn QuickOpenProvider, row: Option<usize>) {
        let index = row.and_then(|row| self.rows.get(row).copied());
        provider.select_item(index, &self.query);
    }

    /// Text to show instead of rows, if there are none
    pub fn empty_text(&self, provider: &dyn QuickOpenProvider) -> Option<&'static str> {
        self.rows.is_empty().then(|| provider.not_found_text())
    }
}
