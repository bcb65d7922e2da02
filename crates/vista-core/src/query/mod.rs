//! Client-side query engine: predicates, free-text search, stable sort and pagination over an in-memory slice.
//!
//! [`apply`] is a pure function of `(items, query)`; it never mutates the base collection.

use std::{cmp::Ordering, fmt, sync::Arc};

pub const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 1000;

/// Extracts a searchable text field from an item.
pub type FieldAccessor<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Orders two items; used with a stable sort.
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Body of a named predicate.
pub enum Filter<T> {
    /// Explicit "all" sentinel: always true.
    Any,
    /// Keep items for which the closure returns `true`.
    Match(Arc<dyn Fn(&T) -> bool + Send + Sync>),
}

impl<T> Filter<T> {
    pub fn matching(f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Filter::Match(Arc::new(f))
    }

    /// `None` selects the [`Filter::Any`] sentinel, `Some(v)` keeps items whose key equals `v`.
    pub fn eq_by<K>(value: Option<K>, key: impl Fn(&T) -> K + Send + Sync + 'static) -> Self
    where
        K: PartialEq + Send + Sync + 'static,
    {
        match value {
            None => Filter::Any,
            Some(v) => Filter::matching(move |item| key(item) == v),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Filter::Any)
    }

    fn test(&self, item: &T) -> bool {
        match self {
            Filter::Any => true,
            Filter::Match(f) => f(item),
        }
    }
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        match self {
            Filter::Any => Filter::Any,
            Filter::Match(f) => Filter::Match(Arc::clone(f)),
        }
    }
}

/// A named, independently replaceable filter.
pub struct Predicate<T> {
    name: &'static str,
    filter: Filter<T>,
}

impl<T> Predicate<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn filter(&self) -> &Filter<T> {
        &self.filter
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            filter: self.filter.clone(),
        }
    }
}

/// Filter / search / sort / page configuration.
///
/// Immutable: every `with_*` call consumes the query and returns the updated one.
pub struct QuerySpec<T> {
    predicates: Vec<Predicate<T>>,
    search_term: String,
    search_fields: Vec<FieldAccessor<T>>,
    sort: Option<Comparator<T>>,
    page_size: usize,
    page: usize,
}

impl<T> QuerySpec<T> {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
            search_term: String::new(),
            search_fields: Vec::new(),
            sort: None,
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }

    /// Set (or replace, by name) a predicate.
    pub fn with_filter(mut self, name: &'static str, filter: Filter<T>) -> Self {
        match self.predicates.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.filter = filter,
            None => self.predicates.push(Predicate { name, filter }),
        }
        self
    }

    pub fn with_predicate(
        self,
        name: &'static str,
        f: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.with_filter(name, Filter::matching(f))
    }

    /// Reset a named predicate to the "all" sentinel.
    pub fn with_any(self, name: &'static str) -> Self {
        self.with_filter(name, Filter::Any)
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_search_field(mut self, field: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.search_fields.push(Arc::new(field));
        self
    }

    pub fn with_sort(mut self, cmp: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) -> Self {
        self.sort = Some(Arc::new(cmp));
        self
    }

    pub fn without_sort(mut self) -> Self {
        self.sort = None;
        self
    }

    /// Page size is kept in `[1, 1000]`.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Pages are 1-based; `0` is treated as `1`.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    /// Same query with `page` clamped against a filtered count.
    pub fn clamped(mut self, filtered: usize) -> Self {
        self.page = clamp_page(self.page, page_count(filtered, self.page_size));
        self
    }

    pub fn predicates(&self) -> &[Predicate<T>] {
        &self.predicates
    }

    pub fn predicate(&self, name: &str) -> Option<&Predicate<T>> {
        self.predicates.iter().find(|p| p.name == name)
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn has_sort(&self) -> bool {
        self.sort.is_some()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Predicates AND search; ignores sort and pagination.
    pub fn matches(&self, item: &T) -> bool {
        self.passes_predicates(item) && self.passes_search(item, &self.needle())
    }

    /// Number of items in `items` that [`matches`](Self::matches).
    pub fn count_matching(&self, items: &[T]) -> usize {
        let needle = self.needle();
        items
            .iter()
            .filter(|item| self.passes_predicates(item) && self.passes_search(item, &needle))
            .count()
    }

    fn needle(&self) -> String {
        self.search_term.trim().to_lowercase()
    }

    fn passes_predicates(&self, item: &T) -> bool {
        self.predicates.iter().all(|p| p.filter.test(item))
    }

    fn passes_search(&self, item: &T, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.search_fields
            .iter()
            .any(|field| field(item).to_lowercase().contains(needle))
    }
}

impl<T> Default for QuerySpec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for QuerySpec<T> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
            search_term: self.search_term.clone(),
            search_fields: self.search_fields.clone(),
            sort: self.sort.clone(),
            page_size: self.page_size,
            page: self.page,
        }
    }
}

impl<T> fmt::Debug for QuerySpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active: Vec<&str> = self
            .predicates
            .iter()
            .filter(|p| !p.filter.is_any())
            .map(|p| p.name)
            .collect();
        f.debug_struct("QuerySpec")
            .field("active_predicates", &active)
            .field("search_term", &self.search_term)
            .field("search_fields", &self.search_fields.len())
            .field("sorted", &self.sort.is_some())
            .field("page_size", &self.page_size)
            .field("page", &self.page)
            .finish()
    }
}

/// One rendered page of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub items: Vec<T>,
    /// Count after filtering and search, before pagination.
    pub total: usize,
    /// Always at least 1.
    pub total_pages: usize,
    /// Effective page after clamping.
    pub page: usize,
}

impl<T> QueryResult<T> {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Number of pages for `total` items; an empty result still has one page.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Derive one page from `items` under `query`.
pub fn apply<T: Clone>(items: &[T], query: &QuerySpec<T>) -> QueryResult<T> {
    let needle = query.needle();

    let mut filtered: Vec<&T> = items
        .iter()
        .filter(|item| query.passes_predicates(item))
        .filter(|item| query.passes_search(item, &needle))
        .collect();

    if let Some(cmp) = &query.sort {
        // `sort_by` is stable: ties keep their prior relative order.
        filtered.sort_by(|a, b| cmp(*a, *b));
    }

    let total = filtered.len();
    let total_pages = page_count(total, query.page_size);
    let page = clamp_page(query.page, total_pages);

    let items = filtered
        .into_iter()
        .skip((page - 1) * query.page_size)
        .take(query.page_size)
        .cloned()
        .collect();

    QueryResult {
        items,
        total,
        total_pages,
        page,
    }
}
