//! Filtering, sorting and pagination of reconciled records
//!
//! Everything here is pure: the result map is only read, and the same input
//! always yields the same page.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::num::NonZeroUsize;
use utoipa::ToSchema;

use crate::error::{Error, Result};
use crate::types::{ArchitectureStatus, PackageRecord};

/// Which side of the directory membership split to show
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MembershipView {
    /// Packages resolved through the directory
    #[default]
    Directory,
    /// Packages the directory does not list
    Unlisted,
}

/// Sort column
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Package name, lexicographic
    #[default]
    Name,
    /// Star count, unknown counts as 0
    Stars,
    /// Last update, unknown counts as the epoch
    Updated,
}

/// Sort direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// Records per page
///
/// Serialized as a positive number, or as `"all"` (also accepted: `-1`) for a
/// single page holding every record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSize {
    /// No pagination
    All,
    /// At most `n` records per page
    Fixed(NonZeroUsize),
}

impl PageSize {
    /// Fixed page size; zero is rejected
    pub fn fixed(n: usize) -> Result<Self> {
        NonZeroUsize::new(n)
            .map(PageSize::Fixed)
            .ok_or_else(|| Error::InvalidInput("page size must be at least 1".to_string()))
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Fixed(NonZeroUsize::MIN.saturating_add(9))
    }
}

impl Serialize for PageSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PageSize::All => serializer.serialize_str("all"),
            PageSize::Fixed(n) => serializer.serialize_u64(n.get() as u64),
        }
    }
}

impl<'de> Deserialize<'de> for PageSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        let invalid = |what: String| {
            serde::de::Error::custom(format!(
                "invalid page size {what}: expected a positive number or \"all\""
            ))
        };

        match Raw::deserialize(deserializer)? {
            Raw::Number(-1) => Ok(PageSize::All),
            Raw::Number(n) if n > 0 => usize::try_from(n)
                .ok()
                .and_then(NonZeroUsize::new)
                .map(PageSize::Fixed)
                .ok_or_else(|| invalid(n.to_string())),
            Raw::Number(n) => Err(invalid(n.to_string())),
            Raw::Text(text) if text.eq_ignore_ascii_case("all") => Ok(PageSize::All),
            Raw::Text(text) => text
                .parse::<usize>()
                .ok()
                .and_then(NonZeroUsize::new)
                .map(PageSize::Fixed)
                .ok_or_else(|| invalid(format!("{text:?}"))),
        }
    }
}

/// One-click filter presets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuickFilter {
    /// Only supported packages
    Supported,
    /// Only unsupported packages
    Unsupported,
    /// Only untested packages
    Untested,
    /// Only unmaintained packages, any status
    Unmaintained,
}

/// Filter, sort and page parameters for one view of a result map
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ViewQuery {
    /// Architecture statuses to keep; empty keeps all
    pub architecture: Vec<ArchitectureStatus>,
    /// Keep only unmaintained packages
    pub unmaintained_only: bool,
    /// Directory or unlisted side
    pub membership: MembershipView,
    /// Case-insensitive substring of the package name
    pub search: String,
    /// Sort column
    pub sort_key: SortKey,
    /// Sort direction
    pub sort_order: SortOrder,
    /// Records per page, or "all"
    #[schema(value_type = String, example = "10")]
    pub page_size: PageSize,
    /// 1-based page number (0 is read as 1)
    pub page: usize,
}

impl ViewQuery {
    /// Replace the filters with a preset, leaving sort and paging alone
    pub fn with_quick_filter(mut self, filter: QuickFilter) -> Self {
        let (architecture, unmaintained_only) = quick_filter(filter);
        self.architecture = architecture;
        self.unmaintained_only = unmaintained_only;
        self
    }
}

/// Filter settings for a preset: (architecture set, maintenance filter)
pub fn quick_filter(filter: QuickFilter) -> (Vec<ArchitectureStatus>, bool) {
    match filter {
        QuickFilter::Supported => (vec![ArchitectureStatus::Supported], false),
        QuickFilter::Unsupported => (vec![ArchitectureStatus::Unsupported], false),
        QuickFilter::Untested => (vec![ArchitectureStatus::Untested], false),
        QuickFilter::Unmaintained => (Vec::new(), true),
    }
}

/// Select the records one view shows, keeping their input order
///
/// The membership split comes first. Architecture and maintenance filters
/// then apply within the directory view only, combined with AND. The name
/// search applies last, on either side.
pub fn apply_filters<'a, I>(
    records: I,
    architecture: &[ArchitectureStatus],
    unmaintained_only: bool,
    membership: MembershipView,
    search: &str,
) -> Vec<&'a PackageRecord>
where
    I: IntoIterator<Item = &'a PackageRecord>,
{
    let needle = search.trim().to_lowercase();

    records
        .into_iter()
        .filter(|record| match membership {
            MembershipView::Directory => {
                !record.not_in_directory
                    && (architecture.is_empty() || architecture.contains(&record.architecture))
                    && (!unmaintained_only || record.unmaintained)
            }
            MembershipView::Unlisted => record.not_in_directory,
        })
        .filter(|record| needle.is_empty() || record.name.to_lowercase().contains(&needle))
        .collect()
}

/// One page of a sorted view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on this page
    pub items: Vec<T>,
    /// 1-based page number that was requested
    pub page: usize,
    /// Number of pages; 0 for an empty paginated view, always 1 for `All`
    pub total_pages: usize,
    /// Records across all pages
    pub total_count: usize,
}

impl<T> Page<T> {
    /// Convert the items, keeping the paging numbers
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            total_pages: self.total_pages,
            total_count: self.total_count,
        }
    }
}

fn compare(a: &PackageRecord, b: &PackageRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Stars => a.stars().cmp(&b.stars()),
        SortKey::Updated => {
            let epoch = |r: &PackageRecord| r.updated_at().map_or(0, |t| t.timestamp_millis());
            epoch(a).cmp(&epoch(b))
        }
    }
}

/// Sort (stable, ties keep input order) and cut out one page
///
/// A page past the end comes back empty; the caller clamps if it wants to.
pub fn sort_and_paginate<'a>(
    mut records: Vec<&'a PackageRecord>,
    key: SortKey,
    order: SortOrder,
    page_size: PageSize,
    page: usize,
) -> Page<&'a PackageRecord> {
    records.sort_by(|a, b| match order {
        SortOrder::Asc => compare(a, b, key),
        SortOrder::Desc => compare(b, a, key),
    });

    let total_count = records.len();
    let page = page.max(1);

    let (items, total_pages) = match page_size {
        PageSize::All => {
            let items = if page == 1 { records } else { Vec::new() };
            (items, 1)
        }
        PageSize::Fixed(size) => {
            let size = size.get();
            let total_pages = total_count.div_ceil(size);
            let items = records
                .into_iter()
                .skip((page - 1).saturating_mul(size))
                .take(size)
                .collect();
            (items, total_pages)
        }
    };

    Page {
        items,
        page,
        total_pages,
        total_count,
    }
}

/// Run a full query over a result map
pub fn run_query<'a, I>(records: I, query: &ViewQuery) -> Page<&'a PackageRecord>
where
    I: IntoIterator<Item = &'a PackageRecord>,
{
    let filtered = apply_filters(
        records,
        &query.architecture,
        query.unmaintained_only,
        query.membership,
        &query.search,
    );
    sort_and_paginate(
        filtered,
        query.sort_key,
        query.sort_order,
        query.page_size,
        query.page,
    )
}

/// Overview counts for a result map
///
/// Unlisted packages count only as unlisted, not under a status. The
/// unmaintained count spans both sides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Summary {
    /// All packages
    pub total: usize,
    /// Listed and supported
    pub supported: usize,
    /// Listed and unsupported
    pub unsupported: usize,
    /// Listed and untested
    pub untested: usize,
    /// Not in the directory
    pub unlisted: usize,
    /// Flagged unmaintained
    pub unmaintained: usize,
}

/// Count records per status, membership and maintenance
pub fn summarize<'a, I>(records: I) -> Summary
where
    I: IntoIterator<Item = &'a PackageRecord>,
{
    records.into_iter().fold(Summary::default(), |mut s, r| {
        s.total += 1;
        if r.not_in_directory {
            s.unlisted += 1;
        } else {
            match r.architecture {
                ArchitectureStatus::Supported => s.supported += 1,
                ArchitectureStatus::Unsupported => s.unsupported += 1,
                ArchitectureStatus::Untested => s.untested += 1,
            }
        }
        if r.unmaintained {
            s.unmaintained += 1;
        }
        s
    })
}
