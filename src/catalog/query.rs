//! Filtering and pagination over a listing.

use serde::Serialize;

use super::model::FontRecord;

pub const DEFAULT_PAGE_SIZE: usize = 40;
pub const MAX_PAGE_SIZE: usize = 100;

/// Conjunctive predicates over a listing. An empty axis places no restriction.
///
/// All comparisons are case-insensitive; needles are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    categories: Vec<String>,
    subset: Option<String>,
    search: Option<String>,
    variant: Option<String>,
}

impl FilterCriteria {
    /// Builds criteria from raw query values. `categories` is a CSV; blank
    /// entries and blank values are ignored.
    pub fn from_params(
        categories: Option<&str>,
        subset: Option<&str>,
        search: Option<&str>,
        variant: Option<&str>,
    ) -> Self {
        Self {
            categories: categories.map(normalize_csv).unwrap_or_default(),
            subset: normalize(subset),
            search: normalize(search),
            variant: normalize(variant),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.subset.is_none()
            && self.search.is_none()
            && self.variant.is_none()
    }

    pub fn matches(&self, record: &FontRecord) -> bool {
        if !self.categories.is_empty() && !self.categories.contains(&record.category.to_lowercase())
        {
            return false;
        }
        if let Some(subset) = &self.subset {
            if !contains_ignore_case(&record.subsets, subset) {
                return false;
            }
        }
        if let Some(variant) = &self.variant {
            if !contains_ignore_case(&record.variants, variant) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !record.family.to_lowercase().contains(search.as_str()) {
                return false;
            }
        }
        true
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn normalize_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_ignore_case(haystack: &[String], needle: &str) -> bool {
    haystack.iter().any(|s| s.to_lowercase() == needle)
}

/// Records of `listing` that satisfy `criteria`, in listing order.
pub fn filter<'a>(listing: &'a [FontRecord], criteria: &FilterCriteria) -> Vec<&'a FontRecord> {
    listing.iter().filter(|r| criteria.matches(r)).collect()
}

/// A normalized 1-based page position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Reads raw `page` / `pageSize` values.
    ///
    /// Only the leading integer of each value counts (`"3abc"` is 3). A value
    /// that yields no integer, or yields 0, takes the default. Afterwards
    /// `page` is at least 1 and `page_size` lies in `1..=100`.
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Self {
        let page = leading_int(page).filter(|&n| n != 0).unwrap_or(1);
        let page_size = leading_int(page_size)
            .filter(|&n| n != 0)
            .unwrap_or(DEFAULT_PAGE_SIZE as i64);

        Self {
            page: clamp(page, 1, i64::MAX),
            page_size: clamp(page_size, 1, MAX_PAGE_SIZE as i64),
        }
    }

    fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

fn clamp(n: i64, min: i64, max: i64) -> usize {
    usize::try_from(n.clamp(min, max)).unwrap_or(usize::MAX)
}

/// Leading optionally-signed decimal integer, after leading whitespace.
fn leading_int(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim_start();
    let (sign, digits) = match s.as_bytes().first()? {
        b'-' => (-1, &s[1..]),
        b'+' => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * magnitude)
}

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Cuts `items[(page-1)*size .. page*size]`. A page past the end is empty but
/// still reports the full `total`.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len();
    let items = items
        .into_iter()
        .skip(request.offset())
        .take(request.page_size)
        .collect();

    Page {
        total,
        page: request.page,
        page_size: request.page_size,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(family: &str, category: &str, subsets: &[&str], variants: &[&str]) -> FontRecord {
        serde_json::from_value(json!({
            "family": family,
            "category": category,
            "subsets": subsets,
            "variants": variants,
        }))
        .unwrap()
    }

    fn listing() -> Vec<FontRecord> {
        vec![
            record("Roboto", "sans-serif", &["latin", "cyrillic"], &["regular", "700"]),
            record("Lora", "serif", &["latin"], &["regular", "italic"]),
            record("Roboto Slab", "serif", &["latin", "greek"], &["regular"]),
            record("Noto Serif JP", "serif", &["japanese"], &["regular", "700"]),
        ]
    }

    fn families<'a>(records: &[&'a FontRecord]) -> Vec<&'a str> {
        records.iter().map(|r| r.family.as_str()).collect()
    }

    #[test]
    fn no_criteria_keeps_everything_in_order() {
        let all = listing();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_empty());
        assert_eq!(
            families(&filter(&all, &criteria)),
            ["Roboto", "Lora", "Roboto Slab", "Noto Serif JP"]
        );
    }

    #[test]
    fn predicates_are_conjunctive() {
        let all = listing();
        let criteria = FilterCriteria::from_params(Some("serif"), Some("latin"), Some("ro"), None);
        assert_eq!(families(&filter(&all, &criteria)), ["Roboto Slab"]);
    }

    #[test]
    fn category_set_is_csv_and_case_insensitive() {
        let all = listing();
        let criteria = FilterCriteria::from_params(Some(" Sans-Serif , ,SERIF"), None, None, None);
        assert_eq!(filter(&all, &criteria).len(), 4);

        let criteria = FilterCriteria::from_params(Some("display"), None, None, None);
        assert!(filter(&all, &criteria).is_empty());
    }

    #[test]
    fn subset_and_search_ignore_case() {
        let all = listing();
        let criteria = FilterCriteria::from_params(None, Some("JAPANESE"), Some("NOTO"), None);
        assert_eq!(families(&filter(&all, &criteria)), ["Noto Serif JP"]);
    }

    #[test]
    fn variant_filter() {
        let all = listing();
        let criteria = FilterCriteria::from_params(None, None, None, Some("700"));
        assert_eq!(families(&filter(&all, &criteria)), ["Roboto", "Noto Serif JP"]);
    }

    #[test]
    fn blank_values_are_ignored() {
        let criteria = FilterCriteria::from_params(Some(" , "), Some("  "), Some(""), None);
        assert!(criteria.is_empty());
    }

    #[test]
    fn page_request_defaults_and_clamps() {
        assert_eq!(PageRequest::parse(None, None), PageRequest::default());
        assert_eq!(PageRequest::parse(None, Some("500")).page_size, 100);
        assert_eq!(PageRequest::parse(None, Some("0")).page_size, 40);
        assert_eq!(PageRequest::parse(None, Some("abc")).page_size, 40);
        assert_eq!(PageRequest::parse(None, Some("-5")).page_size, 1);
        assert_eq!(PageRequest::parse(Some("0"), None).page, 1);
        assert_eq!(PageRequest::parse(Some("-3"), None).page, 1);
        assert_eq!(PageRequest::parse(Some("xyz"), None).page, 1);
    }

    #[test]
    fn leading_integer_wins() {
        let req = PageRequest::parse(Some("3abc"), Some(" 25px"));
        assert_eq!(req, PageRequest { page: 3, page_size: 25 });
        assert_eq!(leading_int(Some("99999999999999999999")), Some(i64::MAX));
        assert_eq!(leading_int(Some("-")), None);
    }

    #[test]
    fn pages_are_disjoint_and_exhaustive() {
        let items: Vec<u32> = (0..95).collect();
        let mut seen = Vec::new();
        for page in 1..=3 {
            let result = paginate(items.clone(), PageRequest { page, page_size: 40 });
            assert_eq!(result.total, 95);
            seen.extend(result.items);
        }
        assert_eq!(seen, items);
    }

    #[test]
    fn page_past_end_is_empty() {
        let result = paginate(vec![1, 2, 3], PageRequest { page: 7, page_size: 2 });
        assert_eq!(result.total, 3);
        assert!(result.items.is_empty());
        assert_eq!(result.page, 7);
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let result = paginate(vec![1], PageRequest { page: usize::MAX, page_size: 100 });
        assert!(result.items.is_empty());
    }

    #[test]
    fn page_serializes_camel_case() {
        let value = serde_json::to_value(paginate(vec!["a"], PageRequest::default())).unwrap();
        assert_eq!(
            value,
            json!({ "total": 1, "page": 1, "pageSize": 40, "items": ["a"] })
        );
    }
}
