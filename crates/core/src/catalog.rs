//! Product search filters, sorting and pagination.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Default number of rows per listing page.
pub const PAGE_SIZE: u32 = 12;

/// Number of products on the "latest" strip.
pub const LATEST_PRODUCTS_LIMIT: u32 = 4;

/// Number of products in the featured carousel.
pub const FEATURED_PRODUCTS_LIMIT: u32 = 4;

/// Value clients send to mean "no filter".
const ALL: &str = "all";

/// Ordering of product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Cheapest first.
    Lowest,
    /// Most expensive first.
    Highest,
    /// Best rated first.
    Rating,
}

impl ProductSort {
    /// SQL `ORDER BY` clause. Only ever one of a fixed set of strings.
    #[must_use]
    pub const fn order_by(&self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC",
            Self::Lowest => "price ASC, created_at DESC",
            Self::Highest => "price DESC, created_at DESC",
            Self::Rating => "rating DESC, created_at DESC",
        }
    }
}

impl fmt::Display for ProductSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Newest => "newest",
            Self::Lowest => "lowest",
            Self::Highest => "highest",
            Self::Rating => "rating",
        })
    }
}

impl FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "lowest" => Ok(Self::Lowest),
            "highest" => Ok(Self::Highest),
            "rating" => Ok(Self::Rating),
            _ => Err(format!("invalid sort: {s}")),
        }
    }
}

/// Inclusive price bounds parsed from `"min-max"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Money,
    pub max: Money,
}

impl FromStr for PriceRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid price range: {s}"))?;
        let min = Money::parse(min).map_err(|e| e.to_string())?;
        let max = Money::parse(max).map_err(|e| e.to_string())?;
        if min > max {
            return Err(format!("invalid price range: {s}"));
        }
        Ok(Self { min, max })
    }
}

/// Raw search query string as sent by clients.
///
/// Every text filter accepts the literal `all` to mean "unfiltered".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

/// Normalised product filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the product name.
    pub query: Option<String>,
    /// Exact category.
    pub category: Option<String>,
    /// Case-insensitive substring of the brand.
    pub brand: Option<String>,
    pub price: Option<PriceRange>,
    /// Minimum rating.
    pub rating: Option<Decimal>,
    pub sort: ProductSort,
}

fn filter_value(raw: Option<&String>) -> Option<String> {
    raw.map(|s| s.trim())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case(ALL))
        .map(str::to_owned)
}

impl SearchParams {
    /// Normalise into a [`ProductFilter`]. Unparseable values are ignored.
    #[must_use]
    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            query: filter_value(self.q.as_ref()),
            category: filter_value(self.category.as_ref()),
            brand: filter_value(self.brand.as_ref()),
            price: filter_value(self.price.as_ref()).and_then(|p| p.parse().ok()),
            rating: filter_value(self.rating.as_ref()).and_then(|r| r.parse().ok()),
            sort: self
                .sort
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }
}

/// A page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Pages are 1-based; `0` and `None` mean the first page.
    #[must_use]
    pub fn new(page: Option<u32>, limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.max(1),
        }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    #[must_use]
    pub fn limit_i64(&self) -> i64 {
        i64::from(self.limit)
    }

    /// Number of pages needed for `total` rows.
    #[must_use]
    pub fn total_pages(&self, total: i64) -> u32 {
        let total = u64::try_from(total).unwrap_or(0);
        let pages = total.div_ceil(u64::from(self.limit));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_pages: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(data: Vec<T>, pagination: Pagination, total: i64) -> Self {
        Self {
            data,
            total_pages: pagination.total_pages(total),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_all_means_unfiltered() {
        let params = SearchParams {
            q: Some("all".into()),
            category: Some("all".into()),
            brand: Some("  ".into()),
            price: Some("all".into()),
            rating: Some("all".into()),
            ..SearchParams::default()
        };
        assert_eq!(params.filter(), ProductFilter::default());
    }

    #[test]
    fn test_filters_parse() {
        let params = SearchParams {
            q: Some("shirt".into()),
            category: Some("Men's Sweatshirts".into()),
            price: Some("51-100".into()),
            rating: Some("4".into()),
            sort: Some("lowest".into()),
            ..SearchParams::default()
        };
        let filter = params.filter();
        assert_eq!(filter.query.as_deref(), Some("shirt"));
        assert_eq!(filter.category.as_deref(), Some("Men's Sweatshirts"));
        let price = filter.price.unwrap();
        assert_eq!(price.min.to_string(), "51.00");
        assert_eq!(price.max.to_string(), "100.00");
        assert_eq!(filter.rating, Some(Decimal::from(4)));
        assert_eq!(filter.sort, ProductSort::Lowest);
    }

    #[test]
    fn test_bad_values_are_ignored() {
        let params = SearchParams {
            price: Some("cheap".into()),
            sort: Some("random".into()),
            ..SearchParams::default()
        };
        let filter = params.filter();
        assert_eq!(filter.price, None);
        assert_eq!(filter.sort, ProductSort::Newest);
    }

    #[test]
    fn test_inverted_price_range_rejected() {
        assert!("100-50".parse::<PriceRange>().is_err());
    }

    #[test]
    fn test_pagination() {
        let p = Pagination::new(Some(3), PAGE_SIZE);
        assert_eq!(p.offset(), 24);
        assert_eq!(p.total_pages(25), 3);
        assert_eq!(p.total_pages(24), 2);
        assert_eq!(p.total_pages(0), 0);
    }

    #[test]
    fn test_page_zero_is_first_page() {
        assert_eq!(Pagination::new(Some(0), 10).offset(), 0);
        assert_eq!(Pagination::new(None, 10).page, 1);
    }
}
