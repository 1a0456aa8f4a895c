//! Brand frequency statistics over an extracted table.

use serde::Serialize;

use super::chart::{ChartKind, ChartSpec};
use super::table::TableData;

/// Column aggregated when no explicit column is requested.
pub const DEFAULT_BRAND_COLUMN: &str = "Brand";

/// How many rows mention one brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandCount {
    pub brand: String,
    pub count: usize,
}

impl BrandCount {
    pub fn new(brand: impl Into<String>, count: usize) -> Self {
        Self { brand: brand.into(), count }
    }
}

/// One brand's share of all counted rows, in percent with one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandShare {
    pub brand: String,
    pub percent: f64,
}

/// Counts distinct values of a brand column.
///
/// The column is `column` (or [`DEFAULT_BRAND_COLUMN`]) when the header exists,
/// otherwise the first column. Values are case-normalized by capitalization and
/// blank cells are ignored. The result is ordered by descending count; ties keep
/// the order in which brands were first seen.
pub fn brand_counts(table: &TableData, column: Option<&str>) -> Vec<BrandCount> {
    let name = column.unwrap_or(DEFAULT_BRAND_COLUMN);
    let index = table.column_index(name).unwrap_or(0);

    let mut counts: Vec<BrandCount> = Vec::new();
    for value in table.column(index) {
        let brand = capitalize(value.trim());
        if brand.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|c| c.brand == brand) {
            Some(existing) => existing.count += 1,
            None => counts.push(BrandCount { brand, count: 1 }),
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Converts counts to percentage shares rounded to one decimal place.
///
/// Returns an empty list when the total is zero.
pub fn percentage_shares(counts: &[BrandCount]) -> Vec<BrandShare> {
    let total: usize = counts.iter().map(|c| c.count).sum();
    if total == 0 {
        return Vec::new();
    }

    counts
        .iter()
        .map(|c| {
            let percent = c.count as f64 * 100.0 / total as f64;
            BrandShare { brand: c.brand.clone(), percent: (percent * 10.0).round() / 10.0 }
        })
        .collect()
}

/// A count bar chart and a share pie chart for the given counts.
pub fn brand_charts(counts: &[BrandCount]) -> Vec<ChartSpec> {
    let labels: Vec<String> = counts.iter().map(|c| c.brand.clone()).collect();
    let values = counts.iter().map(|c| c.count as f64).collect();
    let shares = percentage_shares(counts).into_iter().map(|s| s.percent).collect();

    [
        ChartSpec::new(ChartKind::Bar, "Brand frequency", labels.clone(), values),
        ChartSpec::new(ChartKind::Pie, "Brand share (%)", labels, shares),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> TableData {
        TableData::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        )
    }

    #[test]
    fn test_counts_normalize_case() {
        let t = table(&["Brand"], &[&["Apple"], &["apple"], &["Samsung"]]);
        assert_eq!(brand_counts(&t, None), vec![BrandCount::new("Apple", 2), BrandCount::new("Samsung", 1)]);
    }

    #[test]
    fn test_counts_descending_with_stable_ties() {
        let t = table(&["Brand"], &[&["Nokia"], &["Sony"], &["SONY"], &["Lg"], &["nokia"], &["Oppo"]]);
        let counts = brand_counts(&t, None);

        let names: Vec<&str> = counts.iter().map(|c| c.brand.as_str()).collect();
        assert_eq!(names, vec!["Nokia", "Sony", "Lg", "Oppo"]);
    }

    #[test]
    fn test_counts_use_brand_column() {
        let t = table(&["Model", "Brand"], &[&["iPhone", "Apple"], &["Galaxy", "Samsung"], &["SE", "Apple"]]);
        let counts = brand_counts(&t, None);
        assert_eq!(counts[0], BrandCount::new("Apple", 2));
    }

    #[test]
    fn test_counts_fall_back_to_first_column() {
        let t = table(&["Maker", "Price"], &[&["Apple", "900"], &["Google", "600"]]);
        let counts = brand_counts(&t, None);
        assert_eq!(counts, vec![BrandCount::new("Apple", 1), BrandCount::new("Google", 1)]);
    }

    #[test]
    fn test_counts_explicit_column() {
        let t = table(&["Brand", "Origin"], &[&["Apple", "US"], &["Samsung", "KR"], &["Lg", "kr"]]);
        let counts = brand_counts(&t, Some("Origin"));
        assert_eq!(counts, vec![BrandCount::new("Kr", 2), BrandCount::new("Us", 1)]);
    }

    #[test]
    fn test_counts_skip_blank_cells() {
        let t = table(&["Brand"], &[&[""], &["  "], &["Apple"]]);
        assert_eq!(brand_counts(&t, None), vec![BrandCount::new("Apple", 1)]);
    }

    #[test]
    fn test_percentage_shares() {
        let counts = vec![BrandCount::new("Apple", 3), BrandCount::new("Samsung", 1)];
        let shares = percentage_shares(&counts);

        assert_eq!(
            shares,
            vec![
                BrandShare { brand: "Apple".to_string(), percent: 75.0 },
                BrandShare { brand: "Samsung".to_string(), percent: 25.0 },
            ]
        );
    }

    #[test]
    fn test_percentage_shares_round_to_one_decimal() {
        let counts = vec![BrandCount::new("A", 1), BrandCount::new("B", 2)];
        let shares = percentage_shares(&counts);
        assert_eq!(shares[0].percent, 33.3);
        assert_eq!(shares[1].percent, 66.7);
    }

    #[test]
    fn test_percentage_shares_zero_total() {
        assert!(percentage_shares(&[]).is_empty());
        assert!(percentage_shares(&[BrandCount::new("A", 0)]).is_empty());
    }

    #[test]
    fn test_brand_charts() {
        let counts = vec![BrandCount::new("Apple", 3), BrandCount::new("Samsung", 1)];
        let charts = brand_charts(&counts);

        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].kind, ChartKind::Bar);
        assert_eq!(charts[0].values, vec![3.0, 1.0]);
        assert_eq!(charts[1].kind, ChartKind::Pie);
        assert_eq!(charts[1].values, vec![75.0, 25.0]);
        assert!(brand_charts(&[]).is_empty());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("sAMSUNG"), "Samsung");
        assert_eq!(capitalize("éclair"), "Éclair");
        assert_eq!(capitalize(""), "");
    }
}
