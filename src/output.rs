use crate::boundary::BoundaryFeature;
use crate::scale::Legend;
use crate::types::{AggregationBucket, RegionRow, RegionSummary};
use crate::util::{display_name, format_int};
use tabled::{settings::Style, Table, Tabled};

const NOT_AVAILABLE: &str = "Data not available";

/// Hover text for one feature.
pub fn tooltip_lines(feature: &BoundaryFeature) -> Vec<String> {
    let count = |v: Option<u64>| v.map(format_int).unwrap_or_else(|| NOT_AVAILABLE.to_string());
    vec![
        format!("Name: {}", feature.name),
        format!("Confirmed: {}", count(feature.stats.map(|s| s.confirmed))),
        format!("Deaths: {}", count(feature.stats.map(|s| s.deaths))),
    ]
}

/// Summary panel for the selected region. Recovered counts are only
/// reported for the country-wide view.
pub fn info_panel(summary: &RegionSummary, country_wide: bool) -> Vec<String> {
    let mut lines = vec![
        format!("Name: {}", display_name(&summary.name)),
        format!("Confirmed: {}", format_int(summary.confirmed)),
        format!("Deaths: {}", format_int(summary.deaths)),
    ];
    if country_wide {
        lines.push(format!("Recovered: {}", format_int(summary.recovered)));
    }
    lines
}

pub fn region_rows(bucket: &AggregationBucket) -> Vec<RegionRow> {
    let mut regions: Vec<&RegionSummary> = bucket.regions.iter().collect();
    regions.sort_by(|a, b| b.confirmed.cmp(&a.confirmed).then_with(|| a.name.cmp(&b.name)));
    regions
        .into_iter()
        .map(|r| RegionRow {
            name: r.name.clone(),
            confirmed: format_int(r.confirmed),
            deaths: format_int(r.deaths),
            recovered: format_int(r.recovered),
        })
        .collect()
}

pub fn preview_regions(bucket: &AggregationBucket, max_rows: usize) -> String {
    preview_table_rows(&region_rows(bucket), max_rows)
}

pub fn preview_legend(legend: &Legend) -> String {
    let rows = legend.rows();
    format!("{}\n{}", legend.title, preview_table_rows(&rows, rows.len()))
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}
