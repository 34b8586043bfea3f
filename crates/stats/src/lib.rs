//! Filter stage and aggregation engine over canonical recalls.
//!
//! Every function here is pure and recomputes from scratch on each call;
//! there is no internal state and no incremental update path. Memoization,
//! if wanted, belongs to the caller. Empty input degrades to zeros and
//! empty series, never to NaN or a division error.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use rappelscope_model::{Recall, RiskLevel, StatsFilter};
use serde::Serialize;

/// French short month names, matching the dashboard's `fr-FR` labels.
const MONTHS_FR: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
    "déc.",
];

/// Category terms counting as food for the food/non-food split.
const FOOD_CATEGORIES: [&str; 9] = [
    "alimentation",
    "boulangerie",
    "charcuterie",
    "produits laitiers",
    "viandes",
    "poissons",
    "fruits et légumes",
    "boissons",
    "épicerie",
];

/// Parse a recall date; accepts RFC 3339 or a plain `YYYY-MM-DD` prefix.
pub fn parse_recall_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()?;
    Some(date.and_time(NaiveTime::MIN).and_utc())
}

/// Calendar year of the recall's publication date, if parsable.
pub fn recall_year(recall: &Recall) -> Option<i32> {
    parse_recall_date(&recall.recall_date).map(|d| d.year())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn pct_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(count as f64 / total as f64 * 100.0)
    }
}

fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() > max_chars {
        let clipped: String = label.chars().take(max_chars).collect();
        format!("{}...", clipped)
    } else {
        label.to_string()
    }
}

/// Apply the dashboard filter: logical AND of the active predicates.
///
/// Re-run on every predicate or collection change; the aggregates below
/// have no incremental update path.
pub fn apply_filter(recalls: &[Recall], filter: &StatsFilter) -> Vec<Recall> {
    recalls
        .iter()
        .filter(|r| {
            let matches_year = filter.year.is_none() || recall_year(r) == filter.year;
            let matches_category = filter
                .category
                .as_deref()
                .map_or(true, |c| r.category == c);
            let matches_risk = filter
                .risk_level
                .map_or(true, |level| r.risk_level == level);
            matches_year && matches_category && matches_risk
        })
        .cloned()
        .collect()
}

/// Frequency counts keyed by `key`, in first-encountered order.
///
/// The stable sort applied by the rankings then gives a deterministic
/// first-encountered tie-break.
fn frequency_by<'a, F>(recalls: &'a [Recall], key: F) -> Vec<(String, usize)>
where
    F: Fn(&'a Recall) -> &'a str,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for recall in recalls {
        let k = key(recall);
        match index.get(k) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(k, counts.len());
                counts.push((k.to_string(), 1));
            }
        }
    }
    counts
}

/// Recalls grouped by (year, month), ascending, trailing `keep` groups.
fn monthly_groups<'a>(recalls: &'a [Recall], keep: usize) -> Vec<((i32, u32), Vec<&'a Recall>)> {
    let mut groups: BTreeMap<(i32, u32), Vec<&Recall>> = BTreeMap::new();
    for recall in recalls {
        if let Some(date) = parse_recall_date(&recall.recall_date) {
            groups
                .entry((date.year(), date.month()))
                .or_default()
                .push(recall);
        }
    }
    let skip = groups.len().saturating_sub(keep);
    groups.into_iter().skip(skip).collect()
}

fn month_label(year: i32, month: u32) -> String {
    format!("{} {}", MONTHS_FR[(month - 1) as usize], year)
}

/// KPI summary over the current (filtered) collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total: usize,
    /// Count in the trailing 30-day window
    pub last_30_days: usize,
    /// Trailing window vs the preceding 30 days, as a percentage change;
    /// 0 when the preceding window is empty
    pub trend_pct: f64,
    /// Share of critical-tier recalls
    pub critical_pct: f64,
    /// Total divided by the months between the oldest recall and now
    pub avg_per_month: f64,
    /// Most frequent category, "N/A" sentinel when absent
    pub top_category: String,
    pub top_category_count: usize,
}

/// Compute the KPI summary; `None` for an empty collection.
///
/// `now` is injected so the trailing windows are testable.
pub fn kpi_summary(recalls: &[Recall], now: DateTime<Utc>) -> Option<KpiSummary> {
    if recalls.is_empty() {
        return None;
    }

    let thirty_days_ago = now - Duration::days(30);
    let sixty_days_ago = now - Duration::days(60);

    let dates: Vec<Option<DateTime<Utc>>> = recalls
        .iter()
        .map(|r| parse_recall_date(&r.recall_date))
        .collect();

    let last_30_days = dates
        .iter()
        .filter(|d| d.is_some_and(|d| d >= thirty_days_ago))
        .count();
    let previous_30_days = dates
        .iter()
        .filter(|d| d.is_some_and(|d| d >= sixty_days_ago && d < thirty_days_ago))
        .count();

    let trend_pct = if previous_30_days > 0 {
        (last_30_days as f64 - previous_30_days as f64) / previous_30_days as f64 * 100.0
    } else {
        0.0
    };

    let critical_count = recalls
        .iter()
        .filter(|r| r.risk_level == RiskLevel::Critical)
        .count();
    let critical_pct = critical_count as f64 / recalls.len() as f64 * 100.0;

    // Months between the oldest recall and now, floored at one so a
    // single-day span cannot divide towards infinity.
    let avg_per_month = match dates.iter().flatten().min() {
        Some(oldest) => {
            let months = ((now - *oldest).num_seconds() as f64 / (30.0 * 86_400.0)).max(1.0);
            recalls.len() as f64 / months
        }
        None => recalls.len() as f64,
    };

    let mut categories = frequency_by(recalls, |r| r.category.as_str());
    categories.sort_by(|a, b| b.1.cmp(&a.1));
    let (top_category, top_category_count) = categories
        .into_iter()
        .next()
        .unwrap_or_else(|| ("N/A".to_string(), 0));

    Some(KpiSummary {
        total: recalls.len(),
        last_30_days,
        trend_pct,
        critical_pct,
        avg_per_month,
        top_category,
        top_category_count,
    })
}

/// One point of the monthly time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

/// Recalls per month, trailing 12 months, ascending by date.
pub fn monthly_series(recalls: &[Recall]) -> Vec<MonthlyCount> {
    monthly_groups(recalls, 12)
        .into_iter()
        .map(|((year, month), group)| MonthlyCount {
            month: month_label(year, month),
            count: group.len(),
        })
        .collect()
}

/// One month of the per-tier time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMonthly {
    pub month: String,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Monthly counts split by tier, trailing 12 months, ascending.
pub fn risk_evolution(recalls: &[Recall]) -> Vec<RiskMonthly> {
    monthly_groups(recalls, 12)
        .into_iter()
        .map(|((year, month), group)| {
            let count_tier =
                |level: RiskLevel| group.iter().filter(|r| r.risk_level == level).count();
            RiskMonthly {
                month: month_label(year, month),
                critical: count_tier(RiskLevel::Critical),
                high: count_tier(RiskLevel::High),
                medium: count_tier(RiskLevel::Medium),
                low: count_tier(RiskLevel::Low),
            }
        })
        .collect()
}

/// One entry of a frequency ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRank {
    /// Display label, truncated at 25 chars with an ellipsis
    pub category: String,
    pub count: usize,
    /// Share of the whole collection, one decimal
    pub pct: f64,
}

/// Most recalled categories, count descending, first-encountered tie-break.
pub fn top_categories(recalls: &[Recall], limit: usize) -> Vec<CategoryRank> {
    let mut counts = frequency_by(recalls, |r| r.category.as_str());
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(limit)
        .map(|(category, count)| CategoryRank {
            category: truncate_label(&category, 25),
            count,
            pct: pct_of(count, recalls.len()),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandRank {
    /// Display label, truncated at 20 chars with an ellipsis
    pub brand: String,
    pub count: usize,
}

/// Most recalled brands, top 10.
pub fn top_brands(recalls: &[Recall]) -> Vec<BrandRank> {
    let mut counts = frequency_by(recalls, |r| r.brand.as_str());
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(10)
        .map(|(brand, count)| BrandRank {
            brand: truncate_label(&brand, 20),
            count,
        })
        .collect()
}

/// Food vs non-food split of the collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodSplit {
    pub food: usize,
    pub non_food: usize,
    pub food_pct: f64,
    pub non_food_pct: f64,
}

/// Classify categories as food by containment against a fixed vocabulary.
pub fn food_vs_non_food(recalls: &[Recall]) -> FoodSplit {
    let mut food = 0;
    let mut non_food = 0;
    for recall in recalls {
        let category = recall.category.to_lowercase();
        if FOOD_CATEGORIES.iter().any(|c| category.contains(c)) {
            food += 1;
        } else {
            non_food += 1;
        }
    }
    FoodSplit {
        food,
        non_food,
        food_pct: pct_of(food, recalls.len()),
        non_food_pct: pct_of(non_food, recalls.len()),
    }
}

/// One tier of the risk distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSlice {
    pub level: RiskLevel,
    pub label: &'static str,
    pub count: usize,
    pub pct: f64,
}

/// Count and share per tier; all four tiers always present, zero-filled.
pub fn risk_distribution(recalls: &[Recall]) -> Vec<RiskSlice> {
    RiskLevel::ALL
        .iter()
        .map(|&level| {
            let count = recalls.iter().filter(|r| r.risk_level == level).count();
            RiskSlice {
                level,
                label: level.label(),
                count,
                pct: pct_of(count, recalls.len()),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyCount {
    pub year: i32,
    pub count: usize,
}

/// Recalls per calendar year, ascending.
pub fn yearly_comparison(recalls: &[Recall]) -> Vec<YearlyCount> {
    let mut years: BTreeMap<i32, usize> = BTreeMap::new();
    for recall in recalls {
        if let Some(year) = recall_year(recall) {
            *years.entry(year).or_default() += 1;
        }
    }
    years
        .into_iter()
        .map(|(year, count)| YearlyCount { year, count })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalRatePoint {
    pub month: String,
    /// Critical share of that month's recalls, one decimal
    pub rate_pct: f64,
}

/// Monthly critical-tier share, trailing 12 months, ascending.
pub fn critical_rate_series(recalls: &[Recall]) -> Vec<CriticalRatePoint> {
    monthly_groups(recalls, 12)
        .into_iter()
        .map(|((year, month), group)| {
            let critical = group
                .iter()
                .filter(|r| r.risk_level == RiskLevel::Critical)
                .count();
            CriticalRatePoint {
                month: month_label(year, month),
                rate_pct: pct_of(critical, group.len()),
            }
        })
        .collect()
}

/// Tier counts for one top category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRiskRow {
    pub category: String,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Tier breakdown for the top-6 categories.
///
/// Truncated ranking labels are matched back by substring with the
/// ellipsis stripped, so a clipped label counts every category sharing
/// its prefix. Display-oriented; the rankings themselves stay exact.
pub fn category_risk_breakdown(recalls: &[Recall]) -> Vec<CategoryRiskRow> {
    top_categories(recalls, 6)
        .into_iter()
        .map(|rank| {
            let needle = rank.category.trim_end_matches("...").to_string();
            let group: Vec<&Recall> = recalls
                .iter()
                .filter(|r| r.category.contains(&needle))
                .collect();
            let count_tier =
                |level: RiskLevel| group.iter().filter(|r| r.risk_level == level).count();
            CategoryRiskRow {
                category: rank.category,
                critical: count_tier(RiskLevel::Critical),
                high: count_tier(RiskLevel::High),
                medium: count_tier(RiskLevel::Medium),
                low: count_tier(RiskLevel::Low),
            }
        })
        .collect()
}

/// Three-tier view of the breakdown for the radar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarRow {
    pub category: String,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
}

pub fn radar_data(recalls: &[Recall]) -> Vec<RadarRow> {
    category_risk_breakdown(recalls)
        .into_iter()
        .map(|row| RadarRow {
            category: row.category,
            critical: row.critical,
            high: row.high,
            medium: row.medium,
        })
        .collect()
}

/// Every aggregate in one payload, for the CLI dashboard and JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub kpis: Option<KpiSummary>,
    pub monthly: Vec<MonthlyCount>,
    pub risk_evolution: Vec<RiskMonthly>,
    pub top_categories: Vec<CategoryRank>,
    pub top_brands: Vec<BrandRank>,
    pub food_split: FoodSplit,
    pub risk_distribution: Vec<RiskSlice>,
    pub yearly: Vec<YearlyCount>,
    pub critical_rate: Vec<CriticalRatePoint>,
    pub category_risk: Vec<CategoryRiskRow>,
    pub radar: Vec<RadarRow>,
}

pub fn dashboard(recalls: &[Recall], now: DateTime<Utc>) -> Dashboard {
    Dashboard {
        kpis: kpi_summary(recalls, now),
        monthly: monthly_series(recalls),
        risk_evolution: risk_evolution(recalls),
        top_categories: top_categories(recalls, 10),
        top_brands: top_brands(recalls),
        food_split: food_vs_non_food(recalls),
        risk_distribution: risk_distribution(recalls),
        yearly: yearly_comparison(recalls),
        critical_rate: critical_rate_series(recalls),
        category_risk: category_risk_breakdown(recalls),
        radar: radar_data(recalls),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn make_recall(id: &str, category: &str, level: RiskLevel, date: &str) -> Recall {
        let mut recall = Recall::new(id, "Produit");
        recall.category = category.to_string();
        recall.risk_level = level;
        recall.recall_date = date.to_string();
        recall
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_recall_date_formats() {
        assert!(parse_recall_date("2024-03-15").is_some());
        assert!(parse_recall_date("2024-03-15T10:30:00+02:00").is_some());
        assert_eq!(parse_recall_date(""), None);
        assert_eq!(parse_recall_date("pas une date"), None);
    }

    #[test]
    fn test_filter_composition_is_intersection() {
        let recalls = vec![
            make_recall("1", "Jouets", RiskLevel::Critical, "2024-02-01"),
            make_recall("2", "Jouets", RiskLevel::Low, "2024-02-01"),
            make_recall("3", "Jouets", RiskLevel::Critical, "2023-02-01"),
            make_recall("4", "Viandes", RiskLevel::Critical, "2024-02-01"),
        ];
        let filter = StatsFilter {
            year: Some(2024),
            category: Some("Jouets".to_string()),
            risk_level: Some(RiskLevel::Critical),
        };
        let filtered = apply_filter(&recalls, &filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "1");
    }

    #[test]
    fn test_filter_absent_predicates_pass_everything() {
        let recalls = vec![
            make_recall("1", "Jouets", RiskLevel::Low, "2024-02-01"),
            make_recall("2", "Viandes", RiskLevel::High, "2023-06-01"),
        ];
        assert_eq!(apply_filter(&recalls, &StatsFilter::default()).len(), 2);
    }

    #[test]
    fn test_kpi_empty_collection_is_none() {
        assert_eq!(kpi_summary(&[], now()), None);
    }

    #[test]
    fn test_kpi_trend_zero_when_prior_window_empty() {
        // Two recalls in the trailing 30 days, nothing in the 30 before
        let recalls = vec![
            make_recall("1", "Jouets", RiskLevel::Low, "2026-08-20"),
            make_recall("2", "Jouets", RiskLevel::Low, "2026-08-10"),
        ];
        let kpis = kpi_summary(&recalls, now()).unwrap();
        assert_eq!(kpis.last_30_days, 2);
        assert_eq!(kpis.trend_pct, 0.0);
    }

    #[test]
    fn test_kpi_trend_and_critical_share() {
        let recalls = vec![
            make_recall("1", "Jouets", RiskLevel::Critical, "2026-08-20"),
            make_recall("2", "Jouets", RiskLevel::Low, "2026-08-10"),
            make_recall("3", "Jouets", RiskLevel::Low, "2026-07-10"),
            make_recall("4", "Jouets", RiskLevel::Low, "2026-07-05"),
        ];
        let kpis = kpi_summary(&recalls, now()).unwrap();
        assert_eq!(kpis.total, 4);
        assert_eq!(kpis.last_30_days, 2);
        // 2 vs 2 in the prior window
        assert_eq!(kpis.trend_pct, 0.0);
        assert_eq!(kpis.critical_pct, 25.0);
        assert_eq!(kpis.top_category, "Jouets");
        assert_eq!(kpis.top_category_count, 4);
    }

    #[test]
    fn test_kpi_avg_per_month_guards_short_span() {
        // Oldest recall is "now": span clamps to one month
        let recalls = vec![
            make_recall("1", "Jouets", RiskLevel::Low, "2026-08-28"),
            make_recall("2", "Jouets", RiskLevel::Low, "2026-08-28"),
        ];
        let kpis = kpi_summary(&recalls, now()).unwrap();
        assert_eq!(kpis.avg_per_month, 2.0);
    }

    #[test]
    fn test_monthly_series_truncates_to_trailing_twelve() {
        // 15 distinct months: Jan 2025 .. Mar 2026
        let mut recalls = Vec::new();
        for (i, (year, month)) in (1..=12)
            .map(|m| (2025, m))
            .chain((1..=3).map(|m| (2026, m)))
            .enumerate()
        {
            recalls.push(make_recall(
                &i.to_string(),
                "Jouets",
                RiskLevel::Low,
                &format!("{year:04}-{month:02}-10"),
            ));
        }
        let series = monthly_series(&recalls);
        assert_eq!(series.len(), 12);
        // 3 oldest months excluded; series starts at April 2025
        assert_eq!(series[0].month, "avr. 2025");
        assert_eq!(series[11].month, "mars 2026");
        assert!(series.iter().all(|p| p.count == 1));
    }

    #[test]
    fn test_monthly_series_sorted_by_date_not_label() {
        // déc. 2025 sorts after janv. 2025 even though "d" < "j"
        let recalls = vec![
            make_recall("1", "Jouets", RiskLevel::Low, "2025-12-01"),
            make_recall("2", "Jouets", RiskLevel::Low, "2025-01-15"),
            make_recall("3", "Jouets", RiskLevel::Low, "2025-01-20"),
        ];
        let series = monthly_series(&recalls);
        assert_eq!(
            series,
            vec![
                MonthlyCount { month: "janv. 2025".to_string(), count: 2 },
                MonthlyCount { month: "déc. 2025".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_risk_evolution_parallel_counters() {
        let recalls = vec![
            make_recall("1", "Jouets", RiskLevel::Critical, "2026-05-01"),
            make_recall("2", "Jouets", RiskLevel::Critical, "2026-05-02"),
            make_recall("3", "Jouets", RiskLevel::High, "2026-05-03"),
            make_recall("4", "Jouets", RiskLevel::Low, "2026-06-01"),
        ];
        let series = risk_evolution(&recalls);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].critical, 2);
        assert_eq!(series[0].high, 1);
        assert_eq!(series[0].medium, 0);
        assert_eq!(series[1].low, 1);
    }

    #[test]
    fn test_top_categories_ranking_and_truncation() {
        let long = "Équipements de protection individuelle";
        let mut recalls = vec![
            make_recall("1", "Jouets", RiskLevel::Low, "2026-01-01"),
            make_recall("2", "Jouets", RiskLevel::Low, "2026-01-02"),
            make_recall("3", "Jouets", RiskLevel::Low, "2026-01-03"),
        ];
        recalls.push(make_recall("4", long, RiskLevel::Low, "2026-01-04"));

        let ranks = top_categories(&recalls, 10);
        assert_eq!(ranks[0].category, "Jouets");
        assert_eq!(ranks[0].count, 3);
        assert_eq!(ranks[0].pct, 75.0);
        assert!(ranks[1].category.ends_with("..."));
        assert_eq!(ranks[1].category.chars().count(), 28);
    }

    #[test]
    fn test_ranking_tie_break_is_first_encountered() {
        let recalls = vec![
            make_recall("1", "Viandes", RiskLevel::Low, "2026-01-01"),
            make_recall("2", "Jouets", RiskLevel::Low, "2026-01-02"),
            make_recall("3", "Viandes", RiskLevel::Low, "2026-01-03"),
            make_recall("4", "Jouets", RiskLevel::Low, "2026-01-04"),
        ];
        let first = top_categories(&recalls, 10);
        let second = top_categories(&recalls, 10);
        assert_eq!(first, second);
        assert_eq!(first[0].category, "Viandes");
        assert_eq!(first[1].category, "Jouets");
    }

    #[test]
    fn test_top_brands_no_percentage_and_clip_at_twenty() {
        let mut recall = make_recall("1", "Jouets", RiskLevel::Low, "2026-01-01");
        recall.brand = "Manufacture française de jouets".to_string();
        let ranks = top_brands(&[recall]);
        assert_eq!(ranks.len(), 1);
        assert_eq!(ranks[0].count, 1);
        assert_eq!(ranks[0].brand.chars().count(), 23);
        assert!(ranks[0].brand.ends_with("..."));
    }

    #[test]
    fn test_food_split_sixty_forty() {
        let recalls = vec![
            make_recall("1", "Produits laitiers", RiskLevel::Low, "2026-01-01"),
            make_recall("2", "Produits laitiers", RiskLevel::Low, "2026-01-02"),
            make_recall("3", "Produits laitiers", RiskLevel::Low, "2026-01-03"),
            make_recall("4", "Jouets", RiskLevel::Low, "2026-01-04"),
            make_recall("5", "Jouets", RiskLevel::Low, "2026-01-05"),
        ];
        let split = food_vs_non_food(&recalls);
        assert_eq!(split.food, 3);
        assert_eq!(split.non_food, 2);
        assert_eq!(split.food_pct, 60.0);
        assert_eq!(split.non_food_pct, 40.0);
    }

    #[test]
    fn test_food_split_empty_has_zero_percentages() {
        let split = food_vs_non_food(&[]);
        assert_eq!(split.food_pct, 0.0);
        assert_eq!(split.non_food_pct, 0.0);
    }

    #[test]
    fn test_risk_distribution_zero_filled() {
        let recalls = vec![
            make_recall("1", "Jouets", RiskLevel::Critical, "2026-01-01"),
            make_recall("2", "Jouets", RiskLevel::Critical, "2026-01-02"),
            make_recall("3", "Jouets", RiskLevel::Low, "2026-01-03"),
            make_recall("4", "Jouets", RiskLevel::Low, "2026-01-04"),
        ];
        let distribution = risk_distribution(&recalls);
        assert_eq!(distribution.len(), 4);
        assert_eq!(distribution[0].level, RiskLevel::Critical);
        assert_eq!(distribution[0].count, 2);
        assert_eq!(distribution[0].pct, 50.0);
        // High and medium present even with no members
        assert_eq!(distribution[1].count, 0);
        assert_eq!(distribution[1].pct, 0.0);
        assert_eq!(distribution[2].count, 0);
    }

    #[test]
    fn test_yearly_comparison_ascending() {
        let recalls = vec![
            make_recall("1", "Jouets", RiskLevel::Low, "2025-06-01"),
            make_recall("2", "Jouets", RiskLevel::Low, "2023-06-01"),
            make_recall("3", "Jouets", RiskLevel::Low, "2025-07-01"),
        ];
        let years = yearly_comparison(&recalls);
        assert_eq!(
            years,
            vec![
                YearlyCount { year: 2023, count: 1 },
                YearlyCount { year: 2025, count: 2 },
            ]
        );
    }

    #[test]
    fn test_critical_rate_rounded_to_one_decimal() {
        // 1 critical out of 3 → 33.3
        let recalls = vec![
            make_recall("1", "Jouets", RiskLevel::Critical, "2026-04-01"),
            make_recall("2", "Jouets", RiskLevel::Low, "2026-04-02"),
            make_recall("3", "Jouets", RiskLevel::Low, "2026-04-03"),
        ];
        let series = critical_rate_series(&recalls);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].rate_pct, 33.3);
    }

    #[test]
    fn test_category_risk_breakdown_top_six() {
        let mut recalls = Vec::new();
        for (i, category) in ["A", "B", "C", "D", "E", "F", "G"].iter().enumerate() {
            // Category "A" gets 8 recalls, "B" 7, ... "G" 2
            for j in 0..(8 - i) {
                recalls.push(make_recall(
                    &format!("{category}{j}"),
                    category,
                    if j == 0 { RiskLevel::Critical } else { RiskLevel::Low },
                    "2026-03-01",
                ));
            }
        }
        let breakdown = category_risk_breakdown(&recalls);
        assert_eq!(breakdown.len(), 6);
        assert_eq!(breakdown[0].category, "A");
        assert_eq!(breakdown[0].critical, 1);
        assert_eq!(breakdown[0].low, 7);
        // "G" fell out of the top 6
        assert!(breakdown.iter().all(|row| row.category != "G"));

        let radar = radar_data(&recalls);
        assert_eq!(radar.len(), 6);
        assert_eq!(radar[0].critical, 1);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let recalls = vec![
            make_recall("1", "Produits laitiers", RiskLevel::Critical, "2026-05-01"),
            make_recall("2", "Jouets", RiskLevel::Low, "2026-06-01"),
            make_recall("3", "Viandes", RiskLevel::High, "2026-07-15"),
        ];
        assert_eq!(dashboard(&recalls, now()), dashboard(&recalls, now()));
    }

    #[test]
    fn test_dashboard_empty_collection_degrades() {
        let empty = dashboard(&[], now());
        assert_eq!(empty.kpis, None);
        assert!(empty.monthly.is_empty());
        assert!(empty.yearly.is_empty());
        assert_eq!(empty.risk_distribution.len(), 4);
        assert!(empty.risk_distribution.iter().all(|s| s.pct == 0.0));
    }
}
