// 📊 Analytics - filtering, summary statistics, histogram, outliers
//
// Everything here is a pure function of (records, filter). Front ends call
// `AnalyticsReport::build` on every filter change.

use crate::games::GameType;
use crate::mock_data::CandidateRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Number of histogram bins.
pub const HISTOGRAM_BINS: usize = 20;

// ============================================================================
// FILTER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsFilter {
    /// Attempts faster than this many seconds are excluded
    pub time_threshold: u32,

    /// Inclusive lower score bound
    pub score_min: u32,

    /// Inclusive upper score bound
    pub score_max: u32,

    pub show_outliers: bool,
}

impl Default for AnalyticsFilter {
    fn default() -> Self {
        AnalyticsFilter {
            time_threshold: 30,
            score_min: 0,
            score_max: 100,
            show_outliers: true,
        }
    }
}

impl AnalyticsFilter {
    pub fn matches(&self, record: &CandidateRecord) -> bool {
        let meets_time_threshold = record.time_taken >= self.time_threshold;
        let meets_score_range = record.score >= self.score_min && record.score <= self.score_max;
        meets_time_threshold && meets_score_range
    }
}

/// Records passing the filter, in their original order.
pub fn filter_candidates<'a>(
    records: &'a [CandidateRecord],
    filter: &AnalyticsFilter,
) -> Vec<&'a CandidateRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

// ============================================================================
// STATISTICS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub mean: f64,

    /// Population standard deviation
    pub std_dev: f64,

    pub count: usize,
}

impl Statistics {
    /// Mean and standard deviation rounded to two decimals for display.
    pub fn rounded(&self) -> Statistics {
        Statistics {
            mean: round2(self.mean),
            std_dev: round2(self.std_dev),
            count: self.count,
        }
    }

    /// Scores strictly outside `mean ± 2σ` are outliers.
    pub fn outlier_bounds(&self) -> (f64, f64) {
        (self.mean - 2.0 * self.std_dev, self.mean + 2.0 * self.std_dev)
    }

    pub fn is_outlier(&self, score: u32) -> bool {
        let (lower, upper) = self.outlier_bounds();
        let score = score as f64;
        score < lower || score > upper
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn compute_statistics(records: &[&CandidateRecord]) -> Statistics {
    if records.is_empty() {
        return Statistics::default();
    }

    let n = records.len() as f64;
    let mean = records.iter().map(|r| r.score as f64).sum::<f64>() / n;
    let variance = records
        .iter()
        .map(|r| (r.score as f64 - mean).powi(2))
        .sum::<f64>()
        / n;

    Statistics {
        mean,
        std_dev: variance.sqrt(),
        count: records.len(),
    }
}

// ============================================================================
// HISTOGRAM
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// "lo-hi" with both ends rounded
    pub range: String,
    pub count: usize,
    pub mid_point: f64,
}

/// Score distribution over a fixed number of equal-width bins.
///
/// The range always covers 0-100 and widens if a score falls outside it.
pub fn build_histogram(records: &[&CandidateRecord]) -> Vec<HistogramBin> {
    let min_score = records.iter().map(|r| r.score as f64).fold(0.0_f64, f64::min);
    let max_score = records.iter().map(|r| r.score as f64).fold(100.0_f64, f64::max);
    let bin_width = (max_score - min_score) / HISTOGRAM_BINS as f64;

    let mut bins: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
        .map(|i| {
            let lo = min_score + i as f64 * bin_width;
            let hi = min_score + (i + 1) as f64 * bin_width;
            HistogramBin {
                range: format!("{}-{}", lo.round(), hi.round()),
                count: 0,
                mid_point: min_score + (i as f64 + 0.5) * bin_width,
            }
        })
        .collect();

    for record in records {
        let offset = ((record.score as f64 - min_score) / bin_width).floor();
        if offset >= 0.0 {
            let index = (offset as usize).min(HISTOGRAM_BINS - 1);
            bins[index].count += 1;
        }
    }

    bins
}

// ============================================================================
// OUTLIERS
// ============================================================================

/// Ids of records whose score lies more than two standard deviations from
/// the mean.
pub fn detect_outliers(records: &[&CandidateRecord], stats: &Statistics) -> HashSet<Uuid> {
    if records.is_empty() {
        return HashSet::new();
    }

    records
        .iter()
        .filter(|r| stats.is_outlier(r.score))
        .map(|r| r.id)
        .collect()
}

// ============================================================================
// REPORT
// ============================================================================

/// One row of the candidate table.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayRow<'a> {
    pub record: &'a CandidateRecord,

    /// Only ever set while outliers are shown
    pub is_outlier: bool,
}

/// Everything the analytics view shows for one game and one filter.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport<'a> {
    pub game: GameType,
    pub filter: AnalyticsFilter,
    pub filtered: Vec<&'a CandidateRecord>,
    pub statistics: Statistics,
    pub histogram: Vec<HistogramBin>,
    pub outliers: HashSet<Uuid>,
}

impl<'a> AnalyticsReport<'a> {
    pub fn build(game: GameType, records: &'a [CandidateRecord], filter: AnalyticsFilter) -> Self {
        let filtered = filter_candidates(records, &filter);
        let statistics = compute_statistics(&filtered);
        let histogram = build_histogram(&filtered);
        let outliers = detect_outliers(&filtered, &statistics);

        AnalyticsReport {
            game,
            filter,
            filtered,
            statistics,
            histogram,
            outliers,
        }
    }

    /// Rows for the candidate table: every filtered record with outliers
    /// tagged, or the filtered records minus outliers when they are hidden.
    pub fn display_rows(&self) -> Vec<DisplayRow<'a>> {
        if self.filter.show_outliers {
            self.filtered
                .iter()
                .map(|&record| DisplayRow {
                    record,
                    is_outlier: self.outliers.contains(&record.id),
                })
                .collect()
        } else {
            self.filtered
                .iter()
                .filter(|r| !self.outliers.contains(&r.id))
                .map(|&record| DisplayRow {
                    record,
                    is_outlier: false,
                })
                .collect()
        }
    }

    pub fn is_outlier(&self, id: &Uuid) -> bool {
        self.outliers.contains(id)
    }

    pub fn summary(&self) -> String {
        let stats = self.statistics.rounded();
        format!(
            "{}: {} candidates, mean {:.2}, std dev {:.2}, {} outliers",
            self.game.display_name(),
            stats.count,
            stats.mean,
            stats.std_dev,
            self.outliers.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_data::{GameDetails, MockDataset};
    use chrono::Utc;

    fn record(score: u32, time_taken: u32) -> CandidateRecord {
        CandidateRecord {
            id: Uuid::new_v4(),
            candidate_name: format!("Candidate {}", score),
            score,
            time_taken,
            completion_date: Utc::now(),
            details: GameDetails::InterviewMode {
                questions_answered: 4,
                average_response_length: 350,
                response_quality: 90,
            },
        }
    }

    fn refs(records: &[CandidateRecord]) -> Vec<&CandidateRecord> {
        records.iter().collect()
    }

    #[test]
    fn test_default_filter() {
        let filter = AnalyticsFilter::default();
        assert_eq!(filter.time_threshold, 30);
        assert_eq!(filter.score_min, 0);
        assert_eq!(filter.score_max, 100);
        assert!(filter.show_outliers);
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let records = vec![
            record(59, 100),
            record(60, 100),
            record(80, 100),
            record(81, 100),
            record(70, 44),
            record(70, 45),
        ];
        let filter = AnalyticsFilter {
            time_threshold: 45,
            score_min: 60,
            score_max: 80,
            show_outliers: true,
        };

        let scores: Vec<(u32, u32)> = filter_candidates(&records, &filter)
            .iter()
            .map(|r| (r.score, r.time_taken))
            .collect();

        assert_eq!(scores, vec![(60, 100), (80, 100), (70, 45)]);
    }

    #[test]
    fn test_statistics_closed_form() {
        let records = vec![record(2, 60), record(4, 60), record(4, 60), record(4, 60), record(5, 60), record(5, 60), record(7, 60), record(9, 60)];
        let stats = compute_statistics(&refs(&records));

        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        // Population variance of this set is exactly 4
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_statistics_empty_input() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats, Statistics { mean: 0.0, std_dev: 0.0, count: 0 });
    }

    #[test]
    fn test_statistics_rounding() {
        let records = vec![record(70, 60), record(71, 60), record(71, 60)];
        let stats = compute_statistics(&refs(&records)).rounded();
        assert_eq!(stats.mean, 70.67);
        assert_eq!(stats.std_dev, 0.47);
    }

    #[test]
    fn test_histogram_has_twenty_bins_and_sums_to_count() {
        let data = MockDataset::seeded(3, 90);
        for game in GameType::ALL {
            let filtered = filter_candidates(data.candidates_for(game), &AnalyticsFilter::default());
            let bins = build_histogram(&filtered);
            assert_eq!(bins.len(), HISTOGRAM_BINS);
            assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), filtered.len());
        }
    }

    #[test]
    fn test_histogram_bin_layout() {
        let records = vec![record(0, 60), record(4, 60), record(5, 60), record(99, 60), record(100, 60)];
        let bins = build_histogram(&refs(&records));

        assert_eq!(bins[0].range, "0-5");
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[0].mid_point, 2.5);
        assert_eq!(bins[1].count, 1);
        // 100 lands in the last bin rather than past it
        assert_eq!(bins[19].range, "95-100");
        assert_eq!(bins[19].count, 2);
    }

    #[test]
    fn test_histogram_of_empty_input() {
        let bins = build_histogram(&[]);
        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert!(bins.iter().all(|b| b.count == 0));
    }

    #[test]
    fn test_outliers_are_beyond_two_std_devs() {
        let mut records: Vec<CandidateRecord> = (0..20).map(|_| record(80, 60)).collect();
        records.push(record(81, 60));
        records.push(record(20, 60));

        let filtered = refs(&records);
        let stats = compute_statistics(&filtered);
        let outliers = detect_outliers(&filtered, &stats);

        let (lower, upper) = stats.outlier_bounds();
        for r in &records {
            let expected = (r.score as f64) < lower || (r.score as f64) > upper;
            assert_eq!(outliers.contains(&r.id), expected, "score {}", r.score);
        }
        assert!(outliers.contains(&records[21].id));
        assert!(!outliers.contains(&records[0].id));
    }

    #[test]
    fn test_outlier_bounds_are_strict() {
        let stats = Statistics { mean: 50.0, std_dev: 10.0, count: 4 };
        assert!(!stats.is_outlier(30));
        assert!(!stats.is_outlier(70));
        assert!(stats.is_outlier(29));
        assert!(stats.is_outlier(71));
    }

    #[test]
    fn test_outliers_use_unrounded_statistics() {
        // Rounded for display this is mean 50.00, σ 10.00 with a lower bound
        // of exactly 30; unrounded the bound is 30.004.
        let stats = Statistics { mean: 50.004, std_dev: 10.0, count: 2 };
        assert_eq!(stats.rounded().mean, 50.0);
        assert!(!stats.rounded().is_outlier(30));

        let records = vec![record(30, 60), record(50, 60)];
        let outliers = detect_outliers(&refs(&records), &stats);
        assert!(outliers.contains(&records[0].id));
        assert!(!outliers.contains(&records[1].id));
    }

    #[test]
    fn test_no_outliers_for_uniform_scores() {
        let records: Vec<CandidateRecord> = (0..5).map(|_| record(75, 60)).collect();
        let filtered = refs(&records);
        let stats = compute_statistics(&filtered);
        assert_eq!(stats.std_dev, 0.0);
        assert!(detect_outliers(&filtered, &stats).is_empty());
    }

    #[test]
    fn test_display_rows_hide_outliers() {
        let mut records: Vec<CandidateRecord> = (0..20).map(|_| record(80, 60)).collect();
        records.push(record(10, 60));

        let shown = AnalyticsReport::build(GameType::InterviewMode, &records, AnalyticsFilter::default());
        let rows = shown.display_rows();
        assert_eq!(rows.len(), 21);
        assert_eq!(rows.iter().filter(|r| r.is_outlier).count(), 1);

        let hidden_filter = AnalyticsFilter { show_outliers: false, ..AnalyticsFilter::default() };
        let hidden = AnalyticsReport::build(GameType::InterviewMode, &records, hidden_filter);
        let rows = hidden.display_rows();
        assert_eq!(rows.len(), 20);
        assert!(rows.iter().all(|r| !r.is_outlier && r.record.score == 80));
        // Statistics still cover the outlier
        assert_eq!(hidden.statistics.count, 21);
    }

    #[test]
    fn test_report_on_empty_filter_result() {
        let records = vec![record(50, 10)];
        let report = AnalyticsReport::build(GameType::BartTest, &records, AnalyticsFilter::default());
        assert!(report.filtered.is_empty());
        assert_eq!(report.statistics.count, 0);
        assert!(report.outliers.is_empty());
        assert!(report.display_rows().is_empty());
        assert_eq!(report.summary(), "BART Test: 0 candidates, mean 0.00, std dev 0.00, 0 outliers");
    }
}
