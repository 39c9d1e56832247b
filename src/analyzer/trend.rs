use crate::model::{AnalysisError, ForecastPoint, HistoryPoint, Predictions, TrendAnalysis, TrendDirection};
use chrono::{Datelike, Duration};

/// Time-series forecaster for daily sentiment scores.
pub trait Forecaster: Send + Sync {
    fn name(&self) -> &str;
    fn forecast(&self, history: &[HistoryPoint], days_ahead: usize) -> Result<Predictions, AnalysisError>;
}

/// Least-squares trend with additive weekly seasonality and normal prediction intervals.
pub struct LinearTrendForecaster {
    min_points: usize,
    /// Two-sided z value for the interval (1.96 = 95%).
    interval_z: f64,
}

impl LinearTrendForecaster {
    pub fn new(min_points: usize) -> Self {
        Self { min_points: min_points.max(2), interval_z: 1.96 }
    }
}

/// Sorted by date, one point per day, finite scores only.
fn prepare(history: &[HistoryPoint]) -> Vec<HistoryPoint> {
    let mut points: Vec<HistoryPoint> =
        history.iter().filter(|p| p.score.is_finite()).cloned().collect();
    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    points
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

impl Forecaster for LinearTrendForecaster {
    fn name(&self) -> &str {
        "linear-weekly"
    }

    fn forecast(&self, history: &[HistoryPoint], days_ahead: usize) -> Result<Predictions, AnalysisError> {
        let points = prepare(history);
        if points.len() < self.min_points {
            return Err(AnalysisError::InsufficientData { needed: self.min_points, got: points.len() });
        }
        let days_ahead = days_ahead.max(1);

        let origin = points[0].date;
        let xs: Vec<f64> = points.iter().map(|p| (p.date - origin).num_days() as f64).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.score).collect();
        let (mx, my) = (mean(&xs), mean(&ys));

        let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
        let sxy: f64 = xs.iter().zip(&ys).map(|(x, y)| (x - mx) * (y - my)).sum();
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = my - slope * mx;

        let residuals: Vec<f64> = xs.iter().zip(&ys).map(|(x, y)| y - (intercept + slope * x)).collect();

        // Weekday offsets need at least two weeks of history
        let span_days = xs.last().copied().unwrap_or(0.0);
        let mut season = [0.0f64; 7];
        if span_days >= 14.0 {
            let mut buckets: [Vec<f64>; 7] = Default::default();
            for (point, r) in points.iter().zip(&residuals) {
                buckets[point.date.weekday().num_days_from_monday() as usize].push(*r);
            }
            for (offset, bucket) in season.iter_mut().zip(&buckets) {
                *offset = mean(bucket);
            }
        }

        let sse: f64 = points
            .iter()
            .zip(&residuals)
            .map(|(p, r)| (r - season[p.date.weekday().num_days_from_monday() as usize]).powi(2))
            .sum();
        let dof = points.len().saturating_sub(2).max(1) as f64;
        let sigma = (sse / dof).sqrt();
        let half_width = self.interval_z * sigma;

        let last = points[points.len() - 1].date;
        let forecast: Vec<ForecastPoint> = (1..=days_ahead as i64)
            .map(|k| {
                let date = last + Duration::days(k);
                let x = (date - origin).num_days() as f64;
                let yhat = intercept + slope * x + season[date.weekday().num_days_from_monday() as usize];
                ForecastPoint {
                    date,
                    predicted_score: yhat.clamp(0.0, 100.0),
                    lower_bound: (yhat - half_width).clamp(0.0, 100.0),
                    upper_bound: (yhat + half_width).clamp(0.0, 100.0),
                }
            })
            .collect();

        let change = forecast[forecast.len() - 1].predicted_score - forecast[0].predicted_score;
        let trend_direction = if change > 1e-6 {
            TrendDirection::Up
        } else if change < -1e-6 {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        };
        let avg_width = mean(&forecast.iter().map(|f| f.upper_bound - f.lower_bound).collect::<Vec<_>>());

        Ok(Predictions {
            trend_direction,
            trend_strength: change.abs().min(100.0),
            confidence: (100.0 - avg_width).clamp(0.0, 100.0),
            forecast,
            forecast_days: days_ahead,
        })
    }
}

/// Summary of the observed history, without forecasting.
pub fn analyze_trend(history: &[HistoryPoint]) -> Option<TrendAnalysis> {
    let points = prepare(history);
    if points.len() < 2 {
        return None;
    }
    let scores: Vec<f64> = points.iter().map(|p| p.score).collect();
    let n = scores.len();

    let recent_avg = mean(&scores[n.saturating_sub(7)..]);
    let older_avg = mean(&scores[..n.saturating_sub(7).max(1)]);
    let trend_change_percent = if older_avg != 0.0 {
        (recent_avg - older_avg) / older_avg * 100.0
    } else {
        0.0
    };

    let average = mean(&scores);
    let variance = scores.iter().map(|s| (s - average).powi(2)).sum::<f64>() / (n - 1) as f64;

    Some(TrendAnalysis {
        current_score: scores[n - 1],
        average_score: average,
        trend_change_percent,
        volatility: variance.sqrt(),
        data_points: n,
        start: points[0].date,
        end: points[n - 1].date,
    })
}
