use crate::model::{Anomaly, AnomalyKind, AnomalyMethod, HistoryPoint};

pub const DEFAULT_Z_THRESHOLD: f64 = 2.5;
pub const DEFAULT_WINDOW: usize = 7;
pub const DEFAULT_WINDOW_THRESHOLD: f64 = 0.25;

fn sorted(history: &[HistoryPoint]) -> Vec<HistoryPoint> {
    let mut points: Vec<HistoryPoint> =
        history.iter().filter(|p| p.score.is_finite()).cloned().collect();
    points.sort_by_key(|p| p.date);
    points
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Single days whose z-score (population std) reaches `z_threshold`.
pub fn detect_statistical(history: &[HistoryPoint], z_threshold: f64) -> Vec<Anomaly> {
    let points = sorted(history);
    if points.len() < 2 {
        return Vec::new();
    }
    let values: Vec<f64> = points.iter().map(|p| p.score).collect();
    let avg = mean(&values);
    let std = (values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64).sqrt();
    if std == 0.0 {
        return Vec::new();
    }

    points
        .iter()
        .filter_map(|p| {
            let z = (p.score - avg) / std;
            (z.abs() >= z_threshold).then(|| Anomaly {
                date: p.date,
                value: p.score,
                kind: if z > 0.0 { AnomalyKind::Spike } else { AnomalyKind::Drop },
                method: AnomalyMethod::Statistical,
                deviation: z,
            })
        })
        .collect()
}

/// Days where the trailing `window` mean moves away from the preceding
/// `2 * window` baseline by at least `threshold` (relative).
pub fn detect_window(history: &[HistoryPoint], window: usize, threshold: f64) -> Vec<Anomaly> {
    let points = sorted(history);
    if window == 0 || points.len() < window * 2 {
        return Vec::new();
    }
    let values: Vec<f64> = points.iter().map(|p| p.score).collect();
    let trailing = |end: usize, len: usize| mean(&values[(end + 1).saturating_sub(len)..=end]);

    let mut anomalies = Vec::new();
    for i in window..values.len() {
        let rolling = trailing(i, window);
        let baseline = trailing(i - window, window * 2);
        if baseline == 0.0 {
            continue;
        }
        let change = (rolling - baseline) / baseline;
        if change.abs() >= threshold {
            anomalies.push(Anomaly {
                date: points[i].date,
                value: rolling,
                kind: if change > 0.0 { AnomalyKind::Spike } else { AnomalyKind::Drop },
                method: AnomalyMethod::Window,
                deviation: change,
            });
        }
    }
    anomalies
}

/// Both detectors with default thresholds, ordered by date.
pub fn detect(history: &[HistoryPoint]) -> Vec<Anomaly> {
    let mut anomalies = detect_statistical(history, DEFAULT_Z_THRESHOLD);
    anomalies.extend(detect_window(history, DEFAULT_WINDOW, DEFAULT_WINDOW_THRESHOLD));
    anomalies.sort_by_key(|a| a.date);
    anomalies
}
