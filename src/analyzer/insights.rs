use crate::model::{AnomalyKind, Insight, SentimentSnapshot, TrendDirection};
use crate::utils::percent;

const FRUSTRATION_ALERT: f64 = 0.2;

/// Human-readable findings for a snapshot, most important first.
pub fn generate(snapshot: &SentimentSnapshot) -> Vec<Insight> {
    let current = &snapshot.current_sentiment;
    let mut insights = vec![Insight::new(format!(
        "{} sentiment score is {:.1}/100 across {} posts",
        snapshot.technology, current.score, snapshot.data_points
    ))];

    let dominant = current
        .distribution
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(label, share)| (*label, *share));
    if let Some((label, share)) = dominant {
        insights.push(Insight::new(format!(
            "Most posts are {} ({}%)",
            label.as_str().to_lowercase(),
            percent(share)
        )));
    }

    if current.frustration_rate > FRUSTRATION_ALERT {
        insights.push(Insight::new(format!(
            "High frustration: {}% of posts express frustration",
            percent(current.frustration_rate)
        )));
    } else if current.satisfaction_rate > FRUSTRATION_ALERT {
        insights.push(Insight::new(format!(
            "Developers are largely satisfied ({}% of posts)",
            percent(current.satisfaction_rate)
        )));
    }

    let predictions = &snapshot.predictions;
    let trend = match predictions.trend_direction {
        TrendDirection::Up => format!(
            "Sentiment is trending up over the next {} days (+{:.1} points)",
            predictions.forecast_days, predictions.trend_strength
        ),
        TrendDirection::Down => format!(
            "Sentiment is trending down over the next {} days (-{:.1} points)",
            predictions.forecast_days, predictions.trend_strength
        ),
        TrendDirection::Stable => "Sentiment is expected to stay stable".to_string(),
        TrendDirection::Unknown => "Not enough history to forecast a trend".to_string(),
    };
    insights.push(Insight::new(trend));

    if let Some(analysis) = &snapshot.trend_analysis {
        if analysis.trend_change_percent.abs() >= 10.0 {
            insights.push(Insight::new(format!(
                "Last week moved {:+.1}% against the earlier average",
                analysis.trend_change_percent
            )));
        }
    }

    if let Some(latest) = snapshot.anomalies.last() {
        let kind = match latest.kind {
            AnomalyKind::Spike => "spike",
            AnomalyKind::Drop => "drop",
        };
        insights.push(Insight::new(format!(
            "{} unusual day(s) detected, latest a {} on {}",
            snapshot.anomalies.len(),
            kind,
            latest.date
        )));
    }

    if !snapshot.topics.keywords.is_empty() {
        let top: Vec<&str> = snapshot.topics.keywords.iter().take(5).map(String::as_str).collect();
        insights.push(Insight::new(format!("Hot topics: {}", top.join(", "))));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Anomaly, AnomalyMethod, CurrentSentiment, Predictions, SentimentLabel, SourceCounts,
        TopicSummary,
    };
    use chrono::{NaiveDate, Utc};
    use std::collections::BTreeMap;

    fn snapshot() -> SentimentSnapshot {
        let mut distribution = BTreeMap::new();
        distribution.insert(SentimentLabel::Positive, 0.5);
        distribution.insert(SentimentLabel::Frustrated, 0.3);
        distribution.insert(SentimentLabel::Neutral, 0.2);
        SentimentSnapshot {
            technology: "react".into(),
            last_updated: Utc::now(),
            data_points: 40,
            current_sentiment: CurrentSentiment {
                score: 61.34,
                label: SentimentLabel::Positive,
                distribution,
                frustration_rate: 0.3,
                satisfaction_rate: 0.0,
            },
            historical_data: Vec::new(),
            predictions: Predictions::unavailable(7),
            trend_analysis: None,
            anomalies: Vec::new(),
            topics: TopicSummary::default(),
            categories: BTreeMap::new(),
            sources: SourceCounts { github: 20, stackoverflow: 20 },
        }
    }

    #[test]
    fn ordered_insights() {
        let mut snap = snapshot();
        snap.topics.keywords = vec!["hooks".into(), "render".into()];
        snap.anomalies.push(Anomaly {
            date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            value: 20.0,
            kind: AnomalyKind::Drop,
            method: AnomalyMethod::Statistical,
            deviation: -2.8,
        });

        let descriptions: Vec<String> = generate(&snap).into_iter().map(|i| i.description).collect();
        assert_eq!(
            descriptions,
            vec![
                "react sentiment score is 61.3/100 across 40 posts",
                "Most posts are positive (50%)",
                "High frustration: 30% of posts express frustration",
                "Not enough history to forecast a trend",
                "1 unusual day(s) detected, latest a drop on 2024-05-03",
                "Hot topics: hooks, render",
            ]
        );
    }

    #[test]
    fn upward_trend_is_reported() {
        let mut snap = snapshot();
        snap.current_sentiment.frustration_rate = 0.1;
        snap.predictions.trend_direction = TrendDirection::Up;
        snap.predictions.trend_strength = 4.0;
        let insights = generate(&snap);
        assert_eq!(insights.len(), 3);
        assert_eq!(
            insights[2].description,
            "Sentiment is trending up over the next 7 days (+4.0 points)"
        );
    }
}
