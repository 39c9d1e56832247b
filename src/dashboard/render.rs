// Plain-text rendering of dashboard views. No I/O here.
use crate::client::hook::{FetchPhase, ViewState};
use crate::model::{
    Classification, CompareResponse, Confidence, ForecastPoint, HistoryPoint, Insight, ModelInfo, Predictions,
    SentimentLabel, SentimentSnapshot, StatsResponse, TrendDirection,
};
use crate::utils::{format_uptime, percent};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

const BAR_WIDTH: usize = 30;
const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn spark(score: f64) -> char {
    let level = (score.clamp(0.0, 100.0) / 100.0 * 7.0).round() as usize;
    SPARKS[level.min(7)]
}

fn trend_arrow(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Up => "📈 up",
        TrendDirection::Down => "📉 down",
        TrendDirection::Stable => "➡️ stable",
        TrendDirection::Unknown => "❔ n/a",
    }
}

fn share(distribution: &BTreeMap<SentimentLabel, f64>, label: SentimentLabel) -> u32 {
    percent(distribution.get(&label).copied().unwrap_or(0.0))
}

/// Headline cards: score, the share of each tone, data points and trend.
pub fn metric_cards(snapshot: &SentimentSnapshot) -> String {
    let current = &snapshot.current_sentiment;
    let distribution = snapshot.distribution();
    let cards = [
        format!("Score {:.1}/100 ({})", current.score, current.label),
        format!("Positive {}%", share(distribution, SentimentLabel::Positive)),
        format!("Negative {}%", share(distribution, SentimentLabel::Negative)),
        format!("Frustrated {}%", share(distribution, SentimentLabel::Frustrated)),
        format!("Satisfied {}%", share(distribution, SentimentLabel::Satisfied)),
        format!("Posts {}", snapshot.data_points),
        format!("Trend {}", trend_arrow(snapshot.predictions.trend_direction)),
    ];
    cards.iter().map(|c| format!("[ {} ]", c)).collect::<Vec<_>>().join(" ")
}

/// Sparkline of the daily history, followed by the forecast after a `|`.
pub fn trend_chart(history: &[HistoryPoint], forecast: &[ForecastPoint]) -> String {
    if history.is_empty() {
        return "No history yet".to_string();
    }
    let past: String = history.iter().map(|p| spark(p.score)).collect();
    let mut chart = format!(
        "{} {} {}",
        history[0].date,
        past,
        history[history.len() - 1].date
    );
    if let Some(last) = forecast.last() {
        let future: String = forecast.iter().map(|f| spark(f.predicted_score)).collect();
        let _ = write!(chart, " | {} {}", future, last.date);
    }
    chart
}

pub fn distribution_bars(distribution: &BTreeMap<SentimentLabel, f64>) -> String {
    if distribution.is_empty() {
        return "No classified posts".to_string();
    }
    let mut out = String::new();
    for label in SentimentLabel::ALL {
        let fraction = distribution.get(&label).copied().unwrap_or(0.0);
        let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
        let _ = writeln!(
            out,
            "{:<11}{}{} {:>3}%",
            label.as_str(),
            "█".repeat(filled),
            "░".repeat(BAR_WIDTH - filled),
            percent(fraction)
        );
    }
    out.trim_end().to_string()
}

pub fn insights_list(insights: &[Insight]) -> String {
    if insights.is_empty() {
        return "No insights available".to_string();
    }
    insights
        .iter()
        .enumerate()
        .map(|(i, insight)| format!("{}. {}", i + 1, insight.description))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn prediction_panel(predictions: &Predictions) -> String {
    if predictions.trend_direction == TrendDirection::Unknown {
        return "🔮 Not enough history for a forecast".to_string();
    }
    let mut out = format!(
        "🔮 {} for {} days, strength {:.1}, confidence {:.0}%",
        trend_arrow(predictions.trend_direction),
        predictions.forecast_days,
        predictions.trend_strength,
        predictions.confidence
    );
    for point in &predictions.forecast {
        let _ = write!(
            out,
            "\n   {}  {:>5.1}  [{:.1} .. {:.1}]",
            point.date, point.predicted_score, point.lower_bound, point.upper_bound
        );
    }
    out
}

/// Full screen for one view state.
pub fn render_dashboard(state: &ViewState) -> String {
    let mut out = format!("=== DevPulse · {} ===\n", state.technology);
    match state.phase() {
        FetchPhase::Loading => out.push_str("⏳ Loading...\n"),
        FetchPhase::Failed => {
            let _ = writeln!(out, "⚠️ {}", state.error.as_deref().unwrap_or_default());
        }
        FetchPhase::Idle | FetchPhase::Ready => {}
    }

    if let Some(snapshot) = &state.sentiment {
        let _ = writeln!(out, "{}", metric_cards(snapshot));
        let _ = writeln!(out, "\n📊 Sentiment trend\n{}", trend_chart(&snapshot.historical_data, &snapshot.predictions.forecast));
        let _ = writeln!(out, "\n🧮 Distribution\n{}", distribution_bars(snapshot.distribution()));
        let _ = writeln!(out, "\n{}", prediction_panel(&snapshot.predictions));
        let _ = writeln!(
            out,
            "\nSources: GitHub {} · Stack Overflow {} · updated {}",
            snapshot.sources.github,
            snapshot.sources.stackoverflow,
            snapshot.last_updated.format("%Y-%m-%d %H:%M UTC")
        );
    }

    if state.sentiment.is_some() || !state.insights.is_empty() {
        let _ = writeln!(out, "\n💡 Insights\n{}", insights_list(&state.insights));
    }
    out
}

pub fn render_comparison(response: &CompareResponse) -> String {
    let mut ranked: Vec<(&String, &f64)> = response.comparison.iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(a.1));
    let mut out = String::from("🏁 Comparison:");
    for (technology, score) in ranked {
        let _ = write!(out, "\n🔹 {:<12} {:>5.1} {}", technology, score, spark(*score));
    }
    if !response.missing.is_empty() {
        let _ = write!(out, "\n📭 No data: {}", response.missing.join(", "));
    }
    out
}

pub fn render_classification(result: &Classification) -> String {
    let confidence = match result.confidence {
        Confidence::Low => "low",
        Confidence::Medium => "medium",
        Confidence::High => "high",
    };
    format!(
        "🔍 {} (score {:.2}, {} confidence)\n   {}",
        result.label, result.score, confidence, result.reasoning
    )
}

pub fn render_stats(stats: &StatsResponse) -> String {
    let mut out = format!(
        "📊 Cached: {} [{}]\n⏱ Uptime: {}",
        stats.cache_size,
        stats.cached.join(", "),
        format_uptime(Duration::from_secs(stats.uptime_seconds))
    );
    if let Some(recorded) = stats.snapshots_recorded {
        let _ = write!(out, "\n🗄 Snapshots recorded: {}", recorded);
    }
    out
}

pub fn render_model_info(info: Option<&ModelInfo>) -> String {
    match info {
        Some(info) => format!(
            "⚙️ Sentiment model: {}\n⚙️ Forecaster: {} ({} days)\n⚙️ Cache TTL: {}s",
            info.sentiment_model, info.forecaster, info.forecast_days, info.cache_ttl_seconds
        ),
        None => "⚠️ Model info unavailable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_snapshot;
    use chrono::NaiveDate;

    fn react_view() -> ViewState {
        let snapshot = sample_snapshot(
            "react",
            &[
                (SentimentLabel::Positive, 0.72),
                (SentimentLabel::Negative, 0.18),
                (SentimentLabel::Frustrated, 0.10),
            ],
        );
        ViewState {
            technology: "react".into(),
            sentiment: Some(snapshot),
            insights: vec![Insight::new("Most posts are positive (72%)")],
            loading: false,
            error: None,
        }
    }

    #[test]
    fn cards_show_rounded_shares() {
        let view = react_view();
        let cards = metric_cards(view.sentiment.as_ref().unwrap());
        assert!(cards.contains("Positive 72%"));
        assert!(cards.contains("Negative 18%"));
        assert!(cards.contains("Frustrated 10%"));
        assert!(cards.contains("Satisfied 0%"));

        let bars = distribution_bars(view.sentiment.as_ref().unwrap().distribution());
        let positive = bars.lines().next().unwrap();
        assert!(positive.starts_with("POSITIVE"));
        assert!(positive.ends_with(" 72%"));
        assert_eq!(positive.matches('█').count(), 22);
    }

    #[test]
    fn dashboard_sections() {
        let screen = render_dashboard(&react_view());
        assert!(screen.starts_with("=== DevPulse · react ==="));
        assert!(screen.contains("1. Most posts are positive (72%)"));
        assert!(screen.contains("Not enough history for a forecast"));
        assert!(!screen.contains("Loading"));

        let failed = ViewState {
            error: Some("Failed to load dashboard data".into()),
            ..ViewState::new("vue")
        };
        let screen = render_dashboard(&failed);
        assert!(screen.contains("⚠️ Failed to load dashboard data"));
        assert!(!screen.contains("Insights"));
    }

    #[test]
    fn sparkline_tracks_scores() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let history: Vec<HistoryPoint> = [0.0, 50.0, 100.0]
            .iter()
            .enumerate()
            .map(|(i, s)| HistoryPoint { date: start + chrono::Duration::days(i as i64), score: *s })
            .collect();
        assert_eq!(trend_chart(&history, &[]), "2024-05-01 ▁▅█ 2024-05-03");
        assert_eq!(trend_chart(&[], &[]), "No history yet");
    }

    #[test]
    fn comparison_is_ranked() {
        let response = CompareResponse {
            comparison: BTreeMap::from([("react".to_string(), 55.0), ("vue".to_string(), 71.5)]),
            missing: vec!["cobol".into()],
        };
        let text = render_comparison(&response);
        let vue = text.find("vue").unwrap();
        let react = text.find("react").unwrap();
        assert!(vue < react);
        assert!(text.ends_with("📭 No data: cobol"));
        assert_eq!(render_model_info(None), "⚠️ Model info unavailable");
    }
}
