// Utility functions
use chrono::{DateTime, Utc};
use scraper::Html;
use std::time::Duration;

/// Преобразует строку в `DateTime<Utc>`, если возможно.
pub fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Ключ кэша: имя технологии без пробелов по краям и в нижнем регистре.
pub fn normalize_key(technology: &str) -> String {
    technology.trim().to_lowercase()
}

/// Извлекает текст из HTML-фрагмента (тела вопросов Stack Overflow приходят в HTML).
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Доля в целых процентах, с округлением.
pub fn percent(fraction: f64) -> u32 {
    if !fraction.is_finite() {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Форматирует длительность как HH:MM:SS.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
