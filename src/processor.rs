// Turns collected posts into documents and daily history
use crate::model::{Classification, Document, HistoryPoint, PostCategory, RawPost, Source};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub fn process_posts(posts: &[RawPost], technology: &str) -> Vec<Document> {
    posts.iter().map(|post| process_post(post, technology)).collect()
}

fn process_post(post: &RawPost, technology: &str) -> Document {
    let text = format!("{} {}", post.title, post.body).trim().to_string();
    Document {
        technology: technology.to_string(),
        source: post.source,
        text,
        date: post.created_at.date_naive(),
        category: categorize(post),
        engagement: engagement(post),
    }
}

fn categorize(post: &RawPost) -> PostCategory {
    if post.source == Source::Stackoverflow {
        return PostCategory::Question;
    }
    let labels: Vec<String> = post.labels.iter().map(|l| l.to_lowercase()).collect();
    if labels.iter().any(|l| l.contains("bug")) {
        PostCategory::Bug
    } else if labels.iter().any(|l| l.contains("feature") || l.contains("enhancement")) {
        PostCategory::Feature
    } else if labels.iter().any(|l| l.contains("question") || l.contains("help")) {
        PostCategory::Question
    } else {
        PostCategory::Other
    }
}

fn engagement(post: &RawPost) -> f64 {
    match post.source {
        Source::Github => post.comments as f64 * 2.0 + post.reactions as f64,
        // downvotes don't reduce engagement
        Source::Stackoverflow => post.comments as f64 * 2.0 + post.reactions.max(0) as f64,
    }
}

/// Mean label score per day, ordered by date. `results` is parallel to `docs`.
pub fn daily_history(docs: &[Document], results: &[Classification]) -> Vec<HistoryPoint> {
    let mut by_day: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (doc, result) in docs.iter().zip(results) {
        let entry = by_day.entry(doc.date).or_insert((0.0, 0));
        entry.0 += result.label.numeric_score();
        entry.1 += 1;
    }
    by_day
        .into_iter()
        .map(|(date, (sum, count))| HistoryPoint { date, score: sum / count as f64 })
        .collect()
}

pub fn category_breakdown(docs: &[Document]) -> BTreeMap<PostCategory, usize> {
    let mut counts = BTreeMap::new();
    for doc in docs {
        *counts.entry(doc.category).or_insert(0) += 1;
    }
    counts
}
