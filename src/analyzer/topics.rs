use crate::model::TopicSummary;
use std::collections::{BTreeSet, HashMap};

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "to", "of", "in", "for", "and", "it", "this", "that", "on",
    "with", "as", "be", "or", "by", "from", "at", "have", "has", "was", "were", "but", "if", "not",
    "your", "you", "how", "can", "what", "when", "why", "does", "using", "use",
];

const KNOWN_TECHNOLOGIES: &[&str] = &[
    "react", "vue", "angular", "svelte", "python", "django", "flask", "fastapi", "nextjs",
    "typescript", "javascript", "node", "rust", "go", "java", "spring", "mongodb", "docker",
    "kubernetes", "aws", "azure", "gcp",
];

/// Lower-cased content words: no URLs, inline code, punctuation or stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut in_code = false;
    for raw in lower.split_whitespace() {
        if raw.starts_with("http") || raw.starts_with("www.") {
            continue;
        }
        // inline `code` spans may cover several words
        let ticks = raw.matches('`').count();
        let was_in_code = in_code;
        if ticks % 2 == 1 {
            in_code = !in_code;
        }
        if was_in_code || ticks > 0 {
            continue;
        }
        let word: String = raw.chars().filter(|c| !c.is_ascii_punctuation()).collect();
        if word.chars().count() > 2 && !STOPWORDS.contains(&word.as_str()) {
            tokens.push(word);
        }
    }
    tokens
}

fn top_by_count(counts: HashMap<String, usize>, top_n: usize) -> Vec<String> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(top_n).map(|(word, _)| word).collect()
}

/// Most frequent keywords, bi/tri-gram phrases and known technology mentions.
pub fn extract_topics(texts: &[String], top_n: usize) -> TopicSummary {
    let mut keyword_counts: HashMap<String, usize> = HashMap::new();
    let mut phrase_counts: HashMap<String, usize> = HashMap::new();
    let mut technologies = BTreeSet::new();

    for text in texts {
        let tokens = tokenize(text);
        for token in &tokens {
            *keyword_counts.entry(token.clone()).or_insert(0) += 1;
            if KNOWN_TECHNOLOGIES.contains(&token.as_str()) {
                technologies.insert(token.clone());
            }
        }
        for n in [2, 3] {
            for gram in tokens.windows(n) {
                *phrase_counts.entry(gram.join(" ")).or_insert(0) += 1;
            }
        }
    }

    if keyword_counts.is_empty() {
        return TopicSummary::default();
    }

    TopicSummary {
        keywords: top_by_count(keyword_counts, top_n),
        top_phrases: top_by_count(phrase_counts, top_n),
        technologies: technologies.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_drops_noise() {
        let tokens = tokenize("How to fix `cargo build --release` errors? See https://example.com now!");
        assert_eq!(tokens, vec!["fix", "errors", "see", "now"]);
    }

    #[test]
    fn ranks_keywords_and_phrases() {
        let texts = vec![
            "React hooks are amazing but useEffect causes confusion.".to_string(),
            "useEffect causes double renders in React".to_string(),
            "Docker container failing on AWS".to_string(),
        ];
        let topics = extract_topics(&texts, 3);
        assert_eq!(topics.keywords, vec!["causes", "react", "useeffect"]);
        assert_eq!(topics.top_phrases[0], "useeffect causes");
        assert_eq!(topics.technologies, vec!["aws", "docker", "react"]);
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        assert_eq!(extract_topics(&[], 5), TopicSummary::default());
    }
}
