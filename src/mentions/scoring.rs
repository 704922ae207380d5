// src/mentions/scoring.rs

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use super::detector::{extract_candidates, Candidate};
use crate::model::person::Person;

/// 正文去掉首尾空白后少于这个长度时不给出建议
pub const MIN_CONTENT_CHARS: usize = 50;
pub const MAX_SUGGESTIONS: usize = 5;

const BOOSTED_CATEGORIES: &[&str] = &["politician", "celebrity"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    Exact,
    FirstLast,
    Partial,
}

/// 一条人物建议
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub person: Person,
    pub confidence: f64,
    pub matched_text: String,
    pub match_kind: MatchKind,
}

fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

fn first_last(tokens: &[String]) -> Option<(&str, &str)> {
    match tokens {
        [first, .., last] => Some((first.as_str(), last.as_str())),
        _ => None,
    }
}

fn classify(candidate: &[String], person: &[String]) -> Option<MatchKind> {
    if candidate == person {
        return Some(MatchKind::Exact);
    }
    if first_last(candidate).is_some() && first_last(candidate) == first_last(person) {
        return Some(MatchKind::FirstLast);
    }
    let (c, p) = (candidate.join(" "), person.join(" "));
    if !c.is_empty() && !p.is_empty() && (c.contains(&p) || p.contains(&c)) {
        return Some(MatchKind::Partial);
    }
    None
}

/// 候选名匹配人物：先找完全一致，再找首尾词一致，最后找互相包含；同一级里取列表中的第一个
pub fn match_person<'a>(candidate: &str, people: &'a [Person]) -> Option<(&'a Person, MatchKind)> {
    let candidate = tokens(candidate);
    let classified: Vec<Option<MatchKind>> = people
        .iter()
        .map(|person| classify(&candidate, &tokens(&person.name)))
        .collect();

    [MatchKind::Exact, MatchKind::FirstLast, MatchKind::Partial]
        .into_iter()
        .find_map(|kind| {
            classified
                .iter()
                .position(|k| *k == Some(kind))
                .map(|i| (&people[i], kind))
        })
}

/// 基础分：完全一致为 1.0，否则为重合词数 / 两者中较多的词数
pub fn base_score(candidate: &str, person: &Person, kind: MatchKind) -> f64 {
    if kind == MatchKind::Exact {
        return 1.0;
    }
    let c = tokens(candidate);
    let p = tokens(&person.name);
    let larger = c.len().max(p.len());
    if larger == 0 {
        return 0.0;
    }
    let overlap = c.iter().filter(|token| p.contains(token)).count();
    overlap as f64 / larger as f64
}

/// 加分项：历史提及次数、人物类别、正文中重复出现（递减）
pub fn boost(person: &Person, occurrences: usize) -> f64 {
    let mut bonus = 0.0;
    if person.mention_count > 10 {
        bonus += 0.1;
    }
    if person.mention_count > 50 {
        bonus += 0.1;
    }
    if BOOSTED_CATEGORIES.contains(&person.category.to_lowercase().as_str()) {
        bonus += 0.1;
    }
    if occurrences > 1 {
        bonus += 0.1 * (1.0 - 0.5f64.powi(occurrences as i32 - 1));
    }
    bonus
}

fn score(candidate: &Candidate, person: &Person, kind: MatchKind) -> f64 {
    (base_score(&candidate.text, person, kind) + boost(person, candidate.occurrences)).min(1.0)
}

/// **人物建议**
///
/// 已标记的人物不再建议；每个人物保留最高分；按分数降序取前 5 个。
pub fn suggest(content: &str, people: &[Person], tagged_ids: &[i64]) -> Vec<Suggestion> {
    if content.trim().chars().count() < MIN_CONTENT_CHARS {
        return Vec::new();
    }
    let untagged: Vec<Person> = people
        .iter()
        .filter(|person| !tagged_ids.contains(&person.id))
        .cloned()
        .collect();
    if untagged.is_empty() {
        return Vec::new();
    }

    let mut best: HashMap<i64, Suggestion> = HashMap::new();
    for candidate in extract_candidates(content) {
        let Some((person, kind)) = match_person(&candidate.text, &untagged) else {
            continue;
        };
        // 只靠子串命中、没有共同词的不算
        if base_score(&candidate.text, person, kind) == 0.0 {
            continue;
        }
        let confidence = score(&candidate, person, kind);
        let better = best
            .get(&person.id)
            .map_or(true, |existing| confidence > existing.confidence);
        if better {
            best.insert(
                person.id,
                Suggestion {
                    person: person.clone(),
                    confidence,
                    matched_text: candidate.text.clone(),
                    match_kind: kind,
                },
            );
        }
    }

    let mut suggestions: Vec<Suggestion> = best.into_values().collect();
    suggestions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.person.name.cmp(&b.person.name))
    });
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn person(id: i64, name: &str, category: &str, mention_count: i64) -> Person {
        Person {
            id,
            name: name.into(),
            slug: crate::model::slugify(name),
            category: category.into(),
            description: None,
            image_url: None,
            mention_count,
            created_at: Utc::now(),
        }
    }

    const PADDING: &str = " The committee met again on the following afternoon to review the figures.";

    #[test]
    fn short_content_yields_nothing() {
        let people = vec![person(1, "Jane Smith", "other", 0)];
        assert!(suggest("Jane Smith spoke.", &people, &[]).is_empty());
    }

    #[test]
    fn exact_match_scores_one() {
        let people = vec![person(1, "Jane Smith", "other", 0)];
        let content = format!("Jane Smith opened the session.{}", PADDING);
        let suggestions = suggest(&content, &people, &[]);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].confidence, 1.0);
        assert_eq!(suggestions[0].match_kind, MatchKind::Exact);
    }

    #[test]
    fn first_last_match_scores_by_overlap() {
        let people = vec![person(1, "Jane Alice Smith", "other", 0)];
        let content = format!("Jane Smith opened the session.{}", PADDING);
        let suggestions = suggest(&content, &people, &[]);
        assert_eq!(suggestions[0].match_kind, MatchKind::FirstLast);
        assert!((suggestions[0].confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn boosts_apply_and_cap_at_one() {
        let famous = person(1, "Jane Alice Smith", "politician", 80);
        let bonus = boost(&famous, 3);
        assert!((bonus - (0.3 + 0.1 * 0.75)).abs() < 1e-9);
        let candidate = Candidate { text: "Jane Smith".into(), occurrences: 3 };
        assert!((score(&candidate, &famous, MatchKind::FirstLast) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tagged_people_are_excluded() {
        let people = vec![person(1, "Jane Smith", "other", 0)];
        let content = format!("Jane Smith opened the session.{}", PADDING);
        assert!(suggest(&content, &people, &[1]).is_empty());
    }

    #[test]
    fn at_most_five_sorted_descending() {
        let names = ["Anna Bell", "Ben Cole", "Cara Dunn", "Dan Ellis", "Eva Ford", "Finn Gray", "Gina Hart"];
        let people: Vec<Person> = names
            .iter()
            .enumerate()
            .map(|(i, name)| person(i as i64 + 1, name, "other", i as i64 * 10))
            .collect();
        let content = names.iter().map(|n| format!("{} spoke.", n)).collect::<Vec<_>>().join(" ");
        let suggestions = suggest(&content, &people, &[]);
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        for pair in suggestions.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn substring_without_shared_token_is_dropped() {
        let people = vec![person(1, "Al", "other", 0)];
        let content = format!("Jane Alison opened the session.{}", PADDING);
        assert!(suggest(&content, &people, &[]).is_empty());
    }

    #[test]
    fn names_after_stop_words_and_titles_are_suggested() {
        let people = vec![person(1, "Jane Smith", "other", 0), person(2, "John Smith", "other", 0)];
        for (content, expected) in [
            ("Yesterday Jane Smith opened the session.", 1),
            ("When Jane Smith arrived the committee had voted.", 1),
            ("Prime Minister John Smith opened the session.", 2),
        ] {
            let suggestions = suggest(&format!("{}{}", content, PADDING), &people, &[]);
            assert_eq!(suggestions.len(), 1, "{}", content);
            assert_eq!(suggestions[0].person.id, expected);
            assert_eq!(suggestions[0].match_kind, MatchKind::Exact);
        }
    }

    #[test]
    fn prefers_exact_over_earlier_partial() {
        let people = vec![person(1, "Smith", "other", 0), person(2, "Jane Smith", "other", 0)];
        let (matched, kind) = match_person("Jane Smith", &people).unwrap();
        assert_eq!(matched.id, 2);
        assert_eq!(kind, MatchKind::Exact);
    }
}
