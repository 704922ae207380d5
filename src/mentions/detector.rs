// src/mentions/detector.rs

use once_cell::sync::Lazy;
use regex::Regex;

/// 大写开头的单词，允许 O'Brien、Jean-Luc 这类写法
const NAME_TOKEN: &str = r"[A-Z][a-z]+(?:['-][A-Za-z]+)?";

/// 称谓 / 职务词表，出现在人名前面
const TITLES: &[&str] = &[
    "President", "Vice", "Prime", "Minister", "Secretary", "Senator", "Rep", "Representative",
    "Governor", "Mayor", "Judge", "Justice", "General", "Colonel", "Captain", "Chancellor",
    "Ambassador", "Chairman", "Chairwoman", "Director", "Coach", "CEO", "Dr", "Mr", "Mrs", "Ms",
    "Prof", "Professor", "Sir", "Dame", "King", "Queen", "Prince", "Princess", "Pope", "Bishop",
];

const STOP_WORDS: &[&str] = &[
    "The", "A", "An", "This", "That", "These", "Those", "He", "She", "They", "We", "It", "His",
    "Her", "Their", "Our", "Its", "In", "On", "At", "For", "With", "And", "But", "Or", "Of", "To",
    "From", "By", "As", "After", "Before", "During", "When", "While", "If", "However", "Meanwhile",
    "According", "Also", "Then", "Later", "Earlier", "Breaking", "News", "Update", "Report",
    "Today", "Yesterday", "Tomorrow",
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday", "January",
    "February", "March", "April", "May", "June", "July", "August", "September", "October",
    "November", "December",
];

const LOCATION_WORDS: &[&str] = &[
    "Street", "Avenue", "Road", "Boulevard", "City", "County", "State", "States", "Province",
    "Republic", "Kingdom", "Island", "Islands", "River", "Lake", "Mountain", "Mount", "Park",
    "Valley", "Bay", "Beach", "North", "South", "East", "West", "Central", "Center", "Centre",
    "University", "College", "School", "Hospital", "Airport", "Station", "Stadium", "Hall",
    "Square", "Bridge", "Ministry", "Department", "Council", "Court", "Parliament", "Congress",
];

const CONTEXT_VERBS: &str = "announced|confirmed|stated|told|added|revealed|noted|claimed|explained";

fn compile(pattern: String) -> Regex {
    Regex::new(&pattern).unwrap_or_else(|e| panic!("invalid mention pattern {}: {}", pattern, e))
}

static SAID_BEFORE: Lazy<Regex> =
    Lazy::new(|| compile(format!(r"\bsaid\s+({t}(?:\s+{t}){{1,3}})", t = NAME_TOKEN)));

static SAID_AFTER: Lazy<Regex> =
    Lazy::new(|| compile(format!(r"\b({t}(?:\s+{t}){{1,3}})\s+said\b", t = NAME_TOKEN)));

static CAPITALIZED: Lazy<Regex> =
    Lazy::new(|| compile(format!(r"\b({t}(?:\s+{t}){{1,2}})\b", t = NAME_TOKEN)));

static TITLED: Lazy<Regex> = Lazy::new(|| {
    compile(format!(
        r"\b(?:(?:{titles})\.?\s+)+({t}(?:\s+{t}){{1,2}})",
        titles = TITLES.join("|"),
        t = NAME_TOKEN
    ))
});

static ACCORDING_TO: Lazy<Regex> =
    Lazy::new(|| compile(format!(r"(?i:\baccording\s+to)\s+({t}(?:\s+{t}){{1,3}})", t = NAME_TOKEN)));

static CONTEXT_VERB: Lazy<Regex> = Lazy::new(|| {
    compile(format!(
        r"\b({t}(?:\s+{t}){{1,3}})\s+(?:{verbs})\b",
        t = NAME_TOKEN,
        verbs = CONTEXT_VERBS
    ))
});

/// 文中找到的一个候选人名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    /// 该名字在正文中出现的次数，至少为 1
    pub occurrences: usize,
}

fn is_listed(token: &str, list: &[&str]) -> bool {
    list.iter().any(|word| word.eq_ignore_ascii_case(token))
}

fn is_filler(token: &str) -> bool {
    is_listed(token, STOP_WORDS) || is_listed(token, LOCATION_WORDS) || is_listed(token.trim_end_matches('.'), TITLES)
}

/// 2 到 4 个词，每个词大写开头，且不含停用词、称谓或地点词
pub fn is_valid_candidate(text: &str) -> bool {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if !(2..=4).contains(&tokens.len()) {
        return false;
    }
    tokens
        .iter()
        .all(|token| token.chars().next().is_some_and(char::is_uppercase) && !is_filler(token))
}

/// 去掉匹配结果首尾的停用词、称谓和地点词，如 "Yesterday Jane Smith" 只留下 "Jane Smith"。
/// 返回剩余部分在原匹配中的字节偏移和规整后的文本。
fn trim_candidate(raw: &str) -> Option<(usize, String)> {
    let tokens: Vec<(usize, &str)> = raw
        .split_whitespace()
        .map(|token| (token.as_ptr() as usize - raw.as_ptr() as usize, token))
        .collect();
    let first = tokens.iter().position(|(_, token)| !is_filler(token))?;
    let last = tokens.iter().rposition(|(_, token)| !is_filler(token))?;
    let kept = &tokens[first..=last];
    let text = kept.iter().map(|(_, token)| *token).collect::<Vec<_>>().join(" ");
    Some((kept[0].0, text))
}

/// **抽取候选人名**
///
/// 多个规则各自匹配后取并集，按首次出现的顺序去重。
pub fn extract_candidates(content: &str) -> Vec<Candidate> {
    let passes: [&Lazy<Regex>; 6] = [&SAID_BEFORE, &SAID_AFTER, &TITLED, &ACCORDING_TO, &CONTEXT_VERB, &CAPITALIZED];

    let mut found: Vec<(usize, String)> = Vec::new();
    for pass in passes {
        for caps in pass.captures_iter(content) {
            let Some(m) = caps.get(1) else { continue };
            let Some((offset, text)) = trim_candidate(m.as_str()) else { continue };
            if !is_valid_candidate(&text) {
                continue;
            }
            let start = m.start() + offset;
            match found.iter_mut().find(|(_, existing)| *existing == text) {
                Some(entry) => entry.0 = entry.0.min(start),
                None => found.push((start, text)),
            }
        }
    }
    found.sort_by_key(|(start, _)| *start);

    found
        .into_iter()
        .map(|(_, text)| Candidate {
            occurrences: content.matches(text.as_str()).count().max(1),
            text,
        })
        .collect()
}
