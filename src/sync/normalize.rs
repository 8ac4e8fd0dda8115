use std::sync::LazyLock;

use regex::Regex;

use crate::constants::NUMBERED_PROMOTIONS;

/// Lower-case, keep only `[a-z0-9 ]`, trim.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | ' '))
        .collect::<String>()
        .trim()
        .to_string()
}

/// One already-normalized key contains the other. Empty keys relate to nothing.
pub fn related(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// A numbered card such as "UFC 312".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceTag {
    pub tag: String,
    pub number: u32,
}

static RE_SEQUENCE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    let promotions = NUMBERED_PROMOTIONS.join("|");
    Regex::new(&format!(r"\b({}) ?([0-9]+)\b", promotions)).expect("sequence tag pattern is valid")
});

/// First sequence tag in an already-normalized string.
pub fn parse_sequence_tag(normalized: &str) -> Option<SequenceTag> {
    sequence_tags(normalized).next()
}

/// Every sequence tag in an already-normalized string, in order.
pub fn sequence_tags(normalized: &str) -> impl Iterator<Item = SequenceTag> + '_ {
    RE_SEQUENCE_TAG.captures_iter(normalized).filter_map(|caps| {
        let number = caps[2].parse().ok()?;
        Some(SequenceTag {
            tag: caps[1].to_string(),
            number,
        })
    })
}
