use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // #tag, #multi-word_tag, #nested/tag; not inside words like "C#"
    static ref HASHTAG_RE: Regex = Regex::new(r"(?:^|[^\w#])#([\w][\w/-]*)").unwrap();
}

/// Hashtags in order of first appearance, without the leading `#`.
pub fn extract_hashtags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for caps in HASHTAG_RE.captures_iter(content) {
        let tag = caps[1].to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Explicit tags followed by any body hashtags not already present.
pub fn merge_tags(explicit: &[String], body: &str) -> Vec<String> {
    let mut merged = explicit.to_vec();
    for tag in extract_hashtags(body) {
        if !merged.contains(&tag) {
            merged.push(tag);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_hashtags() {
        let tags = extract_hashtags("#work planning the #roadmap, see #work again");
        assert_eq!(tags, vec!["work", "roadmap"]);
    }

    #[test]
    fn test_ignores_inline_hash() {
        assert!(extract_hashtags("learning C# and issue##12").is_empty());
        assert_eq!(extract_hashtags("(#x)"), vec!["x"]);
    }

    #[test]
    fn test_merge_keeps_explicit_first() {
        let merged = merge_tags(&["home".to_string()], "buy milk #shopping #home");
        assert_eq!(merged, vec!["home", "shopping"]);
    }
}
