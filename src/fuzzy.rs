// Approximate string matching for the keyword filters. Tag values are messy ("The Beatles"
// vs "Beatles, The"), so the filters use a normalized edit-distance ratio instead of exact
// substring matching.

/// Similarity at or above this ratio counts as a keyword match.
pub const MATCH_THRESHOLD: u32 = 80;

/// Space-optimized Levenshtein distance over chars, keeping only two rows.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (n, m) = (a_chars.len(), b_chars.len());

    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr: Vec<usize> = vec![0; m + 1];

    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            curr[j] = std::cmp::min(std::cmp::min(curr[j - 1] + 1, prev[j] + 1), prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[m]
}

/// Case-insensitive similarity ratio in [0, 100]. Empty-vs-empty is a perfect match.
pub fn similarity(a: &str, b: &str) -> u32 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let max_len = std::cmp::max(a.chars().count(), b.chars().count());
    if max_len == 0 {
        return 100;
    }
    let dist = levenshtein_distance(&a, &b);
    (100 * (max_len - dist) / max_len) as u32
}

/// Whether a tag value matches any of the given keywords. A keyword matches when it is
/// similar enough to the whole value or to any whitespace-separated token of it, so
/// "beatles" still hits "The Beatles".
pub fn keyword_matches(value: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|kw| similarity(value, kw) >= MATCH_THRESHOLD || value.split_whitespace().any(|token| similarity(token, kw) >= MATCH_THRESHOLD))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn test_similarity_ratio() {
        assert_eq!(similarity("hello", "hello"), 100);
        assert_eq!(similarity("Hello", "hello"), 100);
        assert_eq!(similarity("", ""), 100);
        assert!(similarity("abba", "abbey") < MATCH_THRESHOLD);
        assert!(similarity("radiohead", "radioheads") >= MATCH_THRESHOLD);
    }

    #[test]
    fn test_keyword_matches_tokens() {
        let keywords = vec!["beatles".to_string()];
        assert!(keyword_matches("The Beatles", &keywords));
        assert!(keyword_matches("Beatles", &keywords));
        assert!(!keyword_matches("The Rolling Stones", &keywords));
    }

    #[test]
    fn test_keyword_matches_typo() {
        let keywords = vec!["nirvana".to_string()];
        assert!(keyword_matches("Nirvanna", &keywords));
    }

    #[test]
    fn test_keyword_matches_empty_keywords() {
        assert!(!keyword_matches("anything", &[]));
    }
}
