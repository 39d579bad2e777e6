//! Keyword matching shared by the label canonicalizer and the classifiers.
//!
//! Matching is done on a folded form of the text: lowercase with French
//! accents stripped. Short keywords (three characters or fewer, e.g. "eu",
//! "us", "men") only match whole words, otherwise "us" would fire inside
//! "Pouces" and "eu" inside "Longueur". Longer keywords match as substrings.

/// Longest keyword that still requires a whole-word match.
const WORD_MATCH_MAX_LEN: usize = 3;

/// Lowercase `text` and strip the accents found in French and Spanish
/// storefront vocabulary.
pub fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars().flat_map(char::to_lowercase) {
        let base = match ch {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'ç' => 'c',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ñ' => 'n',
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'ý' | 'ÿ' => 'y',
            'œ' => {
                out.push_str("oe");
                continue;
            }
            other => other,
        };
        out.push(base);
    }
    out
}

/// Whether already-folded `haystack` contains `keyword` (given in folded form).
pub fn hit(haystack: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    if keyword.chars().count() > WORD_MATCH_MAX_LEN {
        return haystack.contains(keyword);
    }
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == keyword)
}

/// Whether folded `haystack` contains any of `keywords`.
pub fn any_hit(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| hit(haystack, kw))
}

/// Evaluate an ordered guard list against `text`; the first entry with a
/// keyword hit wins.
pub fn first_match<T: Copy>(text: &str, guards: &[(T, &[&str])]) -> Option<T> {
    let folded = fold(text);
    guards
        .iter()
        .find(|(_, keywords)| any_hit(&folded, keywords))
        .map(|(value, _)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_strips_accents() {
        assert_eq!(fold("Équivalence des Tailles"), "equivalence des tailles");
        assert_eq!(fold("Nouveautés"), "nouveautes");
        assert_eq!(fold("ŒUVRE"), "oeuvre");
    }

    #[test]
    fn test_short_keywords_need_whole_words() {
        assert!(hit("taille us", "us"));
        assert!(hit("us/uk", "uk"));
        assert!(!hit("pouces", "us"));
        assert!(!hit("longueur", "eu"));
        assert!(!hit("women", "men"));
        assert!(hit("/men/shoes.html", "men"));
    }

    #[test]
    fn test_long_keywords_match_substrings() {
        assert!(hit("chaussures-homme", "homme"));
        assert!(hit("bottines", "bottine"));
        assert!(!hit("", "homme"));
    }

    #[test]
    fn test_first_match_respects_order() {
        let guards: &[(u8, &[&str])] = &[(1, &["pied"]), (2, &["cm"])];
        assert_eq!(first_match("Longueur pied (cm)", guards), Some(1));
        assert_eq!(first_match("cm", guards), Some(2));
        assert_eq!(first_match("pouces", guards), None);
    }
}
