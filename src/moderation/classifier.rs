use crate::events::Verdict;

// ============================================================================
// Moderation Classifier
// ============================================================================
//
// Deterministic, side-effect-free denylist scan. No fuzzy matching, no
// scoring: the same body always yields the same verdict, which makes the
// whole moderation path reproducible in tests.
//
// ============================================================================

const BANNED_PHRASES: [&str; 6] = ["zxcvbn", "qwerty", "asdfgh", "йцукен", "фывапр", "ячсмит"];

/// Maps a comment body to a verdict. Case-insensitive substring match
/// against the static denylist.
pub fn classify(content: &str) -> Verdict {
    let lowered = content.to_lowercase();
    if BANNED_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        Verdict::Rejected
    } else {
        Verdict::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_content_is_approved() {
        assert_eq!(classify("Great article, thanks!"), Verdict::Approved);
    }

    #[test]
    fn test_banned_phrase_is_rejected() {
        assert_eq!(classify("my password is qwerty lol"), Verdict::Rejected);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(classify("QwErTy"), Verdict::Rejected);
        assert_eq!(classify("ЙЦУКЕН"), Verdict::Rejected);
    }

    #[test]
    fn test_phrase_inside_longer_word_still_matches() {
        assert_eq!(classify("xxqwertyxx"), Verdict::Rejected);
    }

    #[test]
    fn test_classifier_is_pure() {
        let body = "some qwerty here";
        assert_eq!(classify(body), classify(body));
    }
}
