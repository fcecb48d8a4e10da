// Integration tests for language detection

use call_translator::language::{Language, LanguageDetector};

#[test]
fn test_devanagari_is_hindi() {
    let detector = LanguageDetector::default();
    assert_eq!(detector.detect("नमस्ते, आप कैसे हैं?"), Language::Hindi);
    assert_eq!(detector.detect("ok नमस्ते"), Language::Hindi);
}

#[test]
fn test_romanised_hindi_is_hindi() {
    let detector = LanguageDetector::default();
    assert_eq!(detector.detect("Namaste, kaise ho?"), Language::Hindi);
    assert_eq!(detector.detect("main ghar ja raha hun"), Language::Hindi);
}

#[test]
fn test_common_copulas_mark_romanised_hindi() {
    let detector = LanguageDetector::default();
    assert_eq!(detector.detect("Mera naam Ravi hai"), Language::Hindi);
    assert_eq!(detector.detect("Aap kaun ho?"), Language::Hindi);
    // Whole words only
    assert_eq!(detector.detect("Hold on, go home"), Language::English);
}

#[test]
fn test_romanised_words_must_match_whole() {
    let detector = LanguageDetector::default();
    // "aapple" and "tumble" contain Hindi fragments but are not Hindi words
    assert_eq!(detector.detect("tumble aapple"), Language::English);
}

#[test]
fn test_everything_else_is_english() {
    let detector = LanguageDetector::default();
    assert_eq!(detector.detect("Hello, how are you?"), Language::English);
    assert_eq!(detector.detect(""), Language::English);
    assert_eq!(detector.detect("12345"), Language::English);
}

#[test]
fn test_confident_detection() {
    let detector = LanguageDetector::new(0.6);

    assert_eq!(
        detector.detect_with_confidence("The meeting is at noon", 0.9),
        Some(Language::English)
    );
    assert_eq!(
        detector.detect_with_confidence("धन्यवाद", 0.9),
        Some(Language::Hindi)
    );
}

#[test]
fn test_low_confidence_is_undecided() {
    let detector = LanguageDetector::new(0.6);
    assert_eq!(detector.detect_with_confidence("धन्यवाद", 0.3), None);
    assert_eq!(
        detector.detect_with_confidence("The meeting is at noon", 0.59),
        None
    );
}

#[test]
fn test_unmarked_text_is_undecided() {
    let detector = LanguageDetector::new(0.5);
    assert_eq!(detector.detect_with_confidence("zebra quartz", 0.99), None);
    assert_eq!(detector.detect_with_confidence("   ", 0.99), None);
}
