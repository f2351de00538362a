//! Tests for text normalization and sentence segmentation.

use proptest::prelude::*;
use study_oxide::text::{SentenceSegmenter, TextNormalizer};

const LECTURE: &str = "LECTURE 3\n\
    Cell Respiration\n\
    \n\
    1. Glycolysis splits one glucose molecule into two molecules of pyru-\n\
    vate in the cytoplasm.\n\
    2. The citric acid cycle oxidizes acetyl groups inside the mitochondrial\n\
    matrix and releases carbon dioxide.\n\
    \n\
    Page 2 of 9\n\
    \n\
    Oxidative phosphorylation produces most of the ATP in aerobic cells. Scanned with CamScanner\n";

mod normalizer {
    use super::*;

    #[test]
    fn test_lecture_cleanup() {
        let out = TextNormalizer::new().normalize(LECTURE);
        let text = out.as_str();
        assert!(!text.contains("LECTURE"));
        assert!(!text.contains("Page 2"));
        assert!(!text.contains("CamScanner"));
        assert!(text.contains("two molecules of pyruvate in the cytoplasm."));
        assert!(text.contains("mitochondrial matrix and releases carbon dioxide."));
    }

    #[test]
    fn test_no_blank_line_runs() {
        let out = TextNormalizer::new().normalize(LECTURE);
        assert!(!out.as_str().contains("\n\n\n"));
    }

    const LINES: &[&str] = &[
        "",
        "chapter",
        "Lecture 4",
        "section",
        "3 explains how cells divide into two daughter cells.",
        "Figure 2: the electron transport chain",
        "fig. 3. membrane",
        "Page 7",
        "- 12 -",
        "1. Enzymes lower the activation energy of a reaction.",
        "a) substrates bind the active",
        "The cell mem-",
        "brane controls transport.",
        "F = m * a",
        "Scanned with CamScanner",
        "CELL BIOLOGY",
        "Cell Structure and Function",
    ];

    fn line() -> impl Strategy<Value = String> {
        prop_oneof![
            prop::sample::select(LINES).prop_map(str::to_string),
            "[a-z]{1,10}( [a-z]{1,10}){0,6}[.]?",
            "[A-Z][a-z]{1,8}( [a-z]{1,8}){0,4}",
            "[0-9]{1,3}",
        ]
    }

    proptest! {
        #[test]
        fn prop_normalization_is_a_fixed_point(lines in prop::collection::vec(line(), 0..16)) {
            let raw = lines.join("\n");
            let normalizer = TextNormalizer::new();
            let once = normalizer.normalize(&raw);
            let twice = normalizer.normalize(once.as_str());
            prop_assert_eq!(&once, &twice, "not a fixed point for {:?}", raw);
            prop_assert!(!once.as_str().contains("\n\n\n"));
        }
    }
}

mod segmenter {
    use super::*;

    #[test]
    fn test_lecture_sentences() {
        let normalized = TextNormalizer::new().normalize(LECTURE);
        let sentences = SentenceSegmenter::new().segment(&normalized);
        assert_eq!(sentences.len(), 3);
        assert!(sentences[0].starts_with("Glycolysis"));
        assert!(sentences[2].starts_with("Oxidative phosphorylation"));
    }

    #[test]
    fn test_short_threshold() {
        let text = "Enzymes speed up chemical reactions.";
        assert!(SentenceSegmenter::new().segment_str(text).is_empty());
        assert_eq!(SentenceSegmenter::new().with_min_chars(30).segment_str(text).len(), 1);
    }

    #[test]
    fn test_max_sentences() {
        let text: String = (0..20)
            .map(|i| format!("Sentence number {} is long enough to pass the length filter. ", i))
            .collect();
        let sentences = SentenceSegmenter::new().with_max_sentences(5).segment_str(&text);
        assert_eq!(sentences.len(), 5);
    }

    fn word() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("cell".to_string()),
            Just("Membrane".to_string()),
            Just("ENERGY".to_string()),
            Just("the".to_string()),
            Just("e.g.".to_string()),
            Just("Dr.".to_string()),
            Just("J.".to_string()),
            Just("protein".to_string()),
            "[a-z]{1,12}",
        ]
    }

    fn punctuation() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just(""), Just("."), Just("!"), Just("?"), Just("?!"), Just(","), Just("...")]
    }

    proptest! {
        #[test]
        fn prop_sentences_are_well_formed(
            parts in prop::collection::vec((word(), punctuation()), 0..120)
        ) {
            let text: String = parts
                .iter()
                .map(|(w, p)| format!("{}{} ", w, p))
                .collect();
            let sentences = SentenceSegmenter::new().segment_str(&text);

            let mut seen = std::collections::HashSet::new();
            for s in &sentences {
                prop_assert!(s.chars().count() >= 50, "too short: {:?}", s);
                prop_assert!(s.ends_with(['.', '!', '?']), "unterminated: {:?}", s);
                prop_assert!(seen.insert(s.to_lowercase()), "duplicate: {:?}", s);
            }
        }
    }
}
