//! Tests for key-phrase ranking and refinement.

use study_oxide::config::KeyPhraseConfig;
use study_oxide::keyphrase::KeyPhraseExtractor;
use study_oxide::lexical::{contains_phrase, jaccard, morph_set};
use study_oxide::text::SentenceSegmenter;

const NOTES: &str = "Cellular respiration converts glucose into usable energy inside the cell. \
    Cellular respiration begins with glycolysis in the cytoplasm of the cell. \
    The citric acid cycle runs in the mitochondrial matrix and releases carbon dioxide. \
    The citric acid cycle feeds electrons to the electron transport chain. \
    The electron transport chain pumps protons across the inner membrane. \
    Oxidative phosphorylation uses the proton gradient to make most of the ATP. \
    Oxidative phosphorylation depends on oxygen as the final electron acceptor. \
    See Figure 3 on page 12 of the lecture slides for the full diagram of these pathways.";

fn sentences() -> Vec<String> {
    SentenceSegmenter::new().segment_str(NOTES)
}

mod ranking {
    use super::*;

    #[test]
    fn test_repeated_ngrams_rank_before_unigrams() {
        let ranked = KeyPhraseExtractor::default().rank(NOTES);
        let top: Vec<&str> = ranked.iter().take(8).map(|c| c.text.as_str()).collect();
        assert!(top.iter().all(|t| t.contains(' ')), "{:?}", top);
        assert!(top.contains(&"citric acid cycle"));
        assert!(top.contains(&"electron transport chain"));
    }

    #[test]
    fn test_scores_non_increasing_within_unigrams() {
        let ranked = KeyPhraseExtractor::default().rank(NOTES);
        let unigrams: Vec<f32> = ranked
            .iter()
            .filter(|c| !c.text.contains(' '))
            .map(|c| c.score)
            .collect();
        assert!(unigrams.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_ngrams_need_min_count() {
        let config = KeyPhraseConfig {
            min_ngram_count: 3,
            ..KeyPhraseConfig::default()
        };
        let ranked = KeyPhraseExtractor::new(config, 0.7).rank(NOTES);
        assert!(ranked.iter().filter(|c| c.text.contains(' ')).all(|c| c.count >= 3));
    }
}

mod refinement {
    use super::*;

    #[test]
    fn test_phrases_are_grounded() {
        let sentences = sentences();
        let phrases = KeyPhraseExtractor::default().extract(NOTES, &sentences);
        assert!(!phrases.is_empty());
        for phrase in &phrases {
            assert_eq!(phrase.text, phrase.text.to_lowercase());
            assert!((1..=3).contains(&phrase.token_count()));
            assert!(phrase.text.split(' ').all(|t| t.chars().count() >= 3));
            assert!(
                contains_phrase(&sentences[phrase.support], &phrase.text),
                "{} not in {}",
                phrase.text,
                sentences[phrase.support]
            );
        }
    }

    #[test]
    fn test_document_furniture_rejected() {
        let phrases = KeyPhraseExtractor::default().extract(NOTES, &sentences());
        for banned in ["figure", "page", "lecture", "slides"] {
            assert!(
                phrases.iter().all(|p| !p.text.split(' ').any(|t| t == banned)),
                "{} leaked",
                banned
            );
        }
    }

    #[test]
    fn test_no_near_duplicates() {
        let phrases = KeyPhraseExtractor::default().extract(NOTES, &sentences());
        for (i, a) in phrases.iter().enumerate() {
            for b in &phrases[i + 1..] {
                let (sa, sb) = (morph_set(&a.text), morph_set(&b.text));
                assert!(sa != sb, "{} / {}", a.text, b.text);
                assert!(jaccard(&sa, &sb) < 0.7, "{} / {}", a.text, b.text);
            }
        }
    }

    #[test]
    fn test_limit_respected() {
        let config = KeyPhraseConfig {
            k: 3,
            ..KeyPhraseConfig::default()
        };
        let phrases = KeyPhraseExtractor::new(config, 0.7).extract(NOTES, &sentences());
        assert_eq!(phrases.len(), 3);
    }

    #[test]
    fn test_no_sentences_no_phrases() {
        assert!(KeyPhraseExtractor::default().extract(NOTES, &[]).is_empty());
    }
}
