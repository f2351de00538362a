//! End-to-end kit generation tests.

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, Luma};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use study_oxide::config::{ExtractionConfig, KitConfig};
use study_oxide::document::{ImagePages, PageImage};
use study_oxide::lexical::{jaccard, token_set};
use study_oxide::ocr::{SegmentationMode, TextRecognizer};
use study_oxide::{Difficulty, Error, KitGenerator, KitRequest, QuestionKind, Result, StudyKit};

const MITOCHONDRIA: &str = "Mitochondria\n\
    \n\
    Mitochondria are membrane-bound organelles found in most eukaryotic cells.\n\
    Mitochondria generate most of the chemical energy needed to power the cell.\n\
    The inner membrane of the mitochondria is folded into cristae.\n\
    Oxidative phosphorylation takes place on the inner membrane of the mitochondria.\n\
    Oxidative phosphorylation produces most of the ATP used by eukaryotic cells.\n\
    The citric acid cycle runs in the mitochondrial matrix and feeds the electron transport chain.\n\
    The electron transport chain pumps protons across the inner membrane to build a gradient.\n\
    ATP synthase uses the proton gradient to make ATP from ADP and phosphate.\n";

const PHOTOSYNTHESIS: &str = "Photosynthesis converts light energy into chemical energy inside chloroplasts. \
    Chlorophyll absorbs red and blue light and reflects green light. \
    The light reactions split water and release oxygen as a byproduct. \
    The Calvin cycle fixes carbon dioxide into sugars using ATP and NADPH.";

/// Stands in for an OCR engine by returning a fixed transcript.
struct ScriptedEngine {
    calls: AtomicUsize,
}

#[async_trait]
impl TextRecognizer for ScriptedEngine {
    async fn recognize(&self, _: &GrayImage, _: SegmentationMode) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PHOTOSYNTHESIS.to_string())
    }
}

fn scanned_page() -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_fn(300, 300, |x, y| {
        if (40..260).contains(&x) && y % 12 < 3 {
            Luma([20])
        } else {
            Luma([235])
        }
    }))
}

fn mentions(kit: &StudyKit, needle: &str) -> bool {
    kit.quiz.iter().any(|item| {
        item.question.to_lowercase().contains(needle)
            || item.options.iter().any(|o| o.to_lowercase().contains(needle))
    })
}

fn assert_kit_shape(kit: &StudyKit) {
    assert_eq!(kit.quiz.len(), 10);
    assert_eq!(kit.plan.len(), 7);
    assert!(kit.flashcards.len() <= 12);
    assert!(kit.flashcards.iter().all(|card| card.back.ends_with('.')));
    assert!(!kit.title.is_empty());

    for (d, day) in kit.plan.iter().enumerate() {
        assert_eq!(day.day as usize, d + 1);
        assert!(day.title.starts_with(&format!("Day {}:", d + 1)));
        assert!(day.objectives.iter().all(|o| !o.is_empty()));
    }

    for item in &kit.quiz {
        assert!(item.answer_index < 4);
        assert!(!item.answer().is_empty());
        for i in 0..4 {
            for j in (i + 1)..4 {
                let similarity = jaccard(&token_set(&item.options[i]), &token_set(&item.options[j]));
                assert!(
                    similarity < 0.7,
                    "options too similar in {:?}: {:?} / {:?}",
                    item.question,
                    item.options[i],
                    item.options[j]
                );
            }
        }
    }
}

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn test_pasted_notes() {
        let kit = KitGenerator::new()
            .generate(KitRequest::from_text(MITOCHONDRIA))
            .await
            .unwrap();
        assert_kit_shape(&kit);
        assert!(mentions(&kit, "mitochondria") || mentions(&kit, "oxidative phosphorylation"));
        assert!(kit.quiz.iter().any(|q| q.kind == QuestionKind::Concept || q.kind == QuestionKind::Cloze));
        assert!(!kit.flashcards.is_empty());
    }

    #[tokio::test]
    async fn test_scanned_page_uses_ocr() {
        let engine = Arc::new(ScriptedEngine {
            calls: AtomicUsize::new(0),
        });
        let generator = KitGenerator::new().with_recognizer(engine.clone());
        let pages = Arc::new(ImagePages::from_images(vec![scanned_page()]));

        let extraction = generator
            .extract_text(&KitRequest::from_pages(pages.clone()))
            .await
            .unwrap();
        assert_eq!(extraction.pages_read, 1);
        assert_eq!(extraction.ocr_pages, 1);
        assert!(extraction.text.contains("Chlorophyll absorbs red and blue light"));

        let kit = generator.generate(KitRequest::from_pages(pages)).await.unwrap();
        assert_kit_shape(&kit);
        assert!(mentions(&kit, "photosynthesis") || mentions(&kit, "chlorophyll"));
        assert!(engine.calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_text_layer_skips_ocr() {
        let engine = Arc::new(ScriptedEngine {
            calls: AtomicUsize::new(0),
        });
        let page = PageImage::new(scanned_page()).with_text_layer(MITOCHONDRIA);
        let generator = KitGenerator::new().with_recognizer(engine.clone());
        let extraction = generator
            .extract_text(&KitRequest::from_pages(Arc::new(ImagePages::new(vec![page]))))
            .await
            .unwrap();
        assert_eq!(extraction.ocr_pages, 0);
        assert!(extraction.text.contains("Oxidative phosphorylation"));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scan_without_engine_yields_fallback_kit() {
        let pages = Arc::new(ImagePages::from_images(vec![scanned_page()]));
        let kit = KitGenerator::new()
            .generate(KitRequest::from_pages(pages))
            .await
            .unwrap();
        assert_kit_shape(&kit);
    }

    #[tokio::test]
    async fn test_formula_question() {
        let text = "Mass-energy equivalence is written as $E = mc^2$ in special relativity. \
            The speed of light is the same for every observer in an inertial frame.";
        let kit = KitGenerator::new()
            .generate(KitRequest::from_text(text))
            .await
            .unwrap();
        assert_kit_shape(&kit);
        let formula = kit
            .quiz
            .iter()
            .find(|q| q.kind == QuestionKind::Formula)
            .expect("formula item");
        assert_eq!(formula.answer(), "$E = mc^2$");
    }

    #[tokio::test]
    async fn test_few_topics_end_in_synthesis_days() {
        let kit = KitGenerator::new()
            .generate(KitRequest::from_text("Enzymes speed up chemical reactions."))
            .await
            .unwrap();
        assert_kit_shape(&kit);
        assert_eq!(kit.plan[6].title, "Day 7: Synthesis");
        assert!(kit.plan[0].title != "Day 1: Synthesis");
    }
}

mod properties {
    use super::*;

    #[tokio::test]
    async fn test_same_request_same_kit() {
        let generator = KitGenerator::new();
        let request = KitRequest::from_text(MITOCHONDRIA).with_title("Cell Energy");
        let first = generator.generate(request.clone()).await.unwrap();
        let second = generator.generate(request).await.unwrap();
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        assert_eq!(first.title, "Cell Energy");
    }

    #[tokio::test]
    async fn test_difficulty_changes_layout() {
        let generator = KitGenerator::new();
        let balanced = generator
            .generate(KitRequest::from_text(MITOCHONDRIA))
            .await
            .unwrap();
        let harder = generator
            .generate(KitRequest::from_text(MITOCHONDRIA).with_difficulty(Difficulty::Harder))
            .await
            .unwrap();
        assert_kit_shape(&harder);
        assert_ne!(balanced.quiz, harder.quiz);
    }

    #[tokio::test]
    async fn test_reranked_kit_keeps_shape() {
        let kit = KitGenerator::new()
            .with_hashing_embedder()
            .generate(KitRequest::from_text(MITOCHONDRIA))
            .await
            .unwrap();
        assert_kit_shape(&kit);
    }

    #[tokio::test]
    async fn test_json_field_names() {
        let kit = KitGenerator::new()
            .generate(KitRequest::from_text(MITOCHONDRIA))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&kit.to_json().unwrap()).unwrap();
        let first = &value["quiz"][0];
        assert!(first["type"].is_string());
        assert!(first["answer_index"].is_u64());
        assert_eq!(value["plan"].as_array().map(Vec::len), Some(7));
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let generator = KitGenerator::new();
        assert!(matches!(
            generator.generate(KitRequest::default()).await,
            Err(Error::EmptyInput)
        ));
        assert!(matches!(
            generator.extract_text(&KitRequest::from_text("\n \t")).await,
            Err(Error::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_text_only_config_ignores_engine() {
        let engine = Arc::new(ScriptedEngine {
            calls: AtomicUsize::new(0),
        });
        let config = KitConfig::default().with_extraction(ExtractionConfig::quick());
        let generator = KitGenerator::new()
            .with_config(config)
            .with_recognizer(engine.clone());
        let pages = Arc::new(ImagePages::from_images(vec![scanned_page()]));
        let kit = generator.generate(KitRequest::from_pages(pages)).await.unwrap();
        assert_kit_shape(&kit);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }
}
