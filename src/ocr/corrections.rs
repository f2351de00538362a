//! OCR transcript cleanup and correction rules.
//!
//! Rules are ordered tables applied in sequence:
//!
//! - cleanup: watermarks, typographic quotes and dashes, hyphenated line
//!   breaks, whitespace runs;
//! - character confusions inside words (`0`→`o`, `1`/`I`→`l`, `vv`→`w`,
//!   `rn`→`m`, `cl`→`d`), the last two guarded by a lexicon;
//! - garbled technical vocabulary.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashSet;

lazy_static! {
    static ref RE_WATERMARK: Regex =
        Regex::new(r"(?im)^.*\b(?:scanned\s+(?:with|by)\s+camscanner|camscanner|adobe\s+scan)\b.*$")
            .unwrap();
    static ref RE_HYPHEN_BREAK: Regex = Regex::new(r"([A-Za-z])-[ \t]*\n[ \t]*([a-z])").unwrap();
    static ref RE_SPACES: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref RE_BLANK_RUNS: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref RE_ZERO_IN_WORD: Regex = Regex::new(r"([A-Za-z])0([A-Za-z])").unwrap();
    static ref RE_ONE_IN_WORD: Regex = Regex::new(r"([a-z])[1I]([a-z])").unwrap();
    static ref RE_WORD: Regex = Regex::new(r"[A-Za-z]+").unwrap();

    /// Real words that contain `vv`.
    static ref VV_WORDS: HashSet<&'static str> =
        ["savvy", "revved", "navvy", "skivvy", "divvy", "revving", "bovver"]
            .into_iter()
            .collect();

    /// Known words used to guard the `rn`→`m` and `cl`→`d` rewrites. It holds
    /// common targets of both rewrites and common words that legitimately
    /// contain `rn` or `cl` so they are never touched.
    static ref LEXICON: HashSet<&'static str> = [
        // targets containing m
        "am", "form", "forms", "from", "time", "times", "number", "numbers", "some", "same",
        "system", "systems", "model", "models", "method", "methods", "memory", "problem",
        "problems", "compute", "computer", "computing", "complex", "example", "examples",
        "name", "more", "most", "make", "made", "many", "may", "small", "minimum", "maximum",
        "term", "terms", "formula", "formulas", "matrix", "element", "elements", "assume",
        "summary", "normal", "common", "information", "important", "random", "domain",
        "moment", "mean", "means", "measure", "amount", "formed", "format", "human", "animal",
        "environment", "development", "movement", "management", "statement", "implement",
        "community", "family", "permanent", "remain", "comment", "document", "theorem",
        "algorithm", "logarithm", "polynomial", "them", "him", "whom", "come", "became",
        "become", "home", "mind", "must", "much", "might", "member", "members", "modern",
        "mode", "mass", "main", "map", "mark", "market", "mitochondria", "membrane",
        "molecule", "molecules", "metabolism", "mechanism", "medium", "membranes", "climate",
        // targets containing d
        "do", "does", "done", "did", "and", "end", "idea", "ideas", "data", "day", "days",
        "dead", "deal", "debt", "degree", "order", "under", "add", "added", "body", "old",
        "cold", "hold", "held", "field", "fields", "model", "build", "world", "word", "words",
        "under", "define", "defined", "derive", "derived", "divide", "divided", "dynamic",
        "dense", "density", "direct", "direction", "disease", "dna", "diagram", "diode",
        // words that legitimately contain rn
        "turn", "turns", "learn", "learned", "learning", "return", "returns", "concern",
        "pattern", "patterns", "govern", "government", "internal", "external", "journal",
        "kernel", "western", "eastern", "northern", "southern", "burn", "corner", "morning",
        "warning", "eternal", "intern", "stern", "barn", "born", "corn", "horn", "torn",
        "worn", "yarn", "earn", "earned", "ornament", "modern", "alternate", "alternative",
        "hernia", "cornea", "enzyme",
        // words that legitimately contain cl
        "class", "classes", "clear", "clearly", "close", "closed", "click", "clock", "clinic",
        "clinical", "include", "includes", "including", "conclude", "conclusion", "cycle",
        "cycles", "article", "particle", "particles", "vehicle", "nuclear", "nucleus",
        "nucleotide", "uncle", "cluster", "clusters", "client", "claim", "claims", "clean",
        "decline", "circle", "muscle", "clause", "clay", "cloud", "clone", "chloride",
        "chlorophyll", "cell", "cells", "clade", "declare", "exclude", "enclose", "recycle",
        "bicycle", "miracle", "obstacle", "oracle", "spectacle", "climb", "cliff",
    ]
    .into_iter()
    .collect();

    /// Garbled technical vocabulary. Group 1, when present, is a plural
    /// suffix carried over to the replacement.
    static ref DOMAIN_RULES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)\ba[l1|]g[o0]r[il1|]t[hn](?:m|rn)(s?)\b").unwrap(), "algorithm"),
        (Regex::new(r"(?i)\bp[o0][l1|]yn[o0](?:m|rn)[il1|]a[l1|](s?)\b").unwrap(), "polynomial"),
        (Regex::new(r"(?i)\bNP\s*[-–]?\s*c[o0](?:m|rn)p[l1|]ete\b").unwrap(), "NP-complete"),
        (Regex::new(r"(?i)\bNP\s*[-–]?\s*hard\b").unwrap(), "NP-hard"),
        (Regex::new(r"(?i)\b[l1|][o0]gar[il1|]th(?:m|rn)(s?)\b").unwrap(), "logarithm"),
        (Regex::new(r"(?i)\bthe[o0]re(?:m|rn)(s?)\b").unwrap(), "theorem"),
        (Regex::new(r"(?i)\bpr[o0]bab[il1|][l1|][il1|]ty\b").unwrap(), "probability"),
        (Regex::new(r"(?i)\bfunct[il1|][o0]n(s?)\b").unwrap(), "function"),
        (Regex::new(r"(?i)\bequat[il1|][o0]n(s?)\b").unwrap(), "equation"),
        (Regex::new(r"(?i)\b(?:m|rn)atr[il1|]x\b").unwrap(), "matrix"),
        (Regex::new(r"(?i)\bc[o0](?:m|rn)p[l1|]ex[il1|]ty\b").unwrap(), "complexity"),
        (Regex::new(r"\b[O0]\s*\(\s*n\s*[l1|I][o0]g\s*n\s*\)").unwrap(), "O(n log n)"),
    ];
}

/// Cleanup plus corrections.
pub fn correct(raw: &str) -> String {
    apply_corrections(&clean_transcript(raw))
}

/// Remove watermarks, fold typography, join hyphenated line breaks and
/// collapse whitespace.
pub fn clean_transcript(raw: &str) -> String {
    let text = raw
        .replace("\r\n", "\n")
        .replace(['\u{201C}', '\u{201D}', '\u{201E}'], "\"")
        .replace(['\u{2018}', '\u{2019}', '\u{201A}'], "'")
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace('\u{00A0}', " ");
    let text = RE_WATERMARK.replace_all(&text, "");
    let text = RE_HYPHEN_BREAK.replace_all(&text, "$1$2");
    let text = RE_SPACES.replace_all(&text, " ");
    let text: String = text
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    RE_BLANK_RUNS.replace_all(&text, "\n\n").trim().to_string()
}

/// Character-confusion and vocabulary rules.
pub fn apply_corrections(text: &str) -> String {
    let text = RE_ZERO_IN_WORD.replace_all(text, "${1}o${2}");
    let text = RE_ONE_IN_WORD.replace_all(&text, "${1}l${2}");
    let text = RE_WORD.replace_all(&text, |caps: &Captures<'_>| fix_word(&caps[0]));
    let mut text = text.into_owned();
    for (re, target) in DOMAIN_RULES.iter() {
        text = re
            .replace_all(&text, |caps: &Captures<'_>| {
                let mut fixed = target.to_string();
                if let Some(suffix) = caps.get(1) {
                    fixed.push_str(suffix.as_str());
                }
                let capitalised = caps[0].chars().next().is_some_and(char::is_uppercase);
                if capitalised && target.starts_with(char::is_lowercase) {
                    crate::synth::capitalize(&fixed)
                } else {
                    fixed
                }
            })
            .into_owned();
    }
    text
}

fn fix_word(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut fixed = word.to_string();

    if lower.contains("vv") && !VV_WORDS.contains(lower.as_str()) {
        fixed = fixed.replace("vv", "w").replace("VV", "W");
    }
    for (garbled, target) in [("rn", "m"), ("cl", "d")] {
        let current = fixed.to_lowercase();
        if !current.contains(garbled) {
            continue;
        }
        let candidate = current.replace(garbled, target);
        let always = garbled == "rn" && current.starts_with("rn");
        let known = LEXICON.contains(candidate.as_str()) && !LEXICON.contains(current.as_str());
        if always || known {
            fixed = match_case(&fixed, &fixed.replace(garbled, target));
        }
    }
    fixed
}

/// Re-apply a leading capital from `original` to `rewritten`.
fn match_case(original: &str, rewritten: &str) -> String {
    if original.starts_with(char::is_uppercase) {
        crate::synth::capitalize(rewritten)
    } else {
        rewritten.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_transcript() {
        let raw = "Scanned with CamScanner\nThe mito-\nchondria   make “energy”.\n\n\n\nNext";
        assert_eq!(
            clean_transcript(raw),
            "The mitochondria make \"energy\".\n\nNext"
        );
    }

    #[test]
    fn test_digit_confusions() {
        assert_eq!(apply_corrections("c0mputer"), "computer");
        assert_eq!(apply_corrections("ce1l"), "cell");
        assert_eq!(apply_corrections("version 10 of"), "version 10 of");
    }

    #[test]
    fn test_vv_rule_respects_allow_list() {
        assert_eq!(apply_corrections("vvhat"), "what");
        assert_eq!(apply_corrections("savvy"), "savvy");
    }

    #[test]
    fn test_rn_rule_is_lexicon_guarded() {
        assert_eq!(apply_corrections("nurnber"), "number");
        assert_eq!(apply_corrections("turn"), "turn");
        assert_eq!(apply_corrections("modern"), "modern");
        assert_eq!(apply_corrections("rnodel"), "model");
        assert_eq!(apply_corrections("Forrn"), "Form");
    }

    #[test]
    fn test_cl_rule_is_lexicon_guarded() {
        assert_eq!(apply_corrections("iclea"), "idea");
        assert_eq!(apply_corrections("clata"), "data");
        assert_eq!(apply_corrections("clock"), "clock");
        assert_eq!(apply_corrections("include"), "include");
    }

    #[test]
    fn test_domain_terms() {
        assert_eq!(apply_corrections("the a1gorithrn runs"), "the algorithm runs");
        assert_eq!(apply_corrections("Algor1thms"), "Algorithms");
        assert_eq!(apply_corrections("NP complete"), "NP-complete");
        assert_eq!(apply_corrections("np-hard"), "NP-hard");
        assert_eq!(apply_corrections("theorern"), "theorem");
        assert_eq!(apply_corrections("sorts in 0(n 1og n)"), "sorts in O(n log n)");
        assert_eq!(apply_corrections("po1ynomial"), "polynomial");
    }

    #[test]
    fn test_plain_prose_untouched() {
        let text = "The cell membrane controls transport of molecules.";
        assert_eq!(apply_corrections(text), text);
    }
}
