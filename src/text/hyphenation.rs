//! Repair of words split across line breaks.
//!
//! Scanned handouts and text copied out of PDFs break long words at the
//! right margin:
//!
//! - "photosyn-" + "thesis is the process" → "photosynthesis is the process"
//! - "self-" + "regulation" → kept as "self-" / "regulation" (real compound)
//! - "busi\u{00AD}" + "ness" → "business" (soft hyphens always join)
//!
//! Only breaks inside a paragraph are considered; a blank line is never
//! bridged.

/// Prefixes that form real hyphenated compounds.
const COMPOUND_PREFIXES: &[&str] = &[
    "self", "non", "anti", "pre", "post", "co", "ex", "multi", "semi", "sub", "super", "ultra",
    "cross", "inter", "intra", "counter", "mid", "well", "ill", "all", "half", "high", "low",
    "full", "part", "short", "long", "first", "second", "third", "real", "state", "time",
    "open", "closed", "single", "double", "two", "three", "four", "case", "data", "user",
];

/// Hyphenation handler for reconstructing split words.
#[derive(Debug, Clone)]
pub struct HyphenationHandler {
    /// Minimum length of the continuation word
    /// (prevents joining list markers such as "a)")
    min_continuation_length: usize,

    /// Whether to keep hyphens after known compound prefixes
    preserve_compounds: bool,
}

impl Default for HyphenationHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl HyphenationHandler {
    /// Create a new hyphenation handler with default settings.
    pub fn new() -> Self {
        Self {
            min_continuation_length: 2,
            preserve_compounds: true,
        }
    }

    /// Set minimum continuation length for word joining.
    pub fn with_min_continuation_length(mut self, len: usize) -> Self {
        self.min_continuation_length = len;
        self
    }

    /// Set whether to preserve compound words.
    pub fn with_preserve_compounds(mut self, preserve: bool) -> Self {
        self.preserve_compounds = preserve;
        self
    }

    /// Check if a line ends with a continuation hyphen.
    ///
    /// A soft hyphen (U+00AD) after a letter always continues the word. A hard
    /// hyphen continues it only when a letter precedes it, so "- item" and
    /// "1990-" are left alone.
    pub fn is_continuation_hyphen(text: &str) -> bool {
        let trimmed = text.trim_end();
        let without = match trimmed.strip_suffix('\u{00AD}').or_else(|| trimmed.strip_suffix('-')) {
            Some(rest) => rest,
            None => return false,
        };
        without.chars().last().is_some_and(|c| c.is_alphabetic())
    }

    /// Whether `first-second` should keep its hyphen.
    fn is_compound_word(first_part: &str, second_part: &str) -> bool {
        let first_lower = first_part.to_lowercase();
        if COMPOUND_PREFIXES.contains(&first_lower.as_str()) {
            return true;
        }
        // "Newton-" + "Raphson": two capitalised names
        let first_upper = first_part.chars().next().is_some_and(|c| c.is_uppercase());
        let second_upper = second_part.chars().next().is_some_and(|c| c.is_uppercase());
        first_upper && second_upper
    }

    /// Process a single line pair.
    ///
    /// Returns the possibly joined line and whether `next_line` was consumed.
    pub fn process_line_pair(&self, current_line: &str, next_line: &str) -> (String, bool) {
        let trimmed_current = current_line.trim_end();
        if !Self::is_continuation_hyphen(trimmed_current) {
            return (current_line.to_string(), false);
        }

        let trimmed_next = next_line.trim_start();
        let next_word = trimmed_next.split_whitespace().next().unwrap_or("");
        if next_word.chars().count() < self.min_continuation_length
            || !next_word.chars().next().is_some_and(|c| c.is_alphabetic())
        {
            return (current_line.to_string(), false);
        }

        let is_soft_hyphen = trimmed_current.ends_with('\u{00AD}');
        let hyphen_len = if is_soft_hyphen { '\u{00AD}'.len_utf8() } else { 1 };
        let without_hyphen = &trimmed_current[..trimmed_current.len() - hyphen_len];
        let last_word = without_hyphen
            .split_whitespace()
            .next_back()
            .unwrap_or(without_hyphen);

        if !is_soft_hyphen && self.preserve_compounds && Self::is_compound_word(last_word, next_word) {
            return (current_line.to_string(), false);
        }

        let prefix = &without_hyphen[..without_hyphen.len() - last_word.len()];
        let mut result = format!("{}{}{}", prefix, last_word, next_word);
        let rest_of_next = trimmed_next[next_word.len()..].trim_start();
        if !rest_of_next.is_empty() {
            result.push(' ');
            result.push_str(rest_of_next);
        }

        (result, true)
    }

    /// Join hyphenated words across every line break in `text`.
    ///
    /// A joined line may itself end in a hyphen, so the result is fed back
    /// into the next pair.
    pub fn process_text(&self, text: &str) -> String {
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        let mut result: Vec<String> = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            if i + 1 < lines.len() {
                let (processed, consumed) = self.process_line_pair(&lines[i], &lines[i + 1]);
                if consumed {
                    lines[i + 1] = processed;
                    i += 1;
                    continue;
                }
            }
            result.push(std::mem::take(&mut lines[i]));
            i += 1;
        }

        let mut output = result.join("\n");
        if text.ends_with('\n') && !output.ends_with('\n') {
            output.push('\n');
        }
        output
    }
}
