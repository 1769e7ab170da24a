//! Word and character error rate computation.

use crate::error::MetricError;
use crate::normalize::normalize;
use serde::Serialize;

/// Accuracy metrics for one evaluation run.
///
/// Percentages are rounded to two decimals; accuracies are clamped at zero
/// because error rates above 100% are legitimate when insertions dominate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvalMetrics {
    /// Word error rate in percent
    pub wer: f64,
    /// Character error rate in percent
    pub cer: f64,
    /// 100 - WER, clamped at 0
    pub word_accuracy: f64,
    /// 100 - CER, clamped at 0
    pub char_accuracy: f64,
    /// Word count of the normalized reference
    pub reference_words: usize,
    /// Word count of the normalized hypothesis
    pub hypothesis_words: usize,
}

impl EvalMetrics {
    /// Compute WER/CER between a reference and a hypothesis.
    ///
    /// Both inputs are normalized here, never by the caller, so the two
    /// sides can never diverge in canonicalization. Words are tokenized on
    /// whitespace; characters are the Unicode scalars of the normalized
    /// text, separating spaces included.
    ///
    /// # Errors
    ///
    /// Returns `EmptyReference` when the normalized reference has no words.
    pub fn compute(reference: &str, hypothesis: &str) -> Result<Self, MetricError> {
        let reference = normalize(reference);
        let hypothesis = normalize(hypothesis);

        let ref_words: Vec<&str> = reference.split_whitespace().collect();
        let hyp_words: Vec<&str> = hypothesis.split_whitespace().collect();

        if ref_words.is_empty() {
            return Err(MetricError::EmptyReference);
        }

        let word_distance = edit_distance(&ref_words, &hyp_words);

        let ref_chars: Vec<char> = reference.chars().collect();
        let hyp_chars: Vec<char> = hypothesis.chars().collect();
        let char_distance = edit_distance(&ref_chars, &hyp_chars);

        let wer = round2(word_distance as f64 / ref_words.len() as f64 * 100.0);
        let cer = round2(char_distance as f64 / ref_chars.len() as f64 * 100.0);

        Ok(Self {
            wer,
            cer,
            word_accuracy: round2((100.0 - wer).max(0.0)),
            char_accuracy: round2((100.0 - cer).max(0.0)),
            reference_words: ref_words.len(),
            hypothesis_words: hyp_words.len(),
        })
    }
}

/// Minimum edit distance (substitutions + deletions + insertions).
///
/// Rolling single-row Levenshtein: the total count is symmetric under
/// swapping the sequences, so the row runs over the shorter one and space
/// stays O(min(n, m)) even for multi-hour transcripts with tens of
/// thousands of words.
fn edit_distance<T: PartialEq>(reference: &[T], hypothesis: &[T]) -> usize {
    let (long, short) = if reference.len() >= hypothesis.len() {
        (reference, hypothesis)
    } else {
        (hypothesis, reference)
    };

    if short.is_empty() {
        return long.len();
    }

    let mut row: Vec<usize> = (0..=short.len()).collect();

    for (i, a) in long.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;

        for (j, b) in short.iter().enumerate() {
            let cost = usize::from(a != b);
            let value = (row[j + 1] + 1) // deletion
                .min(row[j] + 1) // insertion
                .min(diagonal + cost); // substitution

            diagonal = row[j + 1];
            row[j + 1] = value;
        }
    }

    row[short.len()]
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_are_perfect() {
        let metrics = EvalMetrics::compute("the quick brown fox", "the quick brown fox").unwrap();

        assert_eq!(metrics.wer, 0.0);
        assert_eq!(metrics.cer, 0.0);
        assert_eq!(metrics.word_accuracy, 100.0);
        assert_eq!(metrics.char_accuracy, 100.0);
        assert_eq!(metrics.reference_words, 4);
        assert_eq!(metrics.hypothesis_words, 4);
    }

    #[test]
    fn normalization_is_symmetric() {
        let metrics = EvalMetrics::compute("Hello  WORLD", "hello world").unwrap();

        assert_eq!(metrics.wer, 0.0);
        assert_eq!(metrics.cer, 0.0);
    }

    #[test]
    fn single_insertion() {
        // One inserted word against 4 reference words: 1/4 = 25.00%
        let metrics =
            EvalMetrics::compute("the quick brown fox", "the quick brown fox jumps").unwrap();

        assert_eq!(metrics.wer, 25.0);
        assert_eq!(metrics.word_accuracy, 75.0);
        assert_eq!(metrics.reference_words, 4);
        assert_eq!(metrics.hypothesis_words, 5);
    }

    #[test]
    fn single_substitution() {
        let metrics = EvalMetrics::compute("hello world", "hello word").unwrap();

        assert_eq!(metrics.wer, 50.0);
        // "hello world" (11 chars) vs "hello word" (10 chars): one deletion
        assert!((metrics.cer - 9.09).abs() < 0.001);
    }

    #[test]
    fn empty_hypothesis_is_all_deletions() {
        let metrics = EvalMetrics::compute("the quick brown fox", "").unwrap();

        assert_eq!(metrics.wer, 100.0);
        assert_eq!(metrics.cer, 100.0);
        assert_eq!(metrics.word_accuracy, 0.0);
        assert_eq!(metrics.char_accuracy, 0.0);
        assert_eq!(metrics.hypothesis_words, 0);
    }

    #[test]
    fn accuracy_never_negative() {
        // 2 insertions against a 1-word reference: WER 200%
        let metrics = EvalMetrics::compute("a", "a b c").unwrap();

        assert_eq!(metrics.wer, 200.0);
        assert_eq!(metrics.word_accuracy, 0.0);
    }

    #[test]
    fn empty_reference_is_rejected() {
        assert!(matches!(
            EvalMetrics::compute("", "anything at all"),
            Err(MetricError::EmptyReference)
        ));
        assert!(matches!(
            EvalMetrics::compute("  \t\n ", ""),
            Err(MetricError::EmptyReference)
        ));
    }

    #[test]
    fn edit_distance_known_cases() {
        let kitten: Vec<char> = "kitten".chars().collect();
        let sitting: Vec<char> = "sitting".chars().collect();
        assert_eq!(edit_distance(&kitten, &sitting), 3);

        let a: Vec<&str> = "a b c d".split_whitespace().collect();
        let b: Vec<&str> = "a x c".split_whitespace().collect();
        assert_eq!(edit_distance(&a, &b), 2);

        assert_eq!(edit_distance::<char>(&[], &[]), 0);
        assert_eq!(edit_distance(&kitten, &[]), 6);
    }

    #[test]
    fn edit_distance_is_symmetric() {
        let long: Vec<&str> = "one two three four five six".split_whitespace().collect();
        let short: Vec<&str> = "two three seven".split_whitespace().collect();

        assert_eq!(edit_distance(&long, &short), edit_distance(&short, &long));
    }

    #[test]
    fn serializes_expected_fields() {
        let metrics = EvalMetrics::compute("a b", "a b").unwrap();
        let json = serde_json::to_value(&metrics).unwrap();

        for key in [
            "wer",
            "cer",
            "word_accuracy",
            "char_accuracy",
            "reference_words",
            "hypothesis_words",
        ] {
            assert!(json.get(key).is_some(), "missing field: {key}");
        }
    }
}
