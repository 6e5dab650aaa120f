//! Keyword heuristic used when the language model cannot be reached.

use fc_core::{AnalysisInput, Label, Verdict};

pub const SUSPICIOUS_PHRASES: [&str; 5] = [
    "breaking",
    "shocking",
    "you won't believe",
    "doctors hate",
    "click here",
];

const LIKELY_TRUE_EXPLANATION: &str = "The article comes from a reliable source and contains factual information with minimal suspicious language.";
const LIKELY_FALSE_EXPLANATION: &str = "The article shows signs of misinformation, including suspicious language patterns and/or unreliable source.";
const UNCERTAIN_EXPLANATION: &str = "Unable to determine with high confidence. More context or verification needed.";

pub fn explanation_for(label: Label) -> &'static str {
    match label {
        Label::LikelyTrue => LIKELY_TRUE_EXPLANATION,
        Label::LikelyFalse => LIKELY_FALSE_EXPLANATION,
        Label::Uncertain => UNCERTAIN_EXPLANATION,
    }
}

/// Number of distinct suspicious phrases present in already lower-cased text.
pub fn suspicious_phrase_count(text: &str) -> usize {
    SUSPICIOUS_PHRASES
        .iter()
        .filter(|phrase| text.contains(*phrase))
        .count()
}

pub fn heuristic_verdict(input: &AnalysisInput) -> Verdict {
    let combined = format!("{} {}", input.title, input.content).to_lowercase();
    let suspicious = suspicious_phrase_count(&combined);
    let reliability = input.reliability_score;

    let (label, confidence) = if reliability > 0.7 && suspicious < 2 {
        (Label::LikelyTrue, 0.75)
    } else if reliability < 0.4 || suspicious > 2 {
        (Label::LikelyFalse, 0.7)
    } else {
        (Label::Uncertain, 0.5)
    };

    tracing::debug!(
        "Heuristic verdict {} (reliability {}, {} suspicious phrases)",
        label, reliability, suspicious
    );

    Verdict {
        label,
        confidence,
        explanation: explanation_for(label).to_string(),
        evidence_links: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, content: &str, reliability: f64) -> AnalysisInput {
        AnalysisInput {
            title: title.to_string(),
            content: content.to_string(),
            url: None,
            domain: None,
            reliability_score: reliability,
        }
    }

    #[test]
    fn test_reliable_and_calm_is_likely_true() {
        let verdict = heuristic_verdict(&input(
            "Council approves budget",
            "The city council approved the annual budget on Tuesday.",
            0.9,
        ));
        assert_eq!(verdict.label, Label::LikelyTrue);
        assert_eq!(verdict.confidence, 0.75);
        assert_eq!(verdict.explanation, LIKELY_TRUE_EXPLANATION);
        assert!(verdict.evidence_links.is_empty());
    }

    #[test]
    fn test_unreliable_source_is_likely_false() {
        let calm = heuristic_verdict(&input("Weather report", "Mild temperatures expected.", 0.2));
        assert_eq!(calm.label, Label::LikelyFalse);
        assert_eq!(calm.confidence, 0.7);

        let loud = heuristic_verdict(&input("BREAKING", "Shocking! Click here!", 0.2));
        assert_eq!(loud.label, Label::LikelyFalse);
        assert_eq!(loud.confidence, 0.7);
    }

    #[test]
    fn test_many_phrases_override_mid_reliability() {
        let verdict = heuristic_verdict(&input(
            "Shocking news",
            "Breaking: click here to learn more.",
            0.5,
        ));
        assert_eq!(verdict.label, Label::LikelyFalse);
        assert_eq!(verdict.confidence, 0.7);

        let repeated = heuristic_verdict(&input("", "shocking shocking shocking", 0.5));
        assert_eq!(repeated.label, Label::Uncertain);
    }

    #[test]
    fn test_mid_reliability_is_uncertain() {
        let verdict = heuristic_verdict(&input("Local news", "Nothing unusual here.", 0.5));
        assert_eq!(verdict.label, Label::Uncertain);
        assert_eq!(verdict.confidence, 0.5);
        assert_eq!(verdict.explanation, UNCERTAIN_EXPLANATION);
    }

    #[test]
    fn test_reliable_but_sensational_is_not_likely_true() {
        // Two phrases: too many for "Likely True", not enough for "Likely False".
        let verdict = heuristic_verdict(&input("You won't believe this", "Doctors hate it.", 0.9));
        assert_eq!(verdict.label, Label::Uncertain);
    }

    #[test]
    fn test_phrase_count_spans_title_and_content() {
        assert_eq!(suspicious_phrase_count("nothing to see"), 0);
        assert_eq!(suspicious_phrase_count("breaking breaking click here"), 2);
        let verdict = heuristic_verdict(&input("Breaking", "shocking click here", 0.5));
        assert_eq!(verdict.label, Label::LikelyFalse);
    }

    #[test]
    fn test_repeated_phrase_counts_once() {
        let verdict = heuristic_verdict(&input(
            "Breaking: council passes budget",
            "In breaking news, the council passed the budget.",
            0.9,
        ));
        assert_eq!(verdict.label, Label::LikelyTrue);
        assert_eq!(verdict.confidence, 0.75);
    }

    #[test]
    fn test_boundaries_are_exclusive() {
        assert_eq!(heuristic_verdict(&input("t", "c", 0.7)).label, Label::Uncertain);
        assert_eq!(heuristic_verdict(&input("t", "c", 0.4)).label, Label::Uncertain);
    }
}
