use fc_core::{parse_http_url, AnalysisInput, Error, Label, Result, Verdict};
use serde::Deserialize;

/// Build the fact-checking prompt for one article.
pub fn build_prompt(input: &AnalysisInput) -> String {
    format!(
        r#"You are a fact-checking AI. Analyze the following content and return JSON exactly in this format:
{{
  "label": "Likely True / Uncertain / Likely False",
  "confidence": 0-1,
  "explanation": "Provide a brief reasoning behind the label",
  "sentiment": "positive / negative / neutral",
  "evidenceLinks": ["optional URLs used as proof"]
}}
Respond with the JSON object only.

Title: "{}"
Content: "{}""#,
        input.title, input.content
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerdict {
    label: String,
    confidence: f64,
    explanation: String,
    #[serde(default)]
    evidence_links: Option<Vec<String>>,
}

/// Parse a model reply into a verdict.
///
/// The reply must be a single JSON object with a known label, a confidence in
/// `[0, 1]` and a non-empty explanation. Evidence links that are not absolute
/// http(s) URLs are dropped.
pub fn parse_verdict(raw: &str) -> Result<Verdict> {
    let parsed: RawVerdict = serde_json::from_str(raw.trim())
        .map_err(|e| Error::MalformedAnalysisOutput(e.to_string()))?;

    let label: Label = parsed.label.parse()?;
    if !parsed.confidence.is_finite() || !(0.0..=1.0).contains(&parsed.confidence) {
        return Err(Error::MalformedAnalysisOutput(format!(
            "confidence out of range: {}",
            parsed.confidence
        )));
    }
    let explanation = parsed.explanation.trim().to_string();
    if explanation.is_empty() {
        return Err(Error::MalformedAnalysisOutput("empty explanation".to_string()));
    }

    let evidence_links = parsed
        .evidence_links
        .unwrap_or_default()
        .into_iter()
        .filter_map(|link| match parse_http_url(&link) {
            Some(url) => Some(String::from(url)),
            None => {
                tracing::debug!("Dropping evidence link that is not an http(s) URL: {:?}", link);
                None
            }
        })
        .collect();

    Ok(Verdict {
        label,
        confidence: parsed.confidence,
        explanation,
        evidence_links,
    })
}
