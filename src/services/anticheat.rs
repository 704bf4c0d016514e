use serde_json::Value;

use crate::core::config::Settings;
use crate::services::gemini::{GeminiClient, GeminiPart, GeminiRequest};
use crate::services::UpstreamError;

const CHEATING_DETECTION_PROMPT: &str = r#"You are an academic-integrity analyst reviewing recordings of remote oral exams.
You receive the audio track and the video track of one exam session.

Look for signs of cheating or academic dishonesty, such as:
- a second voice prompting or dictating answers
- the student reading from notes, a second screen, or a phone
- repeated off-camera glances synchronized with answers
- typing or page-turning sounds during answers
- lip movement that does not match the audio
- unexplained pauses followed by sudden fluent answers

Respond with strict JSON only:
{
  "is_cheating": <bool>,
  "confidence": "low" | "medium" | "high",
  "summary": "<one-paragraph summary of the session>",
  "indicators_found": ["<indicator>", ...],
  "recommendation": "clear" | "review" | "investigate",
  "notes": "<anything the examiner should know that does not fit above>"
}

If nothing suspicious is present, return is_cheating=false with an empty
indicators_found list and recommendation "clear".
"#;

const ANALYSIS_INSTRUCTION: &str = "Please analyze this audio and video recording from an oral exam for any signs of cheating or academic dishonesty. Provide your analysis in the specified JSON format.";

/// Structured verdict parsed from the model's cheating analysis.
#[derive(Debug, Clone)]
pub(crate) struct CheatingReport {
    pub(crate) is_cheating: bool,
    pub(crate) confidence: String,
    pub(crate) summary: String,
    pub(crate) indicators_found: Vec<String>,
    pub(crate) recommendation: String,
    pub(crate) notes: String,
}

#[derive(Debug, Clone)]
pub(crate) struct AnticheatService {
    gemini: GeminiClient,
    model: String,
    temperature: f64,
}

impl AnticheatService {
    pub(crate) fn new(gemini: GeminiClient, settings: &Settings) -> Self {
        Self {
            gemini,
            model: settings.ai().gemini_model.clone(),
            temperature: settings.anticheat().temperature,
        }
    }

    pub(crate) async fn detect_cheating(
        &self,
        audio: &[u8],
        audio_mime_type: &str,
        video: &[u8],
        video_mime_type: &str,
    ) -> Result<CheatingReport, UpstreamError> {
        tracing::info!(
            audio_bytes = audio.len(),
            video_bytes = video.len(),
            "Starting cheating analysis"
        );

        let text = self
            .gemini
            .generate(&GeminiRequest {
                model: self.model.clone(),
                system_instruction: CHEATING_DETECTION_PROMPT.to_string(),
                parts: vec![
                    GeminiPart::Media {
                        mime_type: audio_mime_type.to_string(),
                        data: audio.to_vec(),
                    },
                    GeminiPart::Media {
                        mime_type: video_mime_type.to_string(),
                        data: video.to_vec(),
                    },
                    GeminiPart::Text(ANALYSIS_INSTRUCTION.to_string()),
                ],
                temperature: self.temperature,
            })
            .await?;

        let report = parse_report(&text)?;

        tracing::info!(
            is_cheating = report.is_cheating,
            confidence = %report.confidence,
            recommendation = %report.recommendation,
            indicators = report.indicators_found.len(),
            "Cheating analysis completed"
        );

        Ok(report)
    }
}

/// Decode the model completion into a report, tolerating markdown code fences
/// and missing fields.
fn parse_report(text: &str) -> Result<CheatingReport, UpstreamError> {
    let payload = extract_json_block(text);
    let data: Value =
        serde_json::from_str(payload).map_err(|err| UpstreamError::InvalidResponse {
            service: "Gemini",
            message: format!("cheating report is not valid JSON: {err}"),
        })?;

    let indicators_found = data
        .get("indicators_found")
        .and_then(Value::as_array)
        .map(|items| {
            items.iter().filter_map(|item| item.as_str().map(str::to_string)).collect()
        })
        .unwrap_or_default();

    Ok(CheatingReport {
        is_cheating: data.get("is_cheating").and_then(Value::as_bool).unwrap_or(false),
        confidence: string_field(&data, "confidence", "low"),
        summary: string_field(&data, "summary", ""),
        indicators_found,
        recommendation: string_field(&data, "recommendation", "clear"),
        notes: string_field(&data, "notes", ""),
    })
}

fn string_field(data: &Value, key: &str, default: &str) -> String {
    data.get(key).and_then(Value::as_str).unwrap_or(default).to_string()
}

/// Strip ```json / ``` fences when the model wraps its JSON in markdown.
fn extract_json_block(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
    }

    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_REPORT: &str = r#"{
        "is_cheating": true,
        "confidence": "high",
        "summary": "A second voice dictates answers throughout.",
        "indicators_found": ["second voice", "off-camera glances"],
        "recommendation": "investigate",
        "notes": "Second voice audible from 02:14."
    }"#;

    #[test]
    fn extract_json_block_handles_json_fence() {
        let text = format!("Here is the analysis:\n```json\n{FULL_REPORT}\n```\nDone.");
        assert_eq!(extract_json_block(&text), FULL_REPORT.trim());
    }

    #[test]
    fn extract_json_block_handles_plain_fence() {
        let text = format!("```\n{FULL_REPORT}\n```");
        assert_eq!(extract_json_block(&text), FULL_REPORT.trim());
    }

    #[test]
    fn extract_json_block_passes_through_raw_json() {
        assert_eq!(extract_json_block(FULL_REPORT), FULL_REPORT.trim());
    }

    #[test]
    fn parse_report_reads_all_fields() {
        let report = parse_report(FULL_REPORT).expect("report");
        assert!(report.is_cheating);
        assert_eq!(report.confidence, "high");
        assert_eq!(report.indicators_found, vec!["second voice", "off-camera glances"]);
        assert_eq!(report.recommendation, "investigate");
        assert_eq!(report.notes, "Second voice audible from 02:14.");
    }

    #[test]
    fn parse_report_applies_defaults() {
        let report = parse_report("{}").expect("report");
        assert!(!report.is_cheating);
        assert_eq!(report.confidence, "low");
        assert_eq!(report.summary, "");
        assert!(report.indicators_found.is_empty());
        assert_eq!(report.recommendation, "clear");
        assert_eq!(report.notes, "");
    }

    #[test]
    fn parse_report_skips_non_string_indicators() {
        let report =
            parse_report(r#"{"indicators_found": ["voice", 3, null, "notes"]}"#).expect("report");
        assert_eq!(report.indicators_found, vec!["voice", "notes"]);
    }

    #[test]
    fn parse_report_rejects_non_json() {
        let err = parse_report("the student seems fine").expect_err("should fail");
        assert!(matches!(err, UpstreamError::InvalidResponse { .. }));
    }
}
