use crate::core::config::Settings;
use crate::services::claude::ClaudeClient;
use crate::services::gemini::{GeminiClient, GeminiPart, GeminiRequest};
use crate::services::UpstreamError;

const FIRST_STAGE_PROMPT: &str = r#"You are an experienced examiner for the class "{class_name}".
You are given an audio recording of a student's oral exam answer.

Listen to the recording and produce a written review of the answer:
1. Summarize what the student said.
2. Assess factual correctness, depth, and structure against what a strong
   answer in "{class_name}" would cover.
3. Point out concrete mistakes and gaps.
4. End the review with a final score as an integer from 0 to 100 on its own
   line in the form: FINAL SCORE: <number>
"#;

const SECOND_STAGE_PROMPT: &str = r#"You are an experienced examiner for the class "{class_name}".
Another examiner has already reviewed a student's oral exam answer. You are
given that review. Challenge it where it is too harsh or too lenient, correct
any factual errors in it, and produce your own final assessment.

End your assessment with a final score as an integer from 0 to 100 on its own
line in the form: FINAL SCORE: <number>
"#;

const FIND_FINAL_SCORE_PROMPT: &str = r#"You extract grades from exam review reports.
The report contains a final integer score somewhere in its text.
Reply with that integer and nothing else: no words, no punctuation, no units.
"#;

const REVIEW_EXCHANGE_PREFIX: &str = "Here is the other examiner's analysis of the oral exam:";
const REVIEW_EXCHANGE_SUFFIX: &str =
    "Please provide your final assessment considering this input.";

#[derive(Debug, Clone)]
pub(crate) struct GradingService {
    gemini: GeminiClient,
    claude: ClaudeClient,
    gemini_model: String,
    extraction_model: String,
    base_temperature: f64,
    alt_temperature: f64,
}

impl GradingService {
    pub(crate) fn new(gemini: GeminiClient, claude: ClaudeClient, settings: &Settings) -> Self {
        Self {
            gemini,
            claude,
            gemini_model: settings.ai().gemini_model.clone(),
            extraction_model: settings.ai().gemini_extraction_model.clone(),
            base_temperature: settings.grading().base_temperature,
            alt_temperature: settings.grading().alt_temperature,
        }
    }

    pub(crate) fn gemini_configured(&self) -> bool {
        self.gemini.is_configured()
    }

    pub(crate) fn claude_configured(&self) -> bool {
        self.claude.is_configured()
    }

    /// Run the two-stage peer-review grading pipeline over an exam recording.
    ///
    /// Two first-stage audio analyses are produced at different sampling
    /// temperatures, each final assessment reviews the other analysis (one by
    /// Gemini, one by Claude), and the returned grade is the rounded average
    /// of the integers extracted from both final assessments.
    pub(crate) async fn process_exam(
        &self,
        audio: &[u8],
        mime_type: &str,
        class_name: &str,
    ) -> Result<i64, UpstreamError> {
        let first_stage = FIRST_STAGE_PROMPT.replace("{class_name}", class_name);
        let second_stage = SECOND_STAGE_PROMPT.replace("{class_name}", class_name);

        tracing::info!(class_name, audio_bytes = audio.len(), "Starting exam grading");

        let analysis_base =
            self.audio_analysis(audio, mime_type, &first_stage, self.base_temperature).await?;
        let analysis_alt =
            self.audio_analysis(audio, mime_type, &first_stage, self.alt_temperature).await?;

        // Cross review: each final assessment sees the other analysis.
        let review_prompt_base = review_exchange_prompt(&analysis_alt);
        let review_prompt_alt = review_exchange_prompt(&analysis_base);

        let final_gemini = self
            .gemini
            .generate(&GeminiRequest {
                model: self.gemini_model.clone(),
                system_instruction: second_stage.clone(),
                parts: vec![GeminiPart::Text(review_prompt_base)],
                temperature: self.base_temperature,
            })
            .await?;
        let final_claude = self
            .claude
            .generate(
                &second_stage,
                &review_prompt_alt,
                clamp_claude_temperature(self.alt_temperature),
            )
            .await?;

        let grade_gemini = self.extract_grade(&final_gemini).await?;
        let grade_claude = self.extract_grade(&final_claude).await?;
        let average = average_grade(grade_gemini, grade_claude);

        tracing::info!(class_name, grade_gemini, grade_claude, average, "Exam grading completed");

        Ok(average)
    }

    async fn audio_analysis(
        &self,
        audio: &[u8],
        mime_type: &str,
        system_prompt: &str,
        temperature: f64,
    ) -> Result<String, UpstreamError> {
        self.gemini
            .generate(&GeminiRequest {
                model: self.gemini_model.clone(),
                system_instruction: system_prompt.to_string(),
                parts: vec![
                    GeminiPart::Media { mime_type: mime_type.to_string(), data: audio.to_vec() },
                    GeminiPart::Text(
                        "Please analyze this audio recording from an oral exam.".to_string(),
                    ),
                ],
                temperature,
            })
            .await
    }

    /// Pull the single integer grade out of a full review report using the
    /// fast extraction model.
    async fn extract_grade(&self, report: &str) -> Result<i64, UpstreamError> {
        let prompt = format!(
            "Extract the final grade/score from this review and return only the integer:\n\n{report}"
        );

        let text = self
            .gemini
            .generate(&GeminiRequest {
                model: self.extraction_model.clone(),
                system_instruction: FIND_FINAL_SCORE_PROMPT.to_string(),
                parts: vec![GeminiPart::Text(prompt)],
                temperature: 0.0,
            })
            .await?;

        parse_grade(&text).ok_or_else(|| UpstreamError::InvalidResponse {
            service: "Gemini",
            message: format!("no integer grade in {text:?}"),
        })
    }
}

/// The Anthropic messages API rejects temperatures above 1.0, while Gemini
/// accepts up to 2.0, so the alternate temperature is capped for Claude.
fn clamp_claude_temperature(temperature: f64) -> f64 {
    temperature.min(1.0)
}

/// Average two grades, rounding halves to the nearest even integer so that
/// adjacent grade pairs do not all round upward.
fn average_grade(first: i64, second: i64) -> i64 {
    let sum = first + second;
    let half = sum.div_euclid(2);
    if sum.rem_euclid(2) == 0 || half % 2 == 0 {
        half
    } else {
        half + 1
    }
}

fn review_exchange_prompt(peer_analysis: &str) -> String {
    format!("{REVIEW_EXCHANGE_PREFIX}\n\n{peer_analysis}\n\n{REVIEW_EXCHANGE_SUFFIX}")
}

/// Parse the integer grade from an extraction-model reply. The model is asked
/// for a bare integer but occasionally wraps it in prose, so fall back to the
/// first digit run in the text.
fn parse_grade(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    let mut digits = String::new();
    for ch in trimmed.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else if !digits.is_empty() {
            break;
        }
    }

    digits.parse().ok()
}
