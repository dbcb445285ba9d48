//! Lenient coercion of free-text model replies into fixed result records.
//!
//! Providers are asked for a JSON object but answer with whatever they like:
//! fenced code blocks, a chatty sentence before the object, confidence as
//! `"85%"`. Nothing in here fails on malformed text. A reply that cannot be
//! read degrades into a default verdict whose reasoning quotes the raw text,
//! so the failure stays visible to whoever reads the result.

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::analysis::{
    CONSENSUS_CONFIDENCE, DEFAULT_CONFIDENCE, DEFAULT_PATTERN, UNKNOWN_ASSET,
};
use crate::models::{
    AnalysisMode, AnalysisRequest, AnalysisResult, Direction, ModelVerdict, RawModelReply, Verdict,
};
use crate::schedule;

/// Longest raw excerpt quoted back in a diagnostic reasoning.
pub const EXCERPT_LIMIT: usize = 500;

pub const NO_ANALYSIS_REASONING: &str =
    "Não foi possível obter uma análise detalhada da imagem.";

const PREAMBLES: [&str; 2] = [
    "Here's the analysis in JSON format:",
    "Aqui está a análise em formato JSON:",
];

/// Why a reply could not be read as a verdict object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unreadable model reply: {reason}")]
pub struct ParseDiagnostic {
    pub reason: String,
    /// First `EXCERPT_LIMIT` characters of the raw reply.
    pub excerpt: String,
}

impl ParseDiagnostic {
    fn new(reason: impl Into<String>, raw: &str) -> Self {
        Self {
            reason: reason.into(),
            excerpt: raw.chars().take(EXCERPT_LIMIT).collect(),
        }
    }

    pub fn reasoning(&self, source: &str) -> String {
        format!(
            "Erro ao processar análise da IA ({}). Resposta bruta: {}...",
            source, self.excerpt
        )
    }
}

/// Outcome of turning a reply into a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub verdict: Verdict,
    /// Set when the reply was unreadable and the verdict is all defaults.
    pub diagnostic: Option<ParseDiagnostic>,
}

/// The part of a reply that should hold the JSON object.
pub fn extract_payload(raw: &str) -> &str {
    fenced_block(raw).unwrap_or_else(|| strip_preamble(raw))
}

fn fenced_block(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let body = &raw[open + 3..];
    let body = strip_prefix_ignore_case(body, "json").unwrap_or(body);
    let close = body.find("```")?;
    Some(body[..close].trim())
}

fn strip_preamble(raw: &str) -> &str {
    let mut text = raw.trim_start();
    for preamble in PREAMBLES {
        if let Some(rest) = strip_prefix_ignore_case(text, preamble) {
            text = rest.trim_start();
        }
    }
    if text.starts_with('`') {
        text = text.trim_start_matches('`');
        text = strip_prefix_ignore_case(text, "json").unwrap_or(text);
    }
    let text = text.trim().trim_end_matches('`').trim_end();

    if !text.starts_with('{') {
        if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
            if start < end {
                return &text[start..=end];
            }
        }
    }
    text
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// Read the reply as a `{asset, direction, confidence, reasoning, pattern}`
/// object. Fields that are missing, blank or uncoercible come back `None`.
///
/// A reply that is already valid JSON is taken as-is; fence and preamble
/// extraction only run when it is not, since string fields may themselves
/// contain backticks.
pub fn lenient_parse(raw: &str) -> Result<ModelVerdict, ParseDiagnostic> {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(extract_payload(raw))
            .map_err(|e| ParseDiagnostic::new(e.to_string(), raw))?,
    };
    let Value::Object(fields) = value else {
        return Err(ParseDiagnostic::new("reply is JSON but not an object", raw));
    };

    Ok(ModelVerdict {
        asset: text_field(&fields, "asset"),
        direction: text_field(&fields, "direction")
            .as_deref()
            .and_then(Direction::parse_label),
        confidence: fields.get("confidence").and_then(coerce_confidence),
        reasoning: text_field(&fields, "reasoning"),
        pattern: text_field(&fields, "pattern"),
    })
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// Integer coercion in the spirit of `parseInt`: numbers are truncated,
/// strings contribute their leading signed digits (`"85%"` is 85).
pub fn coerce_confidence(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(text) => leading_integer(text),
        _ => None,
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let sign_len = usize::from(text.starts_with(['-', '+']));
    let digits = text[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    text[..sign_len + digits].parse().ok()
}

fn default_verdict(reasoning: String) -> Verdict {
    Verdict {
        asset: UNKNOWN_ASSET.to_string(),
        direction: Direction::Neutral,
        confidence: DEFAULT_CONFIDENCE,
        reasoning,
        pattern: DEFAULT_PATTERN.to_string(),
    }
}

/// Turn any reply into a complete verdict. `source` names the provider in
/// the diagnostic reasoning.
pub fn resolve_verdict(reply: &RawModelReply, source: &str) -> Resolved {
    if reply.is_blank() {
        debug!(source = source, "Provider reply carried no content");
        return Resolved {
            verdict: default_verdict(NO_ANALYSIS_REASONING.to_string()),
            diagnostic: None,
        };
    }

    match lenient_parse(reply.as_str()) {
        Ok(parsed) => Resolved {
            verdict: Verdict {
                asset: parsed.asset.unwrap_or_else(|| UNKNOWN_ASSET.to_string()),
                direction: parsed.direction.unwrap_or_default(),
                confidence: parsed.confidence.unwrap_or(DEFAULT_CONFIDENCE),
                reasoning: parsed
                    .reasoning
                    .unwrap_or_else(|| NO_ANALYSIS_REASONING.to_string()),
                pattern: parsed.pattern.unwrap_or_else(|| DEFAULT_PATTERN.to_string()),
            },
            diagnostic: None,
        },
        Err(diagnostic) => {
            warn!(
                source = source,
                reason = %diagnostic.reason,
                "Failed to parse model reply as JSON, using defaults"
            );
            Resolved {
                verdict: default_verdict(diagnostic.reasoning(source)),
                diagnostic: Some(diagnostic),
            }
        }
    }
}

/// Apply the request context to a verdict.
///
/// An explicit instrument selection always replaces whatever the model
/// detected. Consensus requests report a fixed confidence.
pub fn apply_request(
    verdict: Verdict,
    request: &AnalysisRequest,
    now: DateTime<FixedOffset>,
) -> AnalysisResult {
    let instrument = request.instrument.clone().unwrap_or(verdict.asset);
    let confidence = match request.mode {
        AnalysisMode::Consensus => CONSENSUS_CONFIDENCE,
        AnalysisMode::Single | AnalysisMode::Automatic => verdict.confidence,
    };

    AnalysisResult {
        instrument,
        direction: verdict.direction,
        confidence,
        pattern: verdict.pattern,
        reasoning: verdict.reasoning,
        timeframe: request.timeframe,
        mode: request.mode,
        analysis_timestamp: now,
        entry_timestamp: schedule::entry_time(&now, request.timeframe),
        ai_used_label: request.ai_used_label(),
    }
}

/// Reply text plus request context in, complete result out.
pub fn normalize(
    reply: &RawModelReply,
    request: &AnalysisRequest,
    source: &str,
    now: DateTime<FixedOffset>,
) -> AnalysisResult {
    apply_request(resolve_verdict(reply, source).verdict, request, now)
}
