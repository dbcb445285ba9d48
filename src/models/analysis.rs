//! Analysis request and result records

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::capture::ImagePayload;
use crate::catalog::{self, AIPreset};

/// Placeholder instrument when neither the user nor the model named one.
pub const UNKNOWN_ASSET: &str = "Ativo Desconhecido";
pub const DEFAULT_CONFIDENCE: i64 = 50;
pub const DEFAULT_PATTERN: &str = "None";
/// Confidence reported for consensus requests, whatever the model said.
pub const CONSENSUS_CONFIDENCE: i64 = 98;

pub const AUTOMATIC_LABEL: &str = "Análise Automática (Todas as IAs)";
pub const CONSENSUS_LABEL: &str = "Consenso (Todas as IAs)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Call,
    Put,
    #[default]
    Neutral,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Call => "CALL",
            Direction::Put => "PUT",
            Direction::Neutral => "NEUTRAL",
        }
    }

    /// Case-insensitive match on the three labels; anything else is `None`.
    pub fn parse_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("CALL") {
            Some(Direction::Call)
        } else if label.eq_ignore_ascii_case("PUT") {
            Some(Direction::Put)
        } else if label.eq_ignore_ascii_case("NEUTRAL") {
            Some(Direction::Neutral)
        } else {
            None
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// One preset chosen by the user.
    #[default]
    Single,
    Automatic,
    /// Stand-in for an unimplemented multi-model aggregate.
    Consensus,
}

impl FromStr for AnalysisMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(AnalysisMode::Single),
            "automatic" | "auto" => Ok(AnalysisMode::Automatic),
            "consensus" => Ok(AnalysisMode::Consensus),
            other => Err(ValidationError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    M1,
    M5,
}

impl Timeframe {
    pub fn minutes(&self) -> i64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
        }
    }
}

impl FromStr for Timeframe {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "M1" => Ok(Timeframe::M1),
            "M5" => Ok(Timeframe::M5),
            other => Err(ValidationError::UnknownTimeframe(other.to_string())),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Problems detected before any provider is contacted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Nenhuma imagem carregada.")]
    MissingImage,
    #[error("Selecione uma IA para a análise.")]
    PresetRequired,
    #[error("IA desconhecida: {0}")]
    UnknownPreset(String),
    #[error("modo de análise desconhecido: {0}")]
    UnknownMode(String),
    #[error("timeframe desconhecido: {0}")]
    UnknownTimeframe(String),
}

/// One user-triggered analysis. Consumed once, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub image: ImagePayload,
    pub mode: AnalysisMode,
    pub selected_preset: Option<String>,
    pub instrument: Option<String>,
    pub timeframe: Timeframe,
}

impl AnalysisRequest {
    pub fn new(image: ImagePayload, mode: AnalysisMode) -> Self {
        Self {
            image,
            mode,
            selected_preset: None,
            instrument: None,
            timeframe: Timeframe::default(),
        }
    }

    pub fn with_preset(mut self, preset_id: impl Into<String>) -> Self {
        self.selected_preset = Some(preset_id.into());
        self
    }

    /// Blank selections mean "detect automatically".
    pub fn with_instrument(mut self, instrument: Option<String>) -> Self {
        self.instrument = instrument
            .map(|symbol| symbol.trim().to_string())
            .filter(|symbol| !symbol.is_empty());
        self
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = timeframe;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mode != AnalysisMode::Single {
            return Ok(());
        }
        let id = self
            .selected_preset
            .as_deref()
            .ok_or(ValidationError::PresetRequired)?;
        catalog::find_preset(id)
            .map(|_| ())
            .ok_or_else(|| ValidationError::UnknownPreset(id.to_string()))
    }

    /// The preset whose specialty frames the prompt. Only single-preset
    /// requests carry one.
    pub fn preset(&self) -> Option<&'static AIPreset> {
        match self.mode {
            AnalysisMode::Single => self
                .selected_preset
                .as_deref()
                .and_then(catalog::find_preset),
            AnalysisMode::Automatic | AnalysisMode::Consensus => None,
        }
    }

    pub fn ai_used_label(&self) -> String {
        match self.mode {
            AnalysisMode::Single => self
                .preset()
                .map(|preset| preset.display_name.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            AnalysisMode::Automatic => AUTOMATIC_LABEL.to_string(),
            AnalysisMode::Consensus => CONSENSUS_LABEL.to_string(),
        }
    }
}

/// Untrusted text handed back by a provider. Shape is not guaranteed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawModelReply(pub String);

impl RawModelReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Fields recovered from a reply that parsed as a JSON object. Absent,
/// empty or uncoercible fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelVerdict {
    pub asset: Option<String>,
    pub direction: Option<Direction>,
    pub confidence: Option<i64>,
    pub reasoning: Option<String>,
    pub pattern: Option<String>,
}

/// Fully defaulted verdict; also the body of the forwarding endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub asset: String,
    pub direction: Direction,
    pub confidence: i64,
    pub reasoning: String,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub instrument: String,
    pub direction: Direction,
    pub confidence: i64,
    pub pattern: String,
    pub reasoning: String,
    pub timeframe: Timeframe,
    pub mode: AnalysisMode,
    pub analysis_timestamp: DateTime<FixedOffset>,
    pub entry_timestamp: DateTime<FixedOffset>,
    pub ai_used_label: String,
}
