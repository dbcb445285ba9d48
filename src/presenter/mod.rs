//! Display formatting for normalized results.

use serde::Serialize;
use std::fmt;

use crate::models::{AnalysisResult, Direction};
use crate::schedule::format_clock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub direction: String,
    /// Style hook: `call`, `put` or `neutral`.
    pub direction_class: String,
    /// Arrow icon: `up`, `down` or `flat`.
    pub arrow: String,
    pub confidence: String,
    pub instrument: String,
    pub timeframe: String,
    pub analysis_time: String,
    pub entry_time: String,
    pub ai_used: String,
    pub pattern: String,
    pub reasoning: String,
}

impl ResultView {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let arrow = match result.direction {
            Direction::Call => "up",
            Direction::Put => "down",
            Direction::Neutral => "flat",
        };

        Self {
            direction: result.direction.to_string(),
            direction_class: result.direction.as_str().to_ascii_lowercase(),
            arrow: arrow.to_string(),
            confidence: format!("{}%", result.confidence),
            instrument: result.instrument.clone(),
            timeframe: result.timeframe.to_string(),
            analysis_time: format_clock(&result.analysis_timestamp),
            entry_time: format_clock(&result.entry_timestamp),
            ai_used: result.ai_used_label.clone(),
            pattern: result.pattern.clone(),
            reasoning: result.reasoning.clone(),
        }
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Direção: {} ({})", self.direction, self.confidence)?;
        writeln!(f, "  Ativo: {}", self.instrument)?;
        writeln!(f, "  Timeframe: {}", self.timeframe)?;
        writeln!(f, "  Horário da Análise: {}", self.analysis_time)?;
        writeln!(f, "  Horário de Entrada: {}", self.entry_time)?;
        writeln!(f, "  IA Utilizada: {}", self.ai_used)?;
        writeln!(f, "  Padrão: {}", self.pattern)?;
        write!(f, "  Análise Detalhada: {}", self.reasoning)
    }
}
