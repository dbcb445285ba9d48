//! Front-end state as an explicit value updated by a reducer.
//!
//! Every user event and every async completion becomes a `UiAction`;
//! `reduce` is the only place state changes. Overlapping analyses are not
//! guarded against: whichever completion is reduced last is what shows.

use std::time::Duration;

use crate::capture::{CaptureError, ImagePayload};
use crate::models::{AnalysisMode, AnalysisRequest, AnalysisResult, Timeframe, ValidationError};
use crate::presenter::ResultView;

/// Cosmetic progress messages, unrelated to actual provider progress.
pub const STATUS_MESSAGES: [&str; 6] = [
    "Processando imagem com IA...",
    "Identificando padrões de candlestick...",
    "Analisando suporte e resistência...",
    "Calculando indicadores técnicos...",
    "Detectando sinais de entrada...",
    "Gerando previsão final...",
];

pub const STATUS_TICK: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Analyzing {
        mode: AnalysisMode,
        status_index: usize,
    },
    Showing,
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UiState {
    pub image: Option<ImagePayload>,
    pub selected_preset: Option<String>,
    /// `None` means "detect automatically".
    pub instrument: Option<String>,
    pub timeframe: Timeframe,
    pub phase: Phase,
    /// Last validation message, cleared by the next accepted image.
    pub notice: Option<String>,
    pub last_result: Option<AnalysisResult>,
}

#[derive(Debug, Clone)]
pub enum UiAction {
    ImageCaptured(ImagePayload),
    ImageRejected(CaptureError),
    ImageRemoved,
    PresetSelected(String),
    InstrumentSelected(Option<String>),
    TimeframeSelected(Timeframe),
    AnalysisStarted(AnalysisMode),
    StatusTick,
    AnalysisSucceeded(AnalysisResult),
    AnalysisFailed(String),
}

pub fn reduce(mut state: UiState, action: UiAction) -> UiState {
    match action {
        UiAction::ImageCaptured(image) => {
            state.image = Some(image);
            state.notice = None;
        }
        UiAction::ImageRejected(error) => {
            state.notice = Some(error.user_message().to_string());
        }
        UiAction::ImageRemoved => {
            state.image = None;
        }
        UiAction::PresetSelected(id) => {
            state.selected_preset = Some(id);
        }
        UiAction::InstrumentSelected(instrument) => {
            state.instrument = instrument.filter(|symbol| !symbol.trim().is_empty());
        }
        UiAction::TimeframeSelected(timeframe) => {
            state.timeframe = timeframe;
        }
        UiAction::AnalysisStarted(mode) => {
            state.phase = Phase::Analyzing {
                mode,
                status_index: 0,
            };
        }
        UiAction::StatusTick => {
            if let Phase::Analyzing { status_index, .. } = &mut state.phase {
                *status_index = (*status_index + 1) % STATUS_MESSAGES.len();
            }
        }
        UiAction::AnalysisSucceeded(result) => {
            state.last_result = Some(result);
            state.phase = Phase::Showing;
        }
        UiAction::AnalysisFailed(message) => {
            state.phase = Phase::Failed { message };
        }
    }
    state
}

impl UiState {
    pub fn is_analyzing(&self) -> bool {
        matches!(self.phase, Phase::Analyzing { .. })
    }

    /// Whether the action control for `mode` is enabled.
    pub fn can_analyze(&self, mode: AnalysisMode) -> bool {
        if self.image.is_none() || self.is_analyzing() {
            return false;
        }
        match mode {
            AnalysisMode::Single => self.selected_preset.is_some(),
            AnalysisMode::Automatic | AnalysisMode::Consensus => true,
        }
    }

    pub fn status_message(&self) -> Option<&'static str> {
        match self.phase {
            Phase::Analyzing { status_index, .. } => Some(STATUS_MESSAGES[status_index]),
            _ => None,
        }
    }

    pub fn result_view(&self) -> Option<ResultView> {
        match self.phase {
            Phase::Showing => self.last_result.as_ref().map(ResultView::from_result),
            _ => None,
        }
    }

    /// Snapshot the current selections into a request, or say what is
    /// missing. No provider is contacted for an invalid request.
    pub fn build_request(&self, mode: AnalysisMode) -> Result<AnalysisRequest, ValidationError> {
        let image = self.image.clone().ok_or(ValidationError::MissingImage)?;
        let mut request = AnalysisRequest::new(image, mode)
            .with_instrument(self.instrument.clone())
            .with_timeframe(self.timeframe);
        if let Some(preset) = &self.selected_preset {
            request = request.with_preset(preset.clone());
        }
        request.validate()?;
        Ok(request)
    }
}
