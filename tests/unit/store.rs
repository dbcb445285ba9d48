//! Unit tests for the UI state reducer

use chartcall::capture::{CaptureError, ImagePayload, INVALID_IMAGE_MESSAGE};
use chartcall::models::{
    AnalysisMode, AnalysisResult, Direction, Timeframe, ValidationError,
};
use chartcall::store::{reduce, Phase, UiAction, UiState, STATUS_MESSAGES};
use chrono::{FixedOffset, TimeZone};

fn chart() -> ImagePayload {
    ImagePayload::from_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap()
}

fn result(direction: Direction, confidence: i64) -> AnalysisResult {
    let now = FixedOffset::east_opt(-3 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 17, 14, 42, 0)
        .unwrap();
    AnalysisResult {
        instrument: "GBP/JPY".to_string(),
        direction,
        confidence,
        pattern: "Doji".to_string(),
        reasoning: "Doji na resistência.".to_string(),
        timeframe: Timeframe::M1,
        mode: AnalysisMode::Automatic,
        analysis_timestamp: now,
        entry_timestamp: now,
        ai_used_label: "Análise Automática (Todas as IAs)".to_string(),
    }
}

fn with_image() -> UiState {
    reduce(UiState::default(), UiAction::ImageCaptured(chart()))
}

#[test]
fn test_rejected_file_keeps_previous_image() {
    let state = with_image();
    let state = reduce(
        state,
        UiAction::ImageRejected(CaptureError::NotAnImage {
            mime: "text/plain".to_string(),
        }),
    );

    assert_eq!(state.image, Some(chart()));
    assert_eq!(state.notice.as_deref(), Some(INVALID_IMAGE_MESSAGE));
}

#[test]
fn test_accepted_image_clears_notice() {
    let state = reduce(
        UiState::default(),
        UiAction::ImageRejected(CaptureError::NoImage),
    );
    let state = reduce(state, UiAction::ImageCaptured(chart()));
    assert!(state.notice.is_none());
}

#[test]
fn test_action_controls_follow_selection() {
    let empty = UiState::default();
    assert!(!empty.can_analyze(AnalysisMode::Automatic));

    let state = with_image();
    assert!(!state.can_analyze(AnalysisMode::Single));
    assert!(state.can_analyze(AnalysisMode::Automatic));
    assert!(state.can_analyze(AnalysisMode::Consensus));

    let state = reduce(state, UiAction::PresetSelected("pattern-ai".to_string()));
    assert!(state.can_analyze(AnalysisMode::Single));

    let state = reduce(state, UiAction::ImageRemoved);
    assert!(!state.can_analyze(AnalysisMode::Single));
}

#[test]
fn test_controls_disabled_while_analyzing() {
    let state = reduce(with_image(), UiAction::AnalysisStarted(AnalysisMode::Automatic));
    assert!(state.is_analyzing());
    assert!(!state.can_analyze(AnalysisMode::Automatic));
}

#[test]
fn test_status_messages_rotate() {
    let mut state = reduce(with_image(), UiAction::AnalysisStarted(AnalysisMode::Automatic));
    assert_eq!(state.status_message(), Some(STATUS_MESSAGES[0]));

    for expected in STATUS_MESSAGES.iter().skip(1) {
        state = reduce(state, UiAction::StatusTick);
        assert_eq!(state.status_message(), Some(*expected));
    }
    state = reduce(state, UiAction::StatusTick);
    assert_eq!(state.status_message(), Some(STATUS_MESSAGES[0]));
}

#[test]
fn test_tick_outside_analysis_is_ignored() {
    let state = reduce(with_image(), UiAction::StatusTick);
    assert_eq!(state.phase, Phase::Idle);
    assert!(state.status_message().is_none());
}

#[test]
fn test_last_response_wins() {
    let state = reduce(with_image(), UiAction::AnalysisStarted(AnalysisMode::Automatic));
    let state = reduce(state, UiAction::AnalysisSucceeded(result(Direction::Call, 90)));
    let state = reduce(state, UiAction::AnalysisSucceeded(result(Direction::Put, 81)));

    let view = state.result_view().unwrap();
    assert_eq!(view.direction, "PUT");
    assert_eq!(view.confidence, "81%");
}

#[test]
fn test_failure_keeps_image_for_manual_retry() {
    let state = reduce(with_image(), UiAction::AnalysisStarted(AnalysisMode::Automatic));
    let state = reduce(state, UiAction::AnalysisFailed("Tente novamente.".to_string()));

    assert_eq!(
        state.phase,
        Phase::Failed {
            message: "Tente novamente.".to_string()
        }
    );
    assert!(state.result_view().is_none());
    assert!(state.can_analyze(AnalysisMode::Automatic));
}

#[test]
fn test_build_request_snapshots_selections() {
    let state = with_image();
    let state = reduce(state, UiAction::PresetSelected("signal-master".to_string()));
    let state = reduce(state, UiAction::InstrumentSelected(Some("OIL".to_string())));
    let state = reduce(state, UiAction::TimeframeSelected(Timeframe::M5));

    let request = state.build_request(AnalysisMode::Single).unwrap();
    assert_eq!(request.selected_preset.as_deref(), Some("signal-master"));
    assert_eq!(request.instrument.as_deref(), Some("OIL"));
    assert_eq!(request.timeframe, Timeframe::M5);
    assert_eq!(request.image, chart());
}

#[test]
fn test_build_request_reports_what_is_missing() {
    assert_eq!(
        UiState::default().build_request(AnalysisMode::Automatic),
        Err(ValidationError::MissingImage)
    );
    assert_eq!(
        with_image().build_request(AnalysisMode::Single),
        Err(ValidationError::PresetRequired)
    );
}

#[test]
fn test_auto_detect_instrument_selection() {
    let state = reduce(with_image(), UiAction::InstrumentSelected(Some("GOLD".into())));
    let state = reduce(state, UiAction::InstrumentSelected(Some(String::new())));
    assert!(state.instrument.is_none());
}
