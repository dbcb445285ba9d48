//! Command-line front-end
//!
//! Loads a chart screenshot, drives the UI store through one analysis and
//! prints the result the way the web front-end lays it out.

use chartcall::capture::{self, CandidateFile, CaptureInput, InputChannel};
use chartcall::catalog::{self, MarketSession};
use chartcall::config::{ProviderKind, Settings};
use chartcall::logging;
use chartcall::models::{AnalysisMode, Timeframe};
use chartcall::providers::{
    EndpointProvider, GeminiProvider, MockProvider, OpenRouterProvider, VisionProvider,
};
use chartcall::services::AnalysisService;
use chartcall::store::{reduce, UiAction, UiState, STATUS_TICK};
use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Parser)]
#[command(name = "analyze", about = "Get a CALL/PUT call for a trading chart screenshot")]
struct Args {
    /// Chart screenshot (png, jpg, gif, webp, bmp)
    #[arg(required_unless_present = "list")]
    image: Option<PathBuf>,

    /// single, automatic or consensus
    #[arg(long, default_value = "automatic")]
    mode: AnalysisMode,

    /// Preset id, required for single mode (see --list)
    #[arg(long)]
    preset: Option<String>,

    /// Instrument symbol; detected by the model when omitted
    #[arg(long)]
    instrument: Option<String>,

    #[arg(long, default_value = "M1")]
    timeframe: Timeframe,

    /// gemini, openrouter or mock; defaults to ANALYSIS_PROVIDER
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Post to a forwarding endpoint instead of calling a provider directly
    #[arg(long, conflicts_with = "provider")]
    endpoint: Option<Url>,

    /// Print presets and instruments and exit
    #[arg(long)]
    list: bool,
}

fn print_catalog() {
    println!("Presets:");
    for preset in catalog::presets() {
        println!(
            "  {:<18} {} ({}) - {}",
            preset.id, preset.display_name, preset.advertised_accuracy, preset.specialty
        );
    }
    for (label, session) in [("Open market", MarketSession::Open), ("OTC", MarketSession::Otc)] {
        println!("{}: {}", label, catalog::instruments(session).join(", "));
    }
}

fn build_provider(args: &Args, settings: &Settings) -> Arc<dyn VisionProvider> {
    if let Some(url) = &args.endpoint {
        return Arc::new(EndpointProvider::new(url.clone()));
    }
    match args.provider.unwrap_or(settings.default_provider) {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(settings.gemini.clone())),
        ProviderKind::OpenRouter => Arc::new(OpenRouterProvider::new(settings.openrouter.clone())),
        ProviderKind::Mock => Arc::new(MockProvider::new()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();
    let args = Args::parse();

    if args.list {
        print_catalog();
        return Ok(());
    }

    let settings = Settings::from_env()?;
    let provider = build_provider(&args, &settings);
    let mut state = UiState::default();

    let Some(path) = &args.image else {
        return Ok(());
    };
    let bytes = tokio::fs::read(path).await?;
    let mime = capture::mime_from_path(path).unwrap_or("application/octet-stream");
    let captured = capture::capture(CaptureInput {
        channel: InputChannel::FilePicker,
        files: vec![CandidateFile::new(mime, bytes)],
    });
    state = match captured {
        Ok(image) => reduce(state, UiAction::ImageCaptured(image)),
        Err(e) => reduce(state, UiAction::ImageRejected(e)),
    };
    if let Some(notice) = &state.notice {
        eprintln!("{}", notice);
        std::process::exit(1);
    }

    if let Some(preset) = args.preset.clone() {
        state = reduce(state, UiAction::PresetSelected(preset));
    }
    state = reduce(state, UiAction::InstrumentSelected(args.instrument.clone()));
    state = reduce(state, UiAction::TimeframeSelected(args.timeframe));

    let request = state.build_request(args.mode)?;
    let service = AnalysisService::new(provider);

    state = reduce(state, UiAction::AnalysisStarted(args.mode));
    if let Some(message) = state.status_message() {
        println!("{}", message);
    }

    let analysis = service.run(&request);
    tokio::pin!(analysis);
    let mut ticker = tokio::time::interval(STATUS_TICK);
    ticker.tick().await;

    let outcome = loop {
        tokio::select! {
            outcome = &mut analysis => break outcome,
            _ = ticker.tick() => {
                state = reduce(state, UiAction::StatusTick);
                if let Some(message) = state.status_message() {
                    println!("{}", message);
                }
            }
        }
    };

    match outcome {
        Ok(result) => {
            state = reduce(state, UiAction::AnalysisSucceeded(result));
            if let Some(view) = state.result_view() {
                println!("Resultado da Análise:");
                println!("{}", view);
            }
            Ok(())
        }
        Err(e) => {
            let message = e.user_message();
            eprintln!("{}", message);
            state = reduce(state, UiAction::AnalysisFailed(message));
            tracing::debug!(phase = ?state.phase, "Analysis ended in failure");
            std::process::exit(1);
        }
    }
}
