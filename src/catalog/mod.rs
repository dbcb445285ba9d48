//! Static reference data: AI presets, tradeable instruments and the canned
//! results served by the offline provider.

use serde::Serialize;

use crate::models::Direction;

/// Labeled analysis framing offered to the user. Carries no inference logic;
/// the specialty only shapes the prompt sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AIPreset {
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub specialty: &'static str,
    pub advertised_accuracy: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSession {
    /// Regular market hours.
    Open,
    /// Over-the-counter, broker-synthesized symbols.
    Otc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MockAnalysis {
    pub pattern: &'static str,
    pub direction: Direction,
    pub confidence: i64,
    pub reasoning: &'static str,
}

static PRESETS: [AIPreset; 10] = [
    AIPreset {
        id: "tradingview-ai",
        display_name: "TradingView AI Pro",
        description: "Análise técnica avançada com padrões",
        specialty: "Padrões de candlestick",
        advertised_accuracy: "94%",
    },
    AIPreset {
        id: "chartgpt",
        display_name: "ChartGPT Analysis",
        description: "IA conversacional para gráficos",
        specialty: "Análise fundamentalista",
        advertised_accuracy: "92%",
    },
    AIPreset {
        id: "binary-vision",
        display_name: "Binary Vision AI",
        description: "Especialista em opções binárias",
        specialty: "Opções binárias",
        advertised_accuracy: "96%",
    },
    AIPreset {
        id: "trendspider",
        display_name: "TrendSpider Bot",
        description: "Detecção automática de tendências",
        specialty: "Linhas de tendência",
        advertised_accuracy: "91%",
    },
    AIPreset {
        id: "pattern-ai",
        display_name: "Chart Pattern AI",
        description: "Reconhecimento de padrões",
        specialty: "Padrões gráficos",
        advertised_accuracy: "95%",
    },
    AIPreset {
        id: "signal-master",
        display_name: "Signal Master Pro",
        description: "Sinais de entrada precisos",
        specialty: "Sinais de entrada",
        advertised_accuracy: "93%",
    },
    AIPreset {
        id: "technical-ai",
        display_name: "Technical Analysis AI",
        description: "Análise técnica completa",
        specialty: "Indicadores técnicos",
        advertised_accuracy: "90%",
    },
    AIPreset {
        id: "market-genius",
        display_name: "Market Genius Bot",
        description: "Inteligência de mercado",
        specialty: "Análise de mercado",
        advertised_accuracy: "94%",
    },
    AIPreset {
        id: "binary-predictor",
        display_name: "Binary Predictor AI",
        description: "Predição para binários",
        specialty: "Predições binárias",
        advertised_accuracy: "97%",
    },
    AIPreset {
        id: "advanced-chart",
        display_name: "Advanced Chart AI",
        description: "Análise avançada de gráficos",
        specialty: "Análise multi-timeframe",
        advertised_accuracy: "95%",
    },
];

static OPEN_MARKET: [&str; 18] = [
    "EUR/USD", "GBP/USD", "USD/JPY", "USD/CHF", "AUD/USD", "USD/CAD", "NZD/USD", "EUR/GBP",
    "EUR/JPY", "GBP/JPY", "BITCOIN", "ETHEREUM", "GOLD", "SILVER", "OIL", "NASDAQ", "S&P500",
    "DOW JONES",
];

static OTC: [&str; 8] = [
    "EUR/USD (OTC)",
    "GBP/USD (OTC)",
    "USD/JPY (OTC)",
    "BTC/USD (OTC)",
    "ETH/USD (OTC)",
    "Amazon (OTC)",
    "Apple (OTC)",
    "DYDX (OTC)",
];

static MOCK_RESULTS: [MockAnalysis; 5] = [
    MockAnalysis {
        pattern: "Hammer",
        direction: Direction::Call,
        confidence: 92,
        reasoning: "Padrão de martelo formado no suporte, indicando reversão de alta. Volume confirmatório presente com rompimento da média móvel de 20 períodos. RSI saindo da zona de sobrevenda, confirmando força compradora.",
    },
    MockAnalysis {
        pattern: "Shooting Star",
        direction: Direction::Put,
        confidence: 87,
        reasoning: "Estrela cadente na resistência com divergência no RSI, forte sinal de reversão baixista. Rejeitada na região de Fibonacci 61.8%, com volume aumentando nas vendas.",
    },
    MockAnalysis {
        pattern: "Doji",
        direction: Direction::Put,
        confidence: 89,
        reasoning: "Doji gravestone na zona de resistência, mercado indeciso com viés baixista. Confluência com linha de tendência descendente e topo duplo formado.",
    },
    MockAnalysis {
        pattern: "Engulfing Bullish",
        direction: Direction::Call,
        confidence: 94,
        reasoning: "Padrão de engolfo de alta no suporte dinâmico, indicando forte pressão compradora. Breakout confirmado com aumento significativo do volume.",
    },
    MockAnalysis {
        pattern: "Three Black Crows",
        direction: Direction::Put,
        confidence: 91,
        reasoning: "Formação de três corvos pretos após topo de alta, sinal de reversão baixista confirmado. MACD com divergência negativa e Estocástico em zona de sobrevenda.",
    },
];

pub fn presets() -> &'static [AIPreset] {
    &PRESETS
}

pub fn find_preset(id: &str) -> Option<&'static AIPreset> {
    PRESETS.iter().find(|preset| preset.id == id)
}

pub fn instruments(session: MarketSession) -> &'static [&'static str] {
    match session {
        MarketSession::Open => &OPEN_MARKET,
        MarketSession::Otc => &OTC,
    }
}

/// Every instrument with the session it trades in, open market first.
pub fn all_instruments() -> impl Iterator<Item = (MarketSession, &'static str)> {
    OPEN_MARKET
        .iter()
        .map(|symbol| (MarketSession::Open, *symbol))
        .chain(OTC.iter().map(|symbol| (MarketSession::Otc, *symbol)))
}

pub fn is_known_instrument(symbol: &str) -> bool {
    all_instruments().any(|(_, known)| known == symbol)
}

pub fn mock_results() -> &'static [MockAnalysis] {
    &MOCK_RESULTS
}
