//! Prompt text sent alongside the chart image.

use crate::catalog::AIPreset;

const RESPONSE_SHAPE: &str = r#"{
  "asset": "Ativo detectado (ex: EUR/USD, BTC/USD, Ativo Desconhecido)",
  "direction": "CALL" | "PUT" | "NEUTRAL",
  "confidence": "Número de 0 a 100",
  "reasoning": "Explicação técnica detalhada, em português",
  "pattern": "Padrão de candlestick identificado (ex: Martelo, Doji, Nenhum)"
}"#;

fn specialty_focus(preset: Option<&AIPreset>) -> String {
    preset
        .map(|preset| {
            format!(
                "Foque sua análise na especialidade de \"{}\".",
                preset.specialty
            )
        })
        .unwrap_or_default()
}

/// Portuguese instructions for the generative vision model.
pub fn portuguese(preset: Option<&AIPreset>) -> String {
    format!(
        "Analise esta imagem de um gráfico de negociação para uma operação de curtíssimo prazo (1 a 5 minutos). {focus}\n\
         1. Identifique o ativo principal e o timeframe, se visíveis.\n\
         2. Avalie a estrutura do preço: suportes, resistências e linhas de tendência.\n\
         3. Aponte padrões de candlestick relevantes (Martelo, Estrela Cadente, Engolfo, Doji, Pin Bar).\n\
         4. Leia os indicadores técnicos visíveis (médias móveis, RSI, MACD, Bandas de Bollinger).\n\n\
         Com base apenas nessa leitura visual, escolha a direção mais provável: \"CALL\" para qualquer \
         indicação razoável de alta, \"PUT\" para qualquer indicação razoável de baixa e \"NEUTRAL\" \
         somente se não houver sinal discernível. Informe a confiança (0-100) e explique o raciocínio.\n\n\
         Responda APENAS com este JSON, em português:\n{shape}",
        focus = specialty_focus(preset),
        shape = RESPONSE_SHAPE,
    )
}

/// English instructions for the chat-completions provider. The reply itself
/// is still requested in Portuguese so both providers read the same.
pub fn english(preset: Option<&AIPreset>) -> String {
    format!(
        "Analyze this trading chart screenshot for a very short-term trade (1 to 5 minutes). {focus}\n\
         1. Identify the main asset and the timeframe if they are visible.\n\
         2. Assess price structure: support, resistance and trend lines.\n\
         3. Name any prominent candlestick pattern (Hammer, Shooting Star, Engulfing, Doji, Pin Bar).\n\
         4. Read any visible indicators (moving averages, RSI, MACD, Bollinger Bands).\n\n\
         Based only on this visual reading, pick the most likely direction: \"CALL\" for any reasonable \
         bullish indication, \"PUT\" for any reasonable bearish indication, \"NEUTRAL\" only when no \
         signal can be discerned. Give a confidence from 0 to 100 and explain your reasoning.\n\n\
         Reply ONLY with this JSON, with the text fields written in Portuguese:\n{shape}",
        focus = specialty_focus(preset),
        shape = RESPONSE_SHAPE,
    )
}
