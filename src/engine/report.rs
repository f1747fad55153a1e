/**
* filename : report
* author : HAMA
* date: 2025. 11. 6.
* description: 지표별 해설 카드 + 종합 의견
**/

use serde::{Deserialize, Serialize};

use crate::engine::analyzer::{Action, Strategy};
use crate::engine::fundamentals::FundamentalsResult;
use crate::engine::indicator_engine::IndicatorSnapshot;
use crate::engine::scoring::{ScoreBreakdown, ScoreInputs};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailCard {
    pub title: String,
    pub full_comment: String,
}

impl DetailCard {
    fn new(title: &str, full_comment: impl Into<String>) -> Self {
        DetailCard {
            title: title.to_string(),
            full_comment: full_comment.into(),
        }
    }
}

pub struct ReportContext<'a> {
    pub snapshot: &'a IndicatorSnapshot,
    pub inputs: &'a ScoreInputs,
    pub strategy: Strategy,
    pub action: Action,
    pub fundamentals: Option<&'a FundamentalsResult>,
    pub stop_loss: f64,
}

fn rsi_zone(rsi: f64) -> &'static str {
    if rsi < 30.0 {
        "(과매도)"
    } else if rsi < 70.0 {
        "(정상)"
    } else {
        "(과매수)"
    }
}

fn mfi_zone(mfi: f64) -> &'static str {
    if mfi < 30.0 {
        "(약세)"
    } else if mfi < 70.0 {
        "(중립)"
    } else {
        "(강세)"
    }
}

fn briefing(ctx: &ReportContext) -> &'static str {
    match ctx.action {
        Action::Avoid => "장기 120일선이 꺾인 폭포수 차트입니다. 120일선을 재탈환하기 전까지는 매수를 금지합니다.",
        Action::Wait => "과매도 구간이지만 RSI가 아직 고개를 들지 못했습니다. 턴어라운드를 확인한 뒤 진입하십시오.",
        Action::Buy => "과매도 바닥에서 반전 신호가 겹쳤습니다. 분할 매수로 접근하십시오.",
        Action::Sell => "뚜렷한 과매도 신호도 상승 신호도 없습니다. 신규 진입을 피하십시오.",
        Action::Overheated => {
            "강한 상승세(RSI 과열)로 저점매수 타점이 아닙니다. 신규 진입 시 고점 물림에 주의하십시오."
        }
        Action::Hold => "방향성이 없는 혼조세입니다. 70점 이상의 확실한 타점을 기다리십시오.",
        Action::Fakeout => "단기 반등이 나왔으나 120일선은 하락 중입니다. 돌파 매매 실패 확률이 높습니다.",
        Action::StrongBuy => "RSI와 수급이 살아 있고 밴드 상단을 뚫는 모멘텀이 발생했습니다. 추세에 편승하십시오.",
        Action::NoTrend => "상승 모멘텀이 약하거나 횡보 중입니다. 돌파 매매를 시도하기에 에너지가 부족합니다.",
        Action::Watch => "상승 흐름은 있으나 시세 분출 전입니다. 거래량 실린 돌파를 기다리십시오.",
    }
}

fn score_breakdown(ctx: &ReportContext) -> String {
    let snap = ctx.snapshot;
    let price = ctx.inputs.price;

    match ctx.strategy {
        Strategy::MeanReversion => {
            let b = ScoreBreakdown::from_inputs(ctx.inputs);
            format!(
                "[역추세 총점 해부]\n\
                 RSI (과매도): +{} / 20\n\
                 MFI (세력 자금): +{} / 20\n\
                 BB (하단 지지): +{} / 15\n\
                 MACD (추세 크기): +{} / 15\n\
                 Ichimoku (구름): +{} / 15\n\
                 VWAP (수급): +{} / 15",
                b.rsi, b.mfi, b.bb, b.macd, b.ichimoku, b.vwap
            )
        }
        Strategy::Trend => {
            let mark = |ok: bool| if ok { "O" } else { "X" };
            let above_cloud = match (snap.ichi_a, snap.ichi_b) {
                (Some(a), Some(b)) => price > a.max(b),
                _ => false,
            };
            format!(
                "[추세추종 총점 해부]\n\
                 RSI 모멘텀(50~75): {}\n\
                 MFI 유입(50+): {}\n\
                 BB 상단 돌파: {}\n\
                 MACD 양수: {}\n\
                 구름 위 위치: {}\n\
                 VWAP 지지: {}",
                mark(snap.rsi >= 50.0),
                mark(snap.mfi >= 50.0),
                mark(price >= snap.bb_upper * 0.98),
                mark(snap.macd_diff > 0.0),
                mark(above_cloud),
                mark(price > snap.vwap)
            )
        }
    }
}

/// 지표 카드 목록. 마지막은 항상 종합 의견 카드
pub fn build_detail_cards(ctx: &ReportContext) -> Vec<DetailCard> {
    let snap = ctx.snapshot;
    let price = ctx.inputs.price;
    let mut cards = Vec::with_capacity(12);

    cards.push(DetailCard::new("RSI (엔진 온도)", format!("{:.1} {}", snap.rsi, rsi_zone(snap.rsi))));

    if ctx.strategy == Strategy::MeanReversion {
        cards.push(DetailCard::new(
            "RSI 턴어라운드 (Hook)",
            if ctx.inputs.is_rsi_hook_failed {
                "턴어라운드 실패 - RSI가 계속 하향 중 (떨어지는 칼날, 관망 필수)"
            } else {
                "턴어라운드 성공 또는 해당 없음"
            },
        ));
    }

    cards.push(DetailCard::new("MFI (자금 흐름)", format!("{:.1} {}", snap.mfi, mfi_zone(snap.mfi))));

    let band_position = if price <= snap.bb_lower {
        "하단 근처"
    } else if price >= snap.bb_upper {
        "상단 근처"
    } else {
        "중간권역"
    };
    cards.push(DetailCard::new("볼린저 밴드 (변동성)", format!("현재가 {}", band_position)));

    cards.push(DetailCard::new(
        "MACD (추세 신호)",
        if snap.macd_diff > 0.0 { "반전 신호 (+)" } else { "하락 지속 (-)" },
    ));

    let cloud = match (snap.ichi_a, snap.ichi_b) {
        (Some(a), Some(b)) if a > b => "클라우드: 상승 흐름",
        (Some(_), Some(_)) => "클라우드: 하락 흐름",
        _ => "클라우드: 데이터 부족 (중립)",
    };
    cards.push(DetailCard::new("일목균형표 (Ichimoku)", cloud));

    cards.push(DetailCard::new(
        "VWAP (거래량 가중)",
        if price > snap.vwap { "VWAP 상향 돌파" } else { "VWAP 하향 이탈" },
    ));

    cards.push(DetailCard::new(
        "장기 추세 (120일선)",
        if ctx.inputs.is_waterfall {
            "위험 - 폭포수 하락 중 (120일선 역배열)"
        } else {
            "안전 - 추세 지지 또는 상승 중"
        },
    ));

    cards.push(DetailCard::new(
        "ATR (동적 손절선)",
        format!("ATR={:.2} -> 손절선: {:.2}", snap.atr, ctx.stop_loss),
    ));

    if let Some(fund) = ctx.fundamentals {
        if fund.penalty > 0.0 || !fund.messages.is_empty() {
            cards.push(DetailCard::new("펀더멘털 검증", fund.messages.join(" / ")));
        }
    }

    let strategy_label = match ctx.strategy {
        Strategy::MeanReversion => "역추세(저점잡기)",
        Strategy::Trend => "추세추종(돌파매매)",
    };
    let mut opinion = format!(
        "전략 모드: {}\n\n{}\n\n{}",
        strategy_label,
        ctx.action.label(),
        score_breakdown(ctx)
    );

    if let Some(fund) = ctx.fundamentals {
        if fund.penalty > 0.0 {
            opinion.push_str(&format!("\n재무 리스크: -{}점 감점", fund.penalty));
        }
    }
    if ctx.inputs.is_waterfall {
        opinion.push_str("\n폭포수 필터: 장기 120일선 역배열");
    }
    if ctx.inputs.is_rsi_hook_failed {
        opinion.push_str("\nRSI Hook 필터: 턴어라운드 실패");
    }
    if price > 0.0 {
        let pct = ((ctx.stop_loss - price) / price * 100.0).abs();
        opinion.push_str(&format!("\nATR 동적 손절선: {:.2} ({:.1}% below)", ctx.stop_loss, pct));
    }
    opinion.push_str(&format!("\n\n{}", briefing(ctx)));

    cards.push(DetailCard::new("실시간 종합 의견", opinion));
    cards
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: 25.0,
            mfi: 20.0,
            macd_diff: 0.4,
            macd_diff_pct: 0.4,
            bb_lower: 98.0,
            bb_upper: 120.0,
            ichi_a: Some(110.0),
            ichi_b: Some(105.0),
            vwap: 104.0,
            atr: 2.5,
            obv: 1000.0,
            current_price: 97.0,
        }
    }

    fn inputs(snap: &IndicatorSnapshot) -> ScoreInputs {
        ScoreInputs {
            rsi: snap.rsi,
            mfi: snap.mfi,
            bb_lower: snap.bb_lower,
            bb_upper: snap.bb_upper,
            price: snap.current_price,
            macd_diff: snap.macd_diff,
            macd_diff_pct: Some(snap.macd_diff_pct),
            ichi_a: snap.ichi_a,
            ichi_b: snap.ichi_b,
            vwap: Some(snap.vwap),
            is_waterfall: false,
            is_rsi_hook_failed: false,
        }
    }

    #[test]
    fn test_mean_reversion_cards() {
        let snap = snapshot();
        let inputs = inputs(&snap);
        let cards = build_detail_cards(&ReportContext {
            snapshot: &snap,
            inputs: &inputs,
            strategy: Strategy::MeanReversion,
            action: Action::Buy,
            fundamentals: None,
            stop_loss: 92.0,
        });

        assert_eq!(cards.len(), 10);
        assert_eq!(cards[0].full_comment, "25.0 (과매도)");
        assert!(cards.iter().any(|c| c.title.contains("Hook")));
        let last = cards.last().unwrap();
        assert!(last.full_comment.contains("[적극 매수 (BUY)]"));
        assert!(last.full_comment.contains("역추세 총점 해부"));
    }

    #[test]
    fn test_fundamentals_card_and_trend_mode() {
        let snap = snapshot();
        let inputs = inputs(&snap);
        let fund = FundamentalsResult {
            penalty: 20.0,
            messages: vec!["지속 적자 (EPS<0) - -20점".to_string()],
            is_exempt: false,
        };
        let cards = build_detail_cards(&ReportContext {
            snapshot: &snap,
            inputs: &inputs,
            strategy: Strategy::Trend,
            action: Action::Watch,
            fundamentals: Some(&fund),
            stop_loss: 92.0,
        });

        assert!(!cards.iter().any(|c| c.title.contains("Hook")));
        assert!(cards.iter().any(|c| c.title == "펀더멘털 검증"));
        let last = cards.last().unwrap();
        assert!(last.full_comment.contains("-20점 감점"));
        assert!(last.full_comment.contains("[추세 관찰 (Watch)]"));
        assert!(last.full_comment.contains("거래량 실린 돌파"));
    }

    #[test]
    fn test_overheated_briefing() {
        let mut snap = snapshot();
        snap.rsi = 72.0;
        let inputs = inputs(&snap);
        let cards = build_detail_cards(&ReportContext {
            snapshot: &snap,
            inputs: &inputs,
            strategy: Strategy::MeanReversion,
            action: Action::Overheated,
            fundamentals: None,
            stop_loss: 92.0,
        });

        let last = cards.last().unwrap();
        assert!(last.full_comment.contains("[과열 경고 (Overheated)]"));
        assert!(last.full_comment.contains("고점 물림"));
    }
}
