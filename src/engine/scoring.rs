/**
* filename : scoring
* author : HAMA
* date: 2025. 11. 6.
* description: 6팩터 100점 채점 (역추세 / 추세추종)
**/

use serde::{Deserialize, Serialize};

/// 필터 발동 시 점수 상한
pub const FILTER_SCORE_CAP: f64 = 29.0;
pub const TREND_WATERFALL_CAP: f64 = 40.0;

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// RSI 과매도 점수 (0~20)
pub fn score_rsi(rsi: f64) -> f64 {
    round1(((60.0 - rsi) * 0.5).clamp(0.0, 20.0))
}

/// MFI 수급 점수 (0~20)
pub fn score_mfi(mfi: f64) -> f64 {
    round1(((60.0 - mfi) * 0.5).clamp(0.0, 20.0))
}

/// 볼린저 하단 이탈 강도 (0~15)
pub fn score_bb(price: f64, bb_lower: f64) -> f64 {
    if bb_lower.is_nan() || bb_lower <= 0.0 {
        return 0.0;
    }
    let ratio = price / bb_lower;
    if ratio > 1.05 {
        return 0.0;
    }
    round1(((1.05 - ratio) * 300.0).clamp(0.0, 15.0))
}

/// MACD 방향 + 크기 (0~15)
pub fn score_macd(macd_diff: f64, macd_diff_pct: Option<f64>) -> f64 {
    if macd_diff <= 0.0 {
        return 0.0;
    }
    let bonus = match macd_diff_pct {
        Some(pct) if pct > 0.0 => (pct * 200.0).min(8.0),
        _ => (macd_diff.abs() * 5.0).min(8.0),
    };
    round1((7.0 + bonus).min(15.0))
}

/// 일목 구름 위치 (0~15). 데이터 없으면 중립 7.5
pub fn score_ichimoku(price: f64, span_a: Option<f64>, span_b: Option<f64>) -> f64 {
    let (a, b) = match (span_a, span_b) {
        (Some(a), Some(b)) => (a, b),
        _ => return 7.5,
    };
    let cloud_top = a.max(b);
    let cloud_bottom = a.min(b);

    let base: f64 = if price < cloud_bottom {
        12.0
    } else if price < cloud_top {
        6.0
    } else {
        0.0
    };
    // 상승 구름 배열
    let bonus: f64 = if a > b { 3.0 } else { 0.0 };
    round1((base + bonus).min(15.0))
}

/// VWAP 대비 괴리율 (0~15). 데이터 없으면 중립 7.5
pub fn score_vwap(price: f64, vwap: Option<f64>) -> f64 {
    let vwap = match vwap {
        Some(v) if v > 0.0 => v,
        _ => return 7.5,
    };
    let divergence = (vwap - price) / vwap;
    if divergence <= 0.0 {
        return 0.0;
    }
    round1((divergence * 300.0).min(15.0))
}

/// 채점 입력값
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreInputs {
    pub rsi: f64,
    pub mfi: f64,
    pub bb_lower: f64,
    pub bb_upper: f64,
    pub price: f64,
    pub macd_diff: f64,
    pub macd_diff_pct: Option<f64>,
    pub ichi_a: Option<f64>,
    pub ichi_b: Option<f64>,
    pub vwap: Option<f64>,
    pub is_waterfall: bool,
    pub is_rsi_hook_failed: bool,
}

/// 팩터별 역추세 점수
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub rsi: f64,
    pub mfi: f64,
    pub bb: f64,
    pub macd: f64,
    pub ichimoku: f64,
    pub vwap: f64,
}

impl ScoreBreakdown {
    pub fn from_inputs(inputs: &ScoreInputs) -> Self {
        ScoreBreakdown {
            rsi: score_rsi(inputs.rsi),
            mfi: score_mfi(inputs.mfi),
            bb: score_bb(inputs.price, inputs.bb_lower),
            macd: score_macd(inputs.macd_diff, inputs.macd_diff_pct),
            ichimoku: score_ichimoku(inputs.price, inputs.ichi_a, inputs.ichi_b),
            vwap: score_vwap(inputs.price, inputs.vwap),
        }
    }

    pub fn total(&self) -> f64 {
        self.rsi + self.mfi + self.bb + self.macd + self.ichimoku + self.vwap
    }
}

/// 역추세(저점매수) 총점
///
/// | 팩터 | 만점 |
/// |---|---|
/// | RSI | 20 |
/// | MFI | 20 |
/// | BB 하단 | 15 |
/// | MACD | 15 |
/// | 일목 | 15 |
/// | VWAP | 15 |
///
/// 폭포수 또는 RSI 훅 실패면 29점으로 상한.
pub fn calculate_sharp_score(inputs: &ScoreInputs) -> f64 {
    let total = ScoreBreakdown::from_inputs(inputs).total();
    let mut score = round1(total.clamp(0.0, 100.0));

    if inputs.is_waterfall {
        score = score.min(FILTER_SCORE_CAP);
    }
    if inputs.is_rsi_hook_failed {
        score = score.min(FILTER_SCORE_CAP);
    }
    score
}

/// 추세추종(돌파매매) 총점. 강한 모멘텀일수록 높다
pub fn calculate_trend_score(inputs: &ScoreInputs) -> f64 {
    let price = inputs.price;
    let mut score: f64 = 0.0;

    // RSI 50~75 비례, 75 초과 만점
    if (50.0..=75.0).contains(&inputs.rsi) {
        score += 20.0 * ((inputs.rsi - 50.0) / 25.0);
    } else if inputs.rsi > 75.0 {
        score += 20.0;
    }

    if inputs.mfi >= 50.0 {
        score += ((inputs.mfi - 50.0) * 0.8).min(20.0);
    }

    if inputs.bb_upper > 0.0 {
        let ratio = price / inputs.bb_upper;
        if ratio >= 0.98 {
            score += 15.0;
        } else {
            score += ((ratio - 0.90) * 150.0).max(0.0);
        }
    }

    if inputs.macd_diff > 0.0 {
        score += 15.0;
    }

    if let (Some(a), Some(b)) = (inputs.ichi_a, inputs.ichi_b) {
        let cloud_top = a.max(b);
        if a > 0.0 && b > 0.0 && price > cloud_top {
            score += 15.0;
            if a > b {
                score += 5.0;
            }
        }
    }

    if let Some(vwap) = inputs.vwap {
        if vwap > 0.0 && price > vwap {
            score += 15.0;
        }
    }

    let mut final_score = round1(score.min(100.0));
    // 역배열에서는 돌파 신뢰도 낮음
    if inputs.is_waterfall {
        final_score = final_score.min(TREND_WATERFALL_CAP);
    }
    final_score
}
