/**
* filename : indicator_engine
* author : HAMA
* date: 2025. 11. 6.
* description: 히스토리 -> 지표 시계열(차트용) + 최신값 스냅샷
**/

use serde::{Deserialize, Serialize};

use crate::error::TerminalError;
use crate::indicators::{
    AverageTrueRange, BollingerBands, Ichimoku, Indicator, MoneyFlowIndex, OnBalanceVolume,
    RelativeStrengthIndex, VolumeWeightedAveragePrice, MACD,
};
use crate::models::market_data::PriceHistory;

/// 최신 지표값
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub mfi: f64,
    pub macd_diff: f64,
    pub macd_diff_pct: f64,
    pub bb_lower: f64,
    pub bb_upper: f64,
    /// 계산 불가(봉 부족)면 None -> 채점 시 중립
    pub ichi_a: Option<f64>,
    pub ichi_b: Option<f64>,
    pub vwap: f64,
    pub atr: f64,
    pub obv: f64,
    pub current_price: f64,
}

/// 봉별 지표 시계열. 준비 전 구간은 대체값으로 채워진다
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    pub timestamps: Vec<i64>,
    pub close: Vec<f64>,
    pub rsi: Vec<f64>,
    pub mfi: Vec<f64>,
    pub bb_lower: Vec<f64>,
    pub bb_upper: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub macd_diff: Vec<f64>,
    pub ichi_a: Vec<f64>,
    pub ichi_b: Vec<f64>,
    pub vwap: Vec<f64>,
    pub obv: Vec<f64>,
    pub atr: Vec<f64>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    pub rsi_period: usize,
    pub mfi_period: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub macd_periods: (usize, usize, usize),
    pub ichimoku_periods: (usize, usize, usize),
    pub vwap_period: usize,
    pub atr_period: usize,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        IndicatorEngine {
            rsi_period: 14,
            mfi_period: 14,
            bb_period: 20,
            bb_std_dev: 2.0,
            macd_periods: (12, 26, 9),
            ichimoku_periods: (9, 26, 52),
            vwap_period: 20,
            atr_period: 14,
        }
    }
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute(
        &self,
        history: &PriceHistory,
        current_price: f64,
    ) -> Result<(IndicatorSnapshot, IndicatorFrame), TerminalError> {
        let last_bar = history.bars.last().copied().ok_or_else(|| {
            TerminalError::InsufficientData(format!("{}: empty price history", history.ticker))
        })?;

        let mut rsi = RelativeStrengthIndex::new(self.rsi_period, None, None);
        let mut mfi = MoneyFlowIndex::new(self.mfi_period);
        let mut bb = BollingerBands::new(self.bb_period, self.bb_std_dev);
        let (fast, slow, signal) = self.macd_periods;
        let mut macd = MACD::new(fast, slow, signal);
        let (conversion, base, span_b) = self.ichimoku_periods;
        let mut ichimoku = Ichimoku::new(conversion, base, span_b);
        let mut vwap = VolumeWeightedAveragePrice::new(self.vwap_period);
        let mut obv = OnBalanceVolume::new();
        let mut atr = AverageTrueRange::new(self.atr_period);

        // ATR 준비 전에는 마지막 봉의 고저폭
        let atr_fallback = last_bar.high - last_bar.low;

        let n = history.len();
        let mut frame = IndicatorFrame {
            timestamps: Vec::with_capacity(n),
            close: Vec::with_capacity(n),
            rsi: Vec::with_capacity(n),
            mfi: Vec::with_capacity(n),
            bb_lower: Vec::with_capacity(n),
            bb_upper: Vec::with_capacity(n),
            macd: Vec::with_capacity(n),
            macd_signal: Vec::with_capacity(n),
            macd_diff: Vec::with_capacity(n),
            ichi_a: Vec::with_capacity(n),
            ichi_b: Vec::with_capacity(n),
            vwap: Vec::with_capacity(n),
            obv: Vec::with_capacity(n),
            atr: Vec::with_capacity(n),
        };

        for (index, bar) in history.bars.iter().enumerate() {
            rsi.update(bar)?;
            mfi.update(bar)?;
            bb.update(bar)?;
            macd.update(bar)?;
            ichimoku.update(bar)?;
            vwap.update(bar)?;
            obv.update(bar)?;
            atr.update(bar)?;

            let midpoint = (bar.high + bar.low) / 2.0;

            frame.timestamps.push(bar.timestamp);
            frame.close.push(bar.close);
            frame.rsi.push(rsi.value().unwrap_or(50.0));
            frame.mfi.push(mfi.value().unwrap_or(50.0));
            frame.bb_lower.push(bb.lower().unwrap_or(bar.close));
            frame.bb_upper.push(bb.upper().unwrap_or(bar.close));
            frame.macd.push(macd.macd_line().unwrap_or(0.0));
            frame.macd_signal.push(macd.signal_line().unwrap_or(0.0));
            frame.macd_diff.push(macd.histogram().unwrap_or(0.0));
            frame.ichi_a.push(ichimoku.span_a().unwrap_or(midpoint));
            frame.ichi_b.push(ichimoku.span_b().unwrap_or(midpoint));
            frame.vwap.push(vwap.value().unwrap_or(bar.close));
            frame.obv.push(obv.value().unwrap_or(index as f64));
            frame.atr.push(atr.value().unwrap_or(atr_fallback));
        }

        let macd_diff = frame.macd_diff.last().copied().unwrap_or(0.0);
        let macd_diff_pct = if current_price > 0.0 {
            macd_diff.abs() / current_price * 100.0
        } else {
            0.0
        };

        let snapshot = IndicatorSnapshot {
            rsi: frame.rsi.last().copied().unwrap_or(50.0),
            mfi: frame.mfi.last().copied().unwrap_or(50.0),
            macd_diff,
            macd_diff_pct,
            bb_lower: frame.bb_lower.last().copied().unwrap_or(last_bar.close),
            bb_upper: frame.bb_upper.last().copied().unwrap_or(last_bar.close),
            ichi_a: ichimoku.span_a(),
            ichi_b: ichimoku.span_b(),
            vwap: frame.vwap.last().copied().unwrap_or(last_bar.close),
            atr: frame.atr.last().copied().unwrap_or(atr_fallback),
            obv: frame.obv.last().copied().unwrap_or(0.0),
            current_price,
        };

        Ok((snapshot, frame))
    }
}
