use serde::{Deserialize, Serialize};

/// 일봉 하나 (OHLCV)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }
}

/// 종목의 시계열 (시간 오름차순)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceHistory {
    pub ticker: String,
    pub bars: Vec<Bar>,
}

impl PriceHistory {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Self {
        PriceHistory {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// 직전 거래일 종가 (1개뿐이면 마지막 종가)
    pub fn previous_close(&self) -> Option<f64> {
        match self.bars.len() {
            0 => None,
            1 => self.last_close(),
            n => Some(self.bars[n - 2].close),
        }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// 한국 거래소 종목 여부 (.KS / .KQ)
pub fn is_korean_ticker(ticker: &str) -> bool {
    let upper = ticker.to_uppercase();
    upper.ends_with(".KS") || upper.ends_with(".KQ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_close() {
        let bars = vec![
            Bar::new(1, 10.0, 11.0, 9.0, 10.0, 100.0),
            Bar::new(2, 10.0, 12.0, 9.5, 11.0, 100.0),
        ];
        let history = PriceHistory::new("AAPL", bars);
        assert_eq!(history.previous_close(), Some(10.0));
        assert_eq!(history.last_close(), Some(11.0));
    }

    #[test]
    fn test_korean_ticker() {
        assert!(is_korean_ticker("005930.KS"));
        assert!(is_korean_ticker("229200.kq"));
        assert!(!is_korean_ticker("BTC-USD"));
    }
}
