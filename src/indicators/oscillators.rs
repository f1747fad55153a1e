/**
* filename : oscillators
* author : HAMA
* date: 2025. 11. 4.
* description:
**/

use std::collections::VecDeque;
use crate::error::TerminalError;
use crate::models::market_data::Bar;
use super::{not_ready, Indicator, IndicatorResult, IndicatorSignal};

#[derive(Debug)]
pub struct RelativeStrengthIndex {
  name: String,
  period: usize,
  gains: Vec<f64>,
  losses: Vec<f64>,
  avg_gain: Option<f64>,
  avg_loss: Option<f64>,
  prev_price: Option<f64>,
  overbought_threshold: f64,
  oversold_threshold: f64,
}

impl RelativeStrengthIndex {
  pub fn new(period: usize, overbought: Option<f64>, oversold: Option<f64>) -> Self {
    RelativeStrengthIndex {
      name: format!("RSI-{}", period),
      period,
      gains: Vec::with_capacity(period),
      losses: Vec::with_capacity(period),
      avg_gain: None,
      avg_loss: None,
      prev_price: None,
      overbought_threshold: overbought.unwrap_or(70.0),
      oversold_threshold: oversold.unwrap_or(30.0),
    }
  }

  pub fn period(&self) -> usize {
    self.period
  }

  pub fn value(&self) -> Option<f64> {
    let (avg_gain, avg_loss) = (self.avg_gain?, self.avg_loss?);

    // 하락폭 평균이 0이면 최대값
    if avg_loss == 0.0 {
      return Some(100.0);
    }

    // RSI = 100 - (100 / (1 + RS))
    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
  }
}

impl Indicator for RelativeStrengthIndex {
  fn name(&self) -> &str {
    &self.name
  }

  fn update(&mut self, bar: &Bar) -> Result<(), TerminalError> {
    let price = bar.close;

    // 이전 가격과 비교하여 gain/loss 계산
    if let Some(prev_price) = self.prev_price {
      let change = price - prev_price;

      let gain = if change > 0.0 { change } else { 0.0 };
      let loss = if change < 0.0 { -change } else { 0.0 };

      match (self.avg_gain, self.avg_loss) {
        // 평균 업데이트 (Wilder의 스무딩 방법)
        (Some(prev_avg_gain), Some(prev_avg_loss)) => {
          let n = self.period as f64;
          self.avg_gain = Some((prev_avg_gain * (n - 1.0) + gain) / n);
          self.avg_loss = Some((prev_avg_loss * (n - 1.0) + loss) / n);
        }
        // 초기 평균 계산
        _ => {
          self.gains.push(gain);
          self.losses.push(loss);

          if self.gains.len() == self.period {
            let total_gain: f64 = self.gains.iter().sum();
            let total_loss: f64 = self.losses.iter().sum();

            self.avg_gain = Some(total_gain / self.period as f64);
            self.avg_loss = Some(total_loss / self.period as f64);
            self.gains.clear();
            self.losses.clear();
          }
        }
      }
    }

    self.prev_price = Some(price);

    Ok(())
  }

  fn calculate(&self) -> Result<IndicatorResult, TerminalError> {
    let rsi = self.value().ok_or_else(|| not_ready(&self.name))?;

    let mut signals = Vec::new();

    // 과매수 영역 - 매도 신호
    if rsi > self.overbought_threshold {
      let strength = -0.5 - (rsi - self.overbought_threshold) / 60.0; // -0.5 ~ -1.0
      signals.push(IndicatorSignal {
        name: "RSI Overbought".to_string(),
        strength,
        message: format!("RSI is overbought at {:.2}", rsi),
      });
    }
    // 과매도 영역 - 매수 신호
    else if rsi < self.oversold_threshold {
      let strength = 0.5 + (self.oversold_threshold - rsi) / 60.0; // 0.5 ~ 1.0
      signals.push(IndicatorSignal {
        name: "RSI Oversold".to_string(),
        strength,
        message: format!("RSI is oversold at {:.2}", rsi),
      });
    }

    Ok(IndicatorResult {
      value: rsi,
      signals,
    })
  }

  fn is_ready(&self) -> bool {
    self.avg_gain.is_some() && self.avg_loss.is_some()
  }

  fn reset(&mut self) {
    self.gains.clear();
    self.losses.clear();
    self.avg_gain = None;
    self.avg_loss = None;
    self.prev_price = None;
  }
}

/// Money Flow Index (거래량 가중 RSI)
#[derive(Debug)]
pub struct MoneyFlowIndex {
  name: String,
  period: usize,
  positive_flows: VecDeque<f64>,
  negative_flows: VecDeque<f64>,
  prev_typical: Option<f64>,
}

impl MoneyFlowIndex {
  pub fn new(period: usize) -> Self {
    MoneyFlowIndex {
      name: format!("MFI-{}", period),
      period,
      positive_flows: VecDeque::with_capacity(period),
      negative_flows: VecDeque::with_capacity(period),
      prev_typical: None,
    }
  }

  pub fn value(&self) -> Option<f64> {
    if !self.is_ready() {
      return None;
    }

    let positive: f64 = self.positive_flows.iter().sum();
    let negative: f64 = self.negative_flows.iter().sum();

    // 자금 흐름이 전혀 없으면 중립
    if positive + negative == 0.0 {
      return Some(50.0);
    }

    Some(100.0 * positive / (positive + negative))
  }
}

impl Indicator for MoneyFlowIndex {
  fn name(&self) -> &str {
    &self.name
  }

  fn update(&mut self, bar: &Bar) -> Result<(), TerminalError> {
    let typical = bar.typical_price();

    if let Some(prev_typical) = self.prev_typical {
      let raw_flow = typical * bar.volume;
      let (positive, negative) = if typical > prev_typical {
        (raw_flow, 0.0)
      } else if typical < prev_typical {
        (0.0, raw_flow)
      } else {
        (0.0, 0.0)
      };

      self.positive_flows.push_back(positive);
      self.negative_flows.push_back(negative);

      if self.positive_flows.len() > self.period {
        self.positive_flows.pop_front();
        self.negative_flows.pop_front();
      }
    }

    self.prev_typical = Some(typical);

    Ok(())
  }

  fn calculate(&self) -> Result<IndicatorResult, TerminalError> {
    let mfi = self.value().ok_or_else(|| not_ready(&self.name))?;

    let mut signals = Vec::new();

    if mfi > 80.0 {
      signals.push(IndicatorSignal {
        name: "MFI Overheated".to_string(),
        strength: -0.5,
        message: format!("Money flow is overheated at {:.2}", mfi),
      });
    } else if mfi < 20.0 {
      signals.push(IndicatorSignal {
        name: "MFI Inflow Exhausted".to_string(),
        strength: 0.5,
        message: format!("Money flow is exhausted at {:.2}", mfi),
      });
    }

    Ok(IndicatorResult {
      value: mfi,
      signals,
    })
  }

  fn is_ready(&self) -> bool {
    self.positive_flows.len() >= self.period
  }

  fn reset(&mut self) {
    self.positive_flows.clear();
    self.negative_flows.clear();
    self.prev_typical = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn close_bar(i: i64, close: f64) -> Bar {
    Bar::new(i, close, close, close, close, 1000.0)
  }

  #[test]
  fn test_rsi_all_gains_is_100() {
    let mut rsi = RelativeStrengthIndex::new(14, None, None);
    for i in 0..20 {
      rsi.update(&close_bar(i, 100.0 + i as f64)).unwrap();
    }
    assert_eq!(rsi.value(), Some(100.0));
    assert!(rsi.calculate().unwrap().signals.iter().any(|s| s.name == "RSI Overbought"));
  }

  #[test]
  fn test_rsi_warmup_needs_period_changes() {
    let mut rsi = RelativeStrengthIndex::new(14, None, None);
    for i in 0..14 {
      rsi.update(&close_bar(i, 100.0 - i as f64)).unwrap();
    }
    // 14개 가격 = 13개 변화량
    assert!(!rsi.is_ready());
    rsi.update(&close_bar(14, 80.0)).unwrap();
    assert_eq!(rsi.value(), Some(0.0));
  }

  #[test]
  fn test_rsi_balanced_is_50() {
    let mut rsi = RelativeStrengthIndex::new(2, None, None);
    for (i, price) in [10.0, 11.0, 10.0].iter().enumerate() {
      rsi.update(&close_bar(i as i64, *price)).unwrap();
    }
    assert!((rsi.value().unwrap() - 50.0).abs() < 1e-9);
  }

  #[test]
  fn test_mfi_rising_prices_is_100() {
    let mut mfi = MoneyFlowIndex::new(14);
    for i in 0..16 {
      mfi.update(&close_bar(i, 50.0 + i as f64)).unwrap();
    }
    assert_eq!(mfi.value(), Some(100.0));
  }

  #[test]
  fn test_mfi_flat_prices_is_neutral() {
    let mut mfi = MoneyFlowIndex::new(3);
    for i in 0..5 {
      mfi.update(&close_bar(i, 50.0)).unwrap();
    }
    assert_eq!(mfi.value(), Some(50.0));
  }
}
