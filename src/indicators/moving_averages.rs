/**
* filename : moving_averages
* author : HAMA
* date: 2025. 11. 4.
* description:
**/

use std::collections::VecDeque;
use crate::error::TerminalError;
use crate::models::market_data::Bar;
use super::{not_ready, Indicator, IndicatorResult};

#[derive(Debug)]
pub struct SimpleMovingAverage {
  name: String,
  period: usize,
  values: VecDeque<f64>,
  sum: f64,
}

impl SimpleMovingAverage {
  pub fn new(period: usize) -> Self {
    SimpleMovingAverage {
      name: format!("SMA-{}", period),
      period,
      values: VecDeque::with_capacity(period),
      sum: 0.0,
    }
  }

  pub fn period(&self) -> usize {
    self.period
  }

  /// 종가 외의 값(예: MACD 라인)으로 업데이트
  pub fn push(&mut self, value: f64) {
    self.values.push_back(value);
    self.sum += value;

    // 오래된 값 제거 (필요시)
    if self.values.len() > self.period {
      if let Some(old_value) = self.values.pop_front() {
        self.sum -= old_value;
      }
    }
  }

  pub fn value(&self) -> Option<f64> {
    if self.is_ready() {
      Some(self.sum / self.values.len() as f64)
    } else {
      None
    }
  }
}

impl Indicator for SimpleMovingAverage {
  fn name(&self) -> &str {
    &self.name
  }

  fn update(&mut self, bar: &Bar) -> Result<(), TerminalError> {
    self.push(bar.close);
    Ok(())
  }

  fn calculate(&self) -> Result<IndicatorResult, TerminalError> {
    let value = self.value().ok_or_else(|| not_ready(&self.name))?;

    Ok(IndicatorResult {
      value,
      signals: vec![],
    })
  }

  fn is_ready(&self) -> bool {
    self.period > 0 && self.values.len() >= self.period
  }

  fn reset(&mut self) {
    self.values.clear();
    self.sum = 0.0;
  }
}

#[derive(Debug)]
pub struct ExponentialMovingAverage {
  name: String,
  period: usize,
  seed: Vec<f64>,
  current_ema: Option<f64>,
  alpha: f64,
}

impl ExponentialMovingAverage {
  pub fn new(period: usize) -> Self {
    let alpha = 2.0 / (period as f64 + 1.0);

    ExponentialMovingAverage {
      name: format!("EMA-{}", period),
      period,
      seed: Vec::with_capacity(period),
      current_ema: None,
      alpha,
    }
  }

  pub fn period(&self) -> usize {
    self.period
  }

  pub fn push(&mut self, value: f64) {
    match self.current_ema {
      // EMA 업데이트
      Some(prev_ema) => {
        self.current_ema = Some(value * self.alpha + prev_ema * (1.0 - self.alpha));
      }
      // EMA 초기화 (처음 period개의 값으로 SMA 계산)
      None => {
        self.seed.push(value);
        if self.seed.len() == self.period {
          let sma = self.seed.iter().sum::<f64>() / self.period as f64;
          self.current_ema = Some(sma);
          self.seed.clear();
        }
      }
    }
  }

  pub fn value(&self) -> Option<f64> {
    self.current_ema
  }
}

impl Indicator for ExponentialMovingAverage {
  fn name(&self) -> &str {
    &self.name
  }

  fn update(&mut self, bar: &Bar) -> Result<(), TerminalError> {
    self.push(bar.close);
    Ok(())
  }

  fn calculate(&self) -> Result<IndicatorResult, TerminalError> {
    let value = self.current_ema.ok_or_else(|| not_ready(&self.name))?;

    Ok(IndicatorResult {
      value,
      signals: vec![],
    })
  }

  fn is_ready(&self) -> bool {
    self.current_ema.is_some()
  }

  fn reset(&mut self) {
    self.seed.clear();
    self.current_ema = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sma_rolls_window() {
    let mut sma = SimpleMovingAverage::new(2);
    sma.push(1.0);
    assert!(sma.value().is_none());
    sma.push(3.0);
    assert_eq!(sma.value(), Some(2.0));
    sma.push(5.0);
    assert_eq!(sma.value(), Some(4.0));
  }

  #[test]
  fn test_ema_seeded_with_sma() {
    let mut ema = ExponentialMovingAverage::new(3);
    for v in [2.0, 4.0, 6.0] {
      ema.push(v);
    }
    assert_eq!(ema.value(), Some(4.0));

    // alpha = 0.5
    ema.push(8.0);
    assert_eq!(ema.value(), Some(6.0));
  }
}
