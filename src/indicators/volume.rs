/**
* filename : volume
* author : HAMA
* date: 2025. 11. 4.
* description:
**/

use std::collections::VecDeque;
use crate::error::TerminalError;
use crate::models::market_data::Bar;
use super::{not_ready, Indicator, IndicatorResult, IndicatorSignal};

#[derive(Debug)]
pub struct VolumeWeightedAveragePrice {
  name: String,
  period: usize,
  prices: VecDeque<f64>,
  volumes: VecDeque<f64>,
  price_volume_products: VecDeque<f64>,
  last_close: Option<f64>,
}

impl VolumeWeightedAveragePrice {
  pub fn new(period: usize) -> Self {
    VolumeWeightedAveragePrice {
      name: format!("VWAP-{}", period),
      period,
      prices: VecDeque::with_capacity(period),
      volumes: VecDeque::with_capacity(period),
      price_volume_products: VecDeque::with_capacity(period),
      last_close: None,
    }
  }

  pub fn value(&self) -> Option<f64> {
    if !self.is_ready() {
      return None;
    }
    let total_volume: f64 = self.volumes.iter().sum();
    if total_volume == 0.0 {
      return None;
    }
    let total_price_volume: f64 = self.price_volume_products.iter().sum();
    Some(total_price_volume / total_volume)
  }
}

impl Indicator for VolumeWeightedAveragePrice {
  fn name(&self) -> &str {
    &self.name
  }

  fn update(&mut self, bar: &Bar) -> Result<(), TerminalError> {
    // 대표가격 (고가 + 저가 + 종가) / 3 기준
    let price = bar.typical_price();

    self.prices.push_back(price);
    self.volumes.push_back(bar.volume);
    self.price_volume_products.push_back(price * bar.volume);
    self.last_close = Some(bar.close);

    // 오래된 데이터 제거
    if self.prices.len() > self.period {
      self.prices.pop_front();
      self.volumes.pop_front();
      self.price_volume_products.pop_front();
    }

    Ok(())
  }

  fn calculate(&self) -> Result<IndicatorResult, TerminalError> {
    if !self.is_ready() {
      return Err(not_ready(&self.name));
    }

    let vwap = self
      .value()
      .ok_or_else(|| TerminalError::Analysis("Total volume is zero".to_string()))?;

    // 마지막 종가와 VWAP 비교
    let mut signals = Vec::new();

    if let Some(last_price) = self.last_close {
      // 가격이 VWAP보다 높음 (약한 매수 신호)
      if last_price > vwap {
        let ratio = last_price / vwap;
        let strength = 0.2 + ((ratio - 1.0) * 2.0).min(0.3); // 0.2 ~ 0.5

        signals.push(IndicatorSignal {
          name: "Price Above VWAP".to_string(),
          strength,
          message: format!("Price is {:.2}% above VWAP", (ratio - 1.0) * 100.0),
        });
      }
      // 가격이 VWAP보다 낮음 (약한 매도 신호)
      else if last_price < vwap {
        let ratio = vwap / last_price;
        let strength = -0.2 - ((ratio - 1.0) * 2.0).min(0.3); // -0.2 ~ -0.5

        signals.push(IndicatorSignal {
          name: "Price Below VWAP".to_string(),
          strength,
          message: format!("Price is {:.2}% below VWAP", (ratio - 1.0) * 100.0),
        });
      }
    }

    Ok(IndicatorResult {
      value: vwap,
      signals,
    })
  }

  fn is_ready(&self) -> bool {
    self.period > 0 && self.prices.len() >= self.period
  }

  fn reset(&mut self) {
    self.prices.clear();
    self.volumes.clear();
    self.price_volume_products.clear();
    self.last_close = None;
  }
}

/// On-Balance Volume
#[derive(Debug)]
pub struct OnBalanceVolume {
  name: String,
  obv: Option<f64>,
  prev_close: Option<f64>,
}

impl OnBalanceVolume {
  pub fn new() -> Self {
    OnBalanceVolume {
      name: "OBV".to_string(),
      obv: None,
      prev_close: None,
    }
  }

  pub fn value(&self) -> Option<f64> {
    self.obv
  }
}

impl Default for OnBalanceVolume {
  fn default() -> Self {
    Self::new()
  }
}

impl Indicator for OnBalanceVolume {
  fn name(&self) -> &str {
    &self.name
  }

  fn update(&mut self, bar: &Bar) -> Result<(), TerminalError> {
    // 하락일만 차감, 보합/상승일과 첫 봉은 가산
    let signed = match self.prev_close {
      Some(prev) if bar.close < prev => -bar.volume,
      _ => bar.volume,
    };
    self.obv = Some(self.obv.unwrap_or(0.0) + signed);
    self.prev_close = Some(bar.close);
    Ok(())
  }

  fn calculate(&self) -> Result<IndicatorResult, TerminalError> {
    let obv = self.obv.ok_or_else(|| not_ready(&self.name))?;
    Ok(IndicatorResult {
      value: obv,
      signals: vec![],
    })
  }

  fn is_ready(&self) -> bool {
    self.obv.is_some()
  }

  fn reset(&mut self) {
    self.obv = None;
    self.prev_close = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_vwap_weights_by_volume() {
    let mut vwap = VolumeWeightedAveragePrice::new(2);
    vwap.update(&Bar::new(0, 10.0, 10.0, 10.0, 10.0, 1.0)).unwrap();
    vwap.update(&Bar::new(1, 20.0, 20.0, 20.0, 20.0, 3.0)).unwrap();
    assert_eq!(vwap.value(), Some(17.5));

    let result = vwap.calculate().unwrap();
    assert!(result.signals.iter().any(|s| s.name == "Price Above VWAP"));
  }

  #[test]
  fn test_vwap_not_ready_before_window() {
    let mut vwap = VolumeWeightedAveragePrice::new(20);
    vwap.update(&Bar::new(0, 10.0, 10.0, 10.0, 10.0, 1.0)).unwrap();
    assert!(vwap.calculate().is_err());
  }

  #[test]
  fn test_obv_accumulates() {
    let mut obv = OnBalanceVolume::new();
    obv.update(&Bar::new(0, 10.0, 10.0, 10.0, 10.0, 100.0)).unwrap();
    obv.update(&Bar::new(1, 11.0, 11.0, 11.0, 11.0, 50.0)).unwrap();
    obv.update(&Bar::new(2, 9.0, 9.0, 9.0, 9.0, 30.0)).unwrap();
    assert_eq!(obv.value(), Some(120.0));
  }
}
