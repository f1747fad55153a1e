/**
* filename : trend
* author : HAMA
* date: 2025. 11. 4.
* description:
**/

use std::collections::VecDeque;
use crate::error::TerminalError;
use crate::models::market_data::Bar;
use super::{not_ready, Indicator, IndicatorResult, IndicatorSignal, moving_averages::ExponentialMovingAverage};

#[derive(Debug)]
pub struct MACD {
  name: String,
  fast_ema: ExponentialMovingAverage,
  slow_ema: ExponentialMovingAverage,
  signal_ema: ExponentialMovingAverage,
  macd_line: Option<f64>,
  histogram_values: VecDeque<f64>,
}

impl MACD {
  pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
    MACD {
      name: format!("MACD-{}-{}-{}", fast_period, slow_period, signal_period),
      fast_ema: ExponentialMovingAverage::new(fast_period),
      slow_ema: ExponentialMovingAverage::new(slow_period),
      signal_ema: ExponentialMovingAverage::new(signal_period),
      macd_line: None,
      histogram_values: VecDeque::with_capacity(3),
    }
  }

  pub fn macd_line(&self) -> Option<f64> {
    self.macd_line
  }

  pub fn signal_line(&self) -> Option<f64> {
    self.signal_ema.value()
  }

  /// MACD - 시그널 (히스토그램)
  pub fn histogram(&self) -> Option<f64> {
    Some(self.macd_line? - self.signal_line()?)
  }
}

impl Indicator for MACD {
  fn name(&self) -> &str {
    &self.name
  }

  fn update(&mut self, bar: &Bar) -> Result<(), TerminalError> {
    // 빠른 EMA와 느린 EMA 업데이트
    self.fast_ema.push(bar.close);
    self.slow_ema.push(bar.close);

    // 두 EMA가 준비되면 MACD 라인 계산하고 시그널 EMA 업데이트
    if let (Some(fast_value), Some(slow_value)) = (self.fast_ema.value(), self.slow_ema.value()) {
      let macd_line = fast_value - slow_value;
      self.macd_line = Some(macd_line);

      // 시그널 라인 업데이트
      self.signal_ema.push(macd_line);

      // 히스토그램 값 저장 (시그널 라인이 준비된 경우)
      if let Some(histogram) = self.histogram() {
        self.histogram_values.push_back(histogram);

        // 히스토그램 값 관리 (메모리 효율성)
        if self.histogram_values.len() > 3 {
          self.histogram_values.pop_front();
        }
      }
    }

    Ok(())
  }

  fn calculate(&self) -> Result<IndicatorResult, TerminalError> {
    let (macd_line, histogram) = match (self.macd_line, self.histogram()) {
      (Some(m), Some(h)) => (m, h),
      _ => return Err(not_ready(&self.name)),
    };

    let mut signals = Vec::new();

    // 최소 2개의 히스토그램 값이 있는 경우, 크로스오버 확인
    if self.histogram_values.len() >= 2 {
      let prev_histogram = self.histogram_values[self.histogram_values.len() - 2];

      // 시그널 크로스오버 (매수 신호)
      if prev_histogram < 0.0 && histogram > 0.0 {
        signals.push(IndicatorSignal {
          name: "MACD Bullish Crossover".to_string(),
          strength: 0.7,
          message: "MACD crossed above signal line".to_string(),
        });
      }
      // 시그널 크로스언더 (매도 신호)
      else if prev_histogram > 0.0 && histogram < 0.0 {
        signals.push(IndicatorSignal {
          name: "MACD Bearish Crossover".to_string(),
          strength: -0.7,
          message: "MACD crossed below signal line".to_string(),
        });
      }
    }

    // 중심선 크로스오버 (추가 신호)
    if macd_line > 0.0 && histogram > 0.0 {
      signals.push(IndicatorSignal {
        name: "MACD Above Zero".to_string(),
        strength: 0.3,
        message: "MACD is above zero line".to_string(),
      });
    }
    else if macd_line < 0.0 && histogram < 0.0 {
      signals.push(IndicatorSignal {
        name: "MACD Below Zero".to_string(),
        strength: -0.3,
        message: "MACD is below zero line".to_string(),
      });
    }

    Ok(IndicatorResult {
      value: histogram, // 히스토그램 값을 주요 값으로 반환
      signals,
    })
  }

  fn is_ready(&self) -> bool {
    self.histogram().is_some()
  }

  fn reset(&mut self) {
    self.fast_ema.reset();
    self.slow_ema.reset();
    self.signal_ema.reset();
    self.macd_line = None;
    self.histogram_values.clear();
  }
}

/// 일목균형표 선행스팬 A/B (차트용 26일 선행 이동 없이 당일 기준)
#[derive(Debug)]
pub struct Ichimoku {
  name: String,
  conversion_period: usize,
  base_period: usize,
  span_b_period: usize,
  highs: VecDeque<f64>,
  lows: VecDeque<f64>,
}

impl Ichimoku {
  pub fn new(conversion_period: usize, base_period: usize, span_b_period: usize) -> Self {
    let capacity = conversion_period.max(base_period).max(span_b_period);
    Ichimoku {
      name: format!("ICHIMOKU-{}-{}-{}", conversion_period, base_period, span_b_period),
      conversion_period,
      base_period,
      span_b_period,
      highs: VecDeque::with_capacity(capacity),
      lows: VecDeque::with_capacity(capacity),
    }
  }

  // 최근 period개 봉의 (최고가 + 최저가) / 2
  fn midpoint(&self, period: usize) -> Option<f64> {
    if period == 0 || self.highs.len() < period {
      return None;
    }
    let start = self.highs.len() - period;
    let high = self.highs.iter().skip(start).cloned().fold(f64::MIN, f64::max);
    let low = self.lows.iter().skip(start).cloned().fold(f64::MAX, f64::min);
    Some((high + low) / 2.0)
  }

  /// 전환선
  pub fn conversion_line(&self) -> Option<f64> {
    self.midpoint(self.conversion_period)
  }

  /// 기준선
  pub fn base_line(&self) -> Option<f64> {
    self.midpoint(self.base_period)
  }

  /// 선행스팬 A = (전환선 + 기준선) / 2
  pub fn span_a(&self) -> Option<f64> {
    Some((self.conversion_line()? + self.base_line()?) / 2.0)
  }

  /// 선행스팬 B = 52일 중간값
  pub fn span_b(&self) -> Option<f64> {
    self.midpoint(self.span_b_period)
  }
}

impl Indicator for Ichimoku {
  fn name(&self) -> &str {
    &self.name
  }

  fn update(&mut self, bar: &Bar) -> Result<(), TerminalError> {
    self.highs.push_back(bar.high);
    self.lows.push_back(bar.low);

    let capacity = self.conversion_period.max(self.base_period).max(self.span_b_period);
    if self.highs.len() > capacity {
      self.highs.pop_front();
      self.lows.pop_front();
    }

    Ok(())
  }

  fn calculate(&self) -> Result<IndicatorResult, TerminalError> {
    let span_a = self.span_a().ok_or_else(|| not_ready(&self.name))?;

    let mut signals = Vec::new();
    if let Some(span_b) = self.span_b() {
      if span_a > span_b {
        signals.push(IndicatorSignal {
          name: "Bullish Cloud".to_string(),
          strength: 0.3,
          message: "Leading span A is above span B".to_string(),
        });
      } else if span_a < span_b {
        signals.push(IndicatorSignal {
          name: "Bearish Cloud".to_string(),
          strength: -0.3,
          message: "Leading span A is below span B".to_string(),
        });
      }
    }

    Ok(IndicatorResult {
      value: span_a,
      signals,
    })
  }

  fn is_ready(&self) -> bool {
    self.span_a().is_some()
  }

  fn reset(&mut self) {
    self.highs.clear();
    self.lows.clear();
  }
}
