/**
* filename : utils
* author : HAMA
* date: 2025. 11. 4.
* description:
**/

use crate::error::TerminalError;
use crate::models::market_data::Bar;
use super::Indicator;

// 봉 전체를 재생하며 지표 시계열 생성 (준비 전 구간은 None)
pub fn indicator_series(
  indicator: &mut dyn Indicator,
  bars: &[Bar]
) -> Result<Vec<Option<f64>>, TerminalError> {
  indicator.reset();
  let mut series = Vec::with_capacity(bars.len());

  for bar in bars {
    indicator.update(bar)?;
    if indicator.is_ready() {
      series.push(Some(indicator.calculate()?.value));
    } else {
      series.push(None);
    }
  }

  Ok(series)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::indicators::SimpleMovingAverage;

  #[test]
  fn test_indicator_series_warmup() {
    let bars: Vec<Bar> = (1..=5)
      .map(|i| Bar::new(i, i as f64, i as f64, i as f64, i as f64, 1.0))
      .collect();
    let mut sma = SimpleMovingAverage::new(3);
    let series = indicator_series(&mut sma, &bars).unwrap();

    assert_eq!(series, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
  }
}
