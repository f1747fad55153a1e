/**
* filename : period
* author : HAMA
* date: 2025. 11. 5.
* description: 조회 기간 ("1d" ~ "5y")
**/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TerminalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    ThreeYears,
    FiveYears,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::ThreeYears => "3y",
            Period::FiveYears => "5y",
        }
    }

    /// 달력 기준 일수
    pub fn days(&self) -> i64 {
        match self {
            Period::OneDay => 1,
            Period::FiveDays => 5,
            Period::OneMonth => 31,
            Period::ThreeMonths => 92,
            Period::SixMonths => 183,
            Period::OneYear => 365,
            Period::TwoYears => 730,
            Period::ThreeYears => 1095,
            Period::FiveYears => 1826,
        }
    }

    /// Yahoo chart API `range` 값. 지원하지 않는 기간은 None (period1/period2 사용)
    pub fn yahoo_range(&self) -> Option<&'static str> {
        match self {
            Period::ThreeYears => None,
            other => Some(other.as_str()),
        }
    }

    /// 데이터가 부족할 때 시도할 기간 목록 (요청 기간 -> 1y -> 2y)
    pub fn fallbacks(&self) -> Vec<Period> {
        let mut periods = vec![*self];
        for p in [Period::OneYear, Period::TwoYears] {
            if !periods.contains(&p) {
                periods.push(p);
            }
        }
        periods
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::SixMonths
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = TerminalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" => Ok(Period::OneDay),
            "5d" => Ok(Period::FiveDays),
            "1mo" => Ok(Period::OneMonth),
            "3mo" => Ok(Period::ThreeMonths),
            "6mo" => Ok(Period::SixMonths),
            "1y" => Ok(Period::OneYear),
            "2y" => Ok(Period::TwoYears),
            "3y" => Ok(Period::ThreeYears),
            "5y" => Ok(Period::FiveYears),
            other => Err(TerminalError::InvalidParameter(format!("Unknown period: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1d", Period::OneDay)]
    #[case("6MO", Period::SixMonths)]
    #[case(" 3y ", Period::ThreeYears)]
    fn test_parse(#[case] input: &str, #[case] expected: Period) {
        assert_eq!(input.parse::<Period>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_period_rejected() {
        assert!(matches!("10y".parse::<Period>(), Err(TerminalError::InvalidParameter(_))));
    }

    #[test]
    fn test_fallbacks_are_deduplicated() {
        assert_eq!(Period::SixMonths.fallbacks(), vec![Period::SixMonths, Period::OneYear, Period::TwoYears]);
        assert_eq!(Period::OneYear.fallbacks(), vec![Period::OneYear, Period::TwoYears]);
    }
}
