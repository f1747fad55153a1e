/**
* filename : symbol_book
* author : HAMA
* date: 2025. 11. 4.
* description: 종목명 <-> 티커 사전 및 검색
**/

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TerminalError;
use crate::models::market_data::is_korean_ticker;

pub const SYMBOLS_FILE: &str = "symbols.json";

/// 국내 ETF/ETN 별칭 (종목 사전보다 먼저 검색)
const ETF_ALIASES: &[(&str, &str)] = &[
    ("삼성은선물", "530089.KS"),
    ("ACEKRX금선물", "411060.KS"),
    ("ACEKRX금현물", "411060.KS"),
    ("KODEX코스피100", "237350.KS"),
    ("KODEX코스닥150", "229200.KS"),
    ("KODEX코스피", "226490.KS"),
    ("KODEX500", "069500.KS"),
];

/// 스캐너 시장 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Market {
    Kospi,
    Kosdaq,
    Global,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Kospi => "KOSPI",
            Market::Kosdaq => "KOSDAQ",
            Market::Global => "GLOBAL",
        }
    }

    pub fn matches(&self, ticker: &str) -> bool {
        let upper = ticker.to_uppercase();
        match self {
            Market::Kospi => upper.ends_with(".KS"),
            Market::Kosdaq => upper.ends_with(".KQ"),
            Market::Global => !is_korean_ticker(&upper),
        }
    }
}

impl FromStr for Market {
    type Err = TerminalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "KOSPI" => Ok(Market::Kospi),
            "KOSDAQ" => Ok(Market::Kosdaq),
            "GLOBAL" | "NASDAQ" | "CRYPTO" => Ok(Market::Global),
            other => Err(TerminalError::InvalidParameter(format!("Unknown market: {}", other))),
        }
    }
}

/// 카테고리별 { 종목명: 티커 } 사전
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolBook {
    categories: BTreeMap<String, BTreeMap<String, String>>,
}

impl SymbolBook {
    pub fn new(categories: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        SymbolBook { categories }
    }

    /// JSON 파일에서 로드. 파일이 없으면 기본 사전 사용
    pub fn load(path: &Path) -> Result<Self, TerminalError> {
        if !path.exists() {
            log::info!("종목 사전 파일 없음, 기본 사전 사용: {}", path.display());
            return Ok(SymbolBook::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let categories = serde_json::from_str(&contents)?;
        Ok(SymbolBook { categories })
    }

    /// 전체 (종목명, 티커) 목록
    pub fn entries(&self) -> Vec<(String, String)> {
        self.categories
            .values()
            .flat_map(|names| names.iter().map(|(n, t)| (n.clone(), t.clone())))
            .collect()
    }

    /// 시장 필터를 통과한 종목만
    pub fn in_market(&self, market: Market) -> Vec<(String, String)> {
        self.entries()
            .into_iter()
            .filter(|(_, ticker)| market.matches(ticker))
            .collect()
    }

    pub fn name_of(&self, ticker: &str) -> Option<String> {
        let upper = ticker.to_uppercase();
        self.entries()
            .into_iter()
            .find(|(_, t)| t.to_uppercase() == upper)
            .map(|(n, _)| n)
    }

    /// 사용자 입력을 티커로 변환
    ///
    /// 공백 제거/대문자화 후 순서대로 시도:
    /// 사전의 티커 -> ETF 별칭/종목명 일치 -> 숫자 코드 -> 티커 형태 그대로 -> 부분 일치.
    /// 부분 일치는 티커 형태가 아닌 2글자 이상 입력에만 적용
    pub fn resolve(&self, input: &str) -> Option<String> {
        let clean: String = input.split_whitespace().collect::<String>().to_uppercase();
        if clean.is_empty() {
            return None;
        }

        let entries = self.entries();
        if let Some((_, ticker)) = entries.iter().find(|(_, t)| t.to_uppercase() == clean) {
            return Some(ticker.clone());
        }

        if let Some((_, ticker)) = ETF_ALIASES.iter().find(|(key, _)| *key == clean) {
            return Some(ticker.to_string());
        }

        let normalized: Vec<(String, String)> = entries
            .into_iter()
            .map(|(name, ticker)| (name.split_whitespace().collect::<String>().to_uppercase(), ticker))
            .collect();

        if let Some((_, ticker)) = normalized.iter().find(|(name, _)| *name == clean) {
            return Some(ticker.clone());
        }

        if clean.chars().all(|c| c.is_ascii_digit()) {
            return Some(format!("{}.KS", clean));
        }

        if is_ticker_shaped(&clean) {
            return Some(clean);
        }

        if clean.chars().count() < 2 {
            return None;
        }

        if let Some((_, ticker)) = ETF_ALIASES
            .iter()
            .find(|(key, _)| key.contains(clean.as_str()) || clean.contains(key))
        {
            return Some(ticker.to_string());
        }

        normalized
            .into_iter()
            .find(|(name, _)| name.contains(clean.as_str()) || clean.contains(name.as_str()))
            .map(|(_, ticker)| ticker)
    }
}

/// `^[A-Z0-9.\-^=]{1,10}$`
fn is_ticker_shaped(s: &str) -> bool {
    (1..=10).contains(&s.len())
        && s
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '^' | '='))
}

impl Default for SymbolBook {
    fn default() -> Self {
        let mut categories = BTreeMap::new();

        let kospi: BTreeMap<String, String> = [
            ("삼성전자", "005930.KS"),
            ("SK하이닉스", "000660.KS"),
            ("현대차", "005380.KS"),
            ("NAVER", "035420.KS"),
            ("KODEX 200", "069500.KS"),
        ]
        .iter()
        .map(|(n, t)| (n.to_string(), t.to_string()))
        .collect();

        let kosdaq: BTreeMap<String, String> = [
            ("에코프로비엠", "247540.KQ"),
            ("알테오젠", "196170.KQ"),
            ("HLB", "028300.KQ"),
        ]
        .iter()
        .map(|(n, t)| (n.to_string(), t.to_string()))
        .collect();

        let global: BTreeMap<String, String> = [
            ("Apple", "AAPL"),
            ("Nvidia", "NVDA"),
            ("Tesla", "TSLA"),
            ("QQQ", "QQQ"),
            ("Bitcoin", "BTC-USD"),
            ("Ethereum", "ETH-USD"),
        ]
        .iter()
        .map(|(n, t)| (n.to_string(), t.to_string()))
        .collect();

        categories.insert("KOSPI".to_string(), kospi);
        categories.insert("KOSDAQ".to_string(), kosdaq);
        categories.insert("GLOBAL".to_string(), global);

        SymbolBook { categories }
    }
}
