/**
* filename : data_provider
* author : HAMA
* date: 2025. 11. 9.
* description: 백테스트용 과거 일봉 소스 (CSV 파일 / 시세 클라이언트)
**/

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TerminalError;
use crate::market_data::{client::clean_history, DataClient, Period};
use crate::models::market_data::{Bar, PriceHistory};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoricalDataProvider: Send + Sync {
    fn available_symbols(&self) -> Vec<String>;

    async fn load_history(&self, symbol: &str) -> Result<PriceHistory, TerminalError>;
}

/// `symbol,timestamp,open,high,low,close,volume` 형식 CSV
pub struct CsvDataProvider {
    path: PathBuf,
    delimiter: u8,
}

impl CsvDataProvider {
    pub fn new(path: impl Into<PathBuf>, delimiter: char) -> Self {
        Self {
            path: path.into(),
            delimiter: delimiter as u8,
        }
    }

    fn read_rows(&self, symbol: &str) -> Result<Vec<Bar>, TerminalError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_path(&self.path)
            .map_err(|e| TerminalError::ParseError(format!("{}: {}", self.path.display(), e)))?;

        let mut bars = Vec::new();
        for rec in rdr.deserialize() {
            let row: CsvRow = rec.map_err(|e| TerminalError::ParseError(e.to_string()))?;
            // 심볼 컬럼이 비어 있으면 파일 전체를 한 종목으로 간주
            if !row.symbol.is_empty() && !row.symbol.eq_ignore_ascii_case(symbol) {
                continue;
            }
            bars.push(Bar::new(row.timestamp, row.open, row.high, row.low, row.close, row.volume));
        }
        bars.sort_by_key(|bar| bar.timestamp);
        Ok(bars)
    }
}

#[async_trait]
impl HistoricalDataProvider for CsvDataProvider {
    fn available_symbols(&self) -> Vec<String> {
        // 단일 파일 CSV: 파일명으로 심볼 추정
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| vec![s.to_uppercase()])
            .unwrap_or_default()
    }

    async fn load_history(&self, symbol: &str) -> Result<PriceHistory, TerminalError> {
        let bars = self.read_rows(symbol)?;
        if bars.is_empty() {
            return Err(TerminalError::InsufficientData(format!(
                "{}: no rows for {} in {}",
                symbol,
                symbol,
                self.path.display()
            )));
        }
        clean_history(PriceHistory::new(symbol, bars))
    }
}

/// 시세 클라이언트를 통한 원격 조회 (기본 2년)
pub struct RemoteDataProvider {
    data: Arc<DataClient>,
    period: Period,
}

impl RemoteDataProvider {
    pub fn new(data: Arc<DataClient>) -> Self {
        Self {
            data,
            period: Period::TwoYears,
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }
}

#[async_trait]
impl HistoricalDataProvider for RemoteDataProvider {
    fn available_symbols(&self) -> Vec<String> {
        Vec::new()
    }

    async fn load_history(&self, symbol: &str) -> Result<PriceHistory, TerminalError> {
        self.data.fetch(symbol, self.period).await
    }
}

#[derive(serde::Deserialize)]
struct CsvRow {
    #[serde(default)]
    symbol: String,
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_csv_filters_symbol_and_sorts() {
        let file = csv_file(
            "symbol,timestamp,open,high,low,close,volume\n\
             AAPL,2000,2,3,1,2.5,0\n\
             MSFT,1500,9,9,9,9,9\n\
             AAPL,1000,1,2,0.5,1.5,100\n",
        );
        let provider = CsvDataProvider::new(file.path(), ',');
        let history = provider.load_history("AAPL").await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.bars[0].timestamp, 1000);
        assert_eq!(history.last_close(), Some(2.5));
        // 거래량 0 -> 1
        assert_eq!(history.bars[1].volume, 1.0);
    }

    #[tokio::test]
    async fn test_csv_unknown_symbol() {
        let file = csv_file("symbol,timestamp,open,high,low,close,volume\nAAPL,1,1,1,1,1,1\n");
        let provider = CsvDataProvider::new(file.path(), ',');
        assert!(matches!(
            provider.load_history("TSLA").await,
            Err(TerminalError::InsufficientData(_))
        ));
    }

    #[tokio::test]
    async fn test_csv_malformed_row() {
        let file = csv_file("symbol,timestamp,open,high,low,close,volume\nAAPL,x,1,1,1,1,1\n");
        let provider = CsvDataProvider::new(file.path(), ',');
        assert!(matches!(provider.load_history("AAPL").await, Err(TerminalError::ParseError(_))));
    }
}
