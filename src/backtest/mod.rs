pub mod data_provider;
pub mod signal;

pub use data_provider::{CsvDataProvider, HistoricalDataProvider, RemoteDataProvider};
pub use signal::{run_signal_backtest, SignalBacktestParams, SignalBacktestReport, SignalBacktester, SignalTrade};
