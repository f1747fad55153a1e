pub mod market_data;
pub mod portfolio;
pub mod symbol_book;

pub use market_data::{Bar, PriceHistory};
pub use portfolio::Holding;
pub use symbol_book::{Market, SymbolBook};
