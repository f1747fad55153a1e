use serde::{Deserialize, Serialize};

/// 보유 종목 기록 (portfolio_<user>.json 의 한 항목)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub name: String,
    pub ticker: String,
    pub avg_price: f64,
    #[serde(default)]
    pub quantity: f64,
}

impl Holding {
    pub fn new(name: impl Into<String>, ticker: impl Into<String>, avg_price: f64, quantity: f64) -> Self {
        Holding {
            name: name.into(),
            ticker: ticker.into(),
            avg_price,
            quantity,
        }
    }

    /// 총 매수 금액
    pub fn invested(&self) -> f64 {
        self.avg_price * self.quantity
    }

    /// 평단 대비 수익률 (%)
    pub fn return_pct(&self, current_price: f64) -> f64 {
        if self.avg_price <= 0.0 {
            return 0.0;
        }
        (current_price - self.avg_price) / self.avg_price * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_defaults_to_zero() {
        let holding: Holding =
            serde_json::from_str(r#"{"name":"삼성전자","ticker":"005930.KS","avg_price":70000}"#).unwrap();
        assert_eq!(holding.quantity, 0.0);
    }

    #[test]
    fn test_return_pct() {
        let holding = Holding::new("Apple", "AAPL", 100.0, 10.0);
        assert!((holding.return_pct(110.0) - 10.0).abs() < 1e-9);
        assert_eq!(holding.invested(), 1000.0);

        let free = Holding::new("Gift", "AAPL", 0.0, 1.0);
        assert_eq!(free.return_pct(110.0), 0.0);
    }
}
