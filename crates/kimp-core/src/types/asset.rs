//! 지원 자산 정의.
//!
//! 파이프라인이 허용하는 자산은 고정 목록입니다. 목록 밖의 심볼은
//! 검증 오류로 즉시 거부됩니다.

use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 지원 자산 (고정 허용 목록).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Btc,
    Eth,
    Sol,
    Doge,
    Xrp,
    Ada,
}

impl Asset {
    /// 모든 지원 자산.
    pub fn all() -> &'static [Asset] {
        &[
            Asset::Btc,
            Asset::Eth,
            Asset::Sol,
            Asset::Doge,
            Asset::Xrp,
            Asset::Ada,
        ]
    }

    /// 기준 통화 코드 (예: "BTC").
    pub fn code(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Sol => "SOL",
            Asset::Doge => "DOGE",
            Asset::Xrp => "XRP",
            Asset::Ada => "ADA",
        }
    }

    /// Binance USD-M 선물 마켓 ID (예: "BTCUSDT").
    pub fn binance_market(&self) -> String {
        format!("{}USDT", self.code())
    }

    /// Upbit KRW 마켓 코드 (예: "KRW-BTC").
    pub fn upbit_market(&self) -> String {
        format!("KRW-{}", self.code())
    }

    /// 데이터 제공 시작일.
    ///
    /// DOGE/SOL은 2021년부터, 나머지는 보수적으로 2020-01-01부터 제공합니다.
    pub fn listing_start(&self) -> NaiveDate {
        match self {
            Asset::Doge | Asset::Sol => NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            _ => NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Asset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BTC" => Ok(Asset::Btc),
            "ETH" => Ok(Asset::Eth),
            "SOL" => Ok(Asset::Sol),
            "DOGE" => Ok(Asset::Doge),
            "XRP" => Ok(Asset::Xrp),
            "ADA" => Ok(Asset::Ada),
            _ => Err(CoreError::UnsupportedSymbol(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_from_str() {
        assert_eq!("btc".parse::<Asset>().unwrap(), Asset::Btc);
        assert_eq!("ETH".parse::<Asset>().unwrap(), Asset::Eth);
        assert_eq!("Doge".parse::<Asset>().unwrap(), Asset::Doge);
        assert!("SHIB".parse::<Asset>().is_err());
    }

    #[test]
    fn test_market_codes() {
        assert_eq!(Asset::Btc.binance_market(), "BTCUSDT");
        assert_eq!(Asset::Xrp.upbit_market(), "KRW-XRP");
    }

    #[test]
    fn test_listing_start() {
        assert_eq!(
            Asset::Btc.listing_start(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
        assert_eq!(
            Asset::Sol.listing_start(),
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
        );
    }
}
