use crate::application::lending::{
    DEFAULT_DAILY_LATE_FEE, DEFAULT_OPERATION_TIMEOUT_SECS, LendingPolicy,
};
use crate::domain::fee::validate_daily_rate;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/library";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// 設定の読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// アプリケーション設定
///
/// 環境変数から読み込む。未設定の項目は既定値を使う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    /// 既定の延滞料金日額（0以上、小数点以下2桁まで）
    pub daily_late_fee: Decimal,
    pub operation_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を組み立てる
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let db_max_connections =
            parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if db_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        let daily_late_fee = parse_or(
            &lookup,
            "DAILY_LATE_FEE",
            Decimal::from(DEFAULT_DAILY_LATE_FEE),
        )?;
        let daily_late_fee = validate_daily_rate(daily_late_fee).map_err(|_| {
            ConfigError::InvalidValue {
                key: "DAILY_LATE_FEE",
                value: daily_late_fee.to_string(),
            }
        })?;

        let timeout_secs = parse_or(
            &lookup,
            "OPERATION_TIMEOUT_SECS",
            DEFAULT_OPERATION_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "OPERATION_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url,
            port,
            db_max_connections,
            daily_late_fee,
            operation_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// 貸出エンジンに渡すポリシー
    pub fn lending_policy(&self) -> LendingPolicy {
        LendingPolicy {
            daily_late_fee: self.daily_late_fee,
            operation_timeout: self.operation_timeout,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}
