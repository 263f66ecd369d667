use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 値オブジェクトの生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// 在庫コードが空
    #[error("stock code must not be empty")]
    EmptyStockCode,
    /// 在庫コードが長すぎる
    #[error("stock code must be at most {} characters (got {0})", STOCK_CODE_MAX_LEN)]
    StockCodeTooLong(usize),
    /// 返却期限の形式が不正（YYYY-MM-DD以外）
    #[error("invalid due date '{0}': use YYYY-MM-DD")]
    MalformedDueDate(String),
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn value(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// 貸出取引ID - 貸出管理コンテキストの集約ID
    TransactionId
);
uuid_id!(
    /// 書籍ID - カタログ管理コンテキストへの参照
    BookId
);
uuid_id!(
    /// 利用者ID - 利用者管理コンテキストへの参照
    CustomerId
);
uuid_id!(
    /// 職員ID - 延滞料金を処理した職員（検証はしない不透明な値）
    StaffId
);
uuid_id!(
    /// 延滞料金ID
    ChargeId
);

/// 在庫コードの最大長（book_stocks.code VARCHAR(50)）
pub const STOCK_CODE_MAX_LEN: usize = 50;

/// 在庫コード - 物理的な1冊を識別する一意なコード
///
/// サロゲートIDではなく、書籍ごとに払い出されるラベル。
/// 空文字と50文字超は生成できない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StockCode(String);

impl StockCode {
    pub fn parse(raw: &str) -> Result<Self, ValueError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValueError::EmptyStockCode);
        }
        let len = trimmed.chars().count();
        if len > STOCK_CODE_MAX_LEN {
            return Err(ValueError::StockCodeTooLong(len));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StockCode {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StockCode> for String {
    fn from(code: StockCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for StockCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 境界で受け取る返却期限の形式
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// 返却期限（YYYY-MM-DD）をUTCの0時のタイムスタンプに変換する
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, ValueError> {
    NaiveDate::parse_from_str(raw.trim(), DUE_DATE_FORMAT)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| ValueError::MalformedDueDate(raw.to_string()))
}
