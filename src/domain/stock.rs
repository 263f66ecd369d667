use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, CustomerId, StockCode, StockTransitionError};

/// 在庫ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    /// 貸出可能
    Available,
    /// 貸出中
    Borrowed,
    /// 破損
    Damaged,
    /// 紛失
    Lost,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Available => "AVAILABLE",
            StockStatus::Borrowed => "BORROWED",
            StockStatus::Damaged => "DAMAGED",
            StockStatus::Lost => "LOST",
        }
    }
}

impl std::str::FromStr for StockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(StockStatus::Available),
            "BORROWED" => Ok(StockStatus::Borrowed),
            "DAMAGED" => Ok(StockStatus::Damaged),
            "LOST" => Ok(StockStatus::Lost),
            _ => Err(format!("Invalid stock status: {}", s)),
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 在庫（物理的な1冊）
///
/// 不変条件：
/// - borrower_id と borrowed_at は両方あるか両方ないか
/// - status が Borrowed 以外のときは両方ない
///
/// 在庫の登録は在庫管理（外部）が行い、以降の状態変更は貸出エンジンのみが行う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUnit {
    pub code: StockCode,
    pub book_id: BookId,
    pub status: StockStatus,
    pub borrower_id: Option<CustomerId>,
    pub borrowed_at: Option<DateTime<Utc>>,
}

impl StockUnit {
    /// 在庫管理から登録された直後の在庫（Available）
    pub fn available(code: StockCode, book_id: BookId) -> Self {
        Self {
            code,
            book_id,
            status: StockStatus::Available,
            borrower_id: None,
            borrowed_at: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == StockStatus::Available
    }

    /// 不変条件を満たしているか
    pub fn is_consistent(&self) -> bool {
        match self.status {
            StockStatus::Borrowed => self.borrower_id.is_some() == self.borrowed_at.is_some(),
            _ => self.borrower_id.is_none() && self.borrowed_at.is_none(),
        }
    }
}

/// 純粋関数：在庫を貸出中にする
///
/// Available 以外からは遷移できない（NotAvailable）。
pub fn mark_borrowed(
    unit: &StockUnit,
    borrower_id: CustomerId,
    at: DateTime<Utc>,
) -> Result<StockUnit, StockTransitionError> {
    if unit.status != StockStatus::Available {
        return Err(StockTransitionError::NotAvailable(unit.status));
    }

    Ok(StockUnit {
        status: StockStatus::Borrowed,
        borrower_id: Some(borrower_id),
        borrowed_at: Some(at),
        ..unit.clone()
    })
}

/// 純粋関数：在庫を貸出可能に戻す
///
/// Borrowed からのみ遷移できる。貸出者と貸出日時はクリアされる。
pub fn mark_available(unit: &StockUnit) -> Result<StockUnit, StockTransitionError> {
    if unit.status != StockStatus::Borrowed {
        return Err(StockTransitionError::InvalidStateTransition(unit.status));
    }

    Ok(StockUnit {
        status: StockStatus::Available,
        borrower_id: None,
        borrowed_at: None,
        ..unit.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(status: StockStatus) -> StockUnit {
        StockUnit {
            status,
            ..StockUnit::available(StockCode::parse("S-001").unwrap(), BookId::new())
        }
    }

    #[test]
    fn test_mark_borrowed_from_available() {
        let available = unit(StockStatus::Available);
        let customer_id = CustomerId::new();
        let at = Utc::now();

        let borrowed = mark_borrowed(&available, customer_id, at).unwrap();

        assert_eq!(borrowed.status, StockStatus::Borrowed);
        assert_eq!(borrowed.borrower_id, Some(customer_id));
        assert_eq!(borrowed.borrowed_at, Some(at));
        assert_eq!(borrowed.code, available.code);
        assert!(borrowed.is_consistent());
    }

    #[test]
    fn test_mark_borrowed_rejects_every_other_status() {
        for status in [StockStatus::Borrowed, StockStatus::Damaged, StockStatus::Lost] {
            let result = mark_borrowed(&unit(status), CustomerId::new(), Utc::now());
            assert_eq!(result, Err(StockTransitionError::NotAvailable(status)));
        }
    }

    #[test]
    fn test_mark_available_clears_borrower() {
        let borrowed = mark_borrowed(&unit(StockStatus::Available), CustomerId::new(), Utc::now())
            .unwrap();

        let returned = mark_available(&borrowed).unwrap();

        assert_eq!(returned.status, StockStatus::Available);
        assert_eq!(returned.borrower_id, None);
        assert_eq!(returned.borrowed_at, None);
        assert!(returned.is_consistent());
    }

    #[test]
    fn test_mark_available_only_from_borrowed() {
        for status in [StockStatus::Available, StockStatus::Damaged, StockStatus::Lost] {
            let result = mark_available(&unit(status));
            assert_eq!(
                result,
                Err(StockTransitionError::InvalidStateTransition(status))
            );
        }
    }

    #[test]
    fn test_borrow_then_return_restores_original_unit() {
        let original = unit(StockStatus::Available);
        let borrowed = mark_borrowed(&original, CustomerId::new(), Utc::now()).unwrap();
        let returned = mark_available(&borrowed).unwrap();
        assert_eq!(returned, original);
    }

    #[test]
    fn test_stock_status_round_trips_through_str() {
        for status in [
            StockStatus::Available,
            StockStatus::Borrowed,
            StockStatus::Damaged,
            StockStatus::Lost,
        ] {
            assert_eq!(status.as_str().parse::<StockStatus>(), Ok(status));
        }
        assert!("borrowed".parse::<StockStatus>().is_err());
    }
}
