use rust_decimal::Decimal;

use super::FeeError;

/// 通貨の小数点以下の桁数
pub const CURRENCY_SCALE: u32 = 2;

/// 日額を検証する
///
/// 負の値と、通貨の精度（小数点以下2桁）を超える値を拒否する。
/// これを通った日額なら、保存後も total = days_late × daily_rate が成り立つ。
pub fn validate_daily_rate(daily_rate: Decimal) -> Result<Decimal, FeeError> {
    if daily_rate < Decimal::ZERO {
        return Err(FeeError::NegativeDailyRate);
    }
    if daily_rate.normalize().scale() > CURRENCY_SCALE {
        return Err(FeeError::RateTooPrecise(daily_rate));
    }
    Ok(daily_rate)
}

/// 純粋関数：延滞料金を計算する
///
/// total = days_late × daily_rate（丸めは行わない）
///
/// # エラー
/// - days_late が1未満: `FeeError::NonPositiveDaysLate`
/// - daily_rate が負: `FeeError::NegativeDailyRate`
/// - daily_rate が小数点以下2桁を超える: `FeeError::RateTooPrecise`
pub fn calculate_fee(days_late: i64, daily_rate: Decimal) -> Result<Decimal, FeeError> {
    if days_late <= 0 {
        return Err(FeeError::NonPositiveDaysLate(days_late));
    }
    let daily_rate = validate_daily_rate(daily_rate)?;

    Decimal::from(days_late)
        .checked_mul(daily_rate)
        .ok_or(FeeError::Overflow)
}
