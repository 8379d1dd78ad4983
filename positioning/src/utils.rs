use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};

/// 按最小价格变动单位取整，非有限值或超出 Decimal 范围时返回 None
pub fn round_nearest(value: f64, min_tick: Decimal) -> Option<Decimal> {
    let value = Decimal::from_f64(value)?;
    let ticks = value
        .checked_div(min_tick)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    ticks.checked_mul(min_tick).map(|v| v.normalize())
}
