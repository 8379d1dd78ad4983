use std::time::{SystemTime, UNIX_EPOCH};

pub fn get_current_milli_timestamp() -> u128 {
    let now = SystemTime::now();
    now.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// 毫秒时间戳，业务模型统一使用 u64
pub fn get_current_milli_timestamp_u64() -> u64 {
    get_current_milli_timestamp() as u64
}
