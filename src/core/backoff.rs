use std::time::Duration;

/// 第 `attempt` 次重試前的等待時間：`base × factor^attempt`
pub fn retry_delay(base: Duration, factor: f64, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let multiplier = factor.powi(exponent);
    if !multiplier.is_finite() || multiplier < 0.0 {
        return base;
    }
    Duration::try_from_secs_f64(base.as_secs_f64() * multiplier).unwrap_or(Duration::MAX)
}
