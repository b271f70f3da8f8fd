use chrono::{Datelike, Local};

use super::config::ThresholdConfig;

pub fn is_active(current_month: u32, config: &ThresholdConfig) -> bool {
    !config.seasonal_gate_enabled || config.active_months.contains(&current_month)
}

pub fn current_month() -> u32 {
    Local::now().month()
}
