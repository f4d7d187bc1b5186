//! 시간 표시 헬퍼
//!
//! 서버의 24시간 형식(HH:MM, HH:MM:SS)을 화면용 12시간 형식으로 변환합니다.

use chrono::{NaiveDate, NaiveTime, Timelike};

/// "HH:MM" 또는 "HH:MM:SS" 파싱
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// "14:05" -> "2:05 PM"
pub fn format_time_12h(raw: &str) -> Option<String> {
    let time = parse_time(raw)?;
    let (is_pm, hour) = time.hour12();
    Some(format!(
        "{}:{:02} {}",
        hour,
        time.minute(),
        if is_pm { "PM" } else { "AM" }
    ))
}

/// 변환 실패 시 원본 문자열 그대로 표시
pub fn display_time(raw: &str) -> String {
    format_time_12h(raw).unwrap_or_else(|| raw.to_string())
}

/// "9:00 AM - 5:00 PM"
pub fn format_time_range(start: &str, end: &str) -> String {
    format!("{} - {}", display_time(start), display_time(end))
}

/// "2024-03-05" -> "March 5, 2024"
pub fn format_date_long(raw: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()?;
    Some(date.format("%B %-d, %Y").to_string())
}
