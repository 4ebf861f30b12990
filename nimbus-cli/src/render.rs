//! Plain-text output for the terminal.

use std::fmt::Write;

use nimbus_core::{CurrentConditions, DailyPoint, HourlyPoint, SessionState, Suggestions};

fn glyph(icon: &str) -> &'static str {
    match icon.get(..2) {
        Some("01") => "☀",
        Some("02") => "⛅",
        Some("03") | Some("04") => "☁",
        Some("09") | Some("10") => "🌧",
        Some("11") => "⛈",
        Some("13") => "❄",
        Some("50") => "🌫",
        _ => "·",
    }
}

pub fn report(state: &SessionState, favorite: bool) -> String {
    let mut out = String::new();

    if let Some(current) = &state.current {
        out.push_str(&current_block(current, favorite));
    }
    if !state.hourly.is_empty() {
        out.push_str("\nToday\n");
        out.push_str(&hourly_rows(&state.hourly));
    }
    if !state.daily.is_empty() {
        out.push_str("\nNext days\n");
        out.push_str(&daily_rows(&state.daily));
    }

    out
}

fn current_block(current: &CurrentConditions, favorite: bool) -> String {
    let star = if favorite { " ★" } else { "" };
    format!(
        "{}{star}\n  {} {}°C  {}\n  low {}° / high {}°  humidity {}%  wind {} m/s\n",
        current.location,
        glyph(&current.icon),
        current.temperature,
        current.description,
        current.temp_min,
        current.temp_max,
        current.humidity,
        current.wind_speed,
    )
}

fn hourly_rows(points: &[HourlyPoint]) -> String {
    let mut out = String::new();
    for point in points {
        let _ = writeln!(
            out,
            "  {}  {} {:>3}°  {}",
            point.time,
            glyph(&point.icon),
            point.temperature,
            point.description
        );
    }
    out
}

fn daily_rows(points: &[DailyPoint]) -> String {
    let mut out = String::new();
    for point in points {
        let _ = writeln!(
            out,
            "  {:<4} {} {:>3}° / {:>3}°  {}",
            point.label,
            glyph(&point.icon),
            point.temp_min,
            point.temp_max,
            point.description
        );
    }
    out
}

pub fn favorites(entries: &[CurrentConditions]) -> String {
    if entries.is_empty() {
        return "No favorite locations yet. Add one with `nimbus favorites add <LOCATION>`.\n".into();
    }

    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<20} {} {:>3}°C  {}  humidity {}%  wind {} m/s",
            entry.location,
            glyph(&entry.icon),
            entry.temperature,
            entry.description,
            entry.humidity,
            entry.wind_speed
        );
    }
    out
}

pub fn suggestions(suggestions: &Suggestions) -> String {
    if suggestions.places.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    for (i, place) in suggestions.places.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, place.display_name());
    }
    out
}
