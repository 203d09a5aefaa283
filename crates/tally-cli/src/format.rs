//! Minutes-to-display-string formatting.

/// Duration display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourFormat {
    /// Decimal hours with a comma separator, e.g. `2,50`.
    PartHours,

    /// Hours and minutes, e.g. `2:30`.
    Clock,
}

/// Formats minutes per the chosen style.
#[allow(clippy::cast_possible_truncation)]
pub fn format_minutes(minutes: f64, format: HourFormat) -> String {
    match format {
        HourFormat::PartHours => format!("{:.2}", minutes / 60.0).replace('.', ","),
        HourFormat::Clock => {
            let hours = (minutes / 60.0).floor();
            let remaining = (minutes - hours * 60.0) as i64;
            format!("{}:{remaining:02}", hours as i64)
        }
    }
}
