//! Swedish date and weekday formatting for schedule tables.
//!
//! # Design
//! - The container width picks a [`FormatType`]; narrower containers get
//!   shorter dates and weekday names, and the narrowest hides the weekday
//!   column entirely.
//! - Weekdays are indexed Monday first.
//! - Today's row is emphasised with Filson Pro weights, which only exist in
//!   steps of 100 between 300 and 900.

use chrono::{Datelike, NaiveDate, TimeDelta};

/// Component slug used in logs.
pub const COMPONENT: &str = "date-formatter";

/// Below this width dates use `d/M` and the weekday column is hidden.
pub const MICRO_MAX: f64 = 280.0;
/// Below this width dates use `dd/MM`.
pub const TINY_MAX: f64 = 350.0;
/// Below this width dates use `dd/MM-yy`.
pub const SMALL_MAX: f64 = 420.0;
/// Below this width dates use `dd/MM-yyyy`.
pub const MEDIUM_MAX: f64 = 520.0;
/// Below this width dates use `d mmm yyyy`; wider is the same.
pub const LARGE_MAX: f64 = 680.0;

/// Full month names.
pub const MONTHS_FULL: [&str; 12] = [
    "januari", "februari", "mars", "april", "maj", "juni", "juli", "augusti", "september",
    "oktober", "november", "december",
];
/// Abbreviated month names.
pub const MONTHS_SHORT: [&str; 12] = [
    "jan", "feb", "mar", "apr", "maj", "jun", "jul", "aug", "sep", "okt", "nov", "dec",
];
/// Full weekday names, Monday first.
pub const DAYS_FULL: [&str; 7] = ["Måndag", "Tisdag", "Onsdag", "Torsdag", "Fredag", "Lördag", "Söndag"];
/// Three-letter weekday names.
pub const DAYS_SHORT: [&str; 7] = ["Mån", "Tis", "Ons", "Tor", "Fre", "Lör", "Sön"];
/// Shortest unambiguous weekday names.
pub const DAYS_MINIMAL: [&str; 7] = ["M", "Ti", "O", "To", "F", "L", "S"];

/// Weights available in Filson Pro.
pub const FILSON_PRO_WEIGHTS: [u16; 7] = [300, 400, 500, 600, 700, 800, 900];

/// Class added to today's row.
pub const CURRENT_ROW_CLASS: &str = "current-date-row";
/// Class added to every cell of today's row.
pub const CURRENT_CELL_CLASS: &str = "current-date-cell";
/// Class added to today's date cell.
pub const CURRENT_DATE_CLASS: &str = "current-date-highlight";
/// Class added to today's weekday cell.
pub const CURRENT_WEEKDAY_CLASS: &str = "current-weekday-highlight";
/// Attribute set on upcoming rows.
pub const UPCOMING_ATTRIBUTE: &str = "data-upcoming";
/// Label given to upcoming rows.
pub const UPCOMING_LABEL: &str = "Kommande datum";

/// Width class of a date container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatType {
    /// `d/M`, no weekday column.
    Micro,
    /// `dd/MM`, minimal weekdays.
    Tiny,
    /// `dd/MM-yy`, short weekdays.
    Small,
    /// `dd/MM-yyyy`, full weekdays.
    Medium,
    /// `d mmm yyyy`, full weekdays.
    Large,
    /// Same as [`FormatType::Large`].
    Full,
}

impl FormatType {
    /// Format for a container `width` in CSS pixels.
    #[must_use]
    pub fn for_width(width: f64) -> Self {
        if width < MICRO_MAX {
            Self::Micro
        } else if width < TINY_MAX {
            Self::Tiny
        } else if width < SMALL_MAX {
            Self::Small
        } else if width < MEDIUM_MAX {
            Self::Medium
        } else if width < LARGE_MAX {
            Self::Large
        } else {
            Self::Full
        }
    }

    /// Whether the weekday column is shown at this width.
    #[must_use]
    pub const fn shows_weekdays(self) -> bool {
        !matches!(self, Self::Micro)
    }
}

/// Render `date` for a container width class.
#[must_use]
pub fn format_date(date: NaiveDate, format: FormatType) -> String {
    let day = date.day();
    let month = date.month();
    let year = date.year();
    match format {
        FormatType::Micro => format!("{day}/{month}"),
        FormatType::Tiny => format!("{day:02}/{month:02}"),
        FormatType::Small => format!("{day:02}/{month:02}-{:02}", year.rem_euclid(100)),
        FormatType::Medium => format!("{day:02}/{month:02}-{year}"),
        FormatType::Large | FormatType::Full => {
            format!("{day} {} {year}", MONTHS_SHORT[date.month0() as usize])
        }
    }
}

/// Monday-first weekday index of `date`.
#[must_use]
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

/// Weekday name at `index` for a width class; `None` when hidden.
#[must_use]
pub fn format_day(index: usize, format: FormatType) -> Option<&'static str> {
    match format {
        FormatType::Micro => None,
        FormatType::Tiny => DAYS_MINIMAL.get(index).copied(),
        FormatType::Small => DAYS_SHORT.get(index).copied(),
        FormatType::Medium | FormatType::Large | FormatType::Full => DAYS_FULL.get(index).copied(),
    }
}

/// Weekday named in `text`: full names, then short names (both as
/// substrings), then exact minimal names.
#[must_use]
pub fn find_day_index(text: &str) -> Option<usize> {
    let lower = text.trim().to_lowercase();
    DAYS_FULL
        .iter()
        .position(|day| lower.contains(&day.to_lowercase()))
        .or_else(|| {
            DAYS_SHORT
                .iter()
                .position(|day| lower.contains(&day.to_lowercase()))
        })
        .or_else(|| DAYS_MINIMAL.iter().position(|day| lower == day.to_lowercase()))
}

/// Whether `text` names a weekday.
#[must_use]
pub fn is_weekday_text(text: &str) -> bool {
    find_day_index(text).is_some()
}

fn names_weekday(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    DAYS_FULL
        .iter()
        .chain(DAYS_SHORT.iter())
        .any(|day| lower.contains(&day.to_lowercase()))
}

/// 0-based weekday column of a table, detected from header texts and, when
/// no header qualifies, from the first body row. The last match wins.
#[must_use]
pub fn weekday_column(headers: &[&str], first_row: &[&str]) -> Option<usize> {
    let from_headers = headers.iter().rposition(|header| {
        let lower = header.trim().to_lowercase();
        lower.contains("dag") || lower.contains("vecka") || names_weekday(&lower)
    });
    from_headers.or_else(|| first_row.iter().rposition(|cell| names_weekday(cell)))
}

/// Parse a `datetime`/`data-date` attribute (`YYYY-MM-DD`, optionally
/// followed by a time).
#[must_use]
pub fn parse_date_attribute(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date = value.get(..10)?;
    if value.len() > 10 && !value[10..].starts_with(['T', ' ']) {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Parse a date as written in schedule cells: ISO dates, `14 mars [2025]`
/// or numeric `14/3[/25]`. Missing years default to `current_year`.
#[must_use]
pub fn parse_swedish_date(text: &str, current_year: i32) -> Option<NaiveDate> {
    let lower = text.trim().to_lowercase();
    parse_date_attribute(&lower)
        .or_else(|| parse_named_month(&lower, current_year))
        .or_else(|| parse_numeric(&lower, current_year))
}

fn leading_digits(text: &str, max: usize) -> &str {
    let end = text
        .char_indices()
        .take(max)
        .take_while(|(_, ch)| ch.is_ascii_digit())
        .map(|(index, ch)| index + ch.len_utf8())
        .last()
        .unwrap_or(0);
    &text[..end]
}

fn month_number(name: &str) -> Option<u32> {
    MONTHS_FULL
        .iter()
        .position(|month| *month == name)
        .or_else(|| MONTHS_SHORT.iter().position(|month| *month == name))
        .and_then(|index| u32::try_from(index + 1).ok())
}

fn parse_named_month(text: &str, current_year: i32) -> Option<NaiveDate> {
    for (start, ch) in text.char_indices() {
        if !ch.is_ascii_digit() {
            continue;
        }
        let digits = leading_digits(&text[start..], 2);
        for len in (1..=digits.len()).rev() {
            let rest = text[start + len..].trim_start();
            let Some(month_name) = MONTHS_FULL
                .iter()
                .chain(MONTHS_SHORT.iter())
                .find(|month| rest.starts_with(**month))
            else {
                continue;
            };
            let day: u32 = digits[..len].parse().ok()?;
            let month = month_number(month_name)?;
            let after = rest[month_name.len()..].trim_start();
            let year_digits = leading_digits(after, 4);
            let year = if year_digits.len() == 4 {
                year_digits.parse().ok()?
            } else {
                current_year
            };
            return NaiveDate::from_ymd_opt(year, month, day);
        }
    }
    None
}

fn parse_numeric(text: &str, current_year: i32) -> Option<NaiveDate> {
    for (start, ch) in text.char_indices() {
        if !ch.is_ascii_digit() {
            continue;
        }
        let day_digits = leading_digits(&text[start..], 2);
        let rest = &text[start + day_digits.len()..];
        let Some(rest) = rest.strip_prefix(['/', '-']) else {
            continue;
        };
        let month_digits = leading_digits(rest, 2);
        if month_digits.is_empty() {
            continue;
        }
        let rest = &rest[month_digits.len()..];
        let mut year = current_year;
        if let Some(year_part) = rest.strip_prefix(['/', '-']) {
            let year_digits = leading_digits(year_part, 4);
            if year_digits.len() >= 2 {
                year = year_digits.parse().ok()?;
                if year < 100 {
                    year += if year < 50 { 2000 } else { 1900 };
                }
            }
        }
        return NaiveDate::from_ymd_opt(year, month_digits.parse().ok()?, day_digits.parse().ok()?);
    }
    None
}

/// Whether `date` falls within `days` days from `today`, inclusive.
///
/// A window reaching past the calendar's end covers every later date.
#[must_use]
pub fn is_upcoming(date: NaiveDate, today: NaiveDate, days: u32) -> bool {
    let horizon = today
        .checked_add_signed(TimeDelta::days(i64::from(days)))
        .unwrap_or(NaiveDate::MAX);
    date >= today && date <= horizon
}

/// Numeric weight for a computed or stored `font-weight` value.
#[must_use]
pub fn parse_weight(value: &str) -> u16 {
    let value = value.trim();
    if value.is_empty() {
        return 400;
    }
    let digits = leading_digits(value, 4);
    if let Ok(weight) = digits.parse::<u16>() {
        return weight;
    }
    match value.to_lowercase().as_str() {
        "bold" | "bolder" => 700,
        "lighter" | "light" => 300,
        "medium" => 500,
        "semi-bold" => 600,
        "extra-bold" => 800,
        "black" => 900,
        _ => 400,
    }
}

/// Smallest Filson Pro weight at or above `current + increase`.
#[must_use]
pub fn next_filson_weight(current: u16, increase: u16) -> u16 {
    let target = current.saturating_add(increase);
    FILSON_PRO_WEIGHTS
        .into_iter()
        .find(|weight| *weight >= target)
        .unwrap_or(900)
}

/// CSS value for a weight, using the design-system variables.
#[must_use]
pub fn weight_css(weight: u16) -> String {
    let variable = match weight {
        400 => "var(--fw-normal, 400)",
        500 => "var(--fw-regular, 500)",
        600 => "var(--fw-medium, 600)",
        700 => "var(--fw-bold, 700)",
        800 => "var(--fw-heavy, 800)",
        900 => "var(--fw-black, 900)",
        other => return other.to_string(),
    };
    variable.to_string()
}

/// A body cell of today's row, as measured by the web layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowCell {
    /// Weight before highlighting.
    pub original_weight: u16,
    /// Whether the cell holds a `time[datetime]`.
    pub has_time: bool,
    /// Cell text.
    pub text: String,
}

/// How to render one cell of today's row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellHighlight {
    /// Weight to apply.
    pub weight: u16,
    /// Add [`CURRENT_DATE_CLASS`].
    pub date: bool,
    /// Add [`CURRENT_WEEKDAY_CLASS`].
    pub weekday: bool,
}

/// Weights for today's row: every cell one step heavier, the date cell
/// (first column or holding a `time`) and weekday cells by `emphasis`.
#[must_use]
pub fn plan_row_highlight(cells: &[RowCell], emphasis: u16) -> Vec<CellHighlight> {
    cells
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let date = index == 0 || cell.has_time;
            let weekday = is_weekday_text(&cell.text);
            let increase = if date || weekday { emphasis } else { 100 };
            CellHighlight {
                weight: next_filson_weight(cell.original_weight, increase),
                date,
                weekday,
            }
        })
        .collect()
}

/// Date a body row refers to: its `time[datetime]`, else its first cell.
#[must_use]
pub fn row_date(time_datetime: Option<&str>, first_cell: Option<&str>, current_year: i32) -> Option<NaiveDate> {
    time_datetime
        .and_then(parse_date_attribute)
        .or_else(|| first_cell.and_then(|text| parse_swedish_date(text, current_year)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn widths_map_to_format_types() {
        assert_eq!(FormatType::for_width(279.0), FormatType::Micro);
        assert_eq!(FormatType::for_width(280.0), FormatType::Tiny);
        assert_eq!(FormatType::for_width(400.0), FormatType::Small);
        assert_eq!(FormatType::for_width(519.0), FormatType::Medium);
        assert_eq!(FormatType::for_width(600.0), FormatType::Large);
        assert_eq!(FormatType::for_width(1_024.0), FormatType::Full);
        assert!(!FormatType::Micro.shows_weekdays());
    }

    #[test]
    fn dates_shrink_with_the_container() {
        let day = date(2025, 3, 7);
        assert_eq!(format_date(day, FormatType::Micro), "7/3");
        assert_eq!(format_date(day, FormatType::Tiny), "07/03");
        assert_eq!(format_date(day, FormatType::Small), "07/03-25");
        assert_eq!(format_date(day, FormatType::Medium), "07/03-2025");
        assert_eq!(format_date(day, FormatType::Large), "7 mar 2025");
        assert_eq!(format_date(date(2025, 10, 21), FormatType::Full), "21 okt 2025");
    }

    #[test]
    fn weekdays_follow_the_width_class() {
        let friday = date(2025, 3, 7);
        assert_eq!(weekday_index(friday), 4);
        assert_eq!(format_day(4, FormatType::Micro), None);
        assert_eq!(format_day(4, FormatType::Tiny), Some("F"));
        assert_eq!(format_day(1, FormatType::Small), Some("Tis"));
        assert_eq!(format_day(6, FormatType::Medium), Some("Söndag"));
    }

    #[test]
    fn day_lookup_prefers_full_then_short_then_exact_minimal() {
        assert_eq!(find_day_index("  Torsdag "), Some(3));
        assert_eq!(find_day_index("lör"), Some(5));
        assert_eq!(find_day_index("To"), Some(3));
        assert_eq!(find_day_index("Ti"), Some(1));
        assert_eq!(find_day_index("Tidig"), None);
        assert!(is_weekday_text("Söndag 12/3"));
    }

    #[test]
    fn weekday_column_detection() {
        assert_eq!(weekday_column(&["Datum", "Veckodag", "Plats"], &[]), Some(1));
        assert_eq!(
            weekday_column(&["Datum", "Tid", "Plats"], &["14/3", "Fredag", "Bjärred"]),
            Some(1)
        );
        assert_eq!(weekday_column(&["Datum", "Plats"], &["14/3", "Bjärred"]), None);
    }

    #[test]
    fn swedish_dates_parse_in_every_supported_shape() {
        assert_eq!(parse_swedish_date("2025-03-14", 2024), Some(date(2025, 3, 14)));
        assert_eq!(parse_swedish_date("14 mars 2025", 2024), Some(date(2025, 3, 14)));
        assert_eq!(parse_swedish_date("Fre 14 mar", 2026), Some(date(2026, 3, 14)));
        assert_eq!(parse_swedish_date("3juni", 2025), Some(date(2025, 6, 3)));
        assert_eq!(parse_swedish_date("14/3", 2025), Some(date(2025, 3, 14)));
        assert_eq!(parse_swedish_date("14-03-49", 2025), Some(date(2049, 3, 14)));
        assert_eq!(parse_swedish_date("14/3/75", 2025), Some(date(1975, 3, 14)));
        assert_eq!(parse_swedish_date("31 februari", 2025), None);
        assert_eq!(parse_swedish_date("Stängt", 2025), None);
        assert_eq!(parse_date_attribute("2025-03-14T09:00:00+01:00"), Some(date(2025, 3, 14)));
        assert_eq!(parse_date_attribute("2025-03-14x"), None);
    }

    #[test]
    fn filson_weights_step_to_the_next_available() {
        assert_eq!(next_filson_weight(400, 100), 500);
        assert_eq!(next_filson_weight(450, 100), 600);
        assert_eq!(next_filson_weight(800, 200), 900);
        assert_eq!(parse_weight("700"), 700);
        assert_eq!(parse_weight("bold"), 700);
        assert_eq!(parse_weight(""), 400);
        assert_eq!(parse_weight("inherit"), 400);
        assert_eq!(weight_css(700), "var(--fw-bold, 700)");
        assert_eq!(weight_css(300), "300");
    }

    #[test]
    fn todays_row_emphasises_date_and_weekday_cells() {
        let cells = [
            RowCell {
                original_weight: 400,
                has_time: false,
                text: "14/3".to_string(),
            },
            RowCell {
                original_weight: 400,
                has_time: false,
                text: "Fredag".to_string(),
            },
            RowCell {
                original_weight: 400,
                has_time: false,
                text: "Bjärred centrum".to_string(),
            },
        ];
        let plan = plan_row_highlight(&cells, 200);
        assert_eq!(
            plan,
            vec![
                CellHighlight {
                    weight: 600,
                    date: true,
                    weekday: false
                },
                CellHighlight {
                    weight: 600,
                    date: false,
                    weekday: true
                },
                CellHighlight {
                    weight: 500,
                    date: false,
                    weekday: false
                },
            ]
        );
    }

    #[test]
    fn rows_resolve_dates_and_upcoming_windows() {
        let today = date(2025, 3, 14);
        assert_eq!(row_date(Some("2025-03-14"), Some("ignored"), 2025), Some(today));
        assert_eq!(row_date(None, Some("14 mars"), 2025), Some(today));
        assert_eq!(row_date(None, None, 2025), None);
        assert!(is_upcoming(today, today, 30));
        assert!(is_upcoming(date(2025, 4, 13), today, 30));
        assert!(!is_upcoming(date(2025, 4, 14), today, 30));
        assert!(!is_upcoming(date(2025, 3, 13), today, 30));
        assert!(is_upcoming(date(2031, 1, 1), today, u32::MAX));
        assert!(!is_upcoming(date(2025, 3, 13), today, u32::MAX));
    }
}
