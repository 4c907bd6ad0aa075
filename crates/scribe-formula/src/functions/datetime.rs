//! Date/time functions
//!
//! All built-ins read the clock from the evaluation context (`ctx.now`)
//! rather than the system, so a single preview cycle sees one consistent
//! instant and tests can pin time.

use std::fmt::Write as _;

use chrono::{Datelike, Duration, Months, Timelike};

use crate::error::{FormulaError, FormulaResult};
use crate::functions::{datetime_arg, number_arg, text_arg};
use scribe_core::{FormulaContext, Value};

/// TODAY()
///
/// Start of the current day in UTC.
pub fn fn_today(_args: &[Value], ctx: &FormulaContext) -> FormulaResult<Value> {
    let midnight = ctx
        .now
        .with_hour(0)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ctx.now);
    Ok(Value::DateTime(midnight))
}

/// NOW()
pub fn fn_now(_args: &[Value], ctx: &FormulaContext) -> FormulaResult<Value> {
    Ok(Value::DateTime(ctx.now))
}

/// DATEADD(date, amount, unit)
///
/// `unit` is one of years, months, weeks, days, hours, minutes, seconds
/// (singular accepted). Month/year arithmetic clamps to the end of the
/// target month, so Jan 31 + 1 month = Feb 28/29.
pub fn fn_dateadd(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let date = datetime_arg("DATEADD", args, 0)?;
    let amount = number_arg("DATEADD", args, 1)?;
    let unit = text_arg("DATEADD", args, 2)?;

    let whole = amount.trunc() as i64;
    let shifted = match normalize_unit(unit) {
        Some("years") => add_months(date, whole.saturating_mul(12)),
        Some("months") => add_months(date, whole),
        Some("weeks") => date.checked_add_signed(Duration::weeks(whole)),
        Some("days") => date.checked_add_signed(Duration::days(whole)),
        Some("hours") => date.checked_add_signed(Duration::hours(whole)),
        Some("minutes") => date.checked_add_signed(Duration::minutes(whole)),
        Some("seconds") => date.checked_add_signed(Duration::seconds(whole)),
        _ => {
            return Err(FormulaError::Runtime {
                function: "DATEADD".into(),
                arg: Some(2),
                message: format!("unknown unit '{}'", unit),
            })
        }
    };

    shifted
        .map(Value::DateTime)
        .ok_or_else(|| FormulaError::runtime("DATEADD", "date out of range"))
}

/// FORMATDATE(date, format)
///
/// `format` uses strftime-style specifiers, e.g. `"%Y-%m-%d"`.
pub fn fn_formatdate(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let date = datetime_arg("FORMATDATE", args, 0)?;
    let format = text_arg("FORMATDATE", args, 1)?;

    // chrono reports a bad specifier through fmt::Error; write into a
    // buffer instead of to_string() so it surfaces as a runtime error.
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        return Err(FormulaError::Runtime {
            function: "FORMATDATE".into(),
            arg: Some(1),
            message: format!("malformed format string '{}'", format),
        });
    }
    Ok(Value::Text(out))
}

/// DURATION(start, end, [unit])
///
/// Signed, fractional length of the interval in `unit` (default days).
pub fn fn_duration(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let start = datetime_arg("DURATION", args, 0)?;
    let end = datetime_arg("DURATION", args, 1)?;
    let unit = match args.get(2) {
        Some(_) => text_arg("DURATION", args, 2)?,
        None => "days",
    };

    let seconds = (end - start).num_milliseconds() as f64 / 1000.0;
    let scaled = match normalize_unit(unit) {
        Some("weeks") => seconds / 604_800.0,
        Some("days") => seconds / 86_400.0,
        Some("hours") => seconds / 3_600.0,
        Some("minutes") => seconds / 60.0,
        Some("seconds") => seconds,
        // Calendar-varying units (months, years) have no fixed length
        _ => {
            return Err(FormulaError::Runtime {
                function: "DURATION".into(),
                arg: Some(2),
                message: format!("unsupported unit '{}'", unit),
            })
        }
    };
    Ok(Value::Number(scaled))
}

/// DAYOFWEEK(date)
///
/// 1 (Monday) through 7 (Sunday).
pub fn fn_dayofweek(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let date = datetime_arg("DAYOFWEEK", args, 0)?;
    Ok(Value::Number(date.weekday().number_from_monday() as f64))
}

fn normalize_unit(unit: &str) -> Option<&'static str> {
    match unit.trim().to_ascii_lowercase().as_str() {
        "year" | "years" => Some("years"),
        "month" | "months" => Some("months"),
        "week" | "weeks" => Some("weeks"),
        "day" | "days" => Some("days"),
        "hour" | "hours" => Some("hours"),
        "minute" | "minutes" => Some("minutes"),
        "second" | "seconds" => Some("seconds"),
        _ => None,
    }
}

fn add_months(
    date: chrono::DateTime<chrono::Utc>,
    months: i64,
) -> Option<chrono::DateTime<chrono::Utc>> {
    let months_u32 = u32::try_from(months.unsigned_abs()).ok()?;
    if months >= 0 {
        date.checked_add_months(Months::new(months_u32))
    } else {
        date.checked_sub_months(Months::new(months_u32))
    }
}
