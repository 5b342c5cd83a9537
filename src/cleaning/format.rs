//! Cell formatter: abbreviation expansion, date parsing and text normalization.
//!
//! The same [`format_table`] runs on the historical batch and, through
//! [`format_record`], on a single record submitted for prediction. Text
//! normalization replaces a fixed character set ([`SEPARATOR_CHARS`]) instead
//! of whatever punctuation happens to occur in a batch, so a record formats
//! identically whether it is cleaned alone or with the training corpus.
//!
//! Formatting is idempotent: an expanded or normalized value never matches a
//! code on a later pass.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::table::{Column, ColumnData, Record, Table};

/// Version tag of [`SEPARATOR_CHARS`]. Bump it whenever the set changes, since
/// encoders fitted on text normalized with one set cannot serve another.
pub const SEPARATOR_SET_VERSION: &str = "v1";

/// Characters replaced by `_` in every text cell.
pub const SEPARATOR_CHARS: [char; 9] = [' ', '-', '\'', ',', '(', ')', '/', '&', '.'];

/// Unit-type codes of the training file.
pub const UNIT_TYPES: [(&str, &str); 3] = [("h", "House"), ("u", "Duplex"), ("t", "Town House")];

/// Sale-method codes of the training file.
pub const SALE_METHODS: [(&str, &str); 9] = [
    ("S", "Sold"),
    ("SP", "Sold Prior"),
    ("PI", "Passed In"),
    ("VB", "Vendor Bid"),
    ("SN", "Sold Not Disclosed"),
    ("PN", "Sold Prior Not Disclosed"),
    ("SA", "Sold After Auction"),
    ("W", "Withdrawn Prior to Auction"),
    ("SS", "Sold After Auction Not Disclosed"),
];

/// Council names carry this suffix in the raw data.
pub const COUNCIL_SUFFIX: &str = " Council";

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Trim, title-case, replace separators with `_` and strip edge underscores.
pub fn normalize_text(raw: &str) -> String {
    title_case(raw.trim())
        .chars()
        .map(|c| if SEPARATOR_CHARS.contains(&c) { '_' } else { c })
        .collect::<String>()
        .trim_matches(|c: char| c == '_' || c.is_whitespace())
        .to_string()
}

/// Title-case the way word-capitalizing string methods usually do: a letter is
/// upper-cased when the previous character is not a letter, lower-cased otherwise.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        let mapped = if prev_is_letter {
            single_char(c.to_lowercase(), c)
        } else {
            single_char(c.to_uppercase(), c)
        };
        out.push(mapped);
        prev_is_letter = c.is_alphabetic();
    }
    out
}

// Case mappings that expand to several characters would break idempotence.
fn single_char(mut mapped: impl Iterator<Item = char>, original: char) -> char {
    match (mapped.next(), mapped.next()) {
        (Some(c), None) => c,
        _ => original,
    }
}

fn lookup<'a>(table: &[(&str, &'a str)], matches: impl Fn(&str) -> bool) -> Option<&'a str> {
    table
        .iter()
        .find(|(code, _)| matches(code))
        .map(|(_, expanded)| *expanded)
}

/// Expand a unit-type code. The match is exact on the trimmed cell, so `H` or
/// any other code passes through unchanged.
pub fn expand_unit_type(raw: &str) -> String {
    let key = raw.trim();
    lookup(&UNIT_TYPES, |code| code == key).map_or_else(|| raw.to_string(), str::to_string)
}

/// Expand a sale-method code. Unknown codes pass through unchanged.
///
/// Unlike [`expand_unit_type`] this ignores case. Sale-method codes are upper
/// case, so a cell such as `s` normalizes to `S`; matching normalized keys
/// expands it on the first pass instead of the second.
pub fn expand_sale_method(raw: &str) -> String {
    let key = normalize_text(raw);
    lookup(&SALE_METHODS, |code| normalize_text(code) == key)
        .map_or_else(|| raw.to_string(), str::to_string)
}

/// Remove every [`COUNCIL_SUFFIX`] from a trimmed council name.
pub fn strip_council_suffix(raw: &str) -> String {
    raw.trim().replace(COUNCIL_SUFFIX, "")
}

/// Parse a sale date written in any of the accepted formats.
///
/// Numeric dates separated by `/` or `-` are month-first (`3/12/2016` is
/// 12 March 2016) unless the first field is above 12, in which case they are
/// day-first (`15/03/2017`). Two-digit years fall in 1969..=2068. ISO dates,
/// ISO date-times and month names (`Mar 15, 2017`, `15 March 2017`) are
/// accepted as well. The time of day is discarded.
pub fn parse_sale_date(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();

    if let Some(date) = numeric_date(s) {
        return Ok(date);
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(PipelineError::DateParse {
        value: raw.to_string(),
    })
}

/// `m/d/y`, `d/m/y` and their `-` forms, with an optional time of day.
fn numeric_date(s: &str) -> Option<NaiveDate> {
    let (date, time) = match s.split_once(' ') {
        Some((date, time)) => (date, Some(time.trim())),
        None => (s, None),
    };
    if let Some(time) = time {
        TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(time, fmt).ok())?;
    }

    let separator = if date.contains('/') { '/' } else { '-' };
    let fields: Vec<&str> = date.split(separator).collect();
    let [first, second, year] = fields.as_slice() else {
        return None;
    };
    if ![first, second, year]
        .iter()
        .all(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
        || first.len() > 2
        || second.len() > 2
    {
        return None;
    }

    let first: u32 = first.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    let year: i32 = match year.len() {
        2 => {
            let yy: i32 = year.parse().ok()?;
            if yy < 69 {
                2000 + yy
            } else {
                1900 + yy
            }
        }
        4 => year.parse().ok()?,
        _ => return None,
    };
    let (month, day) = if first > 12 {
        (second, first)
    } else {
        (first, second)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn map_text(table: &mut Table, name: &str, f: impl Fn(&str) -> String) {
    if let Some(column) = table.column_mut(name) {
        if let ColumnData::Text(values) = column.data_mut() {
            for value in values.iter_mut().flatten() {
                *value = f(value);
            }
        }
    }
}

/// Run every formatting step over a table.
///
/// Steps, in order: unit-type codes, sale-method codes, sale-date parsing,
/// council suffix, text normalization of every text column.
///
/// # Errors
/// [`PipelineError::DateParse`] when any sale date is malformed. The whole
/// batch is rejected.
pub fn format_table(mut table: Table) -> Result<Table> {
    map_text(&mut table, "UnitType", expand_unit_type);
    map_text(&mut table, "SaleMethod", expand_sale_method);

    if let Some(column) = table.column("SaleDate") {
        if let ColumnData::Text(values) = column.data() {
            let dates = values
                .iter()
                .map(|v| v.as_deref().map(parse_sale_date).transpose())
                .collect::<Result<Vec<_>>>()?;
            table.set_column(Column::date("SaleDate", dates))?;
        }
    }

    map_text(&mut table, "CouncilArea", strip_council_suffix);

    let text_columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| c.kind().is_text())
        .map(|c| c.name().to_string())
        .collect();
    for name in &text_columns {
        map_text(&mut table, name, normalize_text);
    }

    debug!(
        rows = table.n_rows(),
        text_columns = text_columns.len(),
        separators = SEPARATOR_SET_VERSION,
        "formatted cells"
    );
    Ok(table)
}

/// Format a single record through the batch formatter.
pub fn format_record(record: &Record) -> Result<Record> {
    let table = format_table(Table::from_records(std::slice::from_ref(record))?)?;
    Ok(table.row(0))
}
