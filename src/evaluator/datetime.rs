//! .NET-style date format support
//!
//! The template surface uses .NET format strings (`dd-MM-yyyy`). Parsing
//! maps the tokens onto chrono specifiers; rendering walks the tokens
//! directly so month and weekday names come from fixed Italian tables,
//! keeping output independent of the host locale.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{Result, TemplateError};

const MONTHS_FULL: [&str; 12] = [
    "gennaio",
    "febbraio",
    "marzo",
    "aprile",
    "maggio",
    "giugno",
    "luglio",
    "agosto",
    "settembre",
    "ottobre",
    "novembre",
    "dicembre",
];

const MONTHS_ABBR: [&str; 12] = [
    "gen", "feb", "mar", "apr", "mag", "giu", "lug", "ago", "set", "ott", "nov", "dic",
];

// indexed by Weekday::num_days_from_monday
const DAYS_FULL: [&str; 7] = [
    "lunedì",
    "martedì",
    "mercoledì",
    "giovedì",
    "venerdì",
    "sabato",
    "domenica",
];

const DAYS_ABBR: [&str; 7] = ["lun", "mar", "mer", "gio", "ven", "sab", "dom"];

/// One lexed piece of a .NET format string.
enum Piece {
    /// A run of a repeated format letter, e.g. `dd` -> ('d', 2)
    Token(char, usize),
    /// Literal text, either separators or a `'...'` quoted run
    Literal(String),
}

fn lex(format: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut chars = format.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch == '\'' {
            chars.next();
            let mut literal = String::new();
            for c in chars.by_ref() {
                if c == '\'' {
                    break;
                }
                literal.push(c);
            }
            pieces.push(Piece::Literal(literal));
        } else if ch.is_ascii_alphabetic() {
            let mut count = 0;
            while chars.peek() == Some(&ch) {
                chars.next();
                count += 1;
            }
            pieces.push(Piece::Token(ch, count));
        } else {
            chars.next();
            match pieces.last_mut() {
                Some(Piece::Literal(text)) => text.push(ch),
                _ => pieces.push(Piece::Literal(ch.to_string())),
            }
        }
    }
    pieces
}

/// Convert a .NET format to a chrono specifier string, reporting whether any
/// time-of-day token is present.
fn to_strftime(format: &str) -> Result<(String, bool)> {
    let mut out = String::new();
    let mut has_time = false;

    for piece in lex(format) {
        match piece {
            Piece::Literal(text) => out.push_str(&text.replace('%', "%%")),
            Piece::Token(ch, count) => {
                let spec = match (ch, count) {
                    ('y', 3..) => "%Y",
                    ('y', _) => "%y",
                    ('M', 4..) => "%B",
                    ('M', 3) => "%b",
                    ('M', _) => "%m",
                    ('d', 4..) => "%A",
                    ('d', 3) => "%a",
                    ('d', _) => "%d",
                    ('H', _) => {
                        has_time = true;
                        "%H"
                    }
                    ('h', _) => {
                        has_time = true;
                        "%I"
                    }
                    ('m', _) => {
                        has_time = true;
                        "%M"
                    }
                    ('s', _) => {
                        has_time = true;
                        "%S"
                    }
                    ('f', 3) => {
                        has_time = true;
                        "%3f"
                    }
                    ('t', _) => {
                        has_time = true;
                        "%p"
                    }
                    _ => {
                        return Err(TemplateError::invalid_argument(format!(
                            "unsupported date format token '{}' in '{format}'",
                            ch.to_string().repeat(count)
                        )));
                    }
                };
                out.push_str(spec);
            }
        }
    }
    Ok((out, has_time))
}

/// Parse `input` strictly against a .NET-style format.
pub fn parse_exact(input: &str, format: &str) -> Result<NaiveDateTime> {
    let (spec, has_time) = to_strftime(format)?;
    let parsed = if has_time {
        NaiveDateTime::parse_from_str(input, &spec)
    } else {
        NaiveDate::parse_from_str(input, &spec).map(|d| d.and_time(NaiveTime::MIN))
    };
    parsed.map_err(|_| TemplateError::format_error(input, format))
}

/// Render a date with a .NET-style format under the fixed locale.
pub fn render(date: &NaiveDateTime, format: &str) -> Result<String> {
    let mut out = String::new();

    for piece in lex(format) {
        match piece {
            Piece::Literal(text) => out.push_str(&text),
            Piece::Token(ch, count) => match (ch, count) {
                ('y', 3..) => out.push_str(&format!("{:04}", date.year())),
                ('y', _) => out.push_str(&format!("{:02}", date.year().rem_euclid(100))),
                ('M', 4..) => out.push_str(MONTHS_FULL[date.month0() as usize]),
                ('M', 3) => out.push_str(MONTHS_ABBR[date.month0() as usize]),
                ('M', 2) => out.push_str(&format!("{:02}", date.month())),
                ('M', _) => out.push_str(&date.month().to_string()),
                ('d', 4..) => {
                    out.push_str(DAYS_FULL[date.weekday().num_days_from_monday() as usize])
                }
                ('d', 3) => out.push_str(DAYS_ABBR[date.weekday().num_days_from_monday() as usize]),
                ('d', 2) => out.push_str(&format!("{:02}", date.day())),
                ('d', _) => out.push_str(&date.day().to_string()),
                ('H', 2..) => out.push_str(&format!("{:02}", date.hour())),
                ('H', _) => out.push_str(&date.hour().to_string()),
                ('h', 2..) => out.push_str(&format!("{:02}", date.hour12().1)),
                ('h', _) => out.push_str(&date.hour12().1.to_string()),
                ('m', 2..) => out.push_str(&format!("{:02}", date.minute())),
                ('m', _) => out.push_str(&date.minute().to_string()),
                ('s', 2..) => out.push_str(&format!("{:02}", date.second())),
                ('s', _) => out.push_str(&date.second().to_string()),
                ('f', 3) => out.push_str(&format!("{:03}", date.nanosecond() / 1_000_000)),
                ('t', _) => out.push_str(if date.hour() < 12 { "AM" } else { "PM" }),
                _ => {
                    return Err(TemplateError::invalid_argument(format!(
                        "unsupported date format token '{}' in '{format}'",
                        ch.to_string().repeat(count)
                    )));
                }
            },
        }
    }
    Ok(out)
}

/// Parse `input` against `original` and re-render it with `output`.
pub fn reformat(input: &str, original: &str, output: &str) -> Result<String> {
    let date = parse_exact(input, original)?;
    render(&date, output)
}
