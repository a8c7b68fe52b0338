//! Lenient IGC track-log parser.
//!
//! IGC files are line-oriented ASCII: `B` records carry position fixes,
//! `H` records carry the flight date and free-text metadata, and `C`
//! records declare a task. Malformed lines are skipped and malformed
//! headers leave their field unset; the only hard failure is a file with
//! no decodable fixes at all.
//!
//! Reference: https://xp-soaring.github.io/igc_file_format/igc_format_2008.html

use crate::processing::types::{Fix, IgcProcessError, ParsedTrack, TrackHeaders};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

pub fn parse_igc(raw: &str) -> Result<ParsedTrack, IgcProcessError> {
    let mut headers = TrackHeaders::default();
    let mut task_name: Option<String> = None;
    let mut date: Option<NaiveDate> = None;
    let mut fixes = Vec::new();

    // Midnight rollover state: IGC fixes carry only a time of day, so a
    // decrease relative to the previous fix means the flight crossed into
    // the next UTC day.
    let mut last_time: Option<NaiveTime> = None;
    let mut day_offset: i64 = 0;

    for line in raw.lines() {
        let line = line.trim();
        match line.as_bytes().first().copied() {
            Some(b'H') => parse_header_line(line, &mut headers, &mut date),
            Some(b'C') => {
                if task_name.is_none() {
                    task_name = parse_task_declaration(line);
                }
            }
            Some(b'B') => {
                let Some((time, partial)) = parse_b_record(line) else {
                    continue;
                };
                if last_time.is_some_and(|prev| time < prev) {
                    day_offset += 1;
                }
                last_time = Some(time);

                let base = date.unwrap_or_else(fallback_date);
                let timestamp = NaiveDateTime::new(base + Duration::days(day_offset), time);
                fixes.push(Fix {
                    latitude: partial.latitude,
                    longitude: partial.longitude,
                    timestamp: timestamp.and_utc(),
                    gps_altitude: partial.gps_altitude,
                    pressure_altitude: partial.pressure_altitude,
                });
            }
            _ => {}
        }
    }

    if fixes.is_empty() {
        return Err(IgcProcessError::NoFixes);
    }

    Ok(ParsedTrack {
        fixes,
        headers,
        task_name,
    })
}

/// Position pieces of a B-record before the date is attached.
struct PartialFix {
    latitude: f64,
    longitude: f64,
    gps_altitude: Option<i32>,
    pressure_altitude: Option<i32>,
}

/// Decode one B-record:
/// `B HHMMSS DDMMmmm[N|S] DDDMMmmm[E|W] [A|V] PPPPP GGGGG`
/// (time of day, latitude, longitude, fix validity, pressure altitude,
/// GPS altitude). Anything off-layout comes back `None` and is skipped.
fn parse_b_record(line: &str) -> Option<(NaiveTime, PartialFix)> {
    if !line.is_ascii() || line.len() < 25 {
        return None;
    }

    let time = parse_time(line.get(1..7)?)?;
    let latitude = parse_latitude(line.get(7..15)?)?;
    let longitude = parse_longitude(line.get(15..24)?)?;
    let validity = line.as_bytes()[24];

    let pressure_altitude = line.get(25..30).and_then(parse_altitude);
    // A `V` validity flag means no 3D fix, so the GPS altitude digits are
    // meaningless even when present.
    let gps_altitude = if validity == b'A' {
        line.get(30..35).and_then(parse_altitude)
    } else {
        None
    };

    Some((
        time,
        PartialFix {
            latitude,
            longitude,
            gps_altitude,
            pressure_altitude,
        },
    ))
}

fn parse_time(field: &str) -> Option<NaiveTime> {
    if field.len() != 6 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = field[0..2].parse().ok()?;
    let minute: u32 = field[2..4].parse().ok()?;
    let second: u32 = field[4..6].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// `DDMMmmm[N|S]`: degrees, minutes, thousandths of minutes, hemisphere.
fn parse_latitude(field: &str) -> Option<f64> {
    if field.len() != 8 {
        return None;
    }
    let degrees: f64 = field[0..2].parse().ok()?;
    let minutes = parse_minutes(&field[2..7])?;
    let value = degrees + minutes / 60.0;
    if value > 90.0 {
        return None;
    }
    match field.as_bytes()[7] {
        b'N' => Some(value),
        b'S' => Some(-value),
        _ => None,
    }
}

/// `DDDMMmmm[E|W]`.
fn parse_longitude(field: &str) -> Option<f64> {
    if field.len() != 9 {
        return None;
    }
    let degrees: f64 = field[0..3].parse().ok()?;
    let minutes = parse_minutes(&field[3..8])?;
    let value = degrees + minutes / 60.0;
    if value > 180.0 {
        return None;
    }
    match field.as_bytes()[8] {
        b'E' => Some(value),
        b'W' => Some(-value),
        _ => None,
    }
}

fn parse_minutes(field: &str) -> Option<f64> {
    if field.len() != 5 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: f64 = field[0..2].parse().ok()?;
    let thousandths: f64 = field[2..5].parse().ok()?;
    Some(whole + thousandths / 1000.0)
}

/// Five-digit altitude field, optionally with a leading `-`. Recorders write
/// all zeroes when the corresponding sensor has no reading, so `00000` maps
/// to absent rather than sea level.
fn parse_altitude(field: &str) -> Option<i32> {
    if field == "00000" {
        return None;
    }
    field.parse().ok()
}

fn parse_header_line(line: &str, headers: &mut TrackHeaders, date: &mut Option<NaiveDate>) {
    let Some(subtype) = line.get(2..5) else {
        return;
    };
    if subtype == "DTE" {
        if date.is_none() {
            *date = parse_date_header(line);
        }
        return;
    }

    // Everything else is "code, long name, colon, value".
    let Some(value) = header_value(line) else {
        return;
    };
    let slot = match subtype {
        "PLT" => &mut headers.pilot,
        "GTY" => &mut headers.glider_type,
        "GID" => &mut headers.glider_id,
        "CID" => &mut headers.competition_id,
        "SIT" => &mut headers.site,
        "FTY" => &mut headers.recorder,
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(value);
    }
}

fn header_value(line: &str) -> Option<String> {
    let (_, value) = line.split_once(':')?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// `HFDTE280825` or the newer `HFDTEDATE:280825,01`; the first six digits
/// after the record code are DDMMYY.
fn parse_date_header(line: &str) -> Option<NaiveDate> {
    let rest = line.get(5..)?;
    let digits: String = rest
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take(6)
        .collect();
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let day: u32 = digits[0..2].parse().ok()?;
    let month: u32 = digits[2..4].parse().ok()?;
    let yy: i32 = digits[4..6].parse().ok()?;
    // Two-digit year pivot: anything from 80 up is a 20th-century logger.
    let year = if yy >= 80 { 1900 + yy } else { 2000 + yy };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Date used when a track carries no `HFDTE` header. The IGC spec requires
/// one, but damaged files turn up without it and their fixes are still worth
/// keeping; only relative times matter for metrics.
fn fallback_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

/// A task declaration C-record starts with twelve digits (declaration date
/// and time); turnpoint C-records start with a latitude instead. The task
/// name is whatever free text follows the fixed fields.
fn parse_task_declaration(line: &str) -> Option<String> {
    let prefix = line.get(1..13)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let name = line.get(25..)?.trim();
    (!name.is_empty()).then(|| name.to_string())
}
