// Record ingest: tooltip-shaped player payloads (JSON) joined with a
// transfer-listing CSV carrying price and the prior SI snapshot.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::candidate::{AgeFraction, CandidateInput};
use crate::engine::rating::MAX_GRADE;
use crate::position::{parse_position_list, PositionCategory};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One player as described by the tooltip payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipRecord {
    pub player_id: u64,
    pub name: String,
    pub age: Option<AgeFraction>,
    pub is_goalkeeper: bool,
    pub positions: Vec<PositionCategory>,
    /// Grades in tooltip order.
    pub skills: Vec<u8>,
    pub current_si: Option<f64>,
    pub conditioning: Option<f64>,
    pub wage: Option<u64>,
}

/// One row of the transfer listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListingEntry {
    pub player_id: u64,
    pub price: Option<f64>,
    pub prior_si: Option<f64>,
}

// ---------------------------------------------------------------------------
// Raw serde structs (private)
// ---------------------------------------------------------------------------

/// Tooltip payload. Numbers arrive as JSON numbers or as display strings
/// ("14,500"), so every scalar is kept as a raw `Value`.
#[derive(Debug, Deserialize)]
struct RawTooltipPlayer {
    #[serde(default)]
    player_id: Value,
    #[serde(default)]
    name: String,
    #[serde(default)]
    age: Value,
    #[serde(default)]
    months: Value,
    #[serde(default)]
    skill_index: Value,
    #[serde(default)]
    routine: Value,
    #[serde(default)]
    wage: Value,
    #[serde(default)]
    fp: String,
    #[serde(default)]
    favposition: String,
    #[serde(default)]
    skills: Vec<RawSkill>,
}

#[derive(Debug, Deserialize)]
struct RawSkill {
    #[serde(default)]
    value: Value,
}

/// Listing CSV row. Price and prior SI are display text ("1.2m", "14,000").
#[derive(Debug, Deserialize)]
struct RawListingRow {
    player_id: u64,
    #[serde(default)]
    price: String,
    #[serde(default)]
    prior_si: String,
}

// ---------------------------------------------------------------------------
// Loose number parsing
// ---------------------------------------------------------------------------

/// Digits of the first number in `s`, separators dropped ("14,500 SI" -> 14500).
pub fn parse_int_loose(s: &str) -> Option<u64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ',') || c.is_whitespace())
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// First signed decimal in `s`.
///
/// A lone `,` is read as the decimal separator ("35,2"). When both `,` and
/// `.` appear, `,` is a thousands separator ("1,234.5").
pub fn parse_float_loose(s: &str) -> Option<f64> {
    let s = s.replace('\u{a0}', " ");
    let bytes = s.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let negative = start > 0 && bytes[start - 1] == b'-';

    let number: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
        .collect();
    let normalized = match (number.contains(','), number.contains('.')) {
        (true, false) => number.replace(',', "."),
        (true, true) => number.replace(',', ""),
        _ => number,
    };

    let value = parse_leading_float(&normalized)?;
    let value = if negative { -value } else { value };
    value.is_finite().then_some(value)
}

/// Longest prefix that parses as a float ("1.2.3" -> 1.2).
fn parse_leading_float(s: &str) -> Option<f64> {
    let mut seen_dot = false;
    let end = s
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' {
                if seen_dot {
                    return true;
                }
                seen_dot = true;
                return false;
            }
            !c.is_ascii_digit()
        })
        .map_or(s.len(), |(i, _)| i);
    s[..end].trim_end_matches('.').parse().ok()
}

/// Listed price with `k`/`m` suffixes expanded ("1.5m" -> 1500000).
pub fn parse_price(s: &str) -> Option<f64> {
    let value = parse_float_loose(s)?;
    let lower = s.to_lowercase();
    if lower.contains('m') {
        Some(value * 1_000_000.0)
    } else if lower.contains('k') {
        Some(value * 1_000.0)
    } else {
        Some(value)
    }
}

/// Whole number from a JSON number or a display string. A JSON number must
/// be a non-negative integer value (`14500` or `14500.0`); only strings go
/// through loose digit parsing.
fn value_int(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|x| x.is_finite() && *x >= 0.0 && x.fract() == 0.0 && *x <= u64::MAX as f64)
                .map(|x| x as u64)
        }),
        Value::String(s) => parse_int_loose(s),
        _ => None,
    }
}

fn value_float(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => parse_float_loose(s),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

/// Grade of a tooltip skill entry, `None` for an empty slot.
///
/// Non-numeric markers stand for the top grades: one mentioning "silver" is
/// 19, anything else is 20. Numeric grades above 20 are dropped.
pub fn tooltip_grade(v: &Value) -> Option<u8> {
    let numeric = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(x) => Some(x),
            Err(_) if s.contains("silver") => return Some(MAX_GRADE - 1),
            Err(_) => return Some(MAX_GRADE),
        },
        _ => return None,
    }?;
    if !numeric.is_finite() || numeric <= 0.0 {
        return None;
    }
    let grade = numeric.round().max(1.0);
    if grade > MAX_GRADE as f64 {
        warn!("dropping out-of-range skill grade {}", numeric);
        return None;
    }
    Some(grade as u8)
}

/// Tooltip slot order of a goalkeeper's mapped skill vector.
const GOALKEEPER_SLOT_ORDER: [usize; 11] = [0, 2, 4, 1, 3, 5, 6, 7, 8, 9, 10];

/// Reorder tooltip grades into the weight-table slot order of `position`.
///
/// Goalkeepers follow a fixed permutation; outfielders take the
/// even-indexed entries followed by the odd-indexed ones.
pub fn map_tooltip_skills(tooltip: &[u8], position: PositionCategory) -> Vec<u8> {
    if position.is_goalkeeper() {
        GOALKEEPER_SLOT_ORDER
            .iter()
            .filter_map(|&i| tooltip.get(i).copied())
            .collect()
    } else {
        tooltip
            .iter()
            .step_by(2)
            .chain(tooltip.iter().skip(1).step_by(2))
            .copied()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn tooltip_from_raw(raw: RawTooltipPlayer) -> Option<TooltipRecord> {
    let Some(player_id) = value_int(&raw.player_id) else {
        warn!("skipping tooltip record '{}': missing player_id", raw.name.trim());
        return None;
    };

    let positions = parse_position_list(&raw.favposition);
    let is_goalkeeper = if raw.fp.trim().is_empty() {
        positions.first().is_some_and(|p| p.is_goalkeeper())
    } else {
        raw.fp.trim().eq_ignore_ascii_case("gk")
    };

    let age = value_int(&raw.age).and_then(|years| {
        let years = u32::try_from(years).ok()?;
        let months = value_int(&raw.months).unwrap_or(0);
        Some(AgeFraction::new(years, i64::try_from(months).unwrap_or(i64::MAX)))
    });

    Some(TooltipRecord {
        player_id,
        name: raw.name.trim().to_string(),
        age,
        is_goalkeeper,
        positions,
        skills: raw.skills.iter().filter_map(|s| tooltip_grade(&s.value)).collect(),
        current_si: value_int(&raw.skill_index).map(|si| si as f64),
        conditioning: value_float(&raw.routine),
        wage: value_int(&raw.wage),
    })
}

/// Accepts a JSON array of player objects, each optionally wrapped as
/// `{"player": {...}}`. Malformed entries are skipped with a warning.
fn load_tooltips_from_reader<R: Read>(rdr: R) -> Result<Vec<TooltipRecord>, serde_json::Error> {
    let entries: Vec<Value> = serde_json::from_reader(rdr)?;
    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry = match entry {
            Value::Object(mut map) if map.contains_key("player") => {
                map.remove("player").unwrap_or(Value::Null)
            }
            other => other,
        };
        match serde_json::from_value::<RawTooltipPlayer>(entry) {
            Ok(raw) => records.extend(tooltip_from_raw(raw)),
            Err(e) => warn!("skipping malformed tooltip record: {}", e),
        }
    }
    Ok(records)
}

fn load_listing_from_reader<R: Read>(rdr: R) -> Result<HashMap<u64, ListingEntry>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut listing = HashMap::new();
    for result in reader.deserialize::<RawListingRow>() {
        match result {
            Ok(raw) => {
                let entry = ListingEntry {
                    player_id: raw.player_id,
                    price: parse_price(&raw.price),
                    prior_si: parse_int_loose(&raw.prior_si).map(|si| si as f64),
                };
                if listing.insert(raw.player_id, entry).is_some() {
                    warn!("duplicate listing row for player {}, using latest", raw.player_id);
                }
            }
            Err(e) => {
                warn!("skipping malformed listing row: {}", e);
            }
        }
    }
    Ok(listing)
}

// ---------------------------------------------------------------------------
// Joining
// ---------------------------------------------------------------------------

/// Combine tooltip records with listing rows by player id, keeping tooltip
/// order. Candidates without a listing row have no price or prior SI.
pub fn join_records(
    tooltips: Vec<TooltipRecord>,
    listing: &HashMap<u64, ListingEntry>,
) -> Vec<CandidateInput> {
    tooltips
        .into_iter()
        .map(|t| {
            let row = listing.get(&t.player_id);
            if row.is_none() {
                debug!(player_id = t.player_id, "no listing row, price and prior SI absent");
            }
            let primary = if t.is_goalkeeper {
                PositionCategory::Goalkeeper
            } else {
                t.positions
                    .iter()
                    .copied()
                    .find(|p| !p.is_goalkeeper())
                    .unwrap_or(PositionCategory::CentreBack)
            };
            CandidateInput {
                player_id: t.player_id,
                name: t.name,
                age: t.age,
                primary,
                positions: t.positions,
                tooltip_skills: t.skills,
                wage: t.wage,
                conditioning: t.conditioning,
                price: row.and_then(|r| r.price),
                current_si: t.current_si,
                prior_si: row.and_then(|r| r.prior_si),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load tooltip records from a JSON file.
pub fn load_tooltips(path: &Path) -> Result<Vec<TooltipRecord>, RecordError> {
    let file = std::fs::File::open(path).map_err(|e| RecordError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_tooltips_from_reader(std::io::BufReader::new(file)).map_err(|e| RecordError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load the transfer listing from a CSV file, keyed by player id.
pub fn load_listing(path: &Path) -> Result<HashMap<u64, ListingEntry>, RecordError> {
    let file = std::fs::File::open(path).map_err(|e| RecordError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_listing_from_reader(file).map_err(|e| RecordError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load and join both sources. The listing is optional.
pub fn load_candidates(
    tooltip_path: &Path,
    listing_path: Option<&Path>,
) -> Result<Vec<CandidateInput>, RecordError> {
    let tooltips = load_tooltips(tooltip_path)?;
    if tooltips.is_empty() {
        return Err(RecordError::Validation(
            "tooltip file produced zero valid records".into(),
        ));
    }
    let listing = match listing_path {
        Some(path) => load_listing(path)?,
        None => HashMap::new(),
    };
    info!(
        "loaded {} candidates ({} listing rows)",
        tooltips.len(),
        listing.len()
    );
    Ok(join_records(tooltips, &listing))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- Loose parsing --

    #[test]
    fn int_loose_drops_separators() {
        assert_eq!(parse_int_loose("14,500"), Some(14_500));
        assert_eq!(parse_int_loose("SI: 1.234.567 "), Some(1_234_567));
        assert_eq!(parse_int_loose("12 000 kr"), Some(12_000));
        assert_eq!(parse_int_loose("-"), None);
    }

    #[test]
    fn float_loose_handles_decimal_comma() {
        assert_eq!(parse_float_loose("35,2"), Some(35.2));
        assert_eq!(parse_float_loose("1,234.5"), Some(1234.5));
        assert_eq!(parse_float_loose("-3.5"), Some(-3.5));
        assert_eq!(parse_float_loose("routine 12"), Some(12.0));
        assert_eq!(parse_float_loose("n/a"), None);
    }

    #[test]
    fn price_suffixes() {
        assert_eq!(parse_price("1.5m"), Some(1_500_000.0));
        assert_eq!(parse_price("850k"), Some(850_000.0));
        assert_eq!(parse_price("2,5M"), Some(2_500_000.0));
        assert_eq!(parse_price("12000"), Some(12_000.0));
        assert_eq!(parse_price(""), None);
    }

    // -- Skills --

    #[test]
    fn grade_markers() {
        assert_eq!(tooltip_grade(&json!(15)), Some(15));
        assert_eq!(tooltip_grade(&json!("17")), Some(17));
        assert_eq!(tooltip_grade(&json!("<img src='star_silver.png'>")), Some(19));
        assert_eq!(tooltip_grade(&json!("<img src='star.png'>")), Some(20));
        assert_eq!(tooltip_grade(&json!(0)), None);
        assert_eq!(tooltip_grade(&json!(20.4)), Some(20));
        assert_eq!(tooltip_grade(&json!(21)), None);
        assert_eq!(tooltip_grade(&json!("35")), None);
        assert_eq!(tooltip_grade(&json!("")), None);
        assert_eq!(tooltip_grade(&Value::Null), None);
    }

    #[test]
    fn outfield_mapping_takes_evens_then_odds() {
        let tooltip: Vec<u8> = (1..=14).collect();
        let mapped = map_tooltip_skills(&tooltip, PositionCategory::CentralMidfield);
        assert_eq!(mapped, vec![1, 3, 5, 7, 9, 11, 13, 2, 4, 6, 8, 10, 12, 14]);
    }

    #[test]
    fn goalkeeper_mapping_uses_fixed_order() {
        let tooltip: Vec<u8> = (1..=11).collect();
        let mapped = map_tooltip_skills(&tooltip, PositionCategory::Goalkeeper);
        assert_eq!(mapped, vec![1, 3, 5, 2, 4, 6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn short_goalkeeper_tooltip_skips_missing_slots() {
        let mapped = map_tooltip_skills(&[1, 2, 3], PositionCategory::Goalkeeper);
        assert_eq!(mapped, vec![1, 3, 2]);
    }

    // -- Tooltip JSON --

    #[test]
    fn tooltip_json_parses_display_strings() {
        let data = json!([
            {
                "player": {
                    "player_id": "130000001",
                    "name": " Young Keeper ",
                    "age": "18",
                    "months": "3",
                    "skill_index": "9,000",
                    "routine": "20,0",
                    "wage": "30,000",
                    "fp": "GK",
                    "favposition": "gk",
                    "skills": [{"name": "Handling", "value": 15}, {"value": "<img silver>"}]
                }
            },
            {
                "player_id": 101,
                "name": "Winger",
                "age": 22,
                "months": 14,
                "skill_index": 5000,
                "routine": 3.5,
                "wage": 4000,
                "fp": "OMR",
                "favposition": "omr,fc",
                "skills": [{"value": 12}, {"value": null}, {"value": 11}]
            }
        ])
        .to_string();

        let records = load_tooltips_from_reader(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        let gk = &records[0];
        assert_eq!(gk.player_id, 130_000_001);
        assert_eq!(gk.name, "Young Keeper");
        assert_eq!(gk.age, Some(AgeFraction::new(18, 3)));
        assert!(gk.is_goalkeeper);
        assert_eq!(gk.skills, vec![15, 19]);
        assert_eq!(gk.current_si, Some(9_000.0));
        assert_eq!(gk.conditioning, Some(20.0));
        assert_eq!(gk.wage, Some(30_000));

        let winger = &records[1];
        assert!(!winger.is_goalkeeper);
        assert_eq!(
            winger.positions,
            vec![PositionCategory::AttackingWing, PositionCategory::Forward]
        );
        assert_eq!(winger.age.map(|a| a.months), Some(11));
        assert_eq!(winger.skills, vec![12, 11]);
    }

    #[test]
    fn tooltip_json_float_formatted_integers() {
        let data = json!([{
            "player_id": 100.0,
            "name": "Float Fields",
            "age": 24.0,
            "months": 6.0,
            "skill_index": 14500.0,
            "routine": 35.2,
            "wage": 12000.0,
            "fp": "DMC",
            "favposition": "dmc",
            "skills": [{"value": 15.0}, {"value": 14}, {"value": 25}]
        }])
        .to_string();

        let records = load_tooltips_from_reader(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.player_id, 100);
        assert_eq!(r.age, Some(AgeFraction::new(24, 6)));
        assert_eq!(r.current_si, Some(14_500.0));
        assert_eq!(r.wage, Some(12_000));
        assert_eq!(r.skills, vec![15, 14]);
    }

    #[test]
    fn fractional_or_negative_json_numbers_are_not_integers() {
        assert_eq!(value_int(&json!(14500.5)), None);
        assert_eq!(value_int(&json!(-3)), None);
        assert_eq!(value_int(&json!(14500)), Some(14_500));
        assert_eq!(value_int(&json!("14,500")), Some(14_500));
    }

    #[test]
    fn tooltip_without_player_id_is_skipped() {
        let data = r#"[{"name": "Nobody"}, {"player_id": 7, "name": "Somebody"}, 42]"#;
        let records = load_tooltips_from_reader(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].player_id, 7);
        assert_eq!(records[0].age, None);
        assert!(records[0].positions.is_empty());
    }

    #[test]
    fn tooltip_file_must_be_an_array() {
        assert!(load_tooltips_from_reader(r#"{"player_id": 1}"#.as_bytes()).is_err());
    }

    // -- Listing CSV --

    #[test]
    fn listing_csv_parses_and_skips_malformed_rows() {
        let csv_data = "\
player_id,price,prior_si
100,1.5m,\"14,000\"
not_an_id,850k,9000
101,850k,
100,2.0m,\"14,100\"";

        let listing = load_listing_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[&100].price, Some(2_000_000.0));
        assert_eq!(listing[&100].prior_si, Some(14_100.0));
        assert_eq!(listing[&101].price, Some(850_000.0));
        assert_eq!(listing[&101].prior_si, None);
    }

    #[test]
    fn join_keeps_tooltip_order_and_fills_listing_fields() {
        let tooltips = vec![
            TooltipRecord {
                player_id: 2,
                name: "B".into(),
                age: None,
                is_goalkeeper: false,
                positions: vec![PositionCategory::Winger],
                skills: vec![],
                current_si: Some(1000.0),
                conditioning: None,
                wage: None,
            },
            TooltipRecord {
                player_id: 1,
                name: "A".into(),
                age: None,
                is_goalkeeper: true,
                positions: vec![PositionCategory::Goalkeeper],
                skills: vec![],
                current_si: None,
                conditioning: None,
                wage: None,
            },
        ];
        let mut listing = HashMap::new();
        listing.insert(
            1,
            ListingEntry {
                player_id: 1,
                price: Some(5.0),
                prior_si: Some(900.0),
            },
        );

        let joined = join_records(tooltips, &listing);
        assert_eq!(joined[0].player_id, 2);
        assert_eq!(joined[0].primary, PositionCategory::Winger);
        assert_eq!(joined[0].price, None);
        assert_eq!(joined[1].primary, PositionCategory::Goalkeeper);
        assert_eq!(joined[1].price, Some(5.0));
        assert_eq!(joined[1].prior_si, Some(900.0));
    }
}
