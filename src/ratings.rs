use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{ClubIndexError, Result};

// Field aliases for the nested `items[].rankData` shape.
const ITEM_NAME_KEYS: &[&str] = &["teamName", "team", "club", "name"];
const ITEM_RATING_KEYS: &[&str] = &["Points", "points", "rating"];
// Field aliases for the flat `data[]` shape.
const FLAT_NAME_KEYS: &[&str] = &["club", "name", "team", "teamName"];
const FLAT_RATING_KEYS: &[&str] = &["points", "Points", "rating"];

const COUNTRY_KEYS: &[&str] = &["country", "nation", "countryName", "Country"];
const LEAGUE_KEYS: &[&str] = &["league", "leagueName", "League"];
const RANK_KEYS: &[&str] = &["rank", "Rank", "position"];
const ID_KEYS: &[&str] = &["teamId", "clubId", "id"];

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq)]
pub struct ClubRating {
    pub name: String,
    pub country: Option<String>,
    pub league: Option<String>,
    pub rank: Option<u32>,
    pub rating: f64,
}

/// What to do with a record whose rating cannot be read as a finite, non-negative number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedRatingPolicy {
    #[default]
    Exclude,
    Zero,
}

impl FromStr for MalformedRatingPolicy {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "exclude" | "skip" | "drop" => Ok(Self::Exclude),
            "zero" | "default" => Ok(Self::Zero),
            other => Err(format!("unknown malformed-rating policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestWarning {
    MissingName { index: usize },
    ExcludedRating { club: String, reason: String },
    CoercedRating { club: String, reason: String },
    Duplicate { club: String, id: String },
}

impl fmt::Display for IngestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestWarning::MissingName { index } => {
                write!(f, "record #{index} has no club name, dropped")
            }
            IngestWarning::ExcludedRating { club, reason } => {
                write!(f, "{club}: {reason}, record excluded")
            }
            IngestWarning::CoercedRating { club, reason } => {
                write!(f, "{club}: {reason}, rating set to 0.0")
            }
            IngestWarning::Duplicate { club, id } => {
                write!(f, "{club}: duplicate id {id}, later record dropped")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingTable {
    clubs: Vec<ClubRating>,
}

impl RatingTable {
    pub fn new(clubs: Vec<ClubRating>) -> Self {
        Self { clubs }
    }

    pub fn clubs(&self) -> &[ClubRating] {
        &self.clubs
    }

    pub fn len(&self) -> usize {
        self.clubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clubs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClubRating> {
        self.clubs.iter()
    }

    /// First club whose name matches, ignoring case and surrounding whitespace.
    pub fn find(&self, name: &str) -> Option<&ClubRating> {
        let want = name.trim().to_lowercase();
        if want.is_empty() {
            return None;
        }
        self.clubs
            .iter()
            .find(|c| c.name.trim().to_lowercase() == want)
    }

    /// Rank ascending when every club carries a rank, otherwise rating descending.
    pub fn sorted_for_display(&self) -> Vec<&ClubRating> {
        let mut out: Vec<&ClubRating> = self.clubs.iter().collect();
        if !out.is_empty() && out.iter().all(|c| c.rank.is_some()) {
            out.sort_by_key(|c| c.rank);
        } else {
            out.sort_by(|a, b| {
                b.rating
                    .total_cmp(&a.rating)
                    .then_with(|| a.name.cmp(&b.name))
            });
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingBuild {
    pub table: RatingTable,
    pub warnings: Vec<IngestWarning>,
}

/// The two ranking layouts the endpoint has served.
#[derive(Debug)]
enum RankingPayload<'a> {
    Items(&'a [Value]),
    Flat(&'a [Value]),
}

impl<'a> RankingPayload<'a> {
    fn classify(root: &'a Value) -> Result<Self> {
        if let Some(items) = root.get("items").and_then(|v| v.as_array()) {
            return Ok(Self::Items(items));
        }
        if let Some(data) = root.get("data").and_then(|v| v.as_array()) {
            return Ok(Self::Flat(data));
        }
        let found = match root {
            Value::Object(map) => {
                let keys: Vec<&str> = map.keys().map(|k| k.as_str()).take(8).collect();
                format!("object with keys [{}]", keys.join(", "))
            }
            Value::Array(_) => "bare array".to_string(),
            Value::Null => "null".to_string(),
            _ => "scalar".to_string(),
        };
        Err(ClubIndexError::malformed(format!(
            "expected an `items` or `data` list, found {found}"
        )))
    }

    fn records(&self) -> impl Iterator<Item = RawRecord<'a>> + '_ {
        let (list, nested) = match self {
            Self::Items(list) => (*list, true),
            Self::Flat(list) => (*list, false),
        };
        list.iter().map(move |entry| {
            if nested {
                RawRecord {
                    fields: entry.get("rankData").unwrap_or(&NULL),
                    outer: Some(entry),
                    name_keys: ITEM_NAME_KEYS,
                    rating_keys: ITEM_RATING_KEYS,
                }
            } else {
                RawRecord {
                    fields: entry,
                    outer: None,
                    name_keys: FLAT_NAME_KEYS,
                    rating_keys: FLAT_RATING_KEYS,
                }
            }
        })
    }
}

struct RawRecord<'a> {
    fields: &'a Value,
    // Wrapper object around `rankData`; some metadata only lives there.
    outer: Option<&'a Value>,
    name_keys: &'static [&'static str],
    rating_keys: &'static [&'static str],
}

impl RawRecord<'_> {
    fn string(&self, keys: &[&str]) -> Option<String> {
        pick_string(self.fields, keys)
            .or_else(|| self.outer.and_then(|o| pick_string(o, keys)))
            .filter(|s| !s.is_empty())
    }

    fn name(&self) -> Option<String> {
        pick_string(self.fields, self.name_keys).filter(|s| !s.is_empty())
    }

    fn rank(&self) -> Option<u32> {
        pick_u32(self.fields, RANK_KEYS)
            .or_else(|| self.outer.and_then(|o| pick_u32(o, RANK_KEYS)))
    }

    fn rating_value(&self) -> Option<&Value> {
        self.rating_keys
            .iter()
            .find_map(|key| self.fields.get(*key))
    }
}

/// Parse a JSON document into a rating table.
pub fn parse_ranking_json(raw: &str, policy: MalformedRatingPolicy) -> Result<RatingBuild> {
    let root: Value = serde_json::from_str(raw.trim())
        .map_err(|err| ClubIndexError::malformed(format!("invalid json: {err}")))?;
    build_rating_table(&root, policy)
}

/// Normalize a ranking payload into clean club records.
pub fn build_rating_table(payload: &Value, policy: MalformedRatingPolicy) -> Result<RatingBuild> {
    let shape = RankingPayload::classify(payload)?;

    let mut clubs = Vec::new();
    let mut warnings = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (index, record) in shape.records().enumerate() {
        let Some(name) = record.name() else {
            warnings.push(IngestWarning::MissingName { index });
            continue;
        };

        let id = record.string(ID_KEYS);
        if let Some(id) = &id
            && seen_ids.contains(id)
        {
            warnings.push(IngestWarning::Duplicate {
                club: name,
                id: id.clone(),
            });
            continue;
        }

        let (rating, problem) = parse_rating_or_default(record.rating_value());
        if let Some(reason) = problem {
            match policy {
                MalformedRatingPolicy::Exclude => {
                    warnings.push(IngestWarning::ExcludedRating { club: name, reason });
                    continue;
                }
                MalformedRatingPolicy::Zero => {
                    warnings.push(IngestWarning::CoercedRating {
                        club: name.clone(),
                        reason,
                    });
                }
            }
        }

        // Only records that made it into the table claim their id.
        if let Some(id) = id {
            seen_ids.insert(id);
        }
        clubs.push(ClubRating {
            name,
            country: record.string(COUNTRY_KEYS),
            league: record.string(LEAGUE_KEYS),
            rank: record.rank(),
            rating,
        });
    }

    Ok(RatingBuild {
        table: RatingTable::new(clubs),
        warnings,
    })
}

/// Always yields a usable rating; the second value explains why the default was used.
pub fn parse_rating_or_default(raw: Option<&Value>) -> (f64, Option<String>) {
    let parsed = match raw {
        None | Some(Value::Null) => return (0.0, Some("rating missing".to_string())),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_numeral(s),
        Some(other) => {
            return (0.0, Some(format!("rating is not numeric: {other}")));
        }
    };
    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => (v, None),
        Some(v) => (0.0, Some(format!("rating {v} out of range"))),
        None => {
            let shown = raw.map(|v| v.to_string()).unwrap_or_default();
            (0.0, Some(format!("rating {shown} is not a number")))
        }
    }
}

fn parse_numeral(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    if !s.contains(',') {
        return s.parse::<f64>().ok();
    }
    // Commas are accepted only as thousands separators ("1,024.5"); "850,5" is rejected.
    let (int_part, frac_part) = match s.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (s, None),
    };
    let mut groups = int_part.split(',');
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 || !first.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    if let Some(frac) = frac_part
        && (frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    s.replace(',', "").parse::<f64>().ok()
}

fn pick_string(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(v) = value.get(*key) {
            if let Some(s) = as_string(v) {
                return Some(s);
            }
        }
    }
    None
}

fn pick_u32(value: &Value, keys: &[&str]) -> Option<u32> {
    for key in keys {
        if let Some(v) = value.get(*key) {
            if let Some(num) = v.as_u64() {
                return u32::try_from(num).ok();
            }
            if let Some(num) = v.as_f64()
                && num >= 0.0
                && num.fract() == 0.0
                && num <= u32::MAX as f64
            {
                return Some(num as u32);
            }
            if let Some(s) = v.as_str() {
                if let Ok(num) = s.trim().parse::<u32>() {
                    return Some(num);
                }
            }
        }
    }
    None
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => match map.get("name") {
            Some(Value::String(name)) => Some(name.trim().to_string()),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rating_accepts_numbers_and_numerals() {
        assert_eq!(parse_rating_or_default(Some(&json!(850.5))), (850.5, None));
        assert_eq!(parse_rating_or_default(Some(&json!("850.5"))), (850.5, None));
        assert_eq!(parse_rating_or_default(Some(&json!(" 1,024 "))), (1024.0, None));
        assert_eq!(
            parse_rating_or_default(Some(&json!("1,234,567.25"))),
            (1234567.25, None)
        );
    }

    #[test]
    fn decimal_comma_is_not_read_as_thousands() {
        for raw in ["850,5", "1,02", "12,3456", ",500", "1,000.", "1,000.x"] {
            let (v, warn) = parse_rating_or_default(Some(&json!(raw)));
            assert_eq!(v, 0.0, "{raw} should not parse");
            assert!(warn.is_some(), "expected warning for {raw}");
        }
    }

    #[test]
    fn excluded_record_does_not_claim_its_id() {
        let payload = json!({
            "items": [
                { "rankData": { "teamId": 7, "teamName": "Ajax", "Points": "n/a" } },
                { "rankData": { "teamId": 7, "teamName": "Ajax", "Points": "600" } }
            ]
        });
        let build = build_rating_table(&payload, MalformedRatingPolicy::Exclude).unwrap();
        assert_eq!(build.table.len(), 1);
        assert_eq!(build.table.clubs()[0].rating, 600.0);
        assert_eq!(build.warnings.len(), 1);
        assert!(matches!(build.warnings[0], IngestWarning::ExcludedRating { .. }));
    }

    #[test]
    fn whole_float_rank_is_accepted() {
        let payload = json!({
            "data": [
                { "rank": 2.0, "club": "Inter", "points": 780 },
                { "rank": 1, "club": "Napoli", "points": 700 },
                { "rank": 3.5, "club": "Roma", "points": 650 }
            ]
        });
        let build = build_rating_table(&payload, MalformedRatingPolicy::Exclude).unwrap();
        assert_eq!(build.table.find("Inter").and_then(|c| c.rank), Some(2));
        assert_eq!(build.table.find("Roma").and_then(|c| c.rank), None);
        assert_eq!(pick_u32(&json!({ "rank": -1.0 }), RANK_KEYS), None);
    }

    #[test]
    fn rating_failures_default_to_zero_with_reason() {
        for raw in [json!("n/a"), json!(-3.0), json!(true), json!(null)] {
            let (v, warn) = parse_rating_or_default(Some(&raw));
            assert_eq!(v, 0.0);
            assert!(warn.is_some(), "expected warning for {raw}");
        }
        assert!(parse_rating_or_default(None).1.is_some());
    }

    #[test]
    fn policy_parses() {
        assert_eq!(
            "zero".parse::<MalformedRatingPolicy>(),
            Ok(MalformedRatingPolicy::Zero)
        );
        assert_eq!(
            " Exclude ".parse::<MalformedRatingPolicy>(),
            Ok(MalformedRatingPolicy::Exclude)
        );
        assert!("maybe".parse::<MalformedRatingPolicy>().is_err());
    }

    #[test]
    fn items_shape_takes_precedence() {
        let payload = json!({
            "items": [{ "rankData": { "teamName": "Inter", "Points": 700 } }],
            "data": [{ "club": "Milan", "points": 650 }]
        });
        let build = build_rating_table(&payload, MalformedRatingPolicy::Exclude).unwrap();
        assert_eq!(build.table.len(), 1);
        assert_eq!(build.table.clubs()[0].name, "Inter");
    }

    #[test]
    fn unknown_shape_is_malformed() {
        let payload = json!({ "results": [] });
        let err = build_rating_table(&payload, MalformedRatingPolicy::Exclude).unwrap_err();
        assert!(matches!(err, ClubIndexError::MalformedPayload { .. }));
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let payload = json!({
            "items": [
                { "rankData": { "teamId": 7, "teamName": "Ajax", "Points": "600" } },
                { "rankData": { "teamId": 7, "teamName": "Ajax", "Points": "590" } }
            ]
        });
        let build = build_rating_table(&payload, MalformedRatingPolicy::Exclude).unwrap();
        assert_eq!(build.table.len(), 1);
        assert_eq!(build.table.clubs()[0].rating, 600.0);
        assert!(matches!(build.warnings[0], IngestWarning::Duplicate { .. }));
    }

    #[test]
    fn display_order_prefers_rank() {
        let table = RatingTable::new(vec![
            ClubRating {
                name: "B".to_string(),
                country: None,
                league: None,
                rank: Some(2),
                rating: 900.0,
            },
            ClubRating {
                name: "A".to_string(),
                country: None,
                league: None,
                rank: Some(1),
                rating: 800.0,
            },
        ]);
        let sorted = table.sorted_for_display();
        assert_eq!(sorted[0].name, "A");
    }

    #[test]
    fn display_order_falls_back_to_rating() {
        let club = |name: &str, rating: f64| ClubRating {
            name: name.to_string(),
            country: None,
            league: None,
            rank: None,
            rating,
        };
        let table = RatingTable::new(vec![
            club("Low", 100.0),
            club("High", 900.0),
            club("Alpha", 100.0),
        ]);
        let names: Vec<&str> = table
            .sorted_for_display()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["High", "Alpha", "Low"]);
    }
}
