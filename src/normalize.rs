use crate::models::{
    DEFAULT_FINE, PLACEHOLDER, Proof, Status, UNKNOWN_AREA, Violation, ViolationId, ViolationType,
};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

const OVERSPEEDING: &[&str] = &["overspeeding", "over speed", "speeding", "speed violation"];
const RED_LIGHT_JUMP: &[&str] = &[
    "red light jump",
    "signal jump",
    "rlv",
    "red light violation",
];
const NO_HELMET: &[&str] = &["no helmet", "without helmet", "helmet violation"];
const WRONG_LANE: &[&str] = &[
    "wrong lane",
    "lane violation",
    "wrong side",
    "illegal lane change",
];

const SYNONYMS: &[(ViolationType, &[&str])] = &[
    (ViolationType::Overspeeding, OVERSPEEDING),
    (ViolationType::RedLightJump, RED_LIGHT_JUMP),
    (ViolationType::NoHelmet, NO_HELMET),
    (ViolationType::WrongLane, WRONG_LANE),
];

/// Maps a free-text violation description onto the fixed set of types.
///
/// Non-string input never matches and yields [`ViolationType::Other`].
pub fn normalize_violation_type(raw: &Value) -> ViolationType {
    match raw {
        Value::String(text) => normalize_type_str(text),
        _ => ViolationType::Other,
    }
}

pub fn normalize_type_str(raw: &str) -> ViolationType {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return ViolationType::Other;
    }

    for (kind, synonyms) in SYNONYMS {
        if synonyms.contains(&lowered.as_str()) {
            return *kind;
        }
    }

    let key = lowered.to_uppercase().replace(' ', "_");
    ViolationType::ALL
        .into_iter()
        .find(|kind| kind.key() == key)
        .unwrap_or(ViolationType::Other)
}

/// Builds the canonical record for one raw entry. `position` is the 1-based
/// index inside the fetched batch and only names records without an id.
pub fn normalize_violation(raw: &Value, position: usize, fetched_at: DateTime<Utc>) -> Violation {
    let kind = first_present(raw, &["violation", "type"])
        .map(normalize_violation_type)
        .unwrap_or(ViolationType::Other);

    let date = first_present(raw, &["timestamp", "date"])
        .and_then(timestamp_text)
        .unwrap_or_else(|| fetched_at.to_rfc3339_opts(SecondsFormat::Millis, true));

    let proof = raw.get("proof");
    Violation {
        id: violation_id(raw.get("id"), position),
        name: text_field(raw, &["name"]).unwrap_or_else(|| PLACEHOLDER.to_string()),
        vehicle: text_field(raw, &["license_plate", "vehicle_no", "vehicle"])
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        kind,
        area: text_field(raw, &["area"]).unwrap_or_else(|| UNKNOWN_AREA.to_string()),
        date,
        fine: first_present(raw, &["fine"])
            .and_then(amount)
            .unwrap_or(DEFAULT_FINE),
        status: first_present(raw, &["status"])
            .and_then(Value::as_str)
            .and_then(Status::parse)
            .unwrap_or_default(),
        speed: first_present(raw, &["speed"]).and_then(number),
        camera: text_field(raw, &["camera"]),
        proof: Proof {
            image: text_field(raw, &["image"])
                .or_else(|| proof.and_then(|p| text_field(p, &["image"]))),
            plate_crop: text_field(raw, &["plate_crop"])
                .or_else(|| proof.and_then(|p| text_field(p, &["plate_crop"]))),
        },
    }
}

pub fn normalize_batch(raw: &[Value], fetched_at: DateTime<Utc>) -> Vec<Violation> {
    raw.iter()
        .enumerate()
        .map(|(index, entry)| normalize_violation(entry, index + 1, fetched_at))
        .collect()
}

/// A field counts as present only when it would be truthy in the feeds that
/// produce it: `0`, `""`, `false` and `null` are all treated as absent.
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_present<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| is_present(value))
}

fn text_field(raw: &Value, keys: &[&str]) -> Option<String> {
    first_present(raw, keys).and_then(|value| match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

fn violation_id(raw: Option<&Value>, position: usize) -> ViolationId {
    match raw {
        Some(Value::Number(n)) if n.is_i64() => ViolationId::Number(n.as_i64().unwrap_or_default()),
        Some(Value::Number(n)) => ViolationId::Text(n.to_string()),
        Some(Value::String(text)) if !text.is_empty() => ViolationId::Text(text.clone()),
        _ => ViolationId::Text(format!("row-{position}")),
    }
}

fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn amount(value: &Value) -> Option<u64> {
    number(value)
        .map(f64::round)
        .filter(|v| *v > 0.0)
        .map(|v| v as u64)
}

fn timestamp_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
        _ => None,
    }
}
