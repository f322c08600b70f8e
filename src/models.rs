use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_FINE: u64 = 500;
pub const PLACEHOLDER: &str = "N/A";
pub const UNKNOWN_AREA: &str = "Unknown Area";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationType {
    Overspeeding,
    #[serde(rename = "Red Light Jump")]
    RedLightJump,
    #[serde(rename = "No Helmet")]
    NoHelmet,
    #[serde(rename = "Wrong Lane")]
    WrongLane,
    Other,
}

impl ViolationType {
    pub const ALL: [ViolationType; 5] = [
        ViolationType::Overspeeding,
        ViolationType::RedLightJump,
        ViolationType::NoHelmet,
        ViolationType::WrongLane,
        ViolationType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViolationType::Overspeeding => "Overspeeding",
            ViolationType::RedLightJump => "Red Light Jump",
            ViolationType::NoHelmet => "No Helmet",
            ViolationType::WrongLane => "Wrong Lane",
            ViolationType::Other => "Other",
        }
    }

    /// Upper-case key used by the enum-key fallback of the normalizer.
    pub fn key(self) -> &'static str {
        match self {
            ViolationType::Overspeeding => "OVERSPEEDING",
            ViolationType::RedLightJump => "RED_LIGHT",
            ViolationType::NoHelmet => "NO_HELMET",
            ViolationType::WrongLane => "WRONG_LANE",
            ViolationType::Other => "OTHER",
        }
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Pending,
    Paid,
    Overdue,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Paid => "Paid",
            Status::Overdue => "Overdue",
        }
    }

    pub fn parse(raw: &str) -> Option<Status> {
        match raw.trim().to_lowercase().as_str() {
            "pending" => Some(Status::Pending),
            "paid" => Some(Status::Paid),
            "overdue" => Some(Status::Overdue),
            _ => None,
        }
    }

    pub fn is_outstanding(self) -> bool {
        matches!(self, Status::Pending | Status::Overdue)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Record identifier as delivered by the source, numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViolationId {
    Number(i64),
    Text(String),
}

impl ViolationId {
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            ViolationId::Number(n) => raw.trim().parse::<i64>().is_ok_and(|parsed| parsed == *n),
            ViolationId::Text(text) => text == raw,
        }
    }
}

impl fmt::Display for ViolationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationId::Number(n) => write!(f, "{n}"),
            ViolationId::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    pub image: Option<String>,
    pub plate_crop: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: ViolationId,
    pub name: String,
    pub vehicle: String,
    #[serde(rename = "type")]
    pub kind: ViolationType,
    pub area: String,
    pub date: String,
    pub fine: u64,
    pub status: Status,
    pub speed: Option<f64>,
    pub camera: Option<String>,
    pub proof: Proof,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_violations: u64,
    pub pending_count: u64,
    pub paid_sum: u64,
    pub due_sum: u64,
    pub collection_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub labels: Vec<String>,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotTile {
    pub area: String,
    pub count: u64,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub by_area: Vec<GroupCount>,
    pub by_type: Vec<GroupCount>,
    pub by_month: Vec<GroupCount>,
    pub monthly: MonthlySeries,
    pub hotspots: Vec<HotspotTile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedStatus {
    pub loading: bool,
    pub last_error: Option<String>,
    pub last_updated: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identifier: String,
    pub token: String,
    pub timestamp: i64,
}

impl Session {
    pub fn is_valid(&self) -> bool {
        !self.identifier.trim().is_empty() && !self.token.trim().is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: Option<String>,
    pub session: Option<Session>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkPaidResponse {
    pub id: String,
    pub matched: bool,
    pub status: Option<Status>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub violations: usize,
}
