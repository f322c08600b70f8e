use crate::errors::AppError;
use crate::models::{Status, Violation, ViolationType};
use crate::normalize::normalize_type_str;
use serde::Deserialize;

/// Raw query string accepted by the violations listing.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViolationFilter {
    pub search: Option<String>,
    pub status: Option<Status>,
    pub kind: Option<ViolationType>,
}

impl ViolationFilter {
    pub fn from_query(query: FilterQuery) -> Result<Self, AppError> {
        let status = match query.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) if raw.eq_ignore_ascii_case("all") => None,
            Some(raw) => Some(
                Status::parse(raw)
                    .ok_or_else(|| AppError::bad_request(format!("unknown status '{raw}'")))?,
            ),
        };

        let kind = match query.kind.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_kind(raw)?),
        };

        let search = query
            .search
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty());

        Ok(Self { search, status, kind })
    }

    pub fn matches(&self, violation: &Violation) -> bool {
        if self.status.is_some_and(|status| violation.status != status) {
            return false;
        }
        if self.kind.is_some_and(|kind| violation.kind != kind) {
            return false;
        }
        match &self.search {
            Some(term) => [
                violation.name.as_str(),
                violation.vehicle.as_str(),
                violation.area.as_str(),
                violation.kind.label(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(term.as_str())),
            None => true,
        }
    }

    pub fn apply(&self, violations: Vec<Violation>) -> Vec<Violation> {
        violations.into_iter().filter(|v| self.matches(v)).collect()
    }
}

/// Resolves a type filter through the same synonym lookup as the feed, but
/// refuses text that only lands on `Other` by falling through.
fn parse_kind(raw: &str) -> Result<ViolationType, AppError> {
    match normalize_type_str(raw) {
        ViolationType::Other if !raw.eq_ignore_ascii_case(ViolationType::Other.label()) => {
            Err(AppError::bad_request(format!("unknown violation type '{raw}'")))
        }
        kind => Ok(kind),
    }
}
