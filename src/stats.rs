use crate::models::{
    AnalysisResponse, GroupCount, HotspotTile, MonthlySeries, Status, Summary, Violation,
};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::collections::HashMap;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Area,
    Type,
    Month,
}

pub fn build_summary(violations: &[Violation]) -> Summary {
    let mut paid_sum = 0u64;
    let mut due_sum = 0u64;
    let mut pending_count = 0u64;

    for violation in violations {
        if violation.status == Status::Paid {
            paid_sum = paid_sum.saturating_add(violation.fine);
        } else {
            due_sum = due_sum.saturating_add(violation.fine);
            if violation.status.is_outstanding() {
                pending_count += 1;
            }
        }
    }

    let billed = paid_sum.saturating_add(due_sum);
    let collection_rate = if billed == 0 {
        0.0
    } else {
        paid_sum as f64 / billed as f64
    };

    Summary {
        total_violations: violations.len() as u64,
        pending_count,
        paid_sum,
        due_sum,
        collection_rate,
    }
}

/// Counts occurrences per distinct value of `field`, in first-seen order.
/// Records whose month cannot be derived are left out of month groupings.
pub fn group_counts(violations: &[Violation], field: GroupField) -> Vec<GroupCount> {
    let mut groups: Vec<GroupCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for violation in violations {
        let Some(name) = group_key(violation, field) else {
            continue;
        };
        match index.get(&name) {
            Some(&slot) => groups[slot].count += 1,
            None => {
                index.insert(name.clone(), groups.len());
                groups.push(GroupCount { name, count: 1 });
            }
        }
    }

    groups
}

/// Highest count first; ties keep their first-seen order.
pub fn ranked(mut groups: Vec<GroupCount>) -> Vec<GroupCount> {
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

pub fn monthly_series(violations: &[Violation]) -> MonthlySeries {
    let mut counts = vec![0u64; MONTH_LABELS.len()];
    for violation in violations {
        if let Some(ts) = parse_timestamp(&violation.date) {
            counts[ts.month0() as usize] += 1;
        }
    }

    MonthlySeries {
        labels: MONTH_LABELS.iter().map(|label| label.to_string()).collect(),
        counts,
    }
}

pub fn hotspots(by_area: &[GroupCount]) -> Vec<HotspotTile> {
    let busiest = by_area.iter().map(|group| group.count).max().unwrap_or(0);
    by_area
        .iter()
        .map(|group| HotspotTile {
            area: group.name.clone(),
            count: group.count,
            intensity: if busiest == 0 {
                0.0
            } else {
                group.count as f64 / busiest as f64
            },
        })
        .collect()
}

pub fn build_analysis(violations: &[Violation]) -> AnalysisResponse {
    let by_area = group_counts(violations, GroupField::Area);
    AnalysisResponse {
        hotspots: hotspots(&by_area),
        by_type: group_counts(violations, GroupField::Type),
        by_month: group_counts(violations, GroupField::Month),
        monthly: monthly_series(violations),
        by_area,
    }
}

/// Parses the timestamp formats seen in violation feeds. Values without an
/// offset are read as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Local));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    Local.from_local_datetime(&naive).earliest()
}

fn group_key(violation: &Violation, field: GroupField) -> Option<String> {
    match field {
        GroupField::Area => Some(violation.area.clone()),
        GroupField::Type => Some(violation.kind.label().to_string()),
        GroupField::Month => parse_timestamp(&violation.date).map(|ts| ts.format("%B %Y").to_string()),
    }
}
