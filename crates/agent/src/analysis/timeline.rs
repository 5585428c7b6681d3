//! NATO 10-1-2 timeline compliance
//!
//! First aid within 10 minutes, damage control resuscitation within one
//! hour, damage control surgery within two hours of injury.

use chrono::{DateTime, NaiveDateTime, Utc};
use cmop_common::{CasualtyStatus, EvacPriority, EvacStage, TriageColor};
use serde::{Serialize, Serializer};
use std::fmt;

pub const FIRST_AID_LIMIT_MIN: i64 = 10;
pub const DCR_LIMIT_MIN: i64 = 60;
pub const DCS_LIMIT_MIN: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Compliant,
    Delayed,
    AtRisk,
    Violated,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Compliant => "COMPLIANT",
            CheckStatus::Delayed => "DELAYED",
            CheckStatus::AtRisk => "AT_RISK",
            CheckStatus::Violated => "VIOLATED",
        }
    }
}

/// Outcome of one timeline check.
///
/// `basis` explains a compliance granted by evacuation progress rather than
/// elapsed time. Serialized as `"STATUS"` or `"STATUS (basis)"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineCheck {
    pub status: CheckStatus,
    pub basis: Option<&'static str>,
}

impl TimelineCheck {
    fn of(status: CheckStatus) -> Self {
        Self {
            status,
            basis: None,
        }
    }

    fn compliant_by(basis: &'static str) -> Self {
        Self {
            status: CheckStatus::Compliant,
            basis: Some(basis),
        }
    }
}

impl fmt::Display for TimelineCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.basis {
            Some(basis) => write!(f, "{} ({})", self.status.as_str(), basis),
            None => f.write_str(self.status.as_str()),
        }
    }
}

impl Serialize for TimelineCheck {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineStatus {
    pub first_aid_10min: TimelineCheck,
    pub dcr_1hour: TimelineCheck,
    pub dcs_2hour: TimelineCheck,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineAssessment {
    /// KIA or BLACK: the timeline no longer applies
    Deceased,
    Assessed {
        timeline: TimelineStatus,
        recommendations: Vec<String>,
    },
}

/// Evaluate the three timeline checks and the recommendation rules
pub fn assess_timeline(
    elapsed_min: i64,
    triage: TriageColor,
    stage: EvacStage,
    priority: EvacPriority,
    status: CasualtyStatus,
) -> TimelineAssessment {
    if status == CasualtyStatus::Kia || triage == TriageColor::Black {
        return TimelineAssessment::Deceased;
    }

    let is_red = triage == TriageColor::Red;
    let severe = |milder: CheckStatus| {
        if is_red {
            CheckStatus::Violated
        } else {
            milder
        }
    };

    let first_aid_10min = if elapsed_min <= FIRST_AID_LIMIT_MIN {
        TimelineCheck::of(CheckStatus::Compliant)
    } else {
        TimelineCheck::of(severe(CheckStatus::Delayed))
    };

    let dcr_1hour = if elapsed_min <= DCR_LIMIT_MIN {
        TimelineCheck::of(CheckStatus::Compliant)
    } else if matches!(stage, EvacStage::InTransit | EvacStage::Delivered) {
        TimelineCheck::compliant_by("en route or delivered")
    } else {
        TimelineCheck::of(severe(CheckStatus::AtRisk))
    };

    let dcs_2hour = if elapsed_min <= DCS_LIMIT_MIN {
        TimelineCheck::of(CheckStatus::Compliant)
    } else if stage == EvacStage::Delivered {
        TimelineCheck::compliant_by("delivered to facility")
    } else {
        TimelineCheck::of(severe(CheckStatus::AtRisk))
    };

    let at_poi = stage == EvacStage::AtPoi;
    let delivered = stage == EvacStage::Delivered;
    let mut recommendations = Vec::new();

    if is_red && at_poi && elapsed_min > 30 {
        recommendations.push(
            "URGENT: RED casualty still at POI after 30min — immediate forward MEDEVAC required"
                .to_string(),
        );
    }
    if is_red && elapsed_min > DCR_LIMIT_MIN && !delivered {
        recommendations.push(
            "CRITICAL: RED casualty exceeds 1-hour DCR timeline — prioritize immediate surgical evacuation"
                .to_string(),
        );
    }
    if matches!(triage, TriageColor::Red | TriageColor::Yellow)
        && elapsed_min > DCS_LIMIT_MIN
        && !delivered
    {
        recommendations.push(
            "VIOLATION: 2-hour DCS timeline exceeded — escalate to MASCAL protocols".to_string(),
        );
    }
    if priority == EvacPriority::Urgent && at_poi && elapsed_min > 15 {
        recommendations.push(
            "URGENT priority casualty still at POI — coordinate immediate evacuation asset"
                .to_string(),
        );
    }
    if recommendations.is_empty() {
        recommendations.push("Timeline compliant".to_string());
    }

    TimelineAssessment::Assessed {
        timeline: TimelineStatus {
            first_aid_10min,
            dcr_1hour,
            dcs_2hour,
        },
        recommendations,
    }
}

/// Parse an injury timestamp.
///
/// Accepts RFC 3339 (with `Z` or an offset, `T` or space separated) and
/// naive ISO timestamps, which are taken as UTC.
pub fn parse_injury_time(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(t.and_utc());
        }
    }
    Err(format!("Invalid isoformat string: '{}'", raw))
}

/// Whole minutes from `injury` to `now`, truncated
pub fn elapsed_minutes(injury: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - injury).num_minutes()
}
