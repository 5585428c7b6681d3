//! Medical analysis tools
//!
//! Compose CMOP queries with the deterministic analysis functions so the
//! model never has to do the arithmetic itself.

use async_trait::async_trait;
use chrono::Utc;
use cmop_client::CmopApi;
use cmop_common::{CasualtyStatus, Entity, Envelope, ErrorKind, MEDICAL_FACILITY_CATEGORY};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{parse_args, ParamSpec, ParamType, ToolError, ToolRegistry, ToolTrait};
use crate::analysis::timeline::{elapsed_minutes, parse_injury_time};
use crate::analysis::{assess_timeline, rank_facilities, summarize_mascal, TimelineAssessment};

pub const DEFAULT_MIN_ROLE: i64 = 1;
pub const DEFAULT_MAX_DISTANCE_M: i64 = 50_000;

fn decode<T: serde::de::DeserializeOwned>(data: Option<Value>, what: &str) -> Result<T, ToolError> {
    let data = match data {
        None | Some(Value::Null) => json!([]),
        Some(v) => v,
    };
    serde_json::from_value(data)
        .map_err(|e| ToolError::Execution(format!("unexpected {} payload: {}", what, e)))
}

/// Envelope as JSON, or a tool fault if the payload cannot be encoded
fn to_value<T: serde::Serialize>(envelope: Envelope<T>) -> Result<Envelope, ToolError> {
    envelope
        .into_value()
        .map_err(|e| ToolError::Execution(e.to_string()))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FacilityArgs {
    casualty_lat: f64,
    casualty_lng: f64,
    #[serde(default = "default_min_role")]
    min_role: i64,
    #[serde(default = "default_max_distance")]
    max_distance_m: i64,
}

fn default_min_role() -> i64 {
    DEFAULT_MIN_ROLE
}

fn default_max_distance() -> i64 {
    DEFAULT_MAX_DISTANCE_M
}

pub struct FindNearestFacilityTool {
    api: Arc<dyn CmopApi>,
}

impl FindNearestFacilityTool {
    pub fn new(api: Arc<dyn CmopApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolTrait for FindNearestFacilityTool {
    fn name(&self) -> &str {
        "find_nearest_facility_by_role"
    }

    fn doc(&self) -> &str {
        "Find nearest medical facility with minimum role capability.

Args:
    casualty_lat: Casualty latitude (WGS84).
    casualty_lng: Casualty longitude (WGS84).
    min_role: Minimum role required (1=aid post, 2=surgical, 3=field hospital, 4=definitive).
    max_distance_m: Maximum search radius in meters (default 50000)."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("casualty_lat", ParamType::Number),
            ParamSpec::required("casualty_lng", ParamType::Number),
            ParamSpec::optional("min_role", ParamType::Integer, DEFAULT_MIN_ROLE),
            ParamSpec::optional("max_distance_m", ParamType::Integer, DEFAULT_MAX_DISTANCE_M),
        ]
    }

    async fn execute(&self, args: Value) -> Result<Envelope, ToolError> {
        let args: FacilityArgs = parse_args(args)?;

        let nearby = self
            .api
            .get_nearby_entities(args.casualty_lng, args.casualty_lat, args.max_distance_m)
            .await;
        if !nearby.is_success() {
            return Ok(nearby);
        }

        let entities: Vec<Entity> = decode(nearby.into_data(), "entity list")?;
        to_value(rank_facilities(
            args.casualty_lng,
            args.casualty_lat,
            &entities,
            args.min_role,
            args.max_distance_m,
        ))
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ComplianceArgs {
    entity_id: i64,
}

pub struct CheckComplianceTool {
    api: Arc<dyn CmopApi>,
}

impl CheckComplianceTool {
    pub fn new(api: Arc<dyn CmopApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolTrait for CheckComplianceTool {
    fn name(&self) -> &str {
        "check_10_1_2_compliance"
    }

    fn doc(&self) -> &str {
        "Check if casualty evacuation meets NATO 10-1-2 timeline (10min first aid, 1hr DCR, 2hr surgery).

Args:
    entity_id: Casualty entity ID."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required("entity_id", ParamType::Integer)]
    }

    async fn execute(&self, args: Value) -> Result<Envelope, ToolError> {
        let ComplianceArgs { entity_id } = parse_args(args)?;

        let result = self.api.get_entity(entity_id).await;
        if !result.is_success() {
            return Ok(result);
        }

        let found = result.into_data().filter(|data| match data {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        });
        let Some(data) = found else {
            return Ok(Envelope::fail(
                ErrorKind::NotFound,
                format!("Entity {} not found", entity_id),
            ));
        };
        // an empty record counts as no record
        let has_medical = match data.get("medical") {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        };
        let entity: Entity = serde_json::from_value(data)
            .map_err(|e| ToolError::Execution(format!("unexpected entity payload: {}", e)))?;

        let Some(medical) = entity.medical.as_ref().filter(|_| has_medical) else {
            return Ok(Envelope::fail(
                ErrorKind::NotCasualty,
                format!("Entity {} has no medical record", entity_id),
            ));
        };

        let Some(created_at) = entity.created_at.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(Envelope::fail(
                ErrorKind::NoTimestamp,
                "Entity has no created_at timestamp",
            ));
        };

        let injury_time = match parse_injury_time(created_at) {
            Ok(t) => t,
            Err(e) => {
                return Ok(Envelope::fail(
                    ErrorKind::InvalidTimestamp,
                    format!("Cannot parse timestamp: {}", e),
                ))
            }
        };
        let elapsed = elapsed_minutes(injury_time, Utc::now());

        let assessment = assess_timeline(
            elapsed,
            medical.triage_color,
            medical.evac_stage,
            medical.evac_priority,
            medical.casualty_status,
        );

        let report = match assessment {
            TimelineAssessment::Deceased => json!({
                "entity_id": entity_id,
                "name": entity.name,
                "triage_color": medical.triage_color,
                "casualty_status": medical.casualty_status,
                "message": format!(
                    "Casualty is {} — timeline check not applicable.",
                    if medical.casualty_status == CasualtyStatus::Kia {
                        "KIA"
                    } else {
                        "deceased (BLACK)"
                    }
                ),
            }),
            TimelineAssessment::Assessed {
                timeline,
                recommendations,
            } => json!({
                "entity_id": entity_id,
                "name": entity.name,
                "triage_color": medical.triage_color,
                "casualty_status": medical.casualty_status,
                "evac_stage": medical.evac_stage,
                "evac_priority": medical.evac_priority,
                "time_since_injury_minutes": elapsed,
                "injury_timestamp": created_at,
                "destination_facility": medical.destination_facility,
                "timeline_status": timeline,
                "recommendations": recommendations,
            }),
        };

        Ok(Envelope::ok(report))
    }
}

pub struct MascalSummaryTool {
    api: Arc<dyn CmopApi>,
}

impl MascalSummaryTool {
    pub fn new(api: Arc<dyn CmopApi>) -> Self {
        Self { api }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

#[async_trait]
impl ToolTrait for MascalSummaryTool {
    fn name(&self) -> &str {
        "get_mascal_summary"
    }

    fn doc(&self) -> &str {
        "Get MASCAL situation overview: casualties by triage/stage/status, facilities, risk assessment."
    }

    fn params(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    async fn execute(&self, args: Value) -> Result<Envelope, ToolError> {
        parse_args::<NoArgs>(args)?;

        let casualties = self.api.get_casualties().await;
        if !casualties.is_success() {
            return Ok(casualties);
        }
        let casualties: Vec<Entity> = decode(casualties.into_data(), "casualty list")?;

        let facilities = self
            .api
            .get_entities_by_category(MEDICAL_FACILITY_CATEGORY)
            .await;
        if !facilities.is_success() {
            return Ok(facilities);
        }
        let facilities: Vec<Entity> = decode(facilities.into_data(), "facility list")?;

        to_value(Envelope::ok(summarize_mascal(&casualties, &facilities)))
    }
}

/// Register the medical analysis tools
pub fn register_medical_tools(registry: &mut ToolRegistry, api: Arc<dyn CmopApi>) {
    registry.register(FindNearestFacilityTool::new(api.clone()));
    registry.register(CheckComplianceTool::new(api.clone()));
    registry.register(MascalSummaryTool::new(api));
}
