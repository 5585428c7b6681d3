//! CMOP map entity models
//!
//! Field names follow the Spanish JSON returned by the map API
//! (`nombre`, `categoria`, `tipo_elemento`, `latitud`, `longitud`).
//! Every medical field is optional; missing values decode to `Unknown`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::{Alliance, CasualtyStatus, EvacPriority, EvacStage, TriageColor};

/// Category tag for medical treatment facilities
pub const MEDICAL_FACILITY_CATEGORY: &str = "medical_facility";

/// A map entity: unit, casualty, facility, ...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: i64,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
    #[serde(rename = "tipo_elemento", default)]
    pub element_type: Option<String>,
    #[serde(rename = "latitud", default)]
    pub latitude: Option<f64>,
    #[serde(rename = "longitud", default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub alliance: Alliance,
    /// Injury time for casualties; kept raw so parse failures can be reported
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub medical: Option<MedicalRecord>,
}

impl Entity {
    pub fn is_medical_facility(&self) -> bool {
        self.category.as_deref() == Some(MEDICAL_FACILITY_CATEGORY)
    }

    /// (longitude, latitude) when both are present
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.longitude?, self.latitude?))
    }
}

/// Medical details attached to a casualty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicalRecord {
    #[serde(default)]
    pub triage_color: TriageColor,
    #[serde(default)]
    pub casualty_status: CasualtyStatus,
    #[serde(default)]
    pub evac_priority: EvacPriority,
    #[serde(default)]
    pub evac_stage: EvacStage,
    #[serde(default)]
    pub injury_mechanism: Option<String>,
    #[serde(default)]
    pub primary_injury: Option<String>,
    #[serde(default)]
    pub destination_facility: Option<DestinationFacility>,
    #[serde(default)]
    pub nine_line_data: Option<Value>,
}

/// Resolved reference to the destination facility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationFacility {
    pub id: i64,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
}
