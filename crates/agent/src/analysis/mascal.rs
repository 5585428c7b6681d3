//! Mass-casualty situation summary

use cmop_common::{
    CasualtyStatus, ClosedEnum, Entity, EvacPriority, EvacStage, MedicalRecord, TriageColor,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Critical casualties listed in full; the rest are only counted
const MAX_CRITICAL_LISTED: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MascalStatus {
    MascalDeclared,
    MascalWarning,
    Normal,
}

impl MascalStatus {
    pub fn classify(red: usize, total: usize) -> Self {
        if red >= 10 || total >= 30 {
            MascalStatus::MascalDeclared
        } else if red >= 5 || total >= 15 {
            MascalStatus::MascalWarning
        } else {
            MascalStatus::Normal
        }
    }

    pub fn risk(self) -> RiskLevel {
        match self {
            MascalStatus::MascalDeclared => RiskLevel::High,
            MascalStatus::MascalWarning => RiskLevel::Moderate,
            MascalStatus::Normal => RiskLevel::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    High,
    Moderate,
    Low,
}

/// RED casualty still at the point of injury
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalCasualty {
    pub id: i64,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub evac_priority: EvacPriority,
    pub injury_mechanism: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MascalAssessment {
    #[serde(rename = "RED_casualties")]
    pub red_casualties: usize,
    #[serde(rename = "YELLOW_casualties")]
    pub yellow_casualties: usize,
    #[serde(rename = "KIA_count")]
    pub kia_count: usize,
    pub immediate_evac_needed: usize,
    pub overwhelmed_risk: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MascalSummary {
    pub total_casualties: usize,
    pub triage_distribution: BTreeMap<&'static str, usize>,
    pub evac_stage_distribution: BTreeMap<&'static str, usize>,
    pub casualty_status_distribution: BTreeMap<&'static str, usize>,
    pub critical_at_poi_count: usize,
    pub critical_at_poi: Vec<CriticalCasualty>,
    pub facilities_available: BTreeMap<String, usize>,
    pub total_facilities: usize,
    pub mascal_status: MascalStatus,
    pub assessment: MascalAssessment,
}

/// Every canonical value of `T` with a zero count
fn zeroed<T: ClosedEnum>() -> BTreeMap<&'static str, usize> {
    T::allowed_values().iter().map(|v| (*v, 0)).collect()
}

fn bump<T: ClosedEnum>(counts: &mut BTreeMap<&'static str, usize>, value: T) {
    *counts.entry(value.as_str()).or_insert(0) += 1;
}

/// Aggregate the casualty set and the facility list
pub fn summarize_mascal(casualties: &[Entity], facilities: &[Entity]) -> MascalSummary {
    let mut triage = zeroed::<TriageColor>();
    let mut stages = zeroed::<EvacStage>();
    let mut statuses = zeroed::<CasualtyStatus>();
    let mut critical = Vec::new();

    let no_record = MedicalRecord::default();
    for casualty in casualties {
        let medical = casualty.medical.as_ref().unwrap_or(&no_record);
        bump(&mut triage, medical.triage_color);
        bump(&mut stages, medical.evac_stage);
        bump(&mut statuses, medical.casualty_status);

        if medical.triage_color == TriageColor::Red && medical.evac_stage == EvacStage::AtPoi {
            critical.push(CriticalCasualty {
                id: casualty.id,
                name: casualty.name.clone(),
                latitude: casualty.latitude,
                longitude: casualty.longitude,
                evac_priority: medical.evac_priority,
                injury_mechanism: medical.injury_mechanism.clone(),
            });
        }
    }

    let mut facility_counts = BTreeMap::new();
    for facility in facilities {
        let role = facility
            .element_type
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        *facility_counts.entry(role).or_insert(0) += 1;
    }

    let red = triage[TriageColor::Red.as_str()];
    let total = casualties.len();
    let status = MascalStatus::classify(red, total);
    let critical_count = critical.len();
    critical.truncate(MAX_CRITICAL_LISTED);

    MascalSummary {
        total_casualties: total,
        critical_at_poi_count: critical_count,
        critical_at_poi: critical,
        facilities_available: facility_counts,
        total_facilities: facilities.len(),
        mascal_status: status,
        assessment: MascalAssessment {
            red_casualties: red,
            yellow_casualties: triage[TriageColor::Yellow.as_str()],
            kia_count: statuses[CasualtyStatus::Kia.as_str()],
            immediate_evac_needed: critical_count,
            overwhelmed_risk: status.risk(),
        },
        triage_distribution: triage,
        evac_stage_distribution: stages,
        casualty_status_distribution: statuses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn casualty(id: i64, triage: &str, stage: &str, status: &str) -> Entity {
        serde_json::from_value(json!({
            "id": id,
            "nombre": format!("Casualty {}", id),
            "categoria": "casualty",
            "latitud": 40.0,
            "longitud": -3.0,
            "medical": {
                "triage_color": triage,
                "evac_stage": stage,
                "casualty_status": status,
                "evac_priority": "URGENT",
                "injury_mechanism": "blast"
            }
        }))
        .unwrap()
    }

    fn facility(id: i64, role: Option<&str>) -> Entity {
        serde_json::from_value(json!({
            "id": id,
            "categoria": "medical_facility",
            "tipo_elemento": role
        }))
        .unwrap()
    }

    fn many(red: usize, total: usize) -> Vec<Entity> {
        (0..total)
            .map(|i| {
                let color = if i < red { "RED" } else { "GREEN" };
                casualty(i as i64, color, "delivered", "WIA")
            })
            .collect()
    }

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(MascalStatus::classify(9, 29), MascalStatus::MascalWarning);
        assert_eq!(MascalStatus::classify(10, 10), MascalStatus::MascalDeclared);
        assert_eq!(MascalStatus::classify(0, 30), MascalStatus::MascalDeclared);
        assert_eq!(MascalStatus::classify(0, 15), MascalStatus::MascalWarning);
        assert_eq!(MascalStatus::classify(5, 5), MascalStatus::MascalWarning);
        assert_eq!(MascalStatus::classify(4, 14), MascalStatus::Normal);
    }

    #[test]
    fn test_risk_mapping() {
        assert_eq!(MascalStatus::MascalDeclared.risk(), RiskLevel::High);
        assert_eq!(MascalStatus::MascalWarning.risk(), RiskLevel::Moderate);
        assert_eq!(MascalStatus::Normal.risk(), RiskLevel::Low);
    }

    #[test]
    fn test_empty_picture_zero_filled() {
        let summary = summarize_mascal(&[], &[]);
        assert_eq!(summary.total_casualties, 0);
        assert_eq!(summary.mascal_status, MascalStatus::Normal);
        assert_eq!(summary.triage_distribution.len(), 6);
        assert!(summary.triage_distribution.values().all(|&n| n == 0));
        assert_eq!(summary.evac_stage_distribution["unknown"], 0);
        assert_eq!(summary.casualty_status_distribution["KIA"], 0);
    }

    #[test]
    fn test_counts_and_summary_from_records() {
        let casualties = vec![
            casualty(1, "RED", "at_poi", "WIA"),
            casualty(2, "YELLOW", "in_transit", "WIA"),
            casualty(3, "BLACK", "at_poi", "KIA"),
            casualty(4, "PURPLE", "teleported", "WIA"),
        ];
        let facilities = vec![
            facility(10, Some("medical_role_1")),
            facility(11, Some("medical_role_1")),
            facility(12, None),
        ];

        let summary = summarize_mascal(&casualties, &facilities);
        assert_eq!(summary.total_casualties, 4);
        assert_eq!(summary.triage_distribution["RED"], 1);
        assert_eq!(summary.triage_distribution["UNKNOWN"], 1);
        assert_eq!(summary.evac_stage_distribution["at_poi"], 2);
        assert_eq!(summary.evac_stage_distribution["unknown"], 1);
        assert_eq!(summary.casualty_status_distribution["KIA"], 1);
        assert_eq!(summary.critical_at_poi_count, 1);
        assert_eq!(summary.critical_at_poi[0].id, 1);
        assert_eq!(summary.facilities_available["medical_role_1"], 2);
        assert_eq!(summary.facilities_available["unknown"], 1);
        assert_eq!(summary.total_facilities, 3);
        assert_eq!(summary.assessment.kia_count, 1);
        assert_eq!(summary.assessment.yellow_casualties, 1);
    }

    #[test]
    fn test_critical_list_capped_count_exact() {
        let casualties: Vec<Entity> = (0..8)
            .map(|i| casualty(i, "RED", "at_poi", "WIA"))
            .collect();
        let summary = summarize_mascal(&casualties, &[]);
        assert_eq!(summary.critical_at_poi.len(), 5);
        assert_eq!(summary.critical_at_poi_count, 8);
        assert_eq!(summary.assessment.immediate_evac_needed, 8);
        assert_eq!(summary.mascal_status, MascalStatus::MascalWarning);
    }

    #[test]
    fn test_declared_by_total() {
        let summary = summarize_mascal(&many(0, 30), &[]);
        assert_eq!(summary.mascal_status, MascalStatus::MascalDeclared);
        assert_eq!(summary.assessment.overwhelmed_risk, RiskLevel::High);
    }

    #[test]
    fn test_casualty_without_record_counts_as_unknown() {
        let bare: Entity = serde_json::from_value(json!({"id": 7})).unwrap();
        let summary = summarize_mascal(&[bare], &[]);
        assert_eq!(summary.triage_distribution["UNKNOWN"], 1);
        assert_eq!(summary.casualty_status_distribution["UNKNOWN"], 1);
    }

    #[test]
    fn test_wire_shape() {
        let summary = summarize_mascal(&many(10, 10), &[]);
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["mascal_status"], "MASCAL_DECLARED");
        assert_eq!(value["assessment"]["RED_casualties"], 10);
        assert_eq!(value["assessment"]["overwhelmed_risk"], "HIGH");
        assert_eq!(value["triage_distribution"]["GREEN"], 0);
    }
}
