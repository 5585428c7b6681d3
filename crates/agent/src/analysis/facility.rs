//! Nearest medical facility by role

use cmop_common::{Alliance, Entity, Envelope, FacilityRole};
use serde::Serialize;

use super::geo::{estimate_ground_eta, haversine_distance, DEFAULT_GROUND_SPEED_KMH};

/// Runners-up reported after the nearest facility
const MAX_ALTERNATIVES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityCandidate {
    pub id: i64,
    pub name: Option<String>,
    pub role: String,
    pub role_level: u8,
    pub distance_m: u64,
    pub eta_minutes: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub alliance: Alliance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilitySearch {
    pub nearest: FacilityCandidate,
    pub alternatives: Vec<FacilityCandidate>,
}

/// Rank facilities around `(lon, lat)` that meet `min_role`.
///
/// `entities` is the radius-search result; non-facility entities and
/// facilities without coordinates are ignored. Distances are truncated to
/// whole meters before sorting.
pub fn rank_facilities(
    lon: f64,
    lat: f64,
    entities: &[Entity],
    min_role: i64,
    max_distance_m: i64,
) -> Envelope<FacilitySearch> {
    let facilities: Vec<&Entity> = entities.iter().filter(|e| e.is_medical_facility()).collect();
    if facilities.is_empty() {
        return Envelope::absent(format!(
            "No medical facilities found within {}m",
            max_distance_m
        ));
    }

    let mut eligible: Vec<FacilityCandidate> = facilities
        .into_iter()
        .filter_map(|facility| {
            let tag = facility.element_type.clone().unwrap_or_default();
            let role_level = FacilityRole::level_of(&tag);
            if i64::from(role_level) < min_role {
                return None;
            }
            let (f_lon, f_lat) = facility.position()?;
            let distance = haversine_distance(lon, lat, f_lon, f_lat);

            Some(FacilityCandidate {
                id: facility.id,
                name: facility.name.clone(),
                role: tag,
                role_level,
                distance_m: distance as u64,
                eta_minutes: estimate_ground_eta(distance, DEFAULT_GROUND_SPEED_KMH),
                latitude: f_lat,
                longitude: f_lon,
                country: facility.country.clone(),
                alliance: facility.alliance,
            })
        })
        .collect();

    if eligible.is_empty() {
        return Envelope::absent(format!(
            "No Role {}+ facilities within {}m",
            min_role, max_distance_m
        ));
    }

    eligible.sort_by_key(|c| c.distance_m);
    let nearest = eligible.remove(0);
    eligible.truncate(MAX_ALTERNATIVES);

    Envelope::ok(FacilitySearch {
        nearest,
        alternatives: eligible,
    })
}
