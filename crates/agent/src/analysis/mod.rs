//! Deterministic domain analysis
//!
//! Pure functions over CMOP entities. The medical tools fetch the data and
//! hand it here; nothing in this module touches the network.

pub mod facility;
pub mod geo;
pub mod mascal;
pub mod timeline;

pub use facility::{rank_facilities, FacilityCandidate, FacilitySearch};
pub use geo::{estimate_ground_eta, haversine_distance, DEFAULT_GROUND_SPEED_KMH};
pub use mascal::{summarize_mascal, MascalStatus, MascalSummary, RiskLevel};
pub use timeline::{assess_timeline, CheckStatus, TimelineAssessment, TimelineCheck, TimelineStatus};
