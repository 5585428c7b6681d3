//! Shared CMOP types
//!
//! The response envelope and error taxonomy that every tool and transport
//! call returns, the closed domain enumerations, the CMOP entity wire
//! models, and the telemetry context handed to the registry and client.

pub mod entities;
pub mod enums;
pub mod envelope;
pub mod telemetry;

pub use entities::{DestinationFacility, Entity, MedicalRecord, MEDICAL_FACILITY_CATEGORY};
pub use enums::{
    Alliance, CasualtyStatus, ClosedEnum, EvacPriority, EvacStage, FacilityRole, TriageColor,
};
pub use envelope::{Envelope, ErrorAction, ErrorKind, Failure};
pub use telemetry::Telemetry;
