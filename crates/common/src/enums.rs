//! Closed domain enumerations
//!
//! Wire strings match the CMOP map database enums. Decoding never fails:
//! an unrecognised or null value becomes the `Unknown` variant.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A closed set of string constants.
///
/// The tool descriptor builder reads [`ClosedEnum::allowed_values`] so the
/// model is only offered legal values.
pub trait ClosedEnum: Sized + Copy + 'static {
    fn allowed_values() -> &'static [&'static str];
    fn as_str(&self) -> &'static str;
    fn parse(value: &str) -> Option<Self>;
}

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, unknown = $unknown:literal { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub enum $name {
            $($variant,)+
            #[default]
            Unknown,
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+ $name::Unknown];
        }

        impl ClosedEnum for $name {
            fn allowed_values() -> &'static [&'static str] {
                &[$($wire,)+ $unknown]
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Unknown => $unknown,
                }
            }

            fn parse(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some($name::$variant),)+
                    $unknown => Some($name::Unknown),
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = Option::<String>::deserialize(deserializer)?;
                Ok(raw.as_deref().and_then($name::parse).unwrap_or_default())
            }
        }
    };
}

closed_enum! {
    /// NATO triage classification (AJMedP-7)
    TriageColor, unknown = "UNKNOWN" {
        Red => "RED",
        Yellow => "YELLOW",
        Green => "GREEN",
        Blue => "BLUE",
        Black => "BLACK",
    }
}

closed_enum! {
    /// Position in the evacuation pipeline
    EvacStage, unknown = "unknown" {
        AtPoi => "at_poi",
        InTransit => "in_transit",
        Delivered => "delivered",
    }
}

closed_enum! {
    /// MEDEVAC priority
    EvacPriority, unknown = "UNKNOWN" {
        Urgent => "URGENT",
        Priority => "PRIORITY",
        Routine => "ROUTINE",
    }
}

closed_enum! {
    /// Wounded / killed in action
    CasualtyStatus, unknown = "UNKNOWN" {
        Wia => "WIA",
        Kia => "KIA",
    }
}

closed_enum! {
    /// Entity affiliation
    Alliance, unknown = "unknown" {
        Friendly => "friendly",
        Hostile => "hostile",
        Neutral => "neutral",
    }
}

closed_enum! {
    /// Medical facility role tags (AJMedP-2), as found in `tipo_elemento`
    FacilityRole, unknown = "unknown" {
        Role1 => "medical_role_1",
        Role2 => "medical_role_2",
        Role2Basic => "medical_role_2basic",
        Role2Enhanced => "medical_role_2enhanced",
        Role3 => "medical_role_3",
        Role4 => "medical_role_4",
        Multinational => "medical_facility_multinational",
    }
}

impl FacilityRole {
    /// Numeric capability tier; 0 for unrecognised tags
    pub fn level(self) -> u8 {
        match self {
            FacilityRole::Role1 => 1,
            FacilityRole::Role2 | FacilityRole::Role2Basic | FacilityRole::Role2Enhanced => 2,
            FacilityRole::Role3 | FacilityRole::Multinational => 3,
            FacilityRole::Role4 => 4,
            FacilityRole::Unknown => 0,
        }
    }

    /// Role level for a raw `tipo_elemento` tag
    pub fn level_of(tag: &str) -> u8 {
        FacilityRole::parse(tag).map(FacilityRole::level).unwrap_or(0)
    }
}
