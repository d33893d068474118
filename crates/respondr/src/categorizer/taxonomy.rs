//! Fixed keyword tables for document type, role and hazard classification,
//! plus the jurisdiction code list.
//!
//! Trigger phrases are lower-case; they are matched as substrings against
//! lower-cased document text. Table order is significant: the document-type
//! classifier resolves score ties in favour of the earlier entry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A labelled bucket in a taxonomy.
pub trait Category: Copy + Eq + fmt::Debug + 'static {
    fn as_str(&self) -> &'static str;
}

/// An ordered category → trigger-phrase table.
#[derive(Debug)]
pub struct Taxonomy<C: 'static> {
    entries: &'static [(C, &'static [&'static str])],
}

impl<C: Category> Taxonomy<C> {
    pub const fn new(entries: &'static [(C, &'static [&'static str])]) -> Self {
        Self { entries }
    }

    /// Entries in definition order.
    pub fn entries(&self) -> &'static [(C, &'static [&'static str])] {
        self.entries
    }

    pub fn categories(&self) -> impl Iterator<Item = C> + '_ {
        self.entries.iter().map(|(category, _)| *category)
    }
}

/// Error returned when a stored category label is not part of its taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownCategory {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! category_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl Category for $name {
            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownCategory;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(UnknownCategory {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

category_enum! {
    /// Document type. `Unknown` is the classifier's no-signal result and has
    /// no trigger phrases.
    DocumentType, "document type" {
        EmergencyPlan => "emergency_plan",
        Sop => "sop",
        Policy => "policy",
        IncidentReport => "incident_report",
        Training => "training",
        Unknown => "unknown",
    }
}

category_enum! {
    /// Organisational role referenced by a document.
    Role, "role" {
        Security => "security",
        Ehs => "ehs",
        Facilities => "facilities",
        Hr => "hr",
        Medical => "medical",
    }
}

category_enum! {
    /// Hazard category covered by a document.
    Hazard, "hazard" {
        Fire => "fire",
        Chemical => "chemical",
        ActiveShooter => "active_shooter",
        Flood => "flood",
        MedicalEmergency => "medical_emergency",
    }
}

pub static DOCUMENT_TYPES: Taxonomy<DocumentType> = Taxonomy::new(&[
    (
        DocumentType::EmergencyPlan,
        &["emergency", "evacuation", "response plan", "continuity", "disaster"],
    ),
    (
        DocumentType::Sop,
        &["standard operating procedure", "sop", "procedure", "protocol", "process"],
    ),
    (
        DocumentType::Policy,
        &["policy", "policies", "regulation", "compliance", "guideline"],
    ),
    (
        DocumentType::IncidentReport,
        &["incident report", "incident", "accident report", "injury report"],
    ),
    (
        DocumentType::Training,
        &["training", "course", "workshop", "certification", "instruction"],
    ),
]);

pub static ROLES: Taxonomy<Role> = Taxonomy::new(&[
    (Role::Security, &["security", "guard", "officer", "protection"]),
    (
        Role::Ehs,
        &["ehs", "environment", "health", "safety", "environmental health"],
    ),
    (
        Role::Facilities,
        &["facilities", "maintenance", "building", "grounds"],
    ),
    (
        Role::Hr,
        &["human resources", "hr", "personnel", "employee relations"],
    ),
    (
        Role::Medical,
        &["medical", "nurse", "physician", "healthcare", "first aid"],
    ),
]);

pub static HAZARDS: Taxonomy<Hazard> = Taxonomy::new(&[
    (Hazard::Fire, &["fire", "smoke", "flame", "burn", "combustion"]),
    (
        Hazard::Chemical,
        &["chemical", "hazmat", "spill", "toxic", "corrosive"],
    ),
    (
        Hazard::ActiveShooter,
        &["active shooter", "armed intruder", "gunman", "shooter"],
    ),
    (
        Hazard::Flood,
        &["flood", "water damage", "inundation", "flooding"],
    ),
    (
        Hazard::MedicalEmergency,
        &["medical emergency", "cardiac", "stroke", "injury", "trauma"],
    ),
]);

/// US state codes in scan order, each paired with the full state name.
pub const US_STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];
