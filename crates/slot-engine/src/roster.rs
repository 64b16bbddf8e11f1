//! The specialist roster: static configuration loaded once at startup.
//!
//! Records are decoded into a fixed shape. Active specialists missing either
//! Calendly URI are flagged and kept out of every fetch rather than being
//! silently included.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};

/// One bookable specialist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialist {
    pub name: String,
    /// Calendly user resource, used to attribute scheduled events.
    pub user_uri: String,
    /// Calendly event type the specialist's availability is read from.
    #[serde(rename = "soloEventUri")]
    pub event_type_uri: String,
    pub languages: BTreeSet<String>,
    pub team: String,
    pub active: bool,
}

impl Specialist {
    /// Whether this specialist takes part in availability fetches.
    pub fn participates(&self) -> bool {
        self.active && !self.event_type_uri.trim().is_empty() && !self.user_uri.trim().is_empty()
    }

    pub fn speaks(&self, language: &str) -> bool {
        self.languages.contains(language)
    }
}

/// An active roster entry that cannot participate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterWarning {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roster {
    specialists: Vec<Specialist>,
    warnings: Vec<RosterWarning>,
}

impl Roster {
    /// Build a roster from already-decoded records.
    ///
    /// Names are trimmed. Duplicate names are rejected because names are the
    /// keys every aggregate is reported under.
    pub fn new(records: Vec<Specialist>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let mut specialists = Vec::with_capacity(records.len());
        let mut warnings = Vec::new();

        for mut specialist in records {
            specialist.name = specialist.name.trim().to_string();
            if specialist.name.is_empty() {
                return Err(SlotError::InvalidRoster(
                    "specialist with an empty name".to_string(),
                ));
            }
            if !seen.insert(specialist.name.clone()) {
                return Err(SlotError::InvalidRoster(format!(
                    "duplicate specialist name '{}'",
                    specialist.name
                )));
            }

            if specialist.active {
                let missing: Vec<&str> = [
                    ("soloEventUri", specialist.event_type_uri.trim()),
                    ("userUri", specialist.user_uri.trim()),
                ]
                .iter()
                .filter(|(_, value)| value.is_empty())
                .map(|(field, _)| *field)
                .collect();

                if !missing.is_empty() {
                    let reason = format!("active but missing {}", missing.join(" and "));
                    tracing::warn!(specialist = %specialist.name, %reason, "excluding roster entry");
                    warnings.push(RosterWarning {
                        name: specialist.name.clone(),
                        reason,
                    });
                }
            }

            specialists.push(specialist);
        }

        Ok(Self {
            specialists,
            warnings,
        })
    }

    /// Decode a roster from a JSON array of records.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<Specialist> =
            serde_json::from_str(json).map_err(|e| SlotError::InvalidRoster(e.to_string()))?;
        Self::new(records)
    }

    /// Read and decode a roster file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SlotError::InvalidRoster(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn specialists(&self) -> &[Specialist] {
        &self.specialists
    }

    pub fn warnings(&self) -> &[RosterWarning] {
        &self.warnings
    }

    /// Active, complete specialists, optionally restricted to one team.
    pub fn participants(&self, team: Option<&str>) -> Vec<Specialist> {
        self.specialists
            .iter()
            .filter(|s| s.participates())
            .filter(|s| team.is_none_or(|t| s.team == t))
            .cloned()
            .collect()
    }

    /// Distinct languages spoken by the participants of `team`, sorted.
    pub fn languages(&self, team: Option<&str>) -> Vec<String> {
        self.participants(team)
            .into_iter()
            .flat_map(|s| s.languages.into_iter())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
