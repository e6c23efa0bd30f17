//! Static vehicle registry for plate lookups.
//!
//! The default table is embedded at compile time from
//! `contrib/vehicles.toml` and parsed once on first use.

use crate::panel::{PanelContent, ENTRY_DENIED};
use serde::Deserialize;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_TABLE: &str = include_str!("../../../contrib/vehicles.toml");

static DEFAULT_REGISTRY: OnceLock<VehicleRegistry> = OnceLock::new();

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("bad vehicle table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One registered vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VehicleRecord {
    pub number: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "name-of-vehicle")]
    pub name: String,
    #[serde(rename = "Color")]
    pub color: String,
    #[serde(rename = "Owner Name")]
    pub owner_name: String,
    #[serde(rename = "Owner Phone")]
    pub owner_phone: String,
    #[serde(rename = "Owner Roll Number")]
    pub owner_roll_number: String,
}

impl VehicleRecord {
    pub fn panel(&self) -> PanelContent {
        PanelContent::Fields(vec![
            ("Vehicle Number", self.number.clone()),
            ("Type", self.kind.clone()),
            ("Vehicle Name", self.name.clone()),
            ("Color", self.color.clone()),
            ("Owner Name", self.owner_name.clone()),
            ("Owner Phone", self.owner_phone.clone()),
            ("Owner Roll Number", self.owner_roll_number.clone()),
        ])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleRegistry {
    #[serde(rename = "vehicle", default)]
    vehicles: Vec<VehicleRecord>,
}

impl VehicleRegistry {
    pub fn from_toml_str(src: &str) -> Result<Self, RegistryError> {
        Ok(toml::from_str(src)?)
    }

    /// The compiled-in table. A table that fails to parse yields an empty
    /// registry and an error log.
    pub fn builtin() -> &'static VehicleRegistry {
        DEFAULT_REGISTRY.get_or_init(|| match Self::from_toml_str(DEFAULT_TABLE) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "embedded vehicle table is invalid");
                VehicleRegistry::default()
            }
        })
    }

    pub fn vehicles(&self) -> &[VehicleRecord] {
        &self.vehicles
    }

    /// Exact plate match after trimming; case-insensitive.
    pub fn lookup(&self, plate: &str) -> Option<&VehicleRecord> {
        let wanted = plate.trim().to_uppercase();
        self.vehicles
            .iter()
            .find(|v| v.number.to_uppercase() == wanted)
    }

    /// Record fields on a match, the denial message otherwise.
    pub fn render(&self, plate: &str) -> PanelContent {
        match self.lookup(plate) {
            Some(v) => v.panel(),
            None => {
                tracing::info!(plate = plate.trim(), "vehicle not registered");
                PanelContent::text(ENTRY_DENIED)
            }
        }
    }
}
