//! Snapshot of where the user is in the portal, fed to prompt construction.

use serde::Serialize;
use std::collections::BTreeMap;

/// Fixed application metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
}

pub const APP_INFO: AppInfo = AppInfo {
    name: "Suria",
    version: "1.0.0",
    description: "Plataforma de información energética con fuentes ETL, dimensiones de \
                  territorio y tiempo, y proyecciones de la UPME",
};

/// Derived on every navigation; never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    /// Active path, verbatim.
    pub current_route: String,

    /// Display name of the route, or `"Unknown"`.
    pub route_name: String,

    /// Dataset availability flags for the route.
    pub available_data: BTreeMap<String, bool>,

    pub app_info: AppInfo,
}

impl ChatContext {
    /// Names of the datasets flagged as available, sorted by name.
    pub fn available_datasets(&self) -> Vec<&str> {
        self.available_data
            .iter()
            .filter(|(_, available)| **available)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
