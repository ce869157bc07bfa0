//! Thermostat data models matching the ecobee API schema.
//!
//! Only the commonly used fields are modelled; anything else in a response is ignored.

use serde::{Deserialize, Serialize};

/// Status object included in every data response. Code 0 means success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiStatus {
    pub code: i64,
    pub message: String,
}

impl ApiStatus {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Paging information for list responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Page {
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub total: u32,
}

impl Page {
    /// Whether pages after this one exist.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Response of `GET /1/thermostatSummary`: cheap polling of revision numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThermostatSummary {
    /// Colon-separated revision strings, one per thermostat.
    pub revision_list: Vec<String>,
    pub thermostat_count: u32,
    /// Colon-separated equipment status strings, one per thermostat.
    pub status_list: Vec<String>,
    pub status: ApiStatus,
}

impl ThermostatSummary {
    /// Revision entries that could be parsed.
    #[must_use]
    pub fn revisions(&self) -> Vec<Revision> {
        self.revision_list.iter().filter_map(|r| Revision::parse(r)).collect()
    }
}

/// One entry of [`ThermostatSummary::revision_list`].
///
/// Wire format: `identifier:name:connected:thermostatRev:alertsRev:runtimeRev:intervalRev`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub identifier: String,
    pub name: String,
    pub connected: bool,
    pub thermostat_revision: String,
    pub alerts_revision: String,
    pub runtime_revision: String,
    pub interval_revision: String,
}

impl Revision {
    /// Parse a revision string. Returns `None` unless it has exactly seven fields.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let fields: Vec<&str> = s.split(':').collect();
        let [identifier, name, connected, thermostat, alerts, runtime, interval] = fields[..]
        else {
            return None;
        };
        Some(Self {
            identifier: identifier.to_string(),
            name: name.to_string(),
            connected: connected == "true",
            thermostat_revision: thermostat.to_string(),
            alerts_revision: alerts.to_string(),
            runtime_revision: runtime.to_string(),
            interval_revision: interval.to_string(),
        })
    }
}

/// A thermostat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Thermostat {
    /// Serial number; unique per thermostat.
    pub identifier: String,

    /// User-defined name.
    pub name: String,

    #[serde(rename = "thermostatRev")]
    pub thermostat_revision: String,

    pub is_registered: bool,

    pub model_number: String,

    pub brand: String,

    /// Local time at the thermostat.
    pub thermostat_time: String,

    /// UTC time at the thermostat.
    pub utc_time: String,

    /// Comma-separated list of running equipment; empty when idle.
    pub equipment_status: String,

    /// Present when the selection asked for runtime.
    pub runtime: Option<Runtime>,

    /// Present when the selection asked for sensors.
    pub remote_sensors: Vec<RemoteSensor>,
}

/// Current runtime state. Temperatures are in tenths of a degree Fahrenheit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Runtime {
    #[serde(rename = "runtimeRev")]
    pub runtime_revision: String,
    pub connected: bool,
    pub first_connected: String,
    pub last_status_modified: String,
    pub actual_temperature: i64,
    pub actual_humidity: i64,
    pub desired_heat: i64,
    pub desired_cool: i64,
    pub desired_humidity: i64,
    pub desired_dehumidity: i64,
    pub desired_fan_mode: String,
}

impl Runtime {
    /// Actual temperature in degrees Fahrenheit.
    #[must_use]
    pub fn temperature_f(&self) -> f64 {
        self.actual_temperature as f64 / 10.0
    }
}

/// A remote sensor (or the thermostat's built-in one).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteSensor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub code: Option<String>,
    pub in_use: bool,
    pub capability: Vec<SensorCapability>,
}

impl RemoteSensor {
    /// The value reported for a capability type such as `temperature` or `occupancy`.
    #[must_use]
    pub fn capability_value(&self, capability_type: &str) -> Option<&str> {
        self.capability
            .iter()
            .find(|c| c.capability_type == capability_type)
            .map(|c| c.value.as_str())
    }
}

/// One reading of a [`RemoteSensor`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorCapability {
    pub id: String,
    #[serde(rename = "type")]
    pub capability_type: String,
    pub value: String,
}

/// Response of `GET /1/thermostat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThermostatPage {
    pub page: Page,
    pub thermostat_list: Vec<Thermostat>,
    pub status: ApiStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_deserialize() {
        let json = r#"{
            "revisionList": ["318324702718:Upstairs:true:170315165442:170315160025:170315165409:170315165400"],
            "thermostatCount": 1,
            "statusList": ["318324702718:compCool1"],
            "status": {"code": 0, "message": ""}
        }"#;
        let summary: ThermostatSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.thermostat_count, 1);
        assert!(summary.status.is_ok());

        let revisions = summary.revisions();
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].identifier, "318324702718");
        assert_eq!(revisions[0].name, "Upstairs");
        assert!(revisions[0].connected);
        assert_eq!(revisions[0].interval_revision, "170315165400");
    }

    #[test]
    fn test_revision_rejects_wrong_field_count() {
        assert!(Revision::parse("a:b:c").is_none());
        assert!(Revision::parse("").is_none());
    }

    #[test]
    fn test_thermostat_page_deserialize() {
        let json = r#"{
            "page": {"page": 1, "totalPages": 1, "pageSize": 2, "total": 2},
            "thermostatList": [
                {
                    "identifier": "318324702718",
                    "name": "Upstairs",
                    "thermostatRev": "170315165442",
                    "isRegistered": true,
                    "modelNumber": "athenaSmart",
                    "equipmentStatus": "fan,compCool1",
                    "runtime": {"runtimeRev": "170315165409", "connected": true, "actualTemperature": 715, "actualHumidity": 42},
                    "remoteSensors": [{
                        "id": "rs:100", "name": "Bedroom", "type": "ecobee3_remote_sensor", "code": "VHGX", "inUse": true,
                        "capability": [{"id": "1", "type": "temperature", "value": "702"}, {"id": "2", "type": "occupancy", "value": "false"}]
                    }],
                    "settings": {"hvacMode": "cool"}
                },
                {"identifier": "318324702719", "name": "Downstairs"}
            ],
            "status": {"code": 0, "message": ""}
        }"#;
        let page: ThermostatPage = serde_json::from_str(json).unwrap();
        assert!(!page.page.has_more());
        assert_eq!(page.thermostat_list.len(), 2);

        let upstairs = &page.thermostat_list[0];
        let runtime = upstairs.runtime.as_ref().unwrap();
        assert!((runtime.temperature_f() - 71.5).abs() < f64::EPSILON);
        assert_eq!(upstairs.remote_sensors[0].capability_value("temperature"), Some("702"));
        assert_eq!(upstairs.remote_sensors[0].capability_value("humidity"), None);

        let downstairs = &page.thermostat_list[1];
        assert!(downstairs.runtime.is_none());
        assert!(downstairs.remote_sensors.is_empty());
    }

    #[test]
    fn test_page_has_more() {
        let page = Page { page: 1, total_pages: 3, page_size: 25, total: 60 };
        assert!(page.has_more());
    }
}
