//! Thermostat selection, the filter sent with every data request.
//!
//! See <https://www.ecobee.com/home/developer/api/documentation/v1/objects/Selection.shtml>.

use serde::{Deserialize, Serialize};

/// How `selection_match` is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionType {
    /// All thermostats registered to the user; `selection_match` is ignored.
    #[default]
    Registered,
    /// Thermostats whose identifiers are listed, comma separated, in `selection_match`.
    Thermostats,
    /// Management sets (EMS accounts only).
    ManagementSet,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if passes a reference
fn is_false(b: &bool) -> bool {
    !*b
}

/// Selects which thermostats to return and which parts of them to include.
///
/// Unset `include_*` flags are omitted from the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub selection_type: SelectionType,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub selection_match: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub include_runtime: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub include_extended_runtime: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub include_settings: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub include_location: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub include_program: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub include_events: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub include_device: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub include_alerts: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub include_weather: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub include_equipment_status: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub include_sensors: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub include_version: bool,
}

impl Selection {
    /// Every thermostat registered to the account.
    #[must_use]
    pub fn registered() -> Self {
        Self::default()
    }

    /// Only the thermostats with the given identifiers.
    #[must_use]
    pub fn thermostats<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<String> = identifiers.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self {
            selection_type: SelectionType::Thermostats,
            selection_match: ids.join(","),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_runtime(mut self) -> Self {
        self.include_runtime = true;
        self
    }

    #[must_use]
    pub fn with_sensors(mut self) -> Self {
        self.include_sensors = true;
        self
    }

    #[must_use]
    pub fn with_alerts(mut self) -> Self {
        self.include_alerts = true;
        self
    }

    #[must_use]
    pub fn with_equipment_status(mut self) -> Self {
        self.include_equipment_status = true;
        self
    }

    /// The `json` query parameter value: `{"selection": {...}}`.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_query_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Wrapper<'a> {
            selection: &'a Selection,
        }
        serde_json::to_string(&Wrapper { selection: self })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_json_omits_unset_fields() {
        let selection = Selection {
            selection_type: SelectionType::Registered,
            selection_match: "awwyiss".into(),
            ..Selection::default()
        };
        assert_eq!(
            selection.to_query_json().unwrap(),
            r#"{"selection":{"selectionType":"registered","selectionMatch":"awwyiss"}}"#
        );
    }

    #[test]
    fn test_thermostats_selection() {
        let selection = Selection::thermostats(["318324702718", "318324702719"]).with_runtime();
        let json = selection.to_query_json().unwrap();
        assert!(json.contains(r#""selectionType":"thermostats""#));
        assert!(json.contains(r#""selectionMatch":"318324702718,318324702719""#));
        assert!(json.contains(r#""includeRuntime":true"#));
        assert!(!json.contains("includeSensors"));
    }

    #[test]
    fn test_selection_type_wire_names() {
        assert_eq!(serde_json::to_string(&SelectionType::ManagementSet).unwrap(), "\"managementSet\"");
    }
}
