//! Catalog of the appointment tools this server exposes to tool-calling
//! agents. The catalog is pushed to every client right after the channel-open
//! handshake; parameter schemas are human-readable strings by design.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One entry in the tool catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub description: String,
    pub parameters: BTreeMap<String, String>,
}

impl ToolDescriptor {
    fn new(description: &str, parameters: &[(&str, &str)]) -> Self {
        Self {
            description: description.to_string(),
            parameters: parameters
                .iter()
                .map(|(name, schema)| (name.to_string(), schema.to_string()))
                .collect(),
        }
    }
}

/// The full tool catalog, keyed by tool name.
pub fn catalog() -> BTreeMap<String, ToolDescriptor> {
    let mut tools = BTreeMap::new();

    tools.insert(
        "check_availability".to_string(),
        ToolDescriptor::new(
            "Checks availability for a specific date and time",
            &[
                ("appointmentDate", "string (date, format: yyyy-MM-dd)"),
                ("appointmentTime", "string (time, format: HH:mm)"),
            ],
        ),
    );

    tools.insert(
        "check_availability_range".to_string(),
        ToolDescriptor::new(
            "Checks availability across a time range and lists open slots",
            &[
                ("appointmentDate", "string (date, format: yyyy-MM-dd)"),
                ("startTime", "string (range start, format: HH:mm)"),
                ("endTime", "string (range end, format: HH:mm)"),
                ("durationMinutes", "string (slot duration in minutes)"),
            ],
        ),
    );

    tools.insert(
        "create_appointment".to_string(),
        ToolDescriptor::new(
            "Creates a new appointment",
            &[
                ("appointmentDate", "string (appointment date, format: yyyy-MM-dd)"),
                ("appointmentTime", "string (appointment time, format: HH:mm)"),
                ("name", "string (appointment name)"),
                ("summary", "string (description/summary)"),
            ],
        ),
    );

    tools.insert(
        "get_appointment_details".to_string(),
        ToolDescriptor::new(
            "Gets the details of an appointment",
            &[("id", "string (appointment ID)")],
        ),
    );

    tools.insert(
        "cancel_appointment".to_string(),
        ToolDescriptor::new(
            "Cancels an existing appointment",
            &[("id", "string (appointment ID)")],
        ),
    );

    tools.insert(
        "reschedule_appointment".to_string(),
        ToolDescriptor::new(
            "Reschedules an existing appointment with a new date, time, name and summary",
            &[
                ("id", "string (appointment ID)"),
                ("appointmentDate", "string (appointment date, format: yyyy-MM-dd)"),
                ("appointmentTime", "string (appointment time, format: HH:mm)"),
                ("name", "string (appointment name)"),
                ("summary", "string (description/summary)"),
            ],
        ),
    );

    tools
}

/// The catalog as a serialized JSON value, ready to embed in a `tools` event.
pub fn catalog_value() -> Value {
    serde_json::to_value(catalog()).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_all_six_tools() {
        let tools = catalog();
        for name in [
            "check_availability",
            "check_availability_range",
            "create_appointment",
            "get_appointment_details",
            "cancel_appointment",
            "reschedule_appointment",
        ] {
            assert!(tools.contains_key(name), "missing tool {name}");
        }
        assert_eq!(tools.len(), 6);
    }

    #[test]
    fn test_catalog_value_serializes_string_typed_parameters() {
        let value = catalog_value();
        let params = &value["create_appointment"]["parameters"];
        assert!(params["appointmentDate"]
            .as_str()
            .is_some_and(|s| s.starts_with("string")));
    }
}
