use serde::Deserialize;
use serde_json::{Value, json};

// The five booking operations the model may call. Dispatch goes through this
// enum so a name string from the wire always hits a total match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ListAllUpcomingBookings,
    CreateBooking,
    LookUpFirstBooking,
    CancelFirstBooking,
    RescheduleFirstBooking,
}

impl ToolKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "list_all_upcoming_bookings" => Some(ToolKind::ListAllUpcomingBookings),
            "create_booking" => Some(ToolKind::CreateBooking),
            "look_up_first_booking" => Some(ToolKind::LookUpFirstBooking),
            "cancel_first_booking" => Some(ToolKind::CancelFirstBooking),
            "reschedule_first_booking" => Some(ToolKind::RescheduleFirstBooking),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::ListAllUpcomingBookings => "list_all_upcoming_bookings",
            ToolKind::CreateBooking => "create_booking",
            ToolKind::LookUpFirstBooking => "look_up_first_booking",
            ToolKind::CancelFirstBooking => "cancel_first_booking",
            ToolKind::RescheduleFirstBooking => "reschedule_first_booking",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsArgs {
    pub attendee_email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingArgs {
    pub attendee_email: String,
    pub attendee_name: String,
    pub start_time: String,
    pub time_zone: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

// Shared by look-up and cancel: both filter on email plus a start-time bound.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstBookingArgs {
    pub attendee_email: String,
    pub scheduled_start_time: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleBookingArgs {
    pub attendee_email: String,
    pub scheduled_start_time: String,
    pub new_start_time: String,
}

#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

// Schema advertised to the model on every turn.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: ToolKind::ListAllUpcomingBookings.name(),
            description: "Get a list of all upcoming bookings.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "attendeeEmail": {
                        "type": "string",
                        "description": "The email of the attendee to get bookings for."
                    }
                },
                "required": ["attendeeEmail"]
            }),
        },
        ToolDefinition {
            name: ToolKind::CreateBooking.name(),
            description: "Create a new booking for a given start time with 30 min duration.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "attendeeEmail": {
                        "type": "string",
                        "description": "The email of the attendee to create a booking for."
                    },
                    "attendeeName": {
                        "type": "string",
                        "description": "The name of the attendee to create a booking for."
                    },
                    "startTime": {
                        "type": "string",
                        "description": "The start time of the booking in ISO 8601 format in UTC timezone (e.g., 2023-10-01T00:00:00Z)."
                    },
                    "timeZone": {
                        "type": "string",
                        "description": "The time zone of the attendee (e.g., America/New_York)."
                    },
                    "phoneNumber": {
                        "type": "string",
                        "description": "The phone number of the attendee (optional)."
                    }
                },
                "required": ["attendeeEmail", "attendeeName", "startTime", "timeZone"]
            }),
        },
        ToolDefinition {
            name: ToolKind::LookUpFirstBooking.name(),
            description: "Look up the first booking for a given email after a specified start time.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "attendeeEmail": {
                        "type": "string",
                        "description": "The email of the attendee to get bookings for."
                    },
                    "scheduledStartTime": {
                        "type": "string",
                        "description": "The scheduled start time to look for bookings after, in ISO 8601 format in UTC timezone (e.g., 2023-10-01T00:00:00Z)."
                    }
                },
                "required": ["attendeeEmail", "scheduledStartTime"]
            }),
        },
        ToolDefinition {
            name: ToolKind::CancelFirstBooking.name(),
            description: "Cancel the first booking for a given email after a specified start time.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "attendeeEmail": {
                        "type": "string",
                        "description": "The email of the attendee to cancel the booking for."
                    },
                    "scheduledStartTime": {
                        "type": "string",
                        "description": "The scheduled start time to look for bookings after, in ISO 8601 format in UTC timezone (e.g., 2023-10-01T00:00:00Z)."
                    }
                },
                "required": ["attendeeEmail", "scheduledStartTime"]
            }),
        },
        ToolDefinition {
            name: ToolKind::RescheduleFirstBooking.name(),
            description: "Reschedule the first booking for a given email after a specified start time to a new start time.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "attendeeEmail": {
                        "type": "string",
                        "description": "The email of the attendee to reschedule the booking for."
                    },
                    "scheduledStartTime": {
                        "type": "string",
                        "description": "The scheduled start time to look for bookings after, in ISO 8601 format in UTC timezone (e.g., 2023-10-01T00:00:00Z)."
                    },
                    "newStartTime": {
                        "type": "string",
                        "description": "The new start time for the booking in ISO 8601 format in UTC timezone (e.g., 2023-10-01T00:00:00Z)."
                    }
                },
                "required": ["attendeeEmail", "scheduledStartTime", "newStartTime"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_definition_name_resolves_to_its_kind() {
        for def in tool_definitions() {
            let kind = ToolKind::from_name(def.name).expect("definition name must resolve");
            assert_eq!(kind.name(), def.name);
        }
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert_eq!(ToolKind::from_name("delete_all_bookings"), None);
        assert_eq!(ToolKind::from_name(""), None);
    }

    #[test]
    fn create_args_accept_missing_phone_number() {
        let args: CreateBookingArgs = serde_json::from_str(
            r#"{"attendeeEmail":"a@b.c","attendeeName":"Ada","startTime":"2025-02-01T15:00:00Z","timeZone":"America/New_York"}"#,
        )
        .unwrap();
        assert_eq!(args.attendee_email, "a@b.c");
        assert!(args.phone_number.is_none());
    }
}
