use axum::http::StatusCode;
use chrono::{DateTime, Duration, Local, SecondsFormat, Utc};
use rand::Rng;
use serde_json::{json, Value};

/// Hours (local time, tomorrow) offered by the availability stub.
pub const SLOT_HOURS: [u32; 3] = [10, 14, 16];

const CONFIRMATION_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CONFIRMATION_LEN: usize = 6;

/// Inbound tool-call payload.
///
/// Extraction is tolerant: absent, empty, or wrong-typed fields all count as
/// missing. A malformed body is a specified 400 response, never an error
/// path.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    pub tool: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub start_time: Option<String>,
}

impl WebhookRequest {
    pub fn from_value(body: &Value) -> Self {
        let field = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            tool: field("tool"),
            name: field("name"),
            email: field("email"),
            start_time: field("startTime"),
        }
    }
}

/// Status and JSON body produced by the responder.
#[derive(Debug, Clone)]
pub struct WebhookReply {
    pub status: StatusCode,
    pub body: Value,
}

impl WebhookReply {
    fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    fn bad_request(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "success": false, "error": error.into() }),
        }
    }
}

/// The responder state machine. Pure: the clock and the random source are
/// parameters, so tests can pin both.
///
/// The requested `startTime` never filters the availability slots; it is
/// only echoed back. That is the observed behavior of the scheduling stub
/// this replaces.
pub fn build_response<R: Rng>(
    request: &WebhookRequest,
    now: DateTime<Local>,
    rng: &mut R,
) -> WebhookReply {
    let (tool, name) = match (request.tool.as_deref(), request.name.as_deref()) {
        (Some(tool), Some(name)) => (tool, name),
        _ => return WebhookReply::bad_request("Missing required fields: tool, name"),
    };

    match tool {
        "check" => WebhookReply::ok(json!({
            "success": true,
            "action": "check",
            "requested": {
                "name": name,
                "email": request.email,
                "startTime": request.start_time,
            },
            "availableSlots": available_slots(now),
        })),
        "book" => {
            let Some(start_time) = request.start_time.as_deref() else {
                return WebhookReply::bad_request("Missing startTime for booking");
            };
            WebhookReply::ok(json!({
                "success": true,
                "action": "book",
                "confirmationId": confirmation_id(rng),
                "scheduledAt": start_time,
                "customer": { "name": name, "email": request.email },
            }))
        }
        other => WebhookReply::bad_request(format!("Unknown tool: {}", other)),
    }
}

/// Tomorrow's candidate slots relative to `now`, as UTC ISO-8601 strings
/// with millisecond precision.
pub fn available_slots(now: DateTime<Local>) -> Vec<String> {
    let tomorrow = now.date_naive() + Duration::days(1);
    SLOT_HOURS
        .iter()
        .filter_map(|&hour| {
            tomorrow
                .and_hms_opt(hour, 0, 0)
                .and_then(|civil| civil.and_local_timezone(Local).earliest())
        })
        .map(|slot| {
            slot.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        })
        .collect()
}

/// `RDV-` plus six characters drawn uniformly from `[A-Z0-9]`.
pub fn confirmation_id<R: Rng>(rng: &mut R) -> String {
    let suffix: String = (0..CONFIRMATION_LEN)
        .map(|_| CONFIRMATION_CHARSET[rng.gen_range(0..CONFIRMATION_CHARSET.len())] as char)
        .collect();
    format!("RDV-{}", suffix)
}
