//! Compiled-in message texts, used when the backend catalog has no entry of
//! the requested kind (or must not be consulted at all in MOCK mode).

use super::types::{Severity, ToastMessage};

/// Default toast for `code`, if one ships with the client.
pub fn toast_default(code: &str) -> Option<ToastMessage> {
    let (title, description, severity) = match code {
        // Mode / connectivity
        "MOCK_MODE_WARNING" => ("MOCK Mode", Some("Changes are NOT saved to database"), Severity::Error),
        "API_UNAVAILABLE" => ("API unavailable", Some("Backend did not respond, switched to MOCK mode"), Severity::Error),
        "API_CONNECTED" => ("Connected", Some("Using live backend data"), Severity::Success),
        "MOCK_MODE_ENABLED" => ("MOCK mode enabled", Some("Showing sample data only"), Severity::Info),

        // Settings
        "SETTINGS_SAVED" => ("Settings saved", None, Severity::Success),
        "SETTINGS_SAVE_FAILED" => ("Could not save settings", None, Severity::Error),

        // Orders / campaigns
        "ORDER_CANCELLED" => ("Order cancelled", None, Severity::Success),
        "ORDER_CANCEL_FAILED" => ("Could not cancel order", Some("Try again later"), Severity::Error),
        "CAMPAIGN_CREATED" => ("Campaign created", None, Severity::Success),
        "CAMPAIGN_STARTED" => ("Campaign started", None, Severity::Success),
        "CAMPAIGN_STOPPED" => ("Campaign stopped", None, Severity::Info),
        "CAMPAIGN_INVALID_GRID" => ("Invalid grid settings", Some("Check price range and step count"), Severity::Warning),

        // Import / jobs
        "CSV_IMPORT_SUCCESS" => ("Import complete", None, Severity::Success),
        "CSV_IMPORT_FAILED" => ("Import failed", Some("The file could not be parsed"), Severity::Error),
        "CRON_JOB_UPDATED" => ("Schedule updated", None, Severity::Success),

        // Message catalog administration
        "MESSAGE_SAVED" => ("Message saved", None, Severity::Success),
        "MESSAGE_DELETED" => ("Message deleted", None, Severity::Success),
        "MESSAGE_INVALID_CODE" => ("Invalid code", Some("Use uppercase letters, digits and underscores"), Severity::Warning),
        "CATALOG_REFRESHED" => ("Messages refreshed", None, Severity::Success),
        "CATALOG_REFRESH_FAILED" => ("Could not refresh messages", Some("Showing cached texts"), Severity::Warning),

        _ => return None,
    };

    Some(ToastMessage {
        title: title.to_string(),
        description: description.map(str::to_string),
        severity: Some(severity),
    })
}

/// Default alert body for `code`, if one ships with the client.
pub fn alert_default(code: &str) -> Option<&'static str> {
    let body = match code {
        "CONFIRM_DELETE_MESSAGE" => "Delete this message? Screens will fall back to built-in text.",
        "CONFIRM_CANCEL_ORDER" => "Cancel this order?",
        "CONFIRM_DELETE_CAMPAIGN" => "Delete this campaign and all of its pending orders?",
        "CONFIRM_SWITCH_LIVE" => "Switch to Live execution? Orders will be sent to the exchange.",
        "CONFIRM_SWITCH_MOCK" => "Switch to MOCK mode? Changes will no longer be saved.",
        "SESSION_EXPIRED" => "Your session has expired. Please sign in again.",
        "API_UNAVAILABLE" => "The backend is unreachable. The app is running in MOCK mode.",
        _ => return None,
    };
    Some(body)
}
