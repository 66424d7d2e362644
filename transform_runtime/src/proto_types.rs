//! Hand-written protobuf wire types for the five entity kinds.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Field numbers are the wire contract — never renumber.
//!
//! The `from_value` constructors build records from JSON fixtures
//! (absent fields default); `Event::to_value` flattens an event back to
//! JSON for fixture comparison.

use prost::Message;
use serde_json::{json, Value};

// ── Event ──────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct Event {
    #[prost(string, tag = "1")]
    pub uuid: String,
    #[prost(uint64, tag = "2")]
    pub created_time: u64,
    #[prost(string, tag = "3")]
    pub fingerprint: String,
    #[prost(string, tag = "4")]
    pub event_class: String,
    #[prost(string, tag = "5")]
    pub event_class_key: String,
    #[prost(string, tag = "6")]
    pub event_class_mapping_uuid: String,
    #[prost(string, tag = "7")]
    pub summary: String,
    #[prost(string, tag = "8")]
    pub message: String,
    #[prost(string, tag = "9")]
    pub severity: String,
    #[prost(string, tag = "10")]
    pub event_key: String,
    #[prost(string, tag = "11")]
    pub event_group: String,
    #[prost(string, tag = "12")]
    pub agent: String,
    #[prost(string, tag = "13")]
    pub monitor: String,
    #[prost(int32, tag = "14")]
    pub syslog_priority: i32,
    #[prost(int32, tag = "15")]
    pub syslog_facility: i32,
    #[prost(uint32, tag = "16")]
    pub nt_event_code: u32,
    #[prost(string, repeated, tag = "17")]
    pub tags: Vec<String>,
}

// ── EventContext ───────────────────────────────────────────────

/// Occurrence-tracking context for an event: counts and lifecycle
/// timestamps maintained by the surrounding system.
#[derive(Clone, PartialEq, Message)]
pub struct EventContext {
    #[prost(string, tag = "1")]
    pub uuid: String,
    #[prost(string, tag = "2")]
    pub status: String,
    #[prost(uint32, tag = "3")]
    pub count: u32,
    #[prost(uint64, tag = "4")]
    pub first_seen_time: u64,
    #[prost(uint64, tag = "5")]
    pub last_seen_time: u64,
    #[prost(uint64, tag = "6")]
    pub status_change_time: u64,
    #[prost(uint64, tag = "7")]
    pub update_time: u64,
    #[prost(string, tag = "8")]
    pub notes: String,
    #[prost(string, tag = "9")]
    pub cleared_by_event_uuid: String,
}

// ── Model entities ─────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct Device {
    #[prost(string, tag = "1")]
    pub uuid: String,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub title: String,
    #[prost(int32, tag = "4")]
    pub production_state: i32,
    #[prost(int32, tag = "5")]
    pub priority: i32,
    #[prost(string, tag = "6")]
    pub location: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Component {
    #[prost(string, tag = "1")]
    pub uuid: String,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub title: String,
    #[prost(string, tag = "4")]
    pub device_uuid: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Service {
    #[prost(string, tag = "1")]
    pub uuid: String,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub title: String,
}

// ── JSON fixture bridge ────────────────────────────────────────

fn str_field(v: &Value, key: &str) -> String {
    v.get(key).and_then(|s| s.as_str()).unwrap_or("").to_string()
}

fn u64_field(v: &Value, key: &str) -> u64 {
    v.get(key).and_then(|n| n.as_u64()).unwrap_or(0)
}

fn i32_field(v: &Value, key: &str) -> i32 {
    v.get(key).and_then(|n| n.as_i64()).unwrap_or(0) as i32
}

impl Event {
    pub fn from_value(v: &Value) -> Self {
        Self {
            uuid: str_field(v, "uuid"),
            created_time: u64_field(v, "created_time"),
            fingerprint: str_field(v, "fingerprint"),
            event_class: str_field(v, "event_class"),
            event_class_key: str_field(v, "event_class_key"),
            event_class_mapping_uuid: str_field(v, "event_class_mapping_uuid"),
            summary: str_field(v, "summary"),
            message: str_field(v, "message"),
            severity: str_field(v, "severity"),
            event_key: str_field(v, "event_key"),
            event_group: str_field(v, "event_group"),
            agent: str_field(v, "agent"),
            monitor: str_field(v, "monitor"),
            syslog_priority: i32_field(v, "syslog_priority"),
            syslog_facility: i32_field(v, "syslog_facility"),
            nt_event_code: u64_field(v, "nt_event_code") as u32,
            tags: v
                .get("tags")
                .and_then(|a| a.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|s| s.as_str().map(|s| s.to_string()))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "uuid": self.uuid,
            "created_time": self.created_time,
            "fingerprint": self.fingerprint,
            "event_class": self.event_class,
            "event_class_key": self.event_class_key,
            "event_class_mapping_uuid": self.event_class_mapping_uuid,
            "summary": self.summary,
            "message": self.message,
            "severity": self.severity,
            "event_key": self.event_key,
            "event_group": self.event_group,
            "agent": self.agent,
            "monitor": self.monitor,
            "syslog_priority": self.syslog_priority,
            "syslog_facility": self.syslog_facility,
            "nt_event_code": self.nt_event_code,
            "tags": self.tags,
        })
    }
}

impl EventContext {
    pub fn from_value(v: &Value) -> Self {
        Self {
            uuid: str_field(v, "uuid"),
            status: str_field(v, "status"),
            count: u64_field(v, "count") as u32,
            first_seen_time: u64_field(v, "first_seen_time"),
            last_seen_time: u64_field(v, "last_seen_time"),
            status_change_time: u64_field(v, "status_change_time"),
            update_time: u64_field(v, "update_time"),
            notes: str_field(v, "notes"),
            cleared_by_event_uuid: str_field(v, "cleared_by_event_uuid"),
        }
    }
}

impl Device {
    pub fn from_value(v: &Value) -> Self {
        Self {
            uuid: str_field(v, "uuid"),
            id: str_field(v, "id"),
            title: str_field(v, "title"),
            production_state: i32_field(v, "production_state"),
            priority: i32_field(v, "priority"),
            location: str_field(v, "location"),
        }
    }
}

impl Component {
    pub fn from_value(v: &Value) -> Self {
        Self {
            uuid: str_field(v, "uuid"),
            id: str_field(v, "id"),
            title: str_field(v, "title"),
            device_uuid: str_field(v, "device_uuid"),
        }
    }
}

impl Service {
    pub fn from_value(v: &Value) -> Self {
        Self {
            uuid: str_field(v, "uuid"),
            id: str_field(v, "id"),
            title: str_field(v, "title"),
        }
    }
}
