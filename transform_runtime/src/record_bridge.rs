//! Record ↔ proxy field bridge.
//!
//! Hand-written per-type field access between the wire records and the
//! kernel's `FieldValue`. The match arms mirror the wire schema; a
//! field missing here but declared active in `api.rs` is a wiring bug
//! that surfaces as an adapter error, not a silent drop.

use prost::Message;

use transform_kernel::value::FieldValue;

use crate::adapter::AdapterError;
use crate::api::EntityKind;
use crate::proto_types::{Component, Device, Event, EventContext, Service};

/// A wire record that can back a tracked proxy.
pub trait TransformRecord: Message + Default + Clone {
    const KIND: EntityKind;

    /// Current value of a canonical field, or None if the record does
    /// not carry it.
    fn read_field(&self, field: &str) -> Option<FieldValue>;

    /// Write a changed value back into the record.
    fn write_field(&mut self, field: &str, value: &FieldValue) -> Result<(), AdapterError>;
}

// ── Conversion helpers ─────────────────────────────────────────

fn to_string_field(
    kind: EntityKind,
    field: &str,
    value: &FieldValue,
) -> Result<String, AdapterError> {
    match value {
        FieldValue::Str(s) => Ok(s.clone()),
        other => Err(type_error(kind, field, "string", other)),
    }
}

fn to_i32_field(kind: EntityKind, field: &str, value: &FieldValue) -> Result<i32, AdapterError> {
    value
        .as_num()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| type_error(kind, field, "int32", value))
}

fn to_u32_field(kind: EntityKind, field: &str, value: &FieldValue) -> Result<u32, AdapterError> {
    value
        .as_num()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| type_error(kind, field, "uint32", value))
}

fn to_u64_field(kind: EntityKind, field: &str, value: &FieldValue) -> Result<u64, AdapterError> {
    value
        .as_num()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| type_error(kind, field, "uint64", value))
}

fn type_error(kind: EntityKind, field: &str, expected: &'static str, got: &FieldValue) -> AdapterError {
    AdapterError::FieldType {
        kind: kind.as_str(),
        field: field.to_string(),
        expected,
        got: got.type_name(),
    }
}

fn unknown_field(kind: EntityKind, field: &str) -> AdapterError {
    AdapterError::UnknownRecordField {
        kind: kind.as_str(),
        field: field.to_string(),
    }
}

// ── Event ──────────────────────────────────────────────────────

impl TransformRecord for Event {
    const KIND: EntityKind = EntityKind::Event;

    fn read_field(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "uuid" => FieldValue::Str(self.uuid.clone()),
            "created_time" => FieldValue::Uint(self.created_time),
            "fingerprint" => FieldValue::Str(self.fingerprint.clone()),
            "event_class" => FieldValue::Str(self.event_class.clone()),
            "event_class_key" => FieldValue::Str(self.event_class_key.clone()),
            "summary" => FieldValue::Str(self.summary.clone()),
            "message" => FieldValue::Str(self.message.clone()),
            "severity" => FieldValue::Str(self.severity.clone()),
            "event_key" => FieldValue::Str(self.event_key.clone()),
            "event_group" => FieldValue::Str(self.event_group.clone()),
            "agent" => FieldValue::Str(self.agent.clone()),
            "monitor" => FieldValue::Str(self.monitor.clone()),
            "syslog_priority" => FieldValue::Int(self.syslog_priority as i64),
            "syslog_facility" => FieldValue::Int(self.syslog_facility as i64),
            "nt_event_code" => FieldValue::Uint(self.nt_event_code as u64),
            _ => return None,
        };
        Some(value)
    }

    fn write_field(&mut self, field: &str, value: &FieldValue) -> Result<(), AdapterError> {
        let kind = Self::KIND;
        match field {
            "uuid" => self.uuid = to_string_field(kind, field, value)?,
            "fingerprint" => self.fingerprint = to_string_field(kind, field, value)?,
            "event_class" => self.event_class = to_string_field(kind, field, value)?,
            "event_class_key" => self.event_class_key = to_string_field(kind, field, value)?,
            "summary" => self.summary = to_string_field(kind, field, value)?,
            "message" => self.message = to_string_field(kind, field, value)?,
            "severity" => self.severity = to_string_field(kind, field, value)?,
            "event_key" => self.event_key = to_string_field(kind, field, value)?,
            "event_group" => self.event_group = to_string_field(kind, field, value)?,
            "agent" => self.agent = to_string_field(kind, field, value)?,
            "monitor" => self.monitor = to_string_field(kind, field, value)?,
            "created_time" => self.created_time = to_u64_field(kind, field, value)?,
            "syslog_priority" => self.syslog_priority = to_i32_field(kind, field, value)?,
            "syslog_facility" => self.syslog_facility = to_i32_field(kind, field, value)?,
            "nt_event_code" => self.nt_event_code = to_u32_field(kind, field, value)?,
            _ => return Err(unknown_field(kind, field)),
        }
        Ok(())
    }
}

// ── EventContext ───────────────────────────────────────────────

impl TransformRecord for EventContext {
    const KIND: EntityKind = EntityKind::Context;

    fn read_field(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "uuid" => FieldValue::Str(self.uuid.clone()),
            "status" => FieldValue::Str(self.status.clone()),
            "count" => FieldValue::Uint(self.count as u64),
            "first_seen_time" => FieldValue::Uint(self.first_seen_time),
            "last_seen_time" => FieldValue::Uint(self.last_seen_time),
            "status_change_time" => FieldValue::Uint(self.status_change_time),
            "update_time" => FieldValue::Uint(self.update_time),
            "notes" => FieldValue::Str(self.notes.clone()),
            "cleared_by_event_uuid" => FieldValue::Str(self.cleared_by_event_uuid.clone()),
            _ => return None,
        };
        Some(value)
    }

    fn write_field(&mut self, field: &str, value: &FieldValue) -> Result<(), AdapterError> {
        let kind = Self::KIND;
        match field {
            "uuid" => self.uuid = to_string_field(kind, field, value)?,
            "status" => self.status = to_string_field(kind, field, value)?,
            "notes" => self.notes = to_string_field(kind, field, value)?,
            "cleared_by_event_uuid" => {
                self.cleared_by_event_uuid = to_string_field(kind, field, value)?
            }
            "count" => self.count = to_u32_field(kind, field, value)?,
            "first_seen_time" => self.first_seen_time = to_u64_field(kind, field, value)?,
            "last_seen_time" => self.last_seen_time = to_u64_field(kind, field, value)?,
            "status_change_time" => self.status_change_time = to_u64_field(kind, field, value)?,
            "update_time" => self.update_time = to_u64_field(kind, field, value)?,
            _ => return Err(unknown_field(kind, field)),
        }
        Ok(())
    }
}

// ── Device ─────────────────────────────────────────────────────

impl TransformRecord for Device {
    const KIND: EntityKind = EntityKind::Device;

    fn read_field(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "uuid" => FieldValue::Str(self.uuid.clone()),
            "id" => FieldValue::Str(self.id.clone()),
            "title" => FieldValue::Str(self.title.clone()),
            "production_state" => FieldValue::Int(self.production_state as i64),
            "priority" => FieldValue::Int(self.priority as i64),
            "location" => FieldValue::Str(self.location.clone()),
            _ => return None,
        };
        Some(value)
    }

    fn write_field(&mut self, field: &str, value: &FieldValue) -> Result<(), AdapterError> {
        let kind = Self::KIND;
        match field {
            "uuid" => self.uuid = to_string_field(kind, field, value)?,
            "id" => self.id = to_string_field(kind, field, value)?,
            "title" => self.title = to_string_field(kind, field, value)?,
            "location" => self.location = to_string_field(kind, field, value)?,
            "production_state" => self.production_state = to_i32_field(kind, field, value)?,
            "priority" => self.priority = to_i32_field(kind, field, value)?,
            _ => return Err(unknown_field(kind, field)),
        }
        Ok(())
    }
}

// ── Component ──────────────────────────────────────────────────

impl TransformRecord for Component {
    const KIND: EntityKind = EntityKind::Component;

    fn read_field(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "uuid" => FieldValue::Str(self.uuid.clone()),
            "id" => FieldValue::Str(self.id.clone()),
            "title" => FieldValue::Str(self.title.clone()),
            "device_uuid" => FieldValue::Str(self.device_uuid.clone()),
            _ => return None,
        };
        Some(value)
    }

    fn write_field(&mut self, field: &str, value: &FieldValue) -> Result<(), AdapterError> {
        let kind = Self::KIND;
        match field {
            "uuid" => self.uuid = to_string_field(kind, field, value)?,
            "id" => self.id = to_string_field(kind, field, value)?,
            "title" => self.title = to_string_field(kind, field, value)?,
            "device_uuid" => self.device_uuid = to_string_field(kind, field, value)?,
            _ => return Err(unknown_field(kind, field)),
        }
        Ok(())
    }
}

// ── Service ────────────────────────────────────────────────────

impl TransformRecord for Service {
    const KIND: EntityKind = EntityKind::Service;

    fn read_field(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "uuid" => FieldValue::Str(self.uuid.clone()),
            "id" => FieldValue::Str(self.id.clone()),
            "title" => FieldValue::Str(self.title.clone()),
            _ => return None,
        };
        Some(value)
    }

    fn write_field(&mut self, field: &str, value: &FieldValue) -> Result<(), AdapterError> {
        let kind = Self::KIND;
        match field {
            "uuid" => self.uuid = to_string_field(kind, field, value)?,
            "id" => self.id = to_string_field(kind, field, value)?,
            "title" => self.title = to_string_field(kind, field, value)?,
            _ => return Err(unknown_field(kind, field)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api;

    /// Every active schema field must be readable from its record type.
    fn assert_covers<R: TransformRecord>(record: &R, schema: &transform_kernel::schema::Schema) {
        for field in schema.active_fields() {
            assert!(
                record.read_field(field).is_some(),
                "{} record does not carry active field {:?}",
                R::KIND.as_str(),
                field
            );
        }
    }

    #[test]
    fn bridges_cover_their_schemas() {
        assert_covers(&Event::default(), &api::event_schema());
        assert_covers(&EventContext::default(), &api::context_schema());
        assert_covers(&Device::default(), &api::device_schema());
        assert_covers(&Component::default(), &api::component_schema());
        assert_covers(&Service::default(), &api::service_schema());
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut event = Event::default();
        event
            .write_field("severity", &FieldValue::Str("CRITICAL".to_string()))
            .unwrap();
        event
            .write_field("syslog_priority", &FieldValue::Int(3))
            .unwrap();
        assert_eq!(
            event.read_field("severity"),
            Some(FieldValue::Str("CRITICAL".to_string()))
        );
        assert_eq!(event.read_field("syslog_priority"), Some(FieldValue::Int(3)));
    }

    #[test]
    fn write_rejects_wrong_types() {
        let mut event = Event::default();
        let err = event
            .write_field("severity", &FieldValue::Int(5))
            .unwrap_err();
        assert!(matches!(err, AdapterError::FieldType { .. }));

        let err = event
            .write_field("nt_event_code", &FieldValue::Int(-1))
            .unwrap_err();
        assert!(matches!(err, AdapterError::FieldType { .. }));
    }

    #[test]
    fn write_rejects_unknown_fields() {
        let mut device = Device::default();
        let err = device
            .write_field("count", &FieldValue::Uint(1))
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnknownRecordField { .. }));
    }
}
