//! Proxy schema declarations for the five transform entity kinds.
//!
//! These are the statically declared layouts the rule namespace sees.
//! CamelCase aliases are the compatibility names older rule bodies use;
//! both spellings resolve to the same canonical field.
//!
//! The event schema declares the occurrence fields (count, seen times,
//! status change) that actually live on the context record — they are
//! excluded here, so the event proxy never exposes them and rules must
//! read them from `ctx`.

use transform_kernel::schema::Schema;

/// The five entity kinds a transform invocation can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Event,
    Context,
    Device,
    Component,
    Service,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Event => "event",
            EntityKind::Context => "context",
            EntityKind::Device => "device",
            EntityKind::Component => "component",
            EntityKind::Service => "service",
        }
    }

    pub fn schema(self) -> Schema {
        match self {
            EntityKind::Event => event_schema(),
            EntityKind::Context => context_schema(),
            EntityKind::Device => device_schema(),
            EntityKind::Component => component_schema(),
            EntityKind::Service => service_schema(),
        }
    }
}

pub fn event_schema() -> Schema {
    Schema::new(
        "event",
        &[
            "event_class",
            "event_class_key",
            "event_key",
            "event_group",
            "agent",
            "monitor",
            "severity",
            "summary",
            "message",
            "syslog_priority",
            "syslog_facility",
            "nt_event_code",
            "count",
            "first_seen_time",
            "last_seen_time",
            "status_change_time",
        ],
        &["uuid", "created_time", "fingerprint"],
        &[
            ("eventClass", "event_class"),
            ("eventClassKey", "event_class_key"),
            ("eventKey", "event_key"),
            ("eventGroup", "event_group"),
            ("createdTime", "created_time"),
        ],
        &[
            "count",
            "first_seen_time",
            "last_seen_time",
            "status_change_time",
        ],
    )
    .expect("event schema declaration is valid")
}

pub fn context_schema() -> Schema {
    Schema::new(
        "context",
        &["notes"],
        &[
            "uuid",
            "status",
            "count",
            "first_seen_time",
            "last_seen_time",
            "status_change_time",
            "update_time",
            "cleared_by_event_uuid",
        ],
        &[
            ("firstSeenTime", "first_seen_time"),
            ("lastSeenTime", "last_seen_time"),
            ("statusChangeTime", "status_change_time"),
            ("clearedByEventUuid", "cleared_by_event_uuid"),
        ],
        &[],
    )
    .expect("context schema declaration is valid")
}

pub fn device_schema() -> Schema {
    Schema::new(
        "device",
        &["title", "production_state", "priority", "location"],
        &["uuid", "id"],
        &[
            ("prodState", "production_state"),
            ("productionState", "production_state"),
        ],
        &[],
    )
    .expect("device schema declaration is valid")
}

pub fn component_schema() -> Schema {
    Schema::new(
        "component",
        &["title"],
        &["uuid", "id", "device_uuid"],
        &[("deviceUuid", "device_uuid")],
        &[],
    )
    .expect("component schema declaration is valid")
}

pub fn service_schema() -> Schema {
    Schema::new("service", &["title"], &["uuid", "id"], &[], &[])
        .expect("service schema declaration is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use transform_kernel::schema::FieldKind;

    #[test]
    fn all_schemas_declare_cleanly() {
        for kind in [
            EntityKind::Event,
            EntityKind::Context,
            EntityKind::Device,
            EntityKind::Component,
            EntityKind::Service,
        ] {
            let schema = kind.schema();
            assert_eq!(schema.entity(), kind.as_str());
        }
    }

    #[test]
    fn event_occurrence_fields_are_excluded() {
        let schema = event_schema();
        assert!(schema.is_excluded("count"));
        assert_eq!(schema.resolve("count"), None);
        // The context exposes the same field read-only.
        let ctx = context_schema();
        assert_eq!(ctx.resolve("count"), Some("count"));
        assert_eq!(ctx.kind("count"), Some(FieldKind::ReadOnly));
    }

    #[test]
    fn compatibility_aliases_resolve() {
        assert_eq!(event_schema().resolve("eventClass"), Some("event_class"));
        assert_eq!(
            device_schema().resolve("prodState"),
            Some("production_state")
        );
        assert_eq!(
            context_schema().resolve("statusChangeTime"),
            Some("status_change_time")
        );
    }
}
