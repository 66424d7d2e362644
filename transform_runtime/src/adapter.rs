//! Record adapters — bind one decoded record to one tracked proxy.
//!
//! Lifecycle per invocation: decode once, copy values into the proxy,
//! `mark()` to establish the baseline (the copy itself is never a
//! tracked change), `freeze()` to lock read-only fields, hand the proxy
//! to the rule, then diff-and-merge on the way out.
//!
//! An adapter is owned by its invocation and dropped with it.

use std::cell::RefCell;
use std::rc::Rc;

use prost::Message;
use thiserror::Error;

use transform_kernel::proxy::TrackedProxy;

use crate::record_bridge::TransformRecord;

/// Failures binding a record to a proxy or merging changes back.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to decode {kind} record: {message}")]
    Decode { kind: &'static str, message: String },

    #[error("field {field:?} does not exist on the {kind} record")]
    UnknownRecordField { kind: &'static str, field: String },

    #[error("field {field:?} on the {kind} record expects {expected}, got {got}")]
    FieldType {
        kind: &'static str,
        field: String,
        expected: &'static str,
        got: &'static str,
    },
}

/// One canonical record plus its change-tracked shadow.
#[derive(Debug)]
pub struct RecordAdapter<R: TransformRecord> {
    record: R,
    proxy: Rc<RefCell<TrackedProxy>>,
}

impl<R: TransformRecord> RecordAdapter<R> {
    /// Decode `raw` and build the proxy: copy every active field in,
    /// then mark and freeze. Decode failures abort the invocation.
    pub fn initialize(raw: &[u8]) -> Result<Self, AdapterError> {
        let record = R::decode(raw).map_err(|e| AdapterError::Decode {
            kind: R::KIND.as_str(),
            message: e.to_string(),
        })?;

        let mut proxy = TrackedProxy::new(R::KIND.schema());
        let fields: Vec<String> = proxy
            .schema()
            .active_fields()
            .map(|f| f.to_string())
            .collect();
        for field in fields {
            let value = record
                .read_field(&field)
                .ok_or_else(|| AdapterError::UnknownRecordField {
                    kind: R::KIND.as_str(),
                    field: field.clone(),
                })?;
            proxy
                .set(&field, value)
                .expect("active schema field is always known to its own proxy");
        }
        proxy.mark();
        proxy.freeze();

        Ok(Self {
            record,
            proxy: Rc::new(RefCell::new(proxy)),
        })
    }

    /// Shared handle for binding into the rule namespace.
    pub fn proxy(&self) -> Rc<RefCell<TrackedProxy>> {
        Rc::clone(&self.proxy)
    }

    /// Merge genuine changes into the record and encode it.
    ///
    /// With no changes the original decoded record is encoded untouched,
    /// so a no-op rule round-trips canonically encoded input
    /// byte-identically.
    pub fn result(&self) -> Result<Vec<u8>, AdapterError> {
        let proxy = self.proxy.borrow();
        if !proxy.changed() {
            return Ok(self.record.encode_to_vec());
        }

        let mut updated = self.record.clone();
        for (field, value) in proxy.get_changes() {
            updated.write_field(&field, &value)?;
        }
        Ok(updated.encode_to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transform_kernel::value::FieldValue;

    use crate::proto_types::{Event, EventContext};

    fn sample_event() -> Event {
        Event {
            uuid: "e-1".to_string(),
            created_time: 1_700_000_000,
            event_class: "/Unknown".to_string(),
            message: "funny burning smell".to_string(),
            severity: "INFO".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn initialize_copies_values_without_tracking() {
        let raw = sample_event().encode_to_vec();
        let adapter = RecordAdapter::<Event>::initialize(&raw).unwrap();
        let proxy = adapter.proxy();
        let proxy = proxy.borrow();

        assert!(!proxy.changed());
        assert_eq!(
            proxy.get("event_class").unwrap(),
            FieldValue::Str("/Unknown".to_string())
        );
        assert_eq!(proxy.get("created_time").unwrap(), FieldValue::Uint(1_700_000_000));
        assert!(proxy.is_frozen());
    }

    #[test]
    fn unchanged_proxy_round_trips_bytes() {
        let raw = sample_event().encode_to_vec();
        let adapter = RecordAdapter::<Event>::initialize(&raw).unwrap();
        assert_eq!(adapter.result().unwrap(), raw);
    }

    #[test]
    fn changes_merge_into_the_record() {
        let raw = sample_event().encode_to_vec();
        let adapter = RecordAdapter::<Event>::initialize(&raw).unwrap();

        adapter
            .proxy()
            .borrow_mut()
            .set("severity", FieldValue::Str("CRITICAL".to_string()))
            .unwrap();

        let out = Event::decode(adapter.result().unwrap().as_slice()).unwrap();
        assert_eq!(out.severity, "CRITICAL");
        // Untouched fields come from the original record.
        assert_eq!(out.message, "funny burning smell");
        assert_eq!(out.uuid, "e-1");
    }

    #[test]
    fn reverted_change_round_trips_bytes() {
        let raw = sample_event().encode_to_vec();
        let adapter = RecordAdapter::<Event>::initialize(&raw).unwrap();

        {
            let proxy = adapter.proxy();
            let mut proxy = proxy.borrow_mut();
            proxy
                .set("severity", FieldValue::Str("CRITICAL".to_string()))
                .unwrap();
            proxy
                .set("severity", FieldValue::Str("INFO".to_string()))
                .unwrap();
        }
        assert_eq!(adapter.result().unwrap(), raw);
    }

    #[test]
    fn malformed_bytes_fail_to_initialize() {
        // Field 1 declares a 255-byte payload that is not there.
        let err = RecordAdapter::<Event>::initialize(&[0x0A, 0xFF]).unwrap_err();
        assert!(matches!(err, AdapterError::Decode { .. }));
    }

    #[test]
    fn context_adapter_exposes_occurrence_fields() {
        let context = EventContext {
            uuid: "c-1".to_string(),
            count: 42,
            status: "NEW".to_string(),
            ..Default::default()
        };
        let raw = context.encode_to_vec();
        let adapter = RecordAdapter::<EventContext>::initialize(&raw).unwrap();
        let proxy = adapter.proxy();
        let proxy = proxy.borrow();
        assert_eq!(proxy.get("count").unwrap(), FieldValue::Uint(42));
    }
}
