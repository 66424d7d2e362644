#![forbid(unsafe_code)]

//! Transform Runtime — wire records, adapters, and the controller.
//!
//! Decodes canonical records from wire bytes, shadows them with the
//! kernel's tracked proxies, runs one rule script per invocation, and
//! merges only genuine changes back into the Event.
//!
//! All rule faults are contained here — a bad script can never corrupt
//! controller state or reach the caller as anything but `Failure`.

pub mod proto_types;
pub mod api;
pub mod record_bridge;
pub mod adapter;
pub mod controller;
pub mod fingerprint;
