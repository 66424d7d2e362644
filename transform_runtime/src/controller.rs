//! Transform controller — one rule invocation over bound records.
//!
//! Protocol per invocation:
//!   1. For each kind with input bytes, build and initialize an adapter.
//!   2. Bind proxies into the namespace: evt, ctx, dev + device,
//!      component, service. Kinds without bytes are never bound.
//!   3. Run the script inside the evaluator, wrapped in catch_unwind.
//!   4. Any fault → log, report Failure. Faults never reach the caller.
//!   5. On success, return the event adapter's merged bytes. Changes on
//!      the other kinds are computed but discarded — they are reference
//!      inputs for the rule's decision logic.
//!   6. Adapters are owned by the invocation and dropped on every exit
//!      path.
//!
//! Invocations share nothing; concurrent controllers are independent.

use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, warn};

use transform_kernel::error::ScriptError;
use transform_kernel::eval::{run_script, EvalLimits, Namespace};

use crate::adapter::{AdapterError, RecordAdapter};
use crate::fingerprint::fingerprint;
use crate::proto_types::{Component, Device, Event, EventContext, Service};
use crate::record_bridge::TransformRecord;

/// The optional encoded inputs for one invocation, one per entity kind.
#[derive(Debug, Default, Clone)]
pub struct TransformInputs {
    pub event: Option<Vec<u8>>,
    pub context: Option<Vec<u8>>,
    pub device: Option<Vec<u8>>,
    pub component: Option<Vec<u8>>,
    pub service: Option<Vec<u8>>,
}

/// Invocation result. A no-op rule is still `Success` — the bytes are
/// the unchanged original. Every failure cause collapses to `Failure`;
/// only the log says which.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutcome {
    Success(Vec<u8>),
    Failure,
}

impl TransformOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransformOutcome::Success(_))
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            TransformOutcome::Success(bytes) => Some(bytes),
            TransformOutcome::Failure => None,
        }
    }
}

/// Internal failure taxonomy. Logged at the boundary, never returned.
#[derive(Debug, Error)]
enum TransformError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("rule execution panicked: {0}")]
    Panic(String),

    #[error("no event record bound for this invocation")]
    MissingEvent,
}

/// Runs one rule body against one set of encoded records.
pub struct TransformController {
    inputs: TransformInputs,
    limits: EvalLimits,
}

impl TransformController {
    pub fn new(inputs: TransformInputs) -> Self {
        Self {
            inputs,
            limits: EvalLimits::default(),
        }
    }

    pub fn with_limits(inputs: TransformInputs, limits: EvalLimits) -> Self {
        Self { inputs, limits }
    }

    /// Run the rule body. The returned outcome is the only thing a
    /// caller can observe; the failure cause goes to the log.
    pub fn run_transform_script(&self, body: &str) -> TransformOutcome {
        let event_fp = self
            .inputs
            .event
            .as_deref()
            .map(fingerprint)
            .unwrap_or_else(|| "-".to_string());

        match self.execute(body) {
            Ok(bytes) => {
                debug!(event = %event_fp, out_len = bytes.len(), "transform succeeded");
                TransformOutcome::Success(bytes)
            }
            Err(err) => {
                warn!(event = %event_fp, error = %err, "transform failed");
                TransformOutcome::Failure
            }
        }
    }

    fn execute(&self, body: &str) -> Result<Vec<u8>, TransformError> {
        if self.inputs.event.is_none() {
            return Err(TransformError::MissingEvent);
        }

        let event_adapter = init_adapter::<Event>(&self.inputs.event)?;
        let context_adapter = init_adapter::<EventContext>(&self.inputs.context)?;
        let device_adapter = init_adapter::<Device>(&self.inputs.device)?;
        let component_adapter = init_adapter::<Component>(&self.inputs.component)?;
        let service_adapter = init_adapter::<Service>(&self.inputs.service)?;

        let mut ns = Namespace::new();
        if let Some(adapter) = &event_adapter {
            ns.bind("evt", adapter.proxy());
        }
        if let Some(adapter) = &context_adapter {
            ns.bind("ctx", adapter.proxy());
        }
        if let Some(adapter) = &device_adapter {
            ns.bind("dev", adapter.proxy());
            ns.bind("device", adapter.proxy());
        }
        if let Some(adapter) = &component_adapter {
            ns.bind("component", adapter.proxy());
        }
        if let Some(adapter) = &service_adapter {
            ns.bind("service", adapter.proxy());
        }

        // The evaluator reports faults as Err; catch_unwind is the hard
        // boundary for anything that slips past it.
        let run = catch_unwind(AssertUnwindSafe(|| run_script(body, &ns, &self.limits)));
        match run {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(TransformError::Script(err)),
            Err(payload) => return Err(TransformError::Panic(panic_message(payload))),
        }

        let event_adapter = event_adapter.expect("event adapter exists when input bytes exist");
        Ok(event_adapter.result()?)
    }
}

fn init_adapter<R: TransformRecord>(
    input: &Option<Vec<u8>>,
) -> Result<Option<RecordAdapter<R>>, AdapterError> {
    match input {
        Some(raw) => Ok(Some(RecordAdapter::initialize(raw)?)),
        None => Ok(None),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
