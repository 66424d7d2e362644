//! Script-level kernel tests — full tokenize/parse/evaluate passes
//! against hand-built schemas, checking the change sets a rule leaves
//! behind.

use std::cell::RefCell;
use std::rc::Rc;

use transform_kernel::error::ScriptError;
use transform_kernel::eval::{run_script, EvalLimits, Namespace};
use transform_kernel::proxy::TrackedProxy;
use transform_kernel::schema::Schema;
use transform_kernel::value::FieldValue;

fn event_proxy() -> TrackedProxy {
    let schema = Schema::new(
        "event",
        &["event_class", "severity", "summary", "message"],
        &["uuid", "created_time"],
        &[("eventClass", "event_class"), ("createdTime", "created_time")],
        &[],
    )
    .unwrap();
    let mut proxy = TrackedProxy::new(schema);
    proxy
        .set("event_class", FieldValue::Str("/Unknown".to_string()))
        .unwrap();
    proxy
        .set(
            "message",
            FieldValue::Str("funny burning smell in the rack".to_string()),
        )
        .unwrap();
    proxy
        .set("uuid", FieldValue::Str("evt-0001".to_string()))
        .unwrap();
    proxy.set("created_time", FieldValue::Uint(1_700_000_000)).unwrap();
    proxy.mark();
    proxy.freeze();
    proxy
}

fn context_proxy(count: u64) -> TrackedProxy {
    let schema = Schema::new(
        "context",
        &["notes"],
        &["count", "first_seen_time"],
        &[("firstSeenTime", "first_seen_time")],
        &[],
    )
    .unwrap();
    let mut proxy = TrackedProxy::new(schema);
    proxy.set("count", FieldValue::Uint(count)).unwrap();
    proxy.set("first_seen_time", FieldValue::Uint(1_600_000_000)).unwrap();
    proxy.mark();
    proxy.freeze();
    proxy
}

fn bind(
    event: TrackedProxy,
    context: TrackedProxy,
) -> (Namespace, Rc<RefCell<TrackedProxy>>, Rc<RefCell<TrackedProxy>>) {
    let evt = Rc::new(RefCell::new(event));
    let ctx = Rc::new(RefCell::new(context));
    let mut ns = Namespace::new();
    ns.bind("evt", Rc::clone(&evt));
    ns.bind("ctx", Rc::clone(&ctx));
    (ns, evt, ctx)
}

const FIRE_RULE: &str = r#"
# escalate unknown events that smell like hardware fires
if evt.eventClass == "/Unknown" {
    msg = lower(evt.message)
    if "fire" in msg || "burning" in msg || "smoking" in msg || "cinders" in msg || "ashes" in msg {
        evt.eventClass = "/Status/ReallyBad/DeviceOnFire"
        if ctx.count > 20 {
            evt.severity = "CRITICAL"
        } else {
            evt.severity = "WARNING"
        }
    }
}
"#;

#[test]
fn fire_rule_escalates_high_count() {
    let (ns, evt, ctx) = bind(event_proxy(), context_proxy(42));
    run_script(FIRE_RULE, &ns, &EvalLimits::default()).unwrap();

    let changes = evt.borrow().get_changes();
    assert_eq!(
        changes.get("event_class"),
        Some(&FieldValue::Str("/Status/ReallyBad/DeviceOnFire".to_string()))
    );
    assert_eq!(
        changes.get("severity"),
        Some(&FieldValue::Str("CRITICAL".to_string()))
    );
    assert_eq!(changes.len(), 2);
    // The context was only read.
    assert!(!ctx.borrow().changed());
}

#[test]
fn fire_rule_warns_on_low_count() {
    let (ns, evt, _) = bind(event_proxy(), context_proxy(5));
    run_script(FIRE_RULE, &ns, &EvalLimits::default()).unwrap();

    let changes = evt.borrow().get_changes();
    assert_eq!(
        changes.get("severity"),
        Some(&FieldValue::Str("WARNING".to_string()))
    );
}

#[test]
fn fire_rule_leaves_quiet_event_alone() {
    let mut quiet = event_proxy();
    // Rebuild the message below the freeze boundary: mutable field,
    // then re-mark so the rewrite itself is not a tracked change.
    quiet
        .set("message", FieldValue::Str("all quiet".to_string()))
        .unwrap();
    quiet.mark();

    let (ns, evt, _) = bind(quiet, context_proxy(42));
    run_script(FIRE_RULE, &ns, &EvalLimits::default()).unwrap();
    assert!(!evt.borrow().changed());
}

#[test]
fn write_then_revert_leaves_no_change() {
    let (ns, evt, _) = bind(event_proxy(), context_proxy(1));
    run_script(
        "evt.eventClass = \"/Changed\"\nevt.eventClass = \"/Unknown\"",
        &ns,
        &EvalLimits::default(),
    )
    .unwrap();
    assert!(!evt.borrow().changed());
}

#[test]
fn readonly_write_is_silently_dropped() {
    let (ns, evt, _) = bind(event_proxy(), context_proxy(1));
    run_script("evt.uuid = \"forged\"", &ns, &EvalLimits::default()).unwrap();

    let proxy = evt.borrow();
    assert!(!proxy.changed());
    assert_eq!(
        proxy.get("uuid").unwrap(),
        FieldValue::Str("evt-0001".to_string())
    );
}

#[test]
fn rule_fault_leaves_partial_changes_visible() {
    // Faults stop execution mid-script; whatever was written before the
    // fault stays on the proxy. The controller discards the whole
    // invocation, so this is observable only at kernel level.
    let (ns, evt, _) = bind(event_proxy(), context_proxy(1));
    let err = run_script(
        "evt.severity = \"ERROR\"\nevt.missing_field = 1",
        &ns,
        &EvalLimits::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ScriptError::UnknownField(_)));
    assert!(evt.borrow().changed());
}

#[test]
fn unbound_binding_is_a_fault() {
    let (ns, _, _) = bind(event_proxy(), context_proxy(1));
    let err = run_script("dev.title = \"x\"", &ns, &EvalLimits::default()).unwrap_err();
    assert!(matches!(err, ScriptError::UnknownVariable(_)));
}
