/// Transform harness — fixture-driven end-to-end runner.
///
/// Loads JSON transform cases, runs each through a fresh controller,
/// and compares the decoded output event against the expected fields.
/// Exits nonzero if any case fails.

use std::fs;
use std::path::Path;

use prost::Message;
use serde::Deserialize;
use serde_json::Value;

use transform_runtime::controller::{TransformController, TransformInputs, TransformOutcome};
use transform_runtime::proto_types::{Component, Device, Event, EventContext, Service};

#[derive(Deserialize)]
struct Case {
    name: String,
    script: String,
    event: Option<Value>,
    context: Option<Value>,
    device: Option<Value>,
    component: Option<Value>,
    service: Option<Value>,
    #[serde(default)]
    expect_failure: bool,
    expected_event: Option<Value>,
}

fn build_inputs(case: &Case) -> TransformInputs {
    TransformInputs {
        event: case.event.as_ref().map(|v| Event::from_value(v).encode_to_vec()),
        context: case
            .context
            .as_ref()
            .map(|v| EventContext::from_value(v).encode_to_vec()),
        device: case.device.as_ref().map(|v| Device::from_value(v).encode_to_vec()),
        component: case
            .component
            .as_ref()
            .map(|v| Component::from_value(v).encode_to_vec()),
        service: case.service.as_ref().map(|v| Service::from_value(v).encode_to_vec()),
    }
}

/// Run one case. Returns a list of mismatch descriptions (empty = pass).
fn run_case(case: &Case) -> Vec<String> {
    let controller = TransformController::new(build_inputs(case));
    let outcome = controller.run_transform_script(&case.script);

    let mut problems = Vec::new();
    match outcome {
        TransformOutcome::Failure => {
            if !case.expect_failure {
                problems.push("unexpected Failure outcome".to_string());
            }
        }
        TransformOutcome::Success(bytes) => {
            if case.expect_failure {
                problems.push("expected Failure, got Success".to_string());
                return problems;
            }
            let event = match Event::decode(bytes.as_slice()) {
                Ok(event) => event,
                Err(e) => {
                    problems.push(format!("output did not decode as Event: {}", e));
                    return problems;
                }
            };
            if let Some(expected) = &case.expected_event {
                let actual = event.to_value();
                for (key, want) in expected.as_object().into_iter().flatten() {
                    let got = &actual[key.as_str()];
                    if got != want {
                        problems.push(format!(
                            "field {}: expected {}, got {}",
                            key, want, got
                        ));
                    }
                }
            }
        }
    }
    problems
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let arg = std::env::args().nth(1);
    let candidates = [
        "transform_cases.json",
        "tests/golden/transform_cases.json",
        "transform_runtime/tests/golden/transform_cases.json",
    ];

    let mut data = None;
    if let Some(path) = &arg {
        data = Some(fs::read_to_string(path).expect("Failed to read case file"));
        println!("Loaded cases from: {}", path);
    } else {
        for p in &candidates {
            if Path::new(p).exists() {
                data = Some(fs::read_to_string(p).expect("Failed to read case file"));
                println!("Loaded cases from: {}", p);
                break;
            }
        }
    }
    let data = data.expect("Could not find transform_cases.json — pass a path as the first argument");

    let cases: Vec<Case> = serde_json::from_str(&data).expect("Failed to parse case JSON");

    let mut passed = 0;
    let mut failed = 0;
    for case in &cases {
        let problems = run_case(case);
        if problems.is_empty() {
            passed += 1;
            println!("[PASS] {}", case.name);
        } else {
            failed += 1;
            println!("[FAIL] {}", case.name);
            for p in &problems {
                println!("  {}", p);
            }
        }
    }

    println!("\n===========================================");
    println!("Results: {}/{} passed", passed, passed + failed);
    if failed > 0 {
        std::process::exit(1);
    }
}
