//! Integration Test: Sleep and Blocking I/O Prohibition
//!
//! **Policy**: Production code must wait on I/O, never on the clock, and must
//! not block inside async functions.
//! **Exceptions**: replay pacing in the scripted transport; blocking reads in
//! plain functions that run before or outside the runtime (config loading).

use std::fs;

use architectural_enforcement::{
    code_part, fail_with, is_in_async_function, production_lines_in, rust_files,
};

const SCANNED: &[&str] = &["scout/core/src", "scout/cli/src"];

/// Files allowed to sleep, with the reason
const SLEEP_ALLOWED: &[(&str, &str)] = &[("transport/scripted.rs", "replay chunk pacing")];

#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for dir in SCANNED {
        for line in production_lines_in(dir) {
            let is_sleep = line.code.contains("sleep(") || line.code.contains("thread::sleep");
            let allowed = SLEEP_ALLOWED
                .iter()
                .any(|(file, _)| line.path.ends_with(file));
            if is_sleep && !allowed {
                violations.push(line.to_string());
            }
        }
    }

    fail_with(
        "Sleep calls found in production code!",
        &[
            "✅ Wait on the stream, a channel or a watch receiver instead",
            "✅ Pacing a replay belongs in ScriptedTransport::with_chunk_delay",
        ],
        &violations,
    );
}

#[test]
fn test_no_blocking_io_in_async_functions() {
    let mut violations = Vec::new();

    for dir in SCANNED {
        for path in rust_files(dir) {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            let lines: Vec<&str> = content
                .lines()
                .take_while(|l| !l.trim_start().starts_with("#[cfg(test)]"))
                .collect();

            for (idx, line) in lines.iter().enumerate() {
                let code = code_part(line);
                let blocking = code.contains("std::fs::")
                    || code.contains("std::net::")
                    || code.contains("reqwest::blocking")
                    || code.contains("std::thread::sleep");
                if blocking && is_in_async_function(&lines, idx) {
                    violations.push(format!("{}:{} - {}", path.display(), idx + 1, line.trim()));
                }
            }
        }
    }

    fail_with(
        "Blocking I/O inside async functions!",
        &["✅ Use tokio::fs / reqwest async APIs inside async fns"],
        &violations,
    );
}
