//! Conformance suite runner.
//!
//! Convention:
//!   positive/          -- *.conf + *.expected.toml (converted without header,
//!                         compared byte-for-byte, must parse as TOML)
//!   negative/<kind>/   -- *.conf + *.expected-error.json (error expected)
//!                         for kind in lex, syntax, undefined, cycle, nesting

use crate::tap::Tap;
use cfgtoml_core::{convert_with, ConvertOptions};
use serde_json::Value;
use std::path::{Path, PathBuf};

const NEGATIVE_KINDS: [&str; 5] = ["lex", "syntax", "undefined", "cycle", "nesting"];

pub struct RunResult {
    pub failed: usize,
}

pub fn run_suite(suite_dir: &Path) -> RunResult {
    let mut tap = Tap::new();

    run_positive_tests(suite_dir, &mut tap);

    for kind in NEGATIVE_KINDS {
        run_negative_tests(suite_dir, kind, &mut tap);
    }

    let failed = tap.failure_count();
    tap.finish();

    RunResult { failed }
}

fn run_positive_tests(suite_dir: &Path, tap: &mut Tap) {
    let dir = suite_dir.join("positive");
    if !dir.exists() {
        return;
    }
    let mut entries = glob_conf_files(&dir);
    entries.sort();
    for conf_path in &entries {
        let stem = stem(conf_path);
        let expected_path = dir.join(format!("{}.expected.toml", stem));
        if !expected_path.exists() {
            tap.not_ok(
                format!("positive/{}", stem),
                format!("missing expected file: {}", expected_path.display()),
            );
            continue;
        }
        run_positive_test(conf_path, &expected_path, &stem, tap);
    }
}

fn run_negative_tests(suite_dir: &Path, kind: &str, tap: &mut Tap) {
    let dir = suite_dir.join("negative").join(kind);
    if !dir.exists() {
        return;
    }
    let mut entries = glob_conf_files(&dir);
    entries.sort();
    for conf_path in &entries {
        let stem = stem(conf_path);
        let expected_path = dir.join(format!("{}.expected-error.json", stem));
        if !expected_path.exists() {
            tap.not_ok(
                format!("negative/{}/{}", kind, stem),
                format!("missing expected-error file: {}", expected_path.display()),
            );
            continue;
        }
        run_negative_test(conf_path, &expected_path, &stem, kind, tap);
    }
}

fn run_positive_test(conf_path: &Path, expected_path: &Path, name: &str, tap: &mut Tap) {
    let test_name = format!("positive/{}", name);

    let (src, expected) = match (read_text(conf_path), read_text(expected_path)) {
        (Ok(src), Ok(expected)) => (src, expected),
        (Err(e), _) | (_, Err(e)) => {
            tap.not_ok(&test_name, e);
            return;
        }
    };

    match convert_with(&src, &ConvertOptions::deterministic()) {
        Ok(got) => {
            if let Err(e) = toml::from_str::<toml::Table>(&got) {
                tap.not_ok(&test_name, format!("output is not valid TOML: {}", e));
            } else if got == expected {
                tap.ok(&test_name);
            } else {
                tap.not_ok(
                    &test_name,
                    format!("output mismatch:\n--- expected\n{}+++ got\n{}", expected, got),
                );
            }
        }
        Err(e) => {
            tap.not_ok(
                &test_name,
                format!("unexpected {} error: {}", e.kind(), e),
            );
        }
    }
}

fn run_negative_test(
    conf_path: &Path,
    expected_error_path: &Path,
    name: &str,
    kind: &str,
    tap: &mut Tap,
) {
    let test_name = format!("negative/{}/{}", kind, name);

    let expected_error = match read_json(expected_error_path) {
        Ok(v) => v,
        Err(e) => {
            tap.not_ok(
                &test_name,
                format!("failed to read expected-error file: {}", e),
            );
            return;
        }
    };
    let src = match read_text(conf_path) {
        Ok(s) => s,
        Err(e) => {
            tap.not_ok(&test_name, e);
            return;
        }
    };

    match convert_with(&src, &ConvertOptions::deterministic()) {
        Err(got_error) => {
            let got_json = got_error.to_json_value();
            if got_json == expected_error {
                tap.ok(&test_name);
            } else {
                let diff = json_diff(&expected_error, &got_json);
                tap.not_ok(&test_name, format!("error mismatch:\n{}", diff));
            }
        }
        Ok(_) => {
            tap.not_ok(
                &test_name,
                format!("expected {} error but conversion succeeded", kind),
            );
        }
    }
}

// -- Helpers --

fn glob_conf_files(dir: &Path) -> Vec<PathBuf> {
    let mut results = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("conf") {
                results.push(path);
            }
        }
    }
    results
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn read_text(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))
}

fn read_json(path: &Path) -> Result<Value, String> {
    let src = read_text(path)?;
    serde_json::from_str(&src).map_err(|e| format!("invalid JSON in {}: {}", path.display(), e))
}

fn json_diff(expected: &Value, got: &Value) -> String {
    let exp_str = serde_json::to_string_pretty(expected).unwrap_or_default();
    let got_str = serde_json::to_string_pretty(got).unwrap_or_default();
    format!("--- expected\n{}\n+++ got\n{}", exp_str, got_str)
}
