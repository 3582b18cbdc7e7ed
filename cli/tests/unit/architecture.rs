//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries stay
//! intact: domain is pure, application talks to the outside only through
//! ports, and infra never prints.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    fn process_line(&mut self, line: &str) -> bool {
        if line.trim().contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Lines outside comments and `#[cfg(test)]` blocks, with their line numbers.
fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut tracker = CfgTestTracker::new();
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            let comment = trimmed.starts_with("//") || trimmed.starts_with("/*");
            (!in_test && !comment).then(|| (i + 1, line.to_string()))
        })
        .collect()
}

fn src_dir(parts: &[&str]) -> PathBuf {
    parts
        .iter()
        .fold(Path::new(env!("CARGO_MANIFEST_DIR")).join("src"), |p, part| {
            p.join(part)
        })
}

/// Report every production line under `dir` containing one of `forbidden`.
fn find_violations(dir: &Path, forbidden: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(dir) {
        let rel = file
            .strip_prefix(env!("CARGO_MANIFEST_DIR"))
            .unwrap_or(&file)
            .display()
            .to_string();
        for (lineno, line) in production_lines(&file) {
            for pattern in forbidden {
                if line.contains(pattern) {
                    violations.push(format!("{rel}:{lineno}: `{pattern}`: {}", line.trim()));
                }
            }
        }
    }
    violations
}

#[test]
fn domain_is_free_of_io_and_outer_layers() {
    let violations = find_violations(
        &src_dir(&["domain"]),
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "tokio",
            "std::fs",
            "std::process",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must stay pure:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_uses_ports_only() {
    let violations = find_violations(
        &src_dir(&["application"]),
        &[
            "crate::infra",
            "crate::commands",
            "crate::output",
            "std::fs",
            "tokio::process",
        ],
    );
    assert!(
        violations.is_empty(),
        "application/ must reach I/O through ports:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = find_violations(&src_dir(&["infra"]), &["crate::commands", "crate::output"]);
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_and_services_have_no_print_macros() {
    let mut violations = find_violations(&src_dir(&["infra"]), &["println!", "eprintln!"]);
    violations.extend(find_violations(
        &src_dir(&["application"]),
        &["println!", "eprintln!"],
    ));
    assert!(
        violations.is_empty(),
        "infra/ and application/ report through tracing or ProgressReporter:\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_concrete_infra_types_in_service_signatures() {
    let services = src_dir(&["application", "services"]);
    let mut violations = Vec::new();
    for file in collect_rs_files(&services) {
        for (lineno, line) in production_lines(&file) {
            if !line.contains("fn ") {
                continue;
            }
            for concrete in ["OpenSshConnector", "LocalBackupStore", "TokioCommandRunner"] {
                if line.contains(concrete) {
                    violations.push(format!("{}:{lineno}: {}", file.display(), line.trim()));
                }
            }
        }
    }
    assert!(
        violations.is_empty(),
        "services must take trait bounds, not concrete infra types:\n{}",
        violations.join("\n")
    );
}
