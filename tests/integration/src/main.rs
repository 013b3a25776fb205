//! Integration Test Harness
//!
//! Runs every integration test target and prints a summary.
//!
//! # Usage
//!
//! Run all tests:
//! ```text
//! cargo run -p integration-tests
//! ```
//!
//! Run specific test categories:
//! ```text
//! cargo test -p integration-tests --test object_model_tests
//! cargo test -p integration-tests --test xml_writer_tests
//! cargo test -p integration-tests --test mof_compile_tests
//! cargo test -p integration-tests --test transcoding_tests
//! ```
//!
//! Run with increased logging:
//! ```text
//! RUST_LOG=debug cargo run -p integration-tests
//! ```

use std::process::Command;
use std::time::{Duration, Instant};

/// Test category
#[derive(Debug, Clone)]
struct TestCategory {
    name: &'static str,
    description: &'static str,
    test_name: &'static str,
}

const TEST_CATEGORIES: &[TestCategory] = &[
    TestCategory {
        name: "Object Model Tests",
        description: "Shared handles, deep copies, renames and instance paths",
        test_name: "object_model_tests",
    },
    TestCategory {
        name: "XML Writer Tests",
        description: "CIM-XML elements and complete request/response messages",
        test_name: "xml_writer_tests",
    },
    TestCategory {
        name: "MOF Compile Tests",
        description: "MOF source to repository and CIM-XML output",
        test_name: "mof_compile_tests",
    },
    TestCategory {
        name: "Transcoding Tests",
        description: "UTF-16/UTF-8 transcoding and XML escaping",
        test_name: "transcoding_tests",
    },
];

fn print_banner() {
    println!("{}", "=".repeat(80));
    println!("  CIM Object Model / CIM-XML / MOF Compiler Integration Tests");
    println!("{}", "=".repeat(80));
}

fn print_test_categories() {
    println!("Test Categories:");
    println!("{}", "-".repeat(80));
    for (i, cat) in TEST_CATEGORIES.iter().enumerate() {
        println!("  {}. {} - {}", i + 1, cat.name, cat.description);
    }
    println!("{}", "-".repeat(80));
    println!();
}

fn run_test_category(category: &TestCategory) -> (bool, Duration, String) {
    println!("\n{}", "=".repeat(80));
    println!("Running: {}", category.name);
    println!("{}", "=".repeat(80));

    let start = Instant::now();

    let output = Command::new("cargo")
        .args(["test", "-p", "integration-tests", "--test", category.test_name, "--", "--nocapture"])
        .output();

    let duration = start.elapsed();

    match output {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);

            if !stdout.is_empty() {
                println!("{}", stdout);
            }
            if !stderr.is_empty() {
                eprintln!("{}", stderr);
            }

            let success = output.status.success();
            let summary = if success {
                "PASSED".to_string()
            } else {
                format!("FAILED (exit code: {:?})", output.status.code())
            };

            (success, duration, summary)
        }
        Err(e) => {
            (false, duration, format!("Failed to execute: {}", e))
        }
    }
}

fn main() {
    print_banner();
    print_test_categories();

    println!("Starting test suite...\n");

    let total_start = Instant::now();
    let mut results = Vec::new();

    for category in TEST_CATEGORIES {
        let (success, duration, summary) = run_test_category(category);
        results.push((category.name, success, duration, summary));
    }

    let total_duration = total_start.elapsed();

    // Print final summary
    println!("\n{}", "=".repeat(80));
    println!("FINAL SUMMARY");
    println!("{}", "=".repeat(80));

    let passed = results.iter().filter(|(_, s, _, _)| *s).count();
    let failed = results.iter().filter(|(_, s, _, _)| !*s).count();

    println!("\nCategories: {} | Passed: {} | Failed: {}", results.len(), passed, failed);
    println!("Total Duration: {:?}", total_duration);
    println!();

    println!("{:<30} {:<10} {:<15} {}", "Category", "Status", "Duration", "Details");
    println!("{}", "-".repeat(80));

    for (name, success, duration, summary) in &results {
        let status = if *success { "PASS" } else { "FAIL" };
        println!("{:<30} {:<10} {:<15?} {}", name, status, duration, summary);
    }

    println!("{}", "=".repeat(80));

    if failed > 0 {
        println!("\nSome tests failed!");
        std::process::exit(1);
    } else {
        println!("\nAll tests passed!");
        std::process::exit(0);
    }
}
