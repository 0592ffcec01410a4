//! Test harness for the INI parser against fixture files.
//!
//! Reads every .ini file under test/ini/ and checks that it parses, writes
//! back byte for byte, re-parses to the same values, and encodes to the JSON
//! in test/json/. Files under test/bad/ must fail with the message in the
//! matching .error file.

use std::fs;
use std::path::{Path, PathBuf};

use libini::{encode, parse, parse_with_filename, Document, Format};

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

/// All files matching `*.ext` in a subdirectory of test/, sorted.
fn fixture_files(subdir: &str, ext: &str) -> Vec<PathBuf> {
    let pattern = test_root().join(subdir).join(format!("*.{}", ext));
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .flatten()
        .collect();
    files.sort();
    files
}

/// Read a sibling fixture with the same stem from another subdirectory.
fn read_companion(path: &Path, subdir: &str, ext: &str) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    fs::read_to_string(test_root().join(subdir).join(format!("{}.{}", stem, ext))).ok()
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

/// Keys, values, and kinds of every scope, in order.
fn summarize(doc: &Document) -> Vec<(String, String, String)> {
    let mut out = Vec::new();
    for (key, value) in doc.root().entries() {
        out.push((String::new(), key.to_string(), format!("{:?}", value)));
    }
    for section in doc.sections() {
        for (key, value) in section.body().entries() {
            out.push((
                section.name().to_string(),
                key.to_string(),
                format!("{:?}", value),
            ));
        }
    }
    out
}

/// Run a single .ini fixture (expected to succeed).
fn run_ini_test(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;

    let doc = parse_with_filename(&content, Some(&filename))
        .map_err(|e| format!("{}: Unexpected parse error: {}", filename, e))?;

    let raw = doc.to_raw_string();
    if raw != content {
        return Err(format!(
            "{}: Raw output differs from input\n    expected: {:?}\n    actual:   {:?}",
            filename, content, raw
        ));
    }

    let again = parse(&doc.to_canonical_string())
        .map_err(|e| format!("{}: Canonical output does not parse: {}", filename, e))?;
    if summarize(&again) != summarize(&doc) {
        return Err(format!("{}: Canonical re-parse changed values", filename));
    }

    if let Some(expected) = read_companion(path, "json", "json") {
        let actual = encode(&doc, Format::Json);
        if actual != expected.trim_end() {
            return Err(format!(
                "{}: JSON mismatch\n    expected: {}\n    actual:   {}",
                filename,
                expected.trim_end(),
                actual
            ));
        }
        println!("  {} => {}", filename, actual.replace('\n', " "));
    } else {
        println!("  {} => ok (no expected JSON)", filename);
    }
    Ok(())
}

/// Run a single bad fixture (expected to fail with a specific error).
fn run_bad_test(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;

    match parse_with_filename(&content, Some(&filename)) {
        Ok(doc) => Err(format!(
            "{}: Expected parse error, but got success: {:?}",
            filename, doc
        )),
        Err(e) => {
            let actual_error = e.to_string();
            if !e.is_malformed_document() {
                return Err(format!(
                    "{}: Error is not a malformed document: {}",
                    filename, actual_error
                ));
            }
            match read_companion(path, "bad", "error") {
                Some(expected) if expected.trim() == actual_error => {
                    println!("  {} => error (as expected)", filename);
                    Ok(())
                }
                Some(expected) => Err(format!(
                    "{}: Error mismatch\n    expected: {}\n    actual:   {}",
                    filename,
                    expected.trim(),
                    actual_error
                )),
                None => {
                    println!(
                        "  {} => error: {} (no .error file to compare)",
                        filename, actual_error
                    );
                    Ok(())
                }
            }
        }
    }
}

fn run_all(kind: &str, files: &[PathBuf], run: fn(&Path) -> Result<(), String>) {
    assert!(!files.is_empty(), "No {} fixtures found!", kind);
    println!("\nRunning {} {} fixtures:", files.len(), kind);

    let errors: Vec<String> = files.iter().filter_map(|f| run(f).err()).collect();

    println!(
        "\nResults: {} passed, {} failed",
        files.len() - errors.len(),
        errors.len()
    );
    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }

    assert!(errors.is_empty(), "{} {} fixtures failed", errors.len(), kind);
}

#[test]
fn test_all_ini_fixtures() {
    run_all("valid", &fixture_files("ini", "ini"), run_ini_test);
}

#[test]
fn test_all_bad_fixtures() {
    run_all("bad", &fixture_files("bad", "ini"), run_bad_test);
}

#[test]
fn test_every_bad_fixture_has_error_file() {
    for path in fixture_files("bad", "ini") {
        assert!(
            read_companion(&path, "bad", "error").is_some(),
            "{} has no .error file",
            file_name(&path)
        );
    }
}

#[test]
fn test_canonical_output_of_fixtures() {
    for path in fixture_files("ini", "ini") {
        let content = fs::read_to_string(&path).unwrap();
        let doc = parse(&content).unwrap();
        let canonical = encode(&doc, Format::Canonical);
        let reparsed = parse(&canonical).unwrap();
        assert_eq!(
            encode(&reparsed, Format::Canonical),
            canonical,
            "{}: canonical form is not stable",
            file_name(&path)
        );
    }
}
