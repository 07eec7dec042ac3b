//! # Model Definition Validator
//!
//! A command-line utility for checking model definition files before they
//! are submitted to a running service.
//!
//! ## Usage
//!
//! ### Validate a Single Definition
//!
//! ```bash
//! cargo run --bin definition-validator models/tree.json
//! ```
//!
//! ### Validate All Definitions in a Directory
//!
//! ```bash
//! cargo run --bin definition-validator ./models/
//! ```
//!
//! Files are validated in file name order. Each valid definition is stored
//! under its file stem, so a later file may reference an earlier one by
//! model name (`object` with `model`, `oneof`, `anyof`).
//!
//! ## Output Examples
//!
//! ```text
//! Validating definitions in directory: ./models/
//!
//! Validating: person.json
//!   ✓ Valid - Person (2 fields)
//!
//! Validating: tree.json
//!   ❌ Invalid
//!     fields.1.model: Model 'owner' not found
//!
//! Validation Summary:
//!   Valid definitions: 1
//!   Invalid definitions: 1
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: All definitions are valid
//! - `1`: One or more definitions are invalid or could not be read

use dynamic_models::{InMemoryStorage, ModelDefinition, ValidationEngine};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <definition-file-or-directory>", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} models/tree.json", args[0]);
        eprintln!("  {} ./models/", args[0]);
        process::exit(1);
    }

    let path = Path::new(&args[1]);
    let engine = ValidationEngine::new();
    let store = InMemoryStorage::new();

    if path.is_file() {
        validate_single_file(&engine, &store, path);
    } else if path.is_dir() {
        validate_directory(&engine, &store, path);
    } else {
        eprintln!("Error: '{}' is not a valid file or directory", path.display());
        process::exit(1);
    }
}

fn validate_single_file(engine: &ValidationEngine, store: &InMemoryStorage, file_path: &Path) {
    println!("Validating definition file: {}", file_path.display());

    match load_and_validate(engine, store, file_path) {
        Ok(definition) => {
            println!("✓ Definition is valid!");
            print_definition_summary(&definition);
        }
        Err(e) => {
            eprintln!("❌ Definition validation failed:");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn validate_directory(engine: &ValidationEngine, store: &InMemoryStorage, dir_path: &Path) {
    println!("Validating definitions in directory: {}", dir_path.display());

    let files = match json_files(dir_path) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error reading directory: {}", e);
            process::exit(1);
        }
    };

    let mut valid_count = 0;
    let mut error_count = 0;

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("\nValidating: {}", name);

        match load_and_validate(engine, store, &path) {
            Ok(definition) => {
                println!(
                    "  ✓ Valid - {} ({} fields)",
                    definition.title,
                    definition.fields.len()
                );
                valid_count += 1;
            }
            Err(e) => {
                eprintln!("  ❌ Invalid");
                for line in e.lines() {
                    eprintln!("    {}", line);
                }
                error_count += 1;
            }
        }
    }

    println!("\nValidation Summary:");
    println!("  Valid definitions: {}", valid_count);
    println!("  Invalid definitions: {}", error_count);

    if let Ok(names) = store.model_names() {
        if !names.is_empty() {
            println!("  Stored models: {}", names.join(", "));
        }
    }

    if error_count > 0 {
        process::exit(1);
    }
}

fn json_files(dir_path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir_path)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Validate one file and store it under its file stem. The error is the
/// printable report, one problem per line.
fn load_and_validate(
    engine: &ValidationEngine,
    store: &InMemoryStorage,
    file_path: &Path,
) -> Result<ModelDefinition, String> {
    let content = fs::read_to_string(file_path).map_err(|e| format!("cannot read file: {}", e))?;
    let raw: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| format!("invalid JSON: {}", e))?;

    let definition = engine.validate_definition(&raw, store).map_err(|errors| {
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    })?;

    let model_name = file_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| "file has no name".to_string())?;
    store
        .put_model(model_name, definition.clone())
        .map_err(|e| e.to_string())?;

    Ok(definition)
}

fn print_definition_summary(definition: &ModelDefinition) {
    println!();
    println!("Definition Summary:");
    println!("  Title: {}", definition.title);
    println!("  Description: {}", definition.description);
    println!("  Fields: {}", definition.fields.len());

    let mut type_counts = BTreeMap::new();
    for field in &definition.fields {
        *type_counts.entry(field.type_name.as_str()).or_insert(0) += 1;
    }
    println!("  Field types:");
    for (type_name, count) in type_counts {
        println!("    - {}: {}", type_name, count);
    }

    let required: Vec<&str> = definition
        .fields
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name.as_str())
        .collect();
    if !required.is_empty() {
        println!("  Required fields: {}", required.join(", "));
    }
}
