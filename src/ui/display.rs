//! Result rendering: status lines, tables and sizes.

use std::path::Path;

use bytesize::ByteSize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use console::style;
use zesec_rs::{EncryptionResult, Header, Operation, WipeOutcome};

pub fn format_bytes(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS).set_content_arrangement(ContentArrangement::Dynamic).set_header(header);
    table
}

pub fn show_success(operation: Operation, path: &Path, bytes: u64) {
    let action = match operation {
        Operation::Encrypt => "encrypted",
        Operation::Decrypt => "decrypted",
    };

    println!("{} {}", style("✓").green(), style(format!("File {action} successfully: {} ({})", path.display(), format_bytes(bytes))).bold());
}

pub fn show_source_deleted(path: &Path) {
    println!("{} {}", style("✓").green(), style(format!("Original securely erased: {}", path.display())).bold());
}

pub fn show_key_generated(path: &Path) {
    println!("{} {}", style("✓").green(), style(format!("Key file written: {}", path.display())).bold());
    println!("  {}", style("Keep it safe: without it, files encrypted with it cannot be recovered.").yellow());
}

pub fn show_wiped(path: &Path, deleted: bool) {
    let action = if deleted { "Securely erased" } else { "Overwritten" };
    println!("{} {}", style("✓").green(), style(format!("{action}: {}", path.display())).bold());
}

pub fn show_header(path: &Path, header: &Header) {
    let mut table = table(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("File"), Cell::new(path.display())]);
    table.add_row(vec![Cell::new("Format version"), Cell::new(header.version)]);
    table.add_row(vec![Cell::new("Cipher"), Cell::new("ChaCha20-Poly1305")]);
    table.add_row(vec![Cell::new("KDF"), Cell::new("PBKDF2-HMAC-SHA256")]);
    table.add_row(vec![Cell::new("Iterations"), Cell::new(header.iterations)]);
    println!("{table}");
}

pub fn show_encryption_results(results: &[EncryptionResult]) {
    if results.is_empty() {
        println!("{}", style("No files found").yellow());
        return;
    }

    let mut table = table(vec!["No", "Output", "Size", "Status"]);
    for (i, result) in results.iter().enumerate() {
        let output = result.output_path.as_deref().map_or_else(|| "-".to_owned(), |path| path.display().to_string());
        let status = match &result.error {
            None => Cell::new("ok").fg(Color::Green),
            Some(error) => Cell::new(error).fg(Color::Red),
        };
        table.add_row(vec![Cell::new(i + 1), Cell::new(output), Cell::new(format_bytes(result.bytes_processed)), status]);
    }

    let failed = results.iter().filter(|r| !r.success).count();
    println!("{table}");
    println!("{} of {} file(s) encrypted", results.len() - failed, results.len());
}

pub fn show_wipe_outcomes(outcomes: &[WipeOutcome]) {
    if outcomes.is_empty() {
        println!("{}", style("No files found").yellow());
        return;
    }

    let mut table = table(vec!["No", "Path", "Status"]);
    for (i, outcome) in outcomes.iter().enumerate() {
        let status = match &outcome.result {
            Ok(()) => Cell::new("wiped").fg(Color::Green),
            Err(error) => Cell::new(error).fg(Color::Red),
        };
        table.add_row(vec![Cell::new(i + 1), Cell::new(outcome.path().display()), status]);
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    println!("{table}");
    println!("{} of {} file(s) wiped", outcomes.len() - failed, outcomes.len());
}
