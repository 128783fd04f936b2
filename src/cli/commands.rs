//! CLI command implementations
//!
//! Each `execute_*` handler returns the exit code for its outcome. Rejected
//! payloads are outcomes, not errors; only unusable input, configuration or
//! backend construction failures come back as `Err`.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use crate::{
    Config, ContractKind, ExitCode, HandoffCheckError, HandoffReport, HandoffType,
    ValidationResult, build_validator, emit_jcs, exit_code_for,
};

// ============================================================================
// Input
// ============================================================================

/// Read a JSON document from a file, or stdin for `-`
pub fn read_json_input(path: &Path) -> Result<Value> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(HandoffCheckError::Io)
            .context("Failed to read payload from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(HandoffCheckError::Io)
            .with_context(|| format!("Failed to read payload file {}", path.display()))?
    };
    let value = serde_json::from_str(&text)
        .map_err(HandoffCheckError::Json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(value)
}

/// Resolve the handoff type from `--type` or the payload's own tag
pub fn resolve_handoff_type(flag: Option<&str>, payload: &Value) -> Result<HandoffType> {
    if let Some(flag) = flag {
        let ty = flag
            .parse::<HandoffType>()
            .map_err(|e| HandoffCheckError::InvalidInput(e.to_string()))?;
        return Ok(ty);
    }
    HandoffType::detect(payload).ok_or_else(|| {
        HandoffCheckError::InvalidInput(
            "Cannot determine the handoff type: pass --type or add a 'handoff_type' field to the payload"
                .to_string(),
        )
        .into()
    })
}

// ============================================================================
// Validate Command
// ============================================================================

pub async fn execute_validate_command(
    file: &Path,
    handoff_type: Option<&str>,
    json: bool,
    config: &Config,
) -> Result<ExitCode> {
    let payload = read_json_input(file)?;
    let handoff_type = resolve_handoff_type(handoff_type, &payload)?;
    let allow_correction = config.validation.allow_correction;

    let validator = build_validator(config).context("Failed to construct the correction backend")?;
    let report = validator
        .validate_with_report(&payload, handoff_type, allow_correction)
        .await
        .context("Handoff validation failed")?;

    if json {
        println!("{}", emit_jcs(&report)?);
    } else {
        print!("{}", render_report(handoff_type, &report));
    }
    Ok(exit_code_for(&report))
}

/// Human-readable handoff report
#[must_use]
pub fn render_report(handoff_type: HandoffType, report: &HandoffReport) -> String {
    let mut out = String::new();
    let corrections = match report.correction_attempts {
        0 => String::new(),
        1 => ", 1 correction attempt".to_string(),
        n => format!(", {n} correction attempts"),
    };
    let mark = if report.result.is_valid { "✓" } else { "✗" };
    let _ = writeln!(
        out,
        "{mark} {handoff_type}: {}{corrections} in {} ms",
        report.final_state,
        report.duration.as_millis()
    );
    let _ = writeln!(out, "  trace_id: {}", report.trace_id);
    out.push_str(&render_findings(&report.result));
    out
}

fn render_findings(result: &ValidationResult) -> String {
    let mut out = String::new();
    let critical: Vec<_> = result.critical_errors().collect();
    if !critical.is_empty() {
        out.push_str("\n  Errors:\n");
        for error in critical {
            let _ = writeln!(
                out,
                "    [{}] {}: {} ({})",
                error.severity, error.field, error.message, error.error_type
            );
        }
    }
    if !result.warnings.is_empty() {
        out.push_str("\n  Warnings:\n");
        for warning in &result.warnings {
            let _ = writeln!(out, "    - {warning}");
        }
    }
    if !result.is_valid && !result.correction_suggestions.is_empty() {
        out.push_str("\n  Suggestions:\n");
        for suggestion in &result.correction_suggestions {
            let _ = writeln!(out, "    [{}] {}", suggestion.priority, suggestion.suggestion);
        }
    }
    out
}

// ============================================================================
// Package Command
// ============================================================================

pub fn execute_package_command(file: &Path, json: bool, config: &Config) -> Result<ExitCode> {
    let package = read_json_input(file)?;
    // Package validation never corrects, so no backend is needed
    let mut config = config.clone();
    config.validation.allow_correction = false;
    let validator = build_validator(&config)?;
    let result = validator.validate_package(&package);

    if json {
        println!("{}", emit_jcs(&result)?);
    } else {
        let mark = if result.is_valid { "✓" } else { "✗" };
        let verdict = if result.is_valid { "valid" } else { "rejected" };
        println!("{mark} {}: {verdict}", ContractKind::DeliveryPackage);
        print!("{}", render_findings(&result));
    }
    Ok(if result.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::VALIDATION_FAILED
    })
}

// ============================================================================
// Contract Command
// ============================================================================

pub fn execute_contract_command(contract: &str) -> Result<ExitCode> {
    let kind = contract
        .parse::<ContractKind>()
        .map_err(|e| HandoffCheckError::InvalidInput(e.to_string()))?;
    print!("{}", handoffcheck_contracts::contract_description(kind));
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Config Command
// ============================================================================

pub fn execute_config_command(json: bool, config: &Config) -> Result<ExitCode> {
    if json {
        println!("{}", emit_jcs(&config_json(config))?);
    } else {
        print!("{}", render_config(config));
    }
    Ok(ExitCode::SUCCESS)
}

/// Effective configuration as `{key: {value, source}}`
#[must_use]
pub fn config_json(config: &Config) -> Value {
    let entries: BTreeMap<String, Value> = config
        .effective_config_ordered()
        .into_iter()
        .map(|(key, value, source)| (key, json!({"value": value, "source": source})))
        .collect();
    json!({
        "provider": config.provider(),
        "model": handoffcheck_llm::effective_model(config),
        "effective_config": entries,
    })
}

#[must_use]
pub fn render_config(config: &Config) -> String {
    let rows = config.effective_config_ordered();
    let width = rows.iter().map(|(key, _, _)| key.len()).max().unwrap_or(0);
    let mut out = String::from("Effective configuration:\n");
    for (key, value, source) in rows {
        let _ = writeln!(out, "  {key:<width$}  {value}  ({source})");
    }
    let _ = writeln!(
        out,
        "\nCorrection model: {} via {}",
        handoffcheck_llm::effective_model(config),
        config.provider()
    );
    out
}
