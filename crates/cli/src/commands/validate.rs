// SPDX-License-Identifier: MIT

//! `hive validate <task-dir>` -- drive the Drone Validator directly
//! against a directory, independent of any registered cell (§4.5, §6).

use hive_core::{CellId, Dimension, DroneId};
use hive_validator::dimensions::{security, strategic, technical, NoArchitectureRules};
use hive_validator::{consensus, ValidationReport};

use crate::cli::ValidateArgs;
use crate::output::{emit, OutputFormat};

fn requested_dimensions(raw: &[String]) -> anyhow::Result<Vec<Dimension>> {
    if raw.is_empty() {
        return Ok(Dimension::ALL.to_vec());
    }
    raw.iter()
        .map(|s| match s.as_str() {
            "technical" => Ok(Dimension::Technical),
            "strategic" => Ok(Dimension::Strategic),
            "security" => Ok(Dimension::Security),
            other => Err(anyhow::anyhow!("unknown validation dimension {other:?}")),
        })
        .collect()
}

fn run_once(args: &ValidateArgs, dims: &[Dimension], drone_id: Option<DroneId>, seed: Option<u64>) -> anyhow::Result<ValidationReport> {
    let cell_id = CellId::parse("task-dir")?;
    let rules = NoArchitectureRules;
    let mut dimensions = Vec::with_capacity(dims.len());
    for dim in dims {
        let report = match dim {
            Dimension::Technical => technical::run(&args.task_dir),
            Dimension::Strategic => strategic::run(&args.task_dir, &[], &rules, seed),
            Dimension::Security => security::run(&args.task_dir, seed),
        };
        dimensions.push(report);
    }
    let consensus_score = ValidationReport::weighted_score(&dimensions);
    Ok(ValidationReport {
        cell_id,
        drone_id,
        dimensions,
        consensus_score,
        consensus_reached: consensus_score >= hive_validator::CONSENSUS_THRESHOLD,
        threshold: hive_validator::CONSENSUS_THRESHOLD,
    })
}

pub fn run(format: OutputFormat, args: ValidateArgs) -> anyhow::Result<()> {
    let dims = requested_dimensions(&args.dimensions)?;

    if args.cross_validate {
        let mut outcome = {
            let reports: Vec<ValidationReport> = consensus::drone_ids_and_seeds(args.drones, None)
                .into_iter()
                .map(|(drone_id, seed)| run_once(&args, &dims, Some(drone_id), Some(seed)))
                .collect::<anyhow::Result<_>>()?;
            consensus::evaluate(&reports)
        };
        let mut attempt = 1u32;
        while !outcome.consensus_reached && attempt < args.max_retries.max(1) {
            let reports: Vec<ValidationReport> = consensus::drone_ids_and_seeds(args.drones, None)
                .into_iter()
                .map(|(drone_id, seed)| run_once(&args, &dims, Some(drone_id), Some(seed)))
                .collect::<anyhow::Result<_>>()?;
            outcome = consensus::evaluate(&reports);
            attempt += 1;
        }
        let value = serde_json::json!({
            "mean": outcome.mean,
            "variance": outcome.variance,
            "consensus_reached": outcome.consensus_reached,
            "attempts": attempt,
            "reports": outcome.reports,
        });
        emit(format, &value, |v| {
            format!(
                "cross-validation: mean={:.1} variance={:.2} consensus_reached={} (after {} attempt(s))",
                v["mean"].as_f64().unwrap_or(0.0),
                v["variance"].as_f64().unwrap_or(0.0),
                v["consensus_reached"],
                v["attempts"],
            )
        })?;
        if !outcome.consensus_reached {
            anyhow::bail!("cross-validation consensus not reached");
        }
        Ok(())
    } else {
        let mut report = run_once(&args, &dims, None, None)?;
        let mut attempt = 1u32;
        while !report.consensus_reached && attempt < args.max_retries.max(1) {
            report = run_once(&args, &dims, None, None)?;
            attempt += 1;
        }
        let passed = report.consensus_reached;
        emit(format, &report, |r| {
            format!(
                "{}: consensus_score={} threshold={} consensus_reached={}",
                r.cell_id, r.consensus_score, r.threshold, r.consensus_reached
            )
        })?;
        if !passed {
            anyhow::bail!("validation consensus not reached");
        }
        Ok(())
    }
}
