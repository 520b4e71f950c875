// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! `aclint` — static anomaly analysis of packet-filter ACLs.
//!
//! Reads a device configuration or filter table, classifies every pair of
//! rules in each ACL, and writes an XML report of the conflicts found.

use clap::Parser;
use classify::analyze;
use miette::{Context, IntoDiagnostic};
use parse::{InputFormat, parse_acls};
use report::{DetailLevel, XmlReport};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aclint")]
#[command(version = option_env!("VERSION").unwrap_or("dev"))]
#[command(about = "Static anomaly analysis of packet-filter access lists", long_about = None)]
struct CmdArgs {
    /// Input file with the device or filter configuration.
    #[arg(short = 'i', long, value_name = "FILE")]
    input: PathBuf,

    /// Output file for the XML report.
    #[arg(short = 'o', long, value_name = "FILE", default_value = "result.xml")]
    output: PathBuf,

    /// Input configuration format.
    #[arg(
        short = 'f',
        long,
        value_name = "FORMAT",
        default_value = "cisco",
        value_parser = InputFormat::from_str,
        help = "Input format: cisco or bench"
    )]
    format: InputFormat,

    /// Report detail level.
    #[arg(
        short = 'd',
        long,
        value_name = "LEVEL",
        default_value_t = 2,
        value_parser = clap::value_parser!(u8).range(1..=4),
        help = "Report detail in [1..4]: 1 = kind and names, 2 = +proto/src/action, \
                3 = +ports and destination, 4 = +dimension relations"
    )]
    detail: u8,

    /// Print the rules of each analyzed access list.
    #[arg(short = 'v', long, default_value_t = false)]
    verbose: bool,
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = CmdArgs::parse();
    let detail = DetailLevel::try_from(args.detail)
        .into_diagnostic()
        .wrap_err("invalid detail level")?;

    let input = File::open(&args.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("can't open input file {}", args.input.display()))?;
    let acls = parse_acls(args.format, BufReader::new(input))
        .into_diagnostic()
        .wrap_err_with(|| format!("parsing of {} failed", args.input.display()))?;
    info!(acls = acls.len(), "parsed input");

    let mut xml = XmlReport::new(detail);
    for acl in &acls {
        if args.verbose {
            println!("{acl}");
        }
        let stats = analyze(acl, &mut xml)
            .into_diagnostic()
            .wrap_err_with(|| format!("analysis of ACL '{}' failed", acl.name()))?;
        info!(
            acl = acl.name(),
            rules = stats.rules,
            conflicts = stats.conflicts,
            "analyzed"
        );
    }

    let output = File::create(&args.output)
        .into_diagnostic()
        .wrap_err_with(|| format!("can't create output file {}", args.output.display()))?;
    let mut writer = BufWriter::new(output);
    xml.flush(&mut writer)
        .into_diagnostic()
        .wrap_err("failed to write report")?;
    info!(
        report = %args.output.display(),
        conflicts = xml.conflict_count(),
        "report written"
    );
    Ok(())
}
