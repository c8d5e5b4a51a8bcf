//! Build automation tasks for SWODLR
//!
//! Currently generates the CLI reference from the clap definitions.

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for SWODLR", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<swodlr_cli::Cli>();

    let content = format!(
        r#"# SWODLR CLI Reference

Generated from the CLI source code. Last updated: {}.

## Overview

`swodlr` runs the ingest-to-SDS stages by hand: submit staged granules to
the SDS as ingest jobs, poll those jobs, and start the ingest state machine.

## Quick Start

```bash
# Ingest one staged file end to end, keeping the ledger in memory
SWODLR_ENV=local swodlr ingest s3://bucket/path/granule.nc --local

# Run the submission stage on a queue batch
swodlr submit --event records.json > jobs.json

# Poll the submitted jobs until nothing remains
swodlr poll --event jobs.json
```

## Commands

{}

## Environment Variables

- `SWODLR_ENV` - `prod` (default) reads parameters from SSM under `/service/swodlr/ingest/`; any other value reads `SWODLR_<name>` variables
- `LOG_LEVEL`, `LOG_FORMAT`, `LOG_OUTPUT` - logging overrides
- `LOG_FILTER` - tracing filter directives

---

*To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
