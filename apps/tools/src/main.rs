use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use sheets_integration::{
    append_submission, connect, ensure_header, google::DEFAULT_API_BASE, GoogleSheetsStore,
    SecretsFile, SheetStore, SheetTarget,
};
use shared::{
    domain::header,
    form::{FieldValue, FormState},
    record::SubmissionRecord,
};
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "secrets.toml")]
    secrets: PathBuf,
    /// Overrides `WORKSHEET_NAME` from the secrets file.
    #[arg(long)]
    worksheet: Option<String>,
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the sheet header, one column per line.
    Header,
    /// Writes the header row if the worksheet is empty.
    EnsureHeader,
    /// Appends one submission read from a JSON object keyed by column.
    Append {
        #[arg(long)]
        json: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    match cli.command {
        Command::Header => {
            for column in header() {
                println!("{column}");
            }
        }
        Command::EnsureHeader => {
            let store = open_store(&cli.secrets, cli.worksheet, &cli.api_base)?;
            store.ensure_worksheet().await?;
            if ensure_header(&store, &header()).await? {
                println!("header written");
            } else {
                println!("header already present");
            }
        }
        Command::Append { json } => {
            let raw = fs::read_to_string(&json)
                .with_context(|| format!("failed to read '{}'", json.display()))?;
            let columns: BTreeMap<String, FieldValue> =
                serde_json::from_str(&raw).with_context(|| {
                    format!("'{}' is not a JSON object of columns", json.display())
                })?;
            let form = FormState::from_columns(columns)?;
            let record = SubmissionRecord::from_form(&form, Local::now().naive_local());

            let store = open_store(&cli.secrets, cli.worksheet, &cli.api_base)?;
            append_submission(&store, &record).await?;
            info!(timestamp = record.timestamp(), "submission appended");
            println!("appended row at {}", record.timestamp());
        }
    }

    Ok(())
}

fn open_store(
    secrets: &Path,
    worksheet: Option<String>,
    api_base: &str,
) -> Result<GoogleSheetsStore> {
    let secrets = SecretsFile::load(secrets)?;
    let target = SheetTarget::resolve(
        secrets.spreadsheet_id,
        worksheet.or(secrets.worksheet_name),
        secrets.gcp_service_account,
    )?;
    info!(
        spreadsheet_id = %target.spreadsheet_id,
        worksheet = %target.worksheet_name,
        "using sheet"
    );
    Ok(connect(&target, api_base)?)
}
