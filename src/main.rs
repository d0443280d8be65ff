//! Database Instance Lifecycle Tool
//!
//! Provides CLI interface for creating, modifying, deleting and restoring RDS instances

// rdstool/src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rdstool::config::AppConfig;
use rdstool::rds::{
    CreateParams, DEFAULT_ENGINE, DeleteRequest, ModifyParams, RdsClient, RestoreOverrides,
};
use rdstool::{
    create_instance, delete_instance, duplicate_instance, get_last_snapshot, modify_instance,
    restore_from_snapshot, wait_until_available,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rdstool")]
#[command(about = "Create, delete and restore managed database instances")]
#[command(version)]
struct Args {
    /// Path to config.json (optional)
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// AWS region (overrides config.json)
    #[arg(long)]
    region: Option<String>,

    /// Seconds between status checks (overrides config.json)
    #[arg(long)]
    poll_interval_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an instance and wait until it is available
    Create {
        /// Instance identifier
        #[arg(short, long)]
        identifier: String,

        /// Instance class, e.g. db.m1.small
        #[arg(short = 't', long)]
        instance_class: String,

        /// Master username
        #[arg(short, long, default_value = "")]
        user: String,

        /// Master password
        #[arg(short, long, env = "RDS_MASTER_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,

        /// Allocated storage in GiB (5-6144)
        #[arg(short, long, default_value_t = 0)]
        size: i64,

        /// Database engine
        #[arg(long)]
        engine: Option<String>,

        /// Availability zone
        #[arg(long)]
        availability_zone: Option<String>,
    },

    /// Change class, storage or master password of an instance
    Modify {
        /// Instance identifier
        #[arg(short, long)]
        identifier: String,

        /// New instance class
        #[arg(short = 't', long)]
        instance_class: Option<String>,

        /// New allocated storage in GiB (5-6144)
        #[arg(short, long)]
        size: Option<i64>,

        /// New master password
        #[arg(short, long, env = "RDS_NEW_MASTER_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Apply now instead of in the next maintenance window
        #[arg(long)]
        apply_immediately: bool,
    },

    /// Delete an instance, taking a final snapshot unless skipped
    Delete {
        /// Instance identifier
        #[arg(short, long)]
        identifier: String,

        /// Do not take a final snapshot
        #[arg(long)]
        skip_final_snapshot: bool,

        /// Identifier for the final snapshot
        #[arg(long)]
        final_snapshot_id: Option<String>,
    },

    /// Show the most recent snapshot of an instance
    LastSnapshot {
        /// Instance identifier
        #[arg(short, long)]
        identifier: String,
    },

    /// Restore a new instance from a snapshot
    Restore {
        /// Identifier of the new instance
        #[arg(short, long)]
        identifier: String,

        /// Snapshot to restore from
        #[arg(long)]
        snapshot_id: String,

        /// Instance class for the new instance
        #[arg(short = 't', long)]
        instance_class: Option<String>,

        /// Availability zone for the new instance
        #[arg(long)]
        availability_zone: Option<String>,

        /// Wait until the new instance is available and print its endpoint
        #[arg(long)]
        wait: bool,
    },

    /// Clone an instance from its most recent snapshot
    Duplicate {
        /// Instance to clone
        #[arg(long)]
        source: String,

        /// Identifier of the clone
        #[arg(long)]
        target: String,

        /// Instance class for the clone
        #[arg(short = 't', long)]
        instance_class: Option<String>,

        /// Availability zone for the clone
        #[arg(long)]
        availability_zone: Option<String>,
    },
}

/// Main entry point for the lifecycle tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run_app(Args::parse()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app(args: Args) -> Result<()> {
    let mut app_config = AppConfig::load_or_default(&args.config).context(format!(
        "Failed to load application configuration from {}",
        args.config.display()
    ))?;
    if let Some(region) = args.region {
        app_config.aws.region = region;
    }
    if let Some(secs) = args.poll_interval_secs {
        app_config.polling.interval = Duration::from_secs(secs);
    }

    let client = RdsClient::new(&app_config.aws).await;
    let poll = app_config.polling;

    match args.command {
        Command::Create {
            identifier,
            instance_class,
            user,
            password,
            size,
            engine,
            availability_zone,
        } => {
            let params = CreateParams {
                instance_class,
                master_user: user,
                master_password: password,
                allocated_storage: size,
                engine: engine
                    .or_else(|| app_config.instance_defaults.engine.clone())
                    .unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
                availability_zone: availability_zone
                    .or_else(|| app_config.instance_defaults.availability_zone.clone()),
            };
            let endpoint = create_instance(&identifier, &params, &poll, &client).await?;
            println!("{}", endpoint);
        }
        Command::Modify {
            identifier,
            instance_class,
            size,
            password,
            apply_immediately,
        } => {
            let params = ModifyParams {
                instance_class,
                allocated_storage: size,
                master_password: password,
                apply_immediately,
            };
            let instance = modify_instance(&identifier, &params, &client).await?;
            println!("{}", serde_json::to_string_pretty(&instance)?);
        }
        Command::Delete {
            identifier,
            skip_final_snapshot,
            final_snapshot_id,
        } => {
            let request = DeleteRequest {
                identifier,
                skip_final_snapshot,
                final_snapshot_id,
            };
            let record = delete_instance(&request, &poll, &client).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::LastSnapshot { identifier } => {
            let snapshot = get_last_snapshot(&identifier, &client).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Restore {
            identifier,
            snapshot_id,
            instance_class,
            availability_zone,
            wait,
        } => {
            let overrides = RestoreOverrides {
                instance_class,
                availability_zone,
                engine: app_config.instance_defaults.engine.clone(),
            };
            let instance =
                restore_from_snapshot(&identifier, &snapshot_id, &overrides, &client).await?;
            if wait {
                let ready = wait_until_available(&instance.identifier, &poll, &client).await?;
                println!("{}", serde_json::to_string_pretty(&ready)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&instance)?);
            }
        }
        Command::Duplicate {
            source,
            target,
            instance_class,
            availability_zone,
        } => {
            let overrides = RestoreOverrides {
                instance_class,
                availability_zone,
                engine: app_config.instance_defaults.engine.clone(),
            };
            let endpoint = duplicate_instance(&source, &target, &overrides, &poll, &client).await?;
            println!("{}", endpoint);
        }
    }
    Ok(())
}
