use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use auditlog_harness::audit::{
    DatagramSinkReader, ExpectedAuditFields, FileSinkReader, FILE_LABEL, SYSLOG_LABEL,
};
use auditlog_harness::config::HarnessConfig;
use auditlog_harness::constants::{
    DEFAULT_AUDIT_USER, DEFAULT_SYSLOG_HOST, DEFAULT_SYSLOG_PORT, DEFAULT_SYSLOG_QUEUE_CAPACITY,
};
use auditlog_harness::logging::{init_subscriber_with, LogFormat};
use auditlog_harness::scenario::AuditLogFieldsScenario;
use auditlog_harness::server::EmbeddedServer;
use auditlog_harness::setup::UdpSyslogSetup;
use auditlog_harness::syslog::SyslogServer;
use auditlog_harness::timeout::TimeoutFactor;

/// Audit-log harness - verifies the fields of management audit records
#[derive(Parser, Debug)]
#[command(name = "auditlog-harness")]
#[command(version, about, long_about = None)]
struct Args {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reframe an audit file and check every record in it
    VerifyFile {
        /// Audit file to read
        path: PathBuf,

        /// Number of records the file must contain
        #[arg(long, default_value_t = 1)]
        expect: usize,

        /// Expected value of the `user` field
        #[arg(long, default_value = DEFAULT_AUDIT_USER)]
        user: String,
    },

    /// Receive one syslog datagram and check the record it carries
    Listen {
        /// UDP address to listen on
        #[arg(long, default_value_t = default_listen_addr())]
        bind: SocketAddr,

        /// Seconds to wait; defaults to 5 seconds scaled by TS_TIMEOUT_FACTOR
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Expected value of the `user` field
        #[arg(long, default_value = DEFAULT_AUDIT_USER)]
        user: String,
    },

    /// Run the full scenario against the embedded server
    Run {
        /// Server home; overrides the configuration and JBOSS_HOME
        #[arg(long)]
        home: Option<PathBuf>,

        /// Path to a YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn default_listen_addr() -> SocketAddr {
    let ip = DEFAULT_SYSLOG_HOST
        .parse()
        .unwrap_or(IpAddr::from([127, 0, 0, 1]));
    SocketAddr::new(ip, DEFAULT_SYSLOG_PORT)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    if let Err(e) = init_subscriber_with(format) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(args.command).await {
        tracing::error!(error = %e, "Verification failed");
        eprintln!("FAILED: {:#}", e);
        std::process::exit(1);
    }
    println!("OK");
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::VerifyFile { path, expect, user } => {
            let expected = ExpectedAuditFields::for_user(&user);
            let records = FileSinkReader.read(&path, expect)?;
            for record in &records {
                expected.check(FILE_LABEL, record)?;
            }
            tracing::info!(path = %path.display(), records = records.len(), "Audit file verified");
        }

        Command::Listen {
            bind,
            timeout_secs,
            user,
        } => {
            let wait = match timeout_secs {
                Some(secs) => Duration::from_secs(secs),
                None => TimeoutFactor::from_env()?.syslog_wait(),
            };
            let (mut server, mut queue) = SyslogServer::bind(bind, DEFAULT_SYSLOG_QUEUE_CAPACITY).await?;
            tracing::info!(local = %server.local_addr(), wait_ms = wait.as_millis() as u64, "Waiting for audit datagram");

            let record = DatagramSinkReader::new(&mut queue).await_one(wait).await;
            server.shutdown();
            let record = record?;

            ExpectedAuditFields::for_user(&user).check(SYSLOG_LABEL, &record)?;
            println!("{}", record.to_json_pretty());
        }

        Command::Run { home, config } => {
            let mut config = match (config, home.as_ref()) {
                (Some(path), _) => HarnessConfig::from_file(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                (None, Some(home)) => HarnessConfig::new(home),
                (None, None) => HarnessConfig::from_env()?,
            };
            if let Some(home) = home {
                config.server.home = home;
            }
            if !config.server.home.is_dir() {
                bail!("Server home {} is not a directory", config.server.home.display());
            }

            let server = EmbeddedServer::new(config.server.home.clone());
            let setup = UdpSyslogSetup::new(config.syslog.clone());
            let mut scenario = AuditLogFieldsScenario::new(server, setup, &config)?;

            let records = scenario.run().await?;
            println!("{}", records.file.to_json_pretty());
        }
    }
    Ok(())
}
