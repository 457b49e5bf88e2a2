//! Stand-in for the client configuration tester executable.
//!
//! Emulates the client's selection rules closely enough to produce every
//! exit status the catalog expects, without a real cluster:
//! - Clusters announce themselves through a registry directory holding one
//!   file per coordinator port, containing the running release.
//! - External libraries are identified by their staged file names.
//! - The locally linked client has the release in `FAKE_LOCAL_VERSION`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use clientcfg_core::{ConnectionString, ErrorCode, Version};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const REGISTRY_VAR: &str = "FAKE_CLUSTER_REGISTRY";
const LOCAL_VERSION_VAR: &str = "FAKE_LOCAL_VERSION";
const POLL: Duration = Duration::from_millis(20);
// Used when no transaction timeout is given.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "fake-tester")]
struct Args {
    #[arg(long)]
    cluster_file: PathBuf,
    #[arg(long)]
    tmp_dir: Option<PathBuf>,
    #[arg(long)]
    log: bool,
    #[arg(long)]
    log_dir: Option<PathBuf>,
    #[arg(long)]
    disable_local_client: bool,
    #[arg(long)]
    external_client_library: Option<PathBuf>,
    #[arg(long)]
    external_client_dir: Option<PathBuf>,
    #[arg(long)]
    ignore_external_client_failures: bool,
    #[arg(long)]
    fail_incompatible_client: bool,
    #[arg(long)]
    api_version: Option<u32>,
    #[arg(long)]
    expected_error: Option<i32>,
    #[arg(long)]
    transaction_timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
struct Client {
    version: Version,
    external: bool,
}

struct Trace(Option<fs::File>);

impl Trace {
    fn open(args: &Args) -> Result<Self> {
        match (&args.log_dir, args.log) {
            (Some(dir), true) => {
                let path = dir.join(format!("trace.{}.log", std::process::id()));
                Ok(Self(Some(fs::File::create(&path).with_context(|| {
                    format!("Failed to create {}", path.display())
                })?)))
            }
            _ => Ok(Self(None)),
        }
    }

    fn event(&mut self, line: &str) {
        if let Some(file) = &mut self.0 {
            let _ = writeln!(file, "{}", line);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut trace = Trace::open(&args)?;
    if let Some(tmp) = &args.tmp_dir {
        trace.event(&format!("using tmp dir {}", tmp.display()));
    }

    let result = run_transaction(&args, &mut trace)?;
    let code = match result {
        Ok(()) => 0,
        Err(e) => e.code(),
    };
    trace.event(&format!("transaction finished with code {}", code));

    let status = match args.expected_error {
        Some(expected) if code == expected => 0,
        Some(_) => 1,
        None => code,
    };
    std::process::exit(status);
}

fn run_transaction(args: &Args, trace: &mut Trace) -> Result<std::result::Result<(), ErrorCode>> {
    let contents = fs::read_to_string(&args.cluster_file)
        .with_context(|| format!("Failed to read {}", args.cluster_file.display()))?;
    let Ok(connection) = contents.parse::<ConnectionString>() else {
        trace.event("cluster file has no usable coordinator");
        return Ok(Err(ErrorCode::ConnectionStringInvalid));
    };

    let local: Version = std::env::var(LOCAL_VERSION_VAR)
        .with_context(|| format!("{} is not set", LOCAL_VERSION_VAR))?
        .parse()?;
    let api_version = args.api_version.unwrap_or(local.api_version());

    let mut clients = Vec::new();
    if !args.disable_local_client {
        clients.push(Client {
            version: local,
            external: false,
        });
    }
    for version in external_versions(args)? {
        clients.push(Client {
            version,
            external: true,
        });
    }

    // Clients that cannot provide the requested API revision.
    let (usable, unsupported): (Vec<Client>, Vec<Client>) = clients
        .into_iter()
        .partition(|c| c.version.api_version() >= api_version);
    for client in &unsupported {
        trace.event(&format!("client {} lacks API version {}", client.version, api_version));
    }
    if unsupported.iter().any(|c| c.external) && !args.ignore_external_client_failures {
        return Ok(Err(ErrorCode::ApiFunctionMissing));
    }
    if usable.is_empty() {
        return Ok(Err(ErrorCode::AllExternalClientsFailed));
    }

    let timeout = args
        .transaction_timeout
        .map_or(DEFAULT_TIMEOUT, Duration::from_millis);
    let Some(coordinator) = connection.primary_coordinator() else {
        return Ok(Err(ErrorCode::ConnectionStringInvalid));
    };
    let registry = PathBuf::from(
        std::env::var(REGISTRY_VAR).with_context(|| format!("{} is not set", REGISTRY_VAR))?,
    );

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(cluster) = cluster_version(&registry, coordinator.port())? {
            if usable.iter().any(|c| c.version.is_protocol_compatible(&cluster)) {
                trace.event(&format!("connected to cluster {}", cluster));
                return Ok(Ok(()));
            }
            if args.fail_incompatible_client {
                trace.event(&format!("no client is compatible with cluster {}", cluster));
                return Ok(Err(ErrorCode::IncompatibleClient));
            }
        }
        if Instant::now() >= deadline {
            trace.event("transaction timed out");
            return Ok(Err(ErrorCode::TransactionTimedOut));
        }
        thread::sleep(POLL);
    }
}

fn external_versions(args: &Args) -> Result<Vec<Version>> {
    let mut files = Vec::new();
    if let Some(path) = &args.external_client_library {
        files.push(path.clone());
    }
    if let Some(dir) = &args.external_client_dir {
        let mut entries = fs::read_dir(dir)?
            .map(|e| e.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();
        files.extend(entries);
    }
    files.iter().map(|f| library_version(f)).collect()
}

/// Reads the release out of a `libfdb_c.<version>.so` file name.
fn library_version(path: &Path) -> Result<Version> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let Some(version) = name
        .strip_prefix("libfdb_c.")
        .and_then(|rest| rest.strip_suffix(".so"))
    else {
        bail!("Not a client library: {}", path.display());
    };
    Ok(version.parse()?)
}

fn cluster_version(registry: &Path, port: u16) -> Result<Option<Version>> {
    match fs::read_to_string(registry.join(port.to_string())) {
        // A half-written entry reads as "not up yet".
        Ok(contents) => Ok(contents.parse().ok()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
