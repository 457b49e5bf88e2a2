//! Argument vector materialization for the tester executable.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Every flag the tester executable understands, as plain data.
///
/// [`TesterArgs::to_args`] renders the flags in a fixed order, so the same
/// configuration always produces the same command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TesterArgs {
    /// Connection descriptor file.
    pub cluster_file: PathBuf,
    /// Directory for client temporary files.
    pub tmp_dir: PathBuf,
    /// Directory for client logs; logging is always enabled.
    pub log_dir: PathBuf,
    /// Disable the locally linked client.
    pub disable_local_client: bool,
    /// Single external client library.
    pub external_library: Option<PathBuf>,
    /// Directory of external client libraries.
    pub external_library_dir: Option<PathBuf>,
    /// Tolerate external clients that fail to initialize.
    pub ignore_external_client_failures: bool,
    /// Fail when no client matches the cluster's protocol.
    pub fail_incompatible_client: bool,
    /// Requested client API version.
    pub api_version: Option<u32>,
    /// Error the tester should treat as success. Only set when delegating.
    pub expected_error: Option<i32>,
    /// Transaction timeout.
    pub transaction_timeout: Option<Duration>,
}

impl TesterArgs {
    /// Arguments with only the always-present flags set.
    pub fn new(cluster_file: PathBuf, tmp_dir: PathBuf, log_dir: PathBuf) -> Self {
        Self {
            cluster_file,
            tmp_dir,
            log_dir,
            disable_local_client: false,
            external_library: None,
            external_library_dir: None,
            ignore_external_client_failures: false,
            fail_incompatible_client: true,
            api_version: None,
            expected_error: None,
            transaction_timeout: None,
        }
    }

    /// Renders the argument vector.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--cluster-file".into(), self.cluster_file.clone().into()];

        args.push("--tmp-dir".into());
        args.push(self.tmp_dir.clone().into());

        args.push("--log".into());
        args.push("--log-dir".into());
        args.push(self.log_dir.clone().into());

        if self.disable_local_client {
            args.push("--disable-local-client".into());
        }

        if let Some(path) = &self.external_library {
            args.push("--external-client-library".into());
            args.push(path.clone().into());
        }

        if let Some(dir) = &self.external_library_dir {
            args.push("--external-client-dir".into());
            args.push(dir.clone().into());
        }

        if self.ignore_external_client_failures {
            args.push("--ignore-external-client-failures".into());
        }

        if self.fail_incompatible_client {
            args.push("--fail-incompatible-client".into());
        }

        if let Some(version) = self.api_version {
            args.push("--api-version".into());
            args.push(version.to_string().into());
        }

        if let Some(code) = self.expected_error {
            args.push("--expected-error".into());
            args.push(code.to_string().into());
        }

        if let Some(timeout) = self.transaction_timeout {
            args.push("--transaction-timeout".into());
            args.push(timeout.as_millis().to_string().into());
        }

        args
    }

    /// The argument vector as display strings, for logs and reports.
    pub fn to_strings(&self) -> Vec<String> {
        self.to_args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}
