//! Shell command, PowerShell and registry helpers shared by the probes.
//!
//! Every helper here is best-effort: failures are logged and surface as
//! `None` so the probe chains can simply fall through to the next source.

use std::process::Command;

use thiserror::Error;

/// Why an external command produced no usable output.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}")]
    Failed { program: String, status: String },

    #[error("`{program}` produced no output")]
    Empty { program: String },
}

/// Runs external programs and returns their trimmed stdout.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String, CommandError>;
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String, CommandError> {
        let mut command = Command::new(program);
        command.args(args);

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            // CREATE_NO_WINDOW: keep console windows from flashing on every probe.
            command.creation_flags(0x0800_0000);
        }

        let output = command.output().map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(CommandError::Failed {
                program: program.to_string(),
                status: output.status.to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            return Err(CommandError::Empty {
                program: program.to_string(),
            });
        }

        Ok(stdout)
    }
}

/// Run a PowerShell one-liner without loading the user profile.
pub fn powershell(runner: &dyn CommandRunner, script: &str) -> Option<String> {
    let args = [
        "-NoProfile",
        "-ExecutionPolicy",
        "Bypass",
        "-Command",
        script,
    ]
    .map(String::from);

    match runner.run("powershell", &args) {
        Ok(out) => Some(out),
        Err(err) => {
            tracing::debug!(%err, "powershell query failed");
            None
        }
    }
}

/// Read a string value below `HKEY_LOCAL_MACHINE` via `reg query`.
///
/// Reading HKLM is normally allowed for standard users, while WMI classes for
/// the same data can require elevation.
pub fn read_registry(runner: &dyn CommandRunner, path: &str, value: &str) -> Option<String> {
    let args = [
        "query".to_string(),
        format!("HKEY_LOCAL_MACHINE\\{path}"),
        "/v".to_string(),
        value.to_string(),
    ];

    match runner.run("reg", &args) {
        Ok(out) => parse_reg_query(&out, value),
        Err(err) => {
            tracing::debug!(%err, path, value, "registry read failed");
            None
        }
    }
}

/// Extract the data column from `reg query` output.
///
/// Lines look like `    ProcessorNameString    REG_SZ    AMD Ryzen 7 5800X 8-Core Processor`.
pub fn parse_reg_query(output: &str, value: &str) -> Option<String> {
    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(type_idx) = parts.iter().position(|p| p.starts_with("REG_")) else {
            continue;
        };
        if parts[..type_idx].join(" ") != value {
            continue;
        }
        let data = parts[type_idx + 1..].join(" ");
        if data.is_empty() {
            return None;
        }
        return Some(data);
    }
    None
}

/// Parse `ConvertTo-Csv -NoTypeInformation` output into rows of fields.
///
/// The header row is skipped, surrounding quotes are stripped and blank lines
/// are ignored. Fields never contain embedded commas in the queries we issue.
pub fn parse_csv_rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split(',')
                .map(|field| field.trim().trim_matches('"').trim().to_string())
                .collect()
        })
        .collect()
}
