//! Running external collaborators: aligners, distance and tree programs,
//! and blast.
//!
//! Every invocation captures stdout, stderr and the exit status; failures
//! and timeouts surface all three in the [`Error::ToolFailure`] payload so
//! a family's failure never takes down its siblings.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One planned external invocation.
#[derive(Clone, Debug, Default)]
pub struct ToolSpec {
    /// Program name, resolved on `PATH` unless absolute.
    pub program: String,
    /// Command-line arguments.
    pub args: Vec<String>,
    /// Text fed to the child's stdin (phylip programs are menu-driven).
    pub stdin: Option<String>,
    /// Working directory for the child.
    pub workdir: Option<PathBuf>,
    /// Total wall-clock allowance; `None` waits forever.
    pub timeout: Option<Duration>,
}

impl ToolSpec {
    /// Creates a spec for the given program.
    #[must_use]
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the stdin payload.
    #[must_use]
    pub fn with_stdin<S: Into<String>>(mut self, stdin: S) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn in_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Sets the wall-clock timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// What an external invocation left behind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Exit code; 0 on success.
    pub status: i32,
}

/// A seam for external invocations, so pipelines can be driven without the
/// binaries installed.
pub trait Runner {
    /// Runs the spec to completion.
    ///
    /// # Errors
    ///
    /// [`Error::ToolFailure`] when the program cannot be found, exits
    /// non-zero, or exceeds its timeout.
    fn run(&self, spec: &ToolSpec) -> Result<ToolOutput>;
}

/// The default runner: spawns real processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, spec: &ToolSpec) -> Result<ToolOutput> {
        let program = which::which(&spec.program).map_err(|e| Error::ToolFailure {
            tool: spec.program.clone(),
            status: "not found".to_string(),
            stdout: String::new(),
            stderr: e.to_string(),
        })?;
        run_command(&program, spec)
    }
}

/// Spawns the resolved program and waits for it, enforcing the timeout.
fn run_command(program: &Path, spec: &ToolSpec) -> Result<ToolOutput> {
    let tool = spec.program.clone();
    let failure = |status: String, stdout: String, stderr: String| Error::ToolFailure {
        tool: tool.clone(),
        status,
        stdout,
        stderr,
    };

    let mut command = Command::new(program);
    command
        .args(&spec.args)
        .stdin(if spec.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &spec.workdir {
        command.current_dir(dir);
    }

    let mut child = command
        .spawn()
        .map_err(|e| failure("failed to spawn".to_string(), String::new(), e.to_string()))?;

    if let Some(payload) = &spec.stdin {
        if let Some(mut stdin) = child.stdin.take() {
            // The child may exit before draining its stdin; that is its
            // prerogative, the exit status tells the story.
            let _ = stdin.write_all(payload.as_bytes());
        }
    }

    // Drain the pipes on threads so a chatty child cannot deadlock against
    // a full pipe buffer while we poll for its exit.
    let stdout_handle = child.stdout.take().map(spawn_drain);
    let stderr_handle = child.stderr.take().map(spawn_drain);

    let deadline = spec.timeout.map(|t| Instant::now() + t);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    let _ = child.kill();
                    let _ = child.wait();
                    let stdout = join_drain(stdout_handle);
                    let stderr = join_drain(stderr_handle);
                    return Err(failure("timed out".to_string(), stdout, stderr));
                }
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(e) => {
                return Err(failure("wait failed".to_string(), String::new(), e.to_string()));
            }
        }
    };

    let stdout = join_drain(stdout_handle);
    let stderr = join_drain(stderr_handle);
    let code = status.code().unwrap_or(-1);
    if status.success() {
        Ok(ToolOutput {
            stdout,
            stderr,
            status: code,
        })
    } else {
        Err(failure(format!("exit code {code}"), stdout, stderr))
    }
}

/// Reads a pipe to the end on a thread.
fn spawn_drain<R: Read + Send + 'static>(mut pipe: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buffer = String::new();
        let _ = pipe.read_to_string(&mut buffer);
        buffer
    })
}

/// Collects a drained pipe, tolerating a panicked reader.
fn join_drain(handle: Option<std::thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// The multiple-alignment programs the pipeline can delegate to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignerKind {
    /// clustalw
    ClustalW,
    /// muscle
    Muscle,
    /// mafft
    Mafft,
    /// kalign
    Kalign,
    /// t-coffee
    TCoffee,
}

impl AlignerKind {
    /// The program name on `PATH`.
    #[must_use]
    pub fn program(self) -> &'static str {
        match self {
            Self::ClustalW => "clustalw",
            Self::Muscle => "muscle",
            Self::Mafft => "mafft",
            Self::Kalign => "kalign",
            Self::TCoffee => "t_coffee",
        }
    }

    /// Builds the invocation aligning `input` (fasta) into `output`.
    ///
    /// `extra_args` come from the per-path configuration and are passed
    /// through verbatim after the canonical arguments.
    #[must_use]
    pub fn spec<I, S>(self, input: &Path, output: &Path, extra_args: I) -> ToolSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (input, output) = (input.display(), output.display());
        let spec = match self {
            Self::ClustalW => ToolSpec::new(self.program())
                .arg(format!("-INFILE={input}"))
                .arg(format!("-OUTFILE={output}"))
                .arg("-OUTPUT=FASTA"),
            Self::Muscle => ToolSpec::new(self.program())
                .arg("-in")
                .arg(input.to_string())
                .arg("-out")
                .arg(output.to_string()),
            Self::Mafft => ToolSpec::new(self.program()).arg("--auto").arg(input.to_string()),
            Self::Kalign => ToolSpec::new(self.program())
                .arg("-i")
                .arg(input.to_string())
                .arg("-o")
                .arg(output.to_string()),
            Self::TCoffee => ToolSpec::new(self.program())
                .arg(input.to_string())
                .arg("-output=fasta_aln")
                .arg(format!("-outfile={output}")),
        };
        spec.args(extra_args)
    }
}

impl std::str::FromStr for AlignerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clustalw" => Ok(Self::ClustalW),
            "muscle" => Ok(Self::Muscle),
            "mafft" => Ok(Self::Mafft),
            "kalign" => Ok(Self::Kalign),
            "tcoffee" | "t_coffee" | "t-coffee" => Ok(Self::TCoffee),
            other => Err(Error::input(format!("unknown alignment program '{other}'"))),
        }
    }
}

/// The tree-inference programs the pipeline can delegate to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeProgram {
    /// phylip `neighbor` (NJ or UPGMA over a distance matrix).
    Neighbor,
    /// phylip `consense` (majority-rule consensus over replicate trees).
    Consense,
    /// phylip `dnaml` (maximum likelihood over an alignment).
    Dnaml,
    /// `phyml` (maximum likelihood over an alignment).
    Phyml,
}

impl TreeProgram {
    /// The program name on `PATH`.
    #[must_use]
    pub fn program(self) -> &'static str {
        match self {
            Self::Neighbor => "neighbor",
            Self::Consense => "consense",
            Self::Dnaml => "dnaml",
            Self::Phyml => "phyml",
        }
    }

    /// Builds the menu-driven invocation run inside `workdir`, whose
    /// `infile` must already be in place. Phylip programs write `outfile`
    /// and `outtree` into the working directory.
    #[must_use]
    pub fn spec(self, workdir: &Path, menu_answers: &str) -> ToolSpec {
        ToolSpec::new(self.program())
            .in_dir(workdir)
            .with_stdin(menu_answers)
    }
}

/// Builds a tabular blast search of `query` against `database`.
#[must_use]
pub fn blast_spec(program: &str, database: &Path, query: &Path) -> ToolSpec {
    ToolSpec::new("blastall")
        .arg("-p")
        .arg(program)
        .arg("-d")
        .arg(database.display().to_string())
        .arg("-i")
        .arg(query.display().to_string())
        .arg("-m")
        .arg("8")
}
