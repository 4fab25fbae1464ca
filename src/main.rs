use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sqlfold::mode::Mode;
use sqlfold::options::Case;
use sqlfold::report::{FileStatus, Report};

/// sqlfold - a non-validating SQL formatter.
#[derive(Parser, Debug)]
#[command(name = "sqlfold", version, about)]
struct Cli {
    /// Files or directories to format. Use "-" to read from stdin.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Reindent statements, one clause per line.
    #[arg(short, long)]
    reindent: bool,

    /// Change the case of keywords.
    #[arg(short, long, value_enum)]
    keywords: Option<Case>,

    /// Change the case of identifiers.
    #[arg(short, long, value_enum)]
    identifiers: Option<Case>,

    /// Remove comments.
    #[arg(long)]
    strip_comments: bool,

    /// Collapse whitespace runs to a single space.
    #[arg(long)]
    strip_whitespace: bool,

    /// Truncate string literals longer than this many characters.
    #[arg(long, value_name = "N")]
    truncate_strings: Option<usize>,

    /// Suffix appended to truncated strings.
    #[arg(long, value_name = "TEXT")]
    truncate_char: Option<String>,

    /// Put exactly one space around arithmetic and comparison operators.
    #[arg(long)]
    use_space_around_operators: bool,

    /// Indent with tabs instead of spaces.
    #[arg(long)]
    indent_tabs: bool,

    /// Width of one indentation level.
    #[arg(long, value_name = "N")]
    indent_width: Option<usize>,

    /// Indent the first line of each statement.
    #[arg(long)]
    indent_after_first: bool,

    /// Start column lists on their own indented line.
    #[arg(long)]
    indent_columns: bool,

    /// Wrap comma-separated lists after this column (0 = one item per line).
    #[arg(long, value_name = "N")]
    wrap_after: Option<usize>,

    /// Put commas at the start of list lines.
    #[arg(long)]
    comma_first: bool,

    /// Nesting depth at which grouping stops.
    #[arg(long, value_name = "N")]
    max_grouping_depth: Option<usize>,

    /// Child count above which a list skips expression grouping.
    #[arg(long, value_name = "N")]
    max_grouping_tokens: Option<usize>,

    /// Check formatting without writing changes.
    #[arg(long)]
    check: bool,

    /// Show formatting diff.
    #[arg(long)]
    diff: bool,

    /// Skip safety equivalence check (faster).
    #[arg(long)]
    fast: bool,

    /// Glob patterns to exclude.
    #[arg(long)]
    exclude: Vec<String>,

    /// Path to config file (pyproject.toml or sqlfold.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write stdin output to this file instead of stdout.
    #[arg(short, long)]
    outfile: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only).
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Command line flags take precedence over configuration files.
    fn apply(&self, mode: &mut Mode) {
        let format = &mut mode.format;
        format.reindent |= self.reindent;
        format.strip_comments |= self.strip_comments;
        format.strip_whitespace |= self.strip_whitespace;
        format.use_space_around_operators |= self.use_space_around_operators;
        format.indent_tabs |= self.indent_tabs;
        format.indent_after_first |= self.indent_after_first;
        format.indent_columns |= self.indent_columns;
        format.comma_first |= self.comma_first;

        if self.keywords.is_some() {
            format.keyword_case = self.keywords;
        }
        if self.identifiers.is_some() {
            format.identifier_case = self.identifiers;
        }
        if self.truncate_strings.is_some() {
            format.truncate_strings = self.truncate_strings;
        }
        if let Some(suffix) = &self.truncate_char {
            format.truncate_char = suffix.clone();
        }
        if let Some(width) = self.indent_width {
            format.indent_width = width;
        }
        if let Some(wrap) = self.wrap_after {
            format.wrap_after = wrap;
        }
        if let Some(depth) = self.max_grouping_depth {
            format.limits.max_depth = depth;
        }
        if let Some(tokens) = self.max_grouping_tokens {
            format.limits.max_tokens = tokens;
        }

        mode.check = self.check;
        mode.diff = self.diff;
        mode.fast = self.fast;
        mode.verbose = self.verbose;
        mode.quiet = self.quiet;
        if !self.exclude.is_empty() {
            mode.exclude = self.exclude.clone();
        }
    }

    fn is_stdin(&self) -> bool {
        self.files.len() == 1 && self.files[0].as_os_str() == "-"
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let mut mode = sqlfold::load_config(&cli.files, cli.config.as_deref())
        .context("Configuration error")?;
    cli.apply(&mut mode);
    mode.format.validate().context("Invalid options")?;

    if cli.is_stdin() {
        return format_stdin(&mode, cli.outfile.as_deref());
    }

    let report = sqlfold::run(&cli.files, &mode);
    if !mode.quiet {
        print_verbose_results(&report, &mode);
        eprintln!("{}", report.summary());
    }
    report.print_errors();

    if report.has_errors() {
        Ok(ExitCode::from(2))
    } else if mode.check && report.has_changes() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn format_stdin(mode: &Mode, outfile: Option<&Path>) -> anyhow::Result<ExitCode> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .context("Error reading stdin")?;

    let formatted = sqlfold::format(&source, &mode.format_options())?;
    let formatted = sqlfold::api::with_trailing_newline(&source, formatted);

    if mode.check || mode.diff {
        let changed = formatted != source;
        if mode.diff && changed {
            sqlfold::api::print_diff(Path::new("<stdin>"), &source, &formatted);
        }
        return Ok(if mode.check && changed {
            ExitCode::from(1)
        } else {
            ExitCode::SUCCESS
        });
    }

    match outfile {
        Some(path) => std::fs::write(path, &formatted)
            .with_context(|| format!("Error writing {}", path.display()))?,
        None => print!("{formatted}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_verbose_results(report: &Report, mode: &Mode) {
    if !mode.verbose {
        return;
    }
    for result in &report.results {
        match result.status {
            FileStatus::Changed => eprintln!("reformatted {}", result.path.display()),
            FileStatus::Unchanged => eprintln!("unchanged {}", result.path.display()),
            // reported by print_errors
            FileStatus::Error => {}
        }
    }
}
