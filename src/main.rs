use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use prose_fmt::parser::extract::{self, Step};
use prose_fmt::parser::{render_sections, sanitize, sections};
use prose_fmt::render::personalize;
use prose_fmt::response::text_from_body;
use prose_fmt::{format_text, process_response, Profile, Theme};

#[derive(Parser)]
#[command(name = "prose_fmt", about = "Format and mine semi-structured LLM output")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a response as markup
    Format {
        /// Input file, or "-" for stdin
        input: PathBuf,
        #[arg(short, long, value_enum, default_value = "generic")]
        profile: ProfileArg,
        /// Profile JSON file (overrides --profile)
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value = "html")]
        theme: ThemeArg,
        /// Theme JSON file (overrides --theme)
        #[arg(long)]
        theme_config: Option<PathBuf>,
        /// Phrase to emphasize wherever it appears (repeatable)
        #[arg(long = "highlight")]
        highlights: Vec<String>,
        /// Replaces "the company" in the output
        #[arg(long)]
        account: Option<String>,
        /// Replaces "the industry" in the output
        #[arg(long)]
        industry: Option<String>,
    },
    /// Split a response into named sections (JSON)
    Sections {
        input: PathBuf,
        #[arg(short, long, value_enum, default_value = "current-system")]
        profile: ProfileArg,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Run each section through the formatter
        #[arg(short, long)]
        render: bool,
        #[arg(short, long, value_enum, default_value = "html")]
        theme: ThemeArg,
    },
    /// Difficulty score and classification
    Assess { input: PathBuf },
    /// Step outline with the items under each step
    Steps { input: PathBuf },
    /// Process every file in a directory into JSON reports
    Batch {
        dir: PathBuf,
        /// Output directory (default: <dir>/reports)
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value = "generic")]
        profile: ProfileArg,
        #[arg(short, long, value_enum, default_value = "html")]
        theme: ThemeArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Generic,
    Vocabulary,
    CurrentSystem,
    Hardness,
}

impl ProfileArg {
    fn profile(self) -> Profile {
        match self {
            ProfileArg::Generic => Profile::generic(),
            ProfileArg::Vocabulary => Profile::vocabulary(),
            ProfileArg::CurrentSystem => Profile::current_system(),
            ProfileArg::Hardness => Profile::hardness(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Html,
    Plain,
    Terminal,
}

impl ThemeArg {
    fn theme(self) -> Theme {
        match self {
            ThemeArg::Html => Theme::html(),
            ThemeArg::Plain => Theme::plain(),
            ThemeArg::Terminal => Theme::terminal(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    match cli.command {
        Commands::Format {
            input,
            profile,
            config,
            theme,
            theme_config,
            highlights,
            account,
            industry,
        } => {
            let profile = load_profile(profile, config.as_deref())?.with_highlights(highlights);
            let theme = match theme_config {
                Some(path) => load_theme(&path)?,
                None => theme.theme(),
            };
            let text = read_input(&input)?;
            let markup = format_text(&text, &profile, &theme);
            let markup = personalize(
                &markup,
                account.as_deref().unwrap_or(""),
                industry.as_deref().unwrap_or(""),
                &theme,
            );
            println!("{}", markup);
        }
        Commands::Sections {
            input,
            profile,
            config,
            render,
            theme,
        } => {
            let profile = load_profile(profile, config.as_deref())?;
            let text = sanitize(&read_input(&input)?);
            let mut map = sections::split_sections(&text, &profile.anchors);
            if render {
                map = render_sections(&map, &profile, &theme.theme());
            }
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        Commands::Assess { input } => {
            let text = sanitize(&read_input(&input)?);
            let a = extract::assess(&text);
            let score = a.score.map(|s| format!("{:.1}", s)).unwrap_or_else(|| "-".into());
            println!("Score:          {}", score);
            println!("Classification: {}", a.classification);
        }
        Commands::Steps { input } => {
            let text = sanitize(&read_input(&input)?);
            let steps = extract::extract_steps(&text);
            if steps.is_empty() {
                println!("No steps found.");
            }
            print_steps(&steps);
        }
        Commands::Batch {
            dir,
            out,
            profile,
            theme,
        } => {
            let out = out.unwrap_or_else(|| dir.join("reports"));
            let files = list_inputs(&dir)?;
            if files.is_empty() {
                println!("No input files in {}.", dir.display());
                return Ok(());
            }
            std::fs::create_dir_all(&out)
                .with_context(|| format!("creating {}", out.display()))?;
            println!("Processing {} files...", files.len());
            let counts = process_files(&files, &out, &profile.profile(), &theme.theme());
            println!(
                "Wrote {} reports to {} ({} errors).",
                counts.ok,
                out.display(),
                counts.errors
            );
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        info!("done in {}", format_duration(elapsed));
    }

    Ok(())
}

fn load_profile(preset: ProfileArg, config: Option<&Path>) -> Result<Profile> {
    match config {
        Some(path) => Profile::from_file(path),
        None => Ok(preset.profile()),
    }
}

fn load_theme(path: &Path) -> Result<Theme> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading theme {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing theme {}", path.display()))
}

/// Read a response body from a file or stdin, unwrapping JSON envelopes.
fn read_input(path: &Path) -> Result<String> {
    let body = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    Ok(text_from_body(&body))
}

fn list_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn print_steps(steps: &[Step]) {
    for step in steps {
        println!("Step {}: {}", step.number, truncate(&step.title, 60));
        for item in &step.items {
            println!("  - {}", truncate(item, 60));
        }
    }
}

struct BatchCounts {
    ok: usize,
    errors: usize,
}

fn process_files(files: &[PathBuf], out: &Path, profile: &Profile, theme: &Theme) -> BatchCounts {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut counts = BatchCounts { ok: 0, errors: 0 };

    for chunk in files.chunks(500) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|path| (path, write_report(path, out, profile, theme)))
            .collect();

        for (path, result) in results {
            match result {
                Ok(()) => counts.ok += 1,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "report failed");
                    counts.errors += 1;
                }
            }
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    counts
}

fn write_report(path: &Path, out: &Path, profile: &Profile, theme: &Theme) -> Result<()> {
    let text = read_input(path)?;
    let report = process_response(&text, profile, theme);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".into());
    let target = out.join(format!("{}.json", stem));
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&target, json).with_context(|| format!("writing {}", target.display()))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
