//! Interactive numbered menu, used when no subcommand is given.

use crate::commands::AnalyzeArgs;
use crate::Command;
use anyhow::{Context, Result};
use chronofile_core::config::{AppConfig, FilingConfig, NetworkConfig};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const ENTRIES: [&str; 8] = [
    "Remove _filemany.simDB files",
    "Report file extensions",
    "Normalize file names",
    "Normalize directory names",
    "Report photo capture dates",
    "Prefix photo names with capture date",
    "Organize photos by capture date",
    "Analyze path/metadata correlation",
];

/// Show the menu on stdout and read a choice from stdin.
///
/// Returns `None` for an invalid choice.
pub fn prompt() -> Result<Option<Command>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();

    writeln!(stdout, "{} - choose an operation:", AppConfig::APP_NAME)?;
    for (index, entry) in ENTRIES.iter().enumerate() {
        writeln!(stdout, "{}: {}", index + 1, entry)?;
    }
    let choice = ask(&mut input, &mut stdout, "Choice (1-8): ")?;

    let command = parse_choice(choice.trim());
    if !matches!(command, Some(Command::Analyze(_))) {
        return Ok(command);
    }

    let answer = ask(
        &mut input,
        &mut stdout,
        &format!(
            "Maximum number of photos to analyze (default: {}): ",
            NetworkConfig::DEFAULT_MAX_PHOTOS
        ),
    )?;
    Ok(Some(Command::Analyze(AnalyzeArgs {
        max_photos: parse_max_photos(&answer)?,
        ..Default::default()
    })))
}

fn ask(input: &mut impl BufRead, output: &mut impl Write, question: &str) -> Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read from stdin")?;
    Ok(line)
}

/// Map a menu number to its command, with default arguments.
pub fn parse_choice(choice: &str) -> Option<Command> {
    let command = match choice {
        "1" => Command::RemoveMarkers,
        "2" => Command::ReportExtensions,
        "3" => Command::NormalizeFiles,
        "4" => Command::NormalizeDirs,
        "5" => Command::ReportExif {
            output: PathBuf::from(FilingConfig::CAPTURE_DATE_REPORT),
            missing_output: PathBuf::from(FilingConfig::MISSING_DATE_REPORT),
        },
        "6" => Command::DatePrefix,
        "7" => Command::Organize {
            target: PathBuf::from(FilingConfig::DEFAULT_TARGET_DIR),
        },
        "8" => Command::Analyze(AnalyzeArgs::default()),
        _ => return None,
    };
    Some(command)
}

/// Empty input keeps the configured default.
fn parse_max_photos(answer: &str) -> Result<Option<usize>> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(None);
    }
    let value = answer
        .parse()
        .with_context(|| format!("Not a number: {}", answer))?;
    Ok(Some(value))
}
