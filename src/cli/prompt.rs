//! Interactive input-validation pipeline
//!
//! Collects everything one invocation needs from the console and hands it
//! over as a single value, keeping the processing layer free of any console
//! state. Generic over reader/writer so a scripted session can drive it in
//! tests.
//!
//! Recoverable input problems never abort: a missing input file re-prompts,
//! an invalid color falls back to white with a notice.

use crate::color::{BackgroundColor, PALETTE};
use crate::error::Result;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Everything gathered from the console for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptedRequest {
    /// Existing input image path
    pub input_path: PathBuf,
    /// Background color to composite over
    pub color: BackgroundColor,
    /// Output path (defaulted when the user pressed Enter)
    pub output_path: PathBuf,
}

/// Run the full prompt pipeline.
///
/// Returns `None` when the user closes the input stream (Ctrl-D), which is
/// treated as cancellation rather than an error.
///
/// # Errors
/// - Console read/write failures
pub fn gather_request<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> Result<Option<PromptedRequest>> {
    let Some(input_path) = prompt_input_path(input, out)? else {
        return Ok(None);
    };
    let Some(color) = prompt_color(input, out)? else {
        return Ok(None);
    };
    let Some(output_path) = prompt_output_path(input, out, &input_path)? else {
        return Ok(None);
    };

    Ok(Some(PromptedRequest {
        input_path,
        color,
        output_path,
    }))
}

/// Ask for the input image path until it references an existing file
fn prompt_input_path<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> Result<Option<PathBuf>> {
    loop {
        let Some(answer) = ask(input, out, "Enter the path to your image: ")? else {
            return Ok(None);
        };
        // Drag-and-drop paths arrive wrapped in quotes
        let cleaned = answer.trim_matches(|c| c == '"' || c == '\'');
        let path = Path::new(cleaned);
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }
        writeln!(out, "File does not exist. Please try again.")?;
    }
}

/// Ask for the background color, via explicit RGB values or the palette
fn prompt_color<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> Result<Option<BackgroundColor>> {
    writeln!(out, "\nChoose background color:")?;
    writeln!(out, "1. Enter RGB values")?;
    writeln!(out, "2. Use predefined color")?;

    let Some(choice) = ask(input, out, "Enter your choice (1 or 2): ")? else {
        return Ok(None);
    };

    if choice.trim() == "1" {
        prompt_rgb_values(input, out)
    } else {
        prompt_palette(input, out)
    }
}

fn prompt_rgb_values<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> Result<Option<BackgroundColor>> {
    let Some(r) = ask(input, out, "Enter Red value (0-255): ")? else {
        return Ok(None);
    };
    let Some(g) = ask(input, out, "Enter Green value (0-255): ")? else {
        return Ok(None);
    };
    let Some(b) = ask(input, out, "Enter Blue value (0-255): ")? else {
        return Ok(None);
    };

    match BackgroundColor::parse_rgb_triple(&r, &g, &b) {
        Some(color) => Ok(Some(color)),
        None => {
            writeln!(out, "Invalid input. Using white as default.")?;
            Ok(Some(BackgroundColor::WHITE))
        },
    }
}

fn prompt_palette<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> Result<Option<BackgroundColor>> {
    writeln!(out, "\nAvailable colors:")?;
    for (index, (name, _)) in PALETTE.iter().enumerate() {
        writeln!(out, "{}. {name}", index + 1)?;
    }

    let Some(choice) = ask(input, out, "Choose a color number: ")? else {
        return Ok(None);
    };
    let (color, _name) = BackgroundColor::from_palette_choice(&choice);
    Ok(Some(color))
}

/// Ask for the output path, defaulting next to the input
fn prompt_output_path<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    input_path: &Path,
) -> Result<Option<PathBuf>> {
    let default = default_output_path(input_path);
    let prompt = format!(
        "Enter output path (press Enter for default: {}): ",
        default.display()
    );

    let Some(answer) = ask(input, out, &prompt)? else {
        return Ok(None);
    };
    if answer.trim().is_empty() {
        Ok(Some(default))
    } else {
        Ok(Some(PathBuf::from(answer.trim())))
    }
}

/// Default output path: `<input-stem>_new_bg.png` next to the input
#[must_use]
pub fn default_output_path(input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input_path.with_file_name(format!("{stem}_new_bg.png"))
}

/// Print a prompt and read one line; `None` signals end of input
fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}
