//! Markup conversion.
//!
//! Dradis stores textile. Local trees may hold markdown instead, and reports
//! can be rendered to PDF or Word. Conversion goes through pandoc behind the
//! [`DocumentConverter`] trait so the sync engine can be tested without it.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Serialize;
use tracing::{debug, warn};

use crate::sync::fields;

/// A markup dialect or document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupFormat {
    Textile,
    Markdown,
    Pdf,
    Word,
}

impl MarkupFormat {
    pub const ALL: [Self; 4] = [Self::Textile, Self::Markdown, Self::Pdf, Self::Word];

    /// Extensions that can be read back as markup.
    pub const INPUT_EXTENSIONS: [&'static str; 2] = [".textile", ".md"];

    /// Format Dradis stores natively.
    pub const NATIVE: Self = Self::Textile;

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Textile => "textile",
            Self::Markdown => "markdown",
            Self::Pdf => "pdf",
            Self::Word => "word",
        }
    }

    /// File extension, dot included.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Textile => ".textile",
            Self::Markdown => ".md",
            Self::Pdf => ".pdf",
            Self::Word => ".docx",
        }
    }

    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.name()).collect()
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Format of a path, from its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extension().trim_start_matches('.') == ext)
    }

    /// Whether the format is a rendered document rather than markup.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(self, Self::Pdf | Self::Word)
    }

    /// Pandoc reader name. Markdown is read as GFM without the extensions
    /// that mangle textile output.
    const fn pandoc_reader(self) -> &'static str {
        match self {
            Self::Textile => "textile",
            Self::Markdown => "gfm-autolink_bare_uris-gfm_auto_identifiers",
            Self::Pdf => "pdf",
            Self::Word => "docx",
        }
    }

    const fn pandoc_writer(self) -> &'static str {
        match self {
            Self::Textile => "textile",
            Self::Markdown => "gfm",
            Self::Pdf => "pdf",
            Self::Word => "docx",
        }
    }
}

impl fmt::Display for MarkupFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Conversion failures.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("pandoc is not installed or not in PATH")]
    PandocMissing,

    #[error("pandoc failed: {0}")]
    Pandoc(String),

    #[error("{0} cannot be read as markup")]
    UnsupportedInput(String),

    #[error("{0} output must be written to a file")]
    BinaryTarget(MarkupFormat),

    #[error("{} does not exist", .0.display())]
    PathNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Converts markup text between formats.
pub trait DocumentConverter {
    /// Convert `text` from one markup format to another.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is unavailable or rejects the input.
    fn convert(&self, text: &str, from: MarkupFormat, to: MarkupFormat)
    -> Result<String, ConvertError>;

    /// Convert `text` and write the result to `output`.
    ///
    /// # Errors
    ///
    /// Returns an error if conversion or the write fails.
    fn render(
        &self,
        text: &str,
        from: MarkupFormat,
        to: MarkupFormat,
        output: &Path,
    ) -> Result<(), ConvertError> {
        let converted = self.convert(text, from, to)?;
        fs::write(output, converted)?;
        Ok(())
    }
}

/// [`DocumentConverter`] shelling out to `pandoc`.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pandoc"),
        }
    }
}

impl PandocConverter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific pandoc binary.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `pandoc --version` first line, if pandoc runs.
    #[must_use]
    pub fn version(&self) -> Option<String> {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .ok()
            .filter(|o| o.status.success())
            .and_then(|o| {
                String::from_utf8_lossy(&o.stdout)
                    .lines()
                    .next()
                    .map(str::to_string)
            })
    }

    fn run(
        &self,
        text: &str,
        from: MarkupFormat,
        to: MarkupFormat,
        output: Option<&Path>,
    ) -> Result<String, ConvertError> {
        let mut command = Command::new(&self.program);
        command
            .args(["--wrap=none", "-f", from.pandoc_reader(), "-t", to.pandoc_writer()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(path) = output {
            command.arg("-o").arg(path);
        }

        debug!(from = %from, to = %to, "Running pandoc");
        let mut child = command.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConvertError::PandocMissing,
            _ => ConvertError::Io(e),
        })?;

        // Feed stdin from another thread so a large output cannot block the pipe.
        let input = fields::space_fields(text);
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ConvertError::Pandoc("stdin unavailable".to_string()))?;
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let result = child.wait_with_output()?;
        writer
            .join()
            .map_err(|_| ConvertError::Pandoc("stdin writer panicked".to_string()))??;

        if !result.status.success() {
            return Err(ConvertError::Pandoc(
                String::from_utf8_lossy(&result.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&result.stdout).into_owned())
    }
}

impl DocumentConverter for PandocConverter {
    fn convert(
        &self,
        text: &str,
        from: MarkupFormat,
        to: MarkupFormat,
    ) -> Result<String, ConvertError> {
        if from == to {
            return Ok(text.to_string());
        }
        if to.is_binary() {
            return Err(ConvertError::BinaryTarget(to));
        }

        let output = unescape_pandoc(&self.run(text, from, to, None)?);
        Ok(if to == MarkupFormat::Textile {
            unescape_html(&output)
        } else {
            output
        })
    }

    fn render(
        &self,
        text: &str,
        from: MarkupFormat,
        to: MarkupFormat,
        output: &Path,
    ) -> Result<(), ConvertError> {
        if to.is_binary() {
            self.run(text, from, to, Some(output))?;
            return Ok(());
        }
        let converted = self.convert(text, from, to)?;
        fs::write(output, converted)?;
        Ok(())
    }
}

/// Undo pandoc's over-eager backslash escaping.
#[must_use]
pub fn unescape_pandoc(text: &str) -> String {
    const ESCAPES: [(&str, &str); 11] = [
        (r"\<", "<"),
        (r"\>", ">"),
        (r"\\", r"\"),
        (r"\*", "*"),
        (r"\_", "_"),
        (r"\[", "["),
        (r"\]", "]"),
        (r"\#", "#"),
        (r"\|", "|"),
        (r"\~", "~"),
        (r"\.\.", ".."),
    ];
    ESCAPES
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Decode the HTML entities pandoc writes into textile.
#[must_use]
pub fn unescape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let decoded = rest.find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end))
        });

        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn input_format(path: &Path) -> Result<MarkupFormat, ConvertError> {
    MarkupFormat::from_path(path)
        .filter(|f| !f.is_binary())
        .ok_or_else(|| {
            ConvertError::UnsupportedInput(
                path.extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_else(|| path.display().to_string()),
            )
        })
}

/// Convert one file to `<stem><new ext>` next to it.
///
/// Returns the path of the converted file. A file already in the target
/// format is left alone.
///
/// # Errors
///
/// Returns an error if the file is not markup, cannot be read, or
/// conversion fails. On error the source file is never deleted.
pub fn convert_file(
    converter: &dyn DocumentConverter,
    path: &Path,
    to: MarkupFormat,
    delete_input: bool,
) -> Result<PathBuf, ConvertError> {
    let from = input_format(path)?;
    if from == to {
        debug!(file = %path.display(), "Already in target format");
        return Ok(path.to_path_buf());
    }

    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let target = path.with_file_name(format!("{stem}{}", to.extension()));

    debug!(from = %path.display(), to = %target.display(), "Converting file");
    converter.render(&content, from, to, &target)?;

    if delete_input {
        fs::remove_file(path)?;
    }
    Ok(target)
}

/// Files converted by [`convert_path`].
#[derive(Debug, Default, Clone, Serialize)]
pub struct ConvertReport {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

fn collect_markup(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_markup(&path, out)?;
        } else if input_format(&path).is_ok() {
            out.push(path);
        }
    }
    Ok(())
}

/// Convert a file, or every markup file under a directory, keeping sources.
///
/// In a directory, a failing file is logged and the walk continues.
///
/// # Errors
///
/// Returns an error if the path does not exist, or if a single file argument
/// is not markup or fails to convert.
pub fn convert_path(
    converter: &dyn DocumentConverter,
    path: &Path,
    to: MarkupFormat,
) -> Result<ConvertReport, ConvertError> {
    let mut report = ConvertReport::default();

    if path.is_file() {
        report.converted.push(convert_file(converter, path, to, false)?);
        return Ok(report);
    }
    if !path.is_dir() {
        return Err(ConvertError::PathNotFound(path.to_path_buf()));
    }

    let mut files = Vec::new();
    collect_markup(path, &mut files)?;
    for file in files {
        if MarkupFormat::from_path(&file) == Some(to) {
            continue;
        }
        match convert_file(converter, &file, to, false) {
            Ok(target) => report.converted.push(target),
            Err(e) => {
                warn!(file = %file.display(), error = %e, "Conversion failed");
                report.failed.push(file);
            }
        }
    }
    Ok(report)
}

/// Read a local file as textile.
///
/// `.textile` is read as is, `.md` is converted. Any other extension yields
/// `Ok(None)`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or conversion fails.
pub fn read_textile(
    converter: &dyn DocumentConverter,
    path: &Path,
) -> Result<Option<String>, ConvertError> {
    let Ok(from) = input_format(path) else {
        return Ok(None);
    };
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    if from == MarkupFormat::Textile {
        return Ok(Some(content.into_owned()));
    }
    converter
        .convert(&content, from, MarkupFormat::Textile)
        .map(Some)
}
