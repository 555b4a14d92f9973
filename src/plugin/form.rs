//! Interactive configuration form
//!
//! The resolver describes the fields it needs as [`FormField`]s and hands
//! them to a [`FormRenderer`], which blocks until the operator submits or
//! cancels. [`TerminalForm`] is a line-oriented renderer for the host CLI.

use crate::plugin::error::{PluginError, PluginResult};
use colored::Colorize;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::sync::Mutex;

/// Widget to render for one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Single-line input; `required` attaches a non-empty validator.
    ///
    /// A `sensitive` field never shows its current value as the prompt
    /// default. Echo of typed input is left to the terminal.
    Input {
        value: String,
        required: bool,
        sensitive: bool,
    },
    /// Yes/no toggle
    Confirm { value: bool },
    /// Multi-line text box
    Text { value: String, lines: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub key: String,
    pub title: String,
    pub description: String,
    pub kind: FieldKind,
}

impl FormField {
    /// Run the field's validator against submitted text.
    pub fn validate(&self, submitted: &str) -> Result<(), String> {
        match &self.kind {
            FieldKind::Input { required: true, .. } if submitted.is_empty() => {
                Err("this field is required".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Submitted value for one field
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    Bool(bool),
}

/// Submitted values keyed by field key
pub type FormValues = HashMap<String, FormValue>;

/// Renders a form and blocks until it is submitted or cancelled.
///
/// Cancellation is reported as [`PluginError::FormCancelled`].
pub trait FormRenderer: Send + Sync {
    fn render(&self, fields: &[FormField]) -> PluginResult<FormValues>;
}

/// Prompts for each field on a line-based terminal.
///
/// End of input cancels the form. Multi-line fields end at an empty line.
pub struct TerminalForm<R, W> {
    io: Mutex<(R, W)>,
}

impl TerminalForm<std::io::BufReader<std::io::Stdin>, std::io::Stderr> {
    /// A form reading stdin and prompting on stderr
    pub fn stdio() -> Self {
        Self::new(std::io::BufReader::new(std::io::stdin()), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalForm<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }
}

fn io_failure(err: std::io::Error) -> PluginError {
    PluginError::FormFailed {
        message: err.to_string(),
    }
}

fn read_line<R: BufRead>(reader: &mut R) -> PluginResult<String> {
    let mut line = String::new();
    let read = reader.read_line(&mut line).map_err(io_failure)?;
    if read == 0 {
        return Err(PluginError::FormCancelled);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn prompt_field<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    field: &FormField,
) -> PluginResult<FormValue> {
    writeln!(writer, "{}", field.title.bold()).map_err(io_failure)?;
    if !field.description.is_empty() {
        writeln!(writer, "{}", field.description.dimmed()).map_err(io_failure)?;
    }

    match &field.kind {
        FieldKind::Input {
            value, sensitive, ..
        } => loop {
            let hint = match (*sensitive, value.is_empty()) {
                (true, _) => " (secret)".to_string(),
                (false, true) => String::new(),
                (false, false) => format!(" [{}]", value),
            };
            write!(writer, "> {}", hint).map_err(io_failure)?;
            writer.flush().map_err(io_failure)?;

            let mut submitted = read_line(reader)?;
            if submitted.is_empty() {
                submitted = value.clone();
            }
            match field.validate(&submitted) {
                Ok(()) => return Ok(FormValue::Text(submitted)),
                Err(message) => writeln!(writer, "{}", message.red()).map_err(io_failure)?,
            }
        },
        FieldKind::Confirm { value } => loop {
            let hint = if *value { "[Y/n]" } else { "[y/N]" };
            write!(writer, "> {} ", hint).map_err(io_failure)?;
            writer.flush().map_err(io_failure)?;

            match read_line(reader)?.trim().to_ascii_lowercase().as_str() {
                "" => return Ok(FormValue::Bool(*value)),
                "y" | "yes" => return Ok(FormValue::Bool(true)),
                "n" | "no" => return Ok(FormValue::Bool(false)),
                _ => writeln!(writer, "{}", "please answer y or n".red()).map_err(io_failure)?,
            }
        },
        FieldKind::Text { value, .. } => {
            if !value.is_empty() {
                writeln!(writer, "{}", value.dimmed()).map_err(io_failure)?;
            }
            writeln!(writer, "(one entry per line, empty line to finish)").map_err(io_failure)?;

            let mut lines = Vec::new();
            loop {
                let line = read_line(reader)?;
                if line.is_empty() {
                    break;
                }
                lines.push(line);
            }
            if lines.is_empty() {
                return Ok(FormValue::Text(value.clone()));
            }
            Ok(FormValue::Text(lines.join("\n")))
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> FormRenderer for TerminalForm<R, W> {
    fn render(&self, fields: &[FormField]) -> PluginResult<FormValues> {
        let mut guard = self.io.lock().map_err(|_| PluginError::FormFailed {
            message: "terminal form is poisoned".to_string(),
        })?;
        let (reader, writer) = &mut *guard;

        let mut values = FormValues::new();
        for field in fields {
            let value = prompt_field(reader, writer, field)?;
            values.insert(field.key.clone(), value);
        }
        Ok(values)
    }
}
