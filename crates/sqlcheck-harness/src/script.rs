//! Replay scripts.
//!
//! One command per line. Blank lines and lines starting with `#` are ignored. Text arguments
//! take the rest of the line and understand the escapes `\n`, `\t` and `\\`.
//!
//! ```text
//! # open a query and check it
//! check
//! insert 15 \n WHERE id = 1
//! pick 0
//! scroll 40
//! ```

use thiserror::Error;

/// One scripted host event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    /// Replace the whole buffer as a user edit.
    Edit(String),
    /// Insert text at a char offset.
    Insert { offset: usize, text: String },
    /// Delete the char range `start..end`.
    Delete { start: usize, end: usize },
    /// Run the full check.
    Check,
    /// Scroll so that the line is the first visible one.
    Scroll(usize),
    /// Free-form selection of `start..end`.
    Select { start: usize, end: usize },
    /// Pick an entry of the problems list.
    Pick(usize),
    /// New, empty document.
    Reset,
    /// Reload the document from its file.
    Reload,
    /// Change the viewport height.
    Resize(usize),
    /// Ask whether the buffer is formatted.
    IsFormatted,
    /// Print the buffer.
    Show,
}

impl ScriptCommand {
    /// Script keyword of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Edit(_) => "edit",
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
            Self::Check => "check",
            Self::Scroll(_) => "scroll",
            Self::Select { .. } => "select",
            Self::Pick(_) => "pick",
            Self::Reset => "reset",
            Self::Reload => "reload",
            Self::Resize(_) => "resize",
            Self::IsFormatted => "is-formatted",
            Self::Show => "show",
        }
    }
}

/// A script line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ScriptError {
    /// 1-based script line.
    pub line: usize,
    pub kind: ScriptErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptErrorKind {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`{command}` expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("`{0}` is not a number")]
    InvalidNumber(String),
    #[error("`{0}` takes no arguments")]
    UnexpectedArgument(&'static str),
}

/// Parse a whole script.
pub fn parse_script(source: &str) -> Result<Vec<ScriptCommand>, ScriptError> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            Some(parse_line(line).map_err(|kind| ScriptError { line: i + 1, kind }))
        })
        .collect()
}

fn parse_line(line: &str) -> Result<ScriptCommand, ScriptErrorKind> {
    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest),
        None => (line, ""),
    };

    let command = match keyword {
        "edit" => ScriptCommand::Edit(unescape(rest)),
        "insert" => {
            let (offset, text) = split_number(rest, "insert", "<offset> <text>")?;
            ScriptCommand::Insert {
                offset,
                text: unescape(text),
            }
        }
        "delete" => {
            let (start, end) = two_numbers(rest, "delete")?;
            ScriptCommand::Delete { start, end }
        }
        "select" => {
            let (start, end) = two_numbers(rest, "select")?;
            ScriptCommand::Select { start, end }
        }
        "scroll" => ScriptCommand::Scroll(one_number(rest, "scroll", "<line>")?),
        "pick" => ScriptCommand::Pick(one_number(rest, "pick", "<index>")?),
        "resize" => ScriptCommand::Resize(one_number(rest, "resize", "<lines>")?),
        "check" => no_arguments(rest, ScriptCommand::Check)?,
        "reset" => no_arguments(rest, ScriptCommand::Reset)?,
        "reload" => no_arguments(rest, ScriptCommand::Reload)?,
        "is-formatted" => no_arguments(rest, ScriptCommand::IsFormatted)?,
        "show" => no_arguments(rest, ScriptCommand::Show)?,
        other => return Err(ScriptErrorKind::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

fn no_arguments(rest: &str, command: ScriptCommand) -> Result<ScriptCommand, ScriptErrorKind> {
    if rest.trim().is_empty() {
        Ok(command)
    } else {
        Err(ScriptErrorKind::UnexpectedArgument(command.name()))
    }
}

fn parse_number(word: &str) -> Result<usize, ScriptErrorKind> {
    word.parse()
        .map_err(|_| ScriptErrorKind::InvalidNumber(word.to_string()))
}

fn split_number<'a>(
    rest: &'a str,
    command: &'static str,
    expected: &'static str,
) -> Result<(usize, &'a str), ScriptErrorKind> {
    let rest = rest.trim_start();
    let (number, tail) = rest.split_once(' ').unwrap_or((rest, ""));
    if number.is_empty() {
        return Err(ScriptErrorKind::MissingArgument { command, expected });
    }
    Ok((parse_number(number)?, tail))
}

fn one_number(
    rest: &str,
    command: &'static str,
    expected: &'static str,
) -> Result<usize, ScriptErrorKind> {
    let mut words = rest.split_whitespace();
    let Some(word) = words.next() else {
        return Err(ScriptErrorKind::MissingArgument { command, expected });
    };
    let value = parse_number(word)?;
    if words.next().is_some() {
        return Err(ScriptErrorKind::MissingArgument { command, expected });
    }
    Ok(value)
}

fn two_numbers(rest: &str, command: &'static str) -> Result<(usize, usize), ScriptErrorKind> {
    let expected = "<start> <end>";
    let words: Vec<&str> = rest.split_whitespace().collect();
    let [start, end] = words.as_slice() else {
        return Err(ScriptErrorKind::MissingArgument { command, expected });
    };
    Ok((parse_number(start)?, parse_number(end)?))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
