//! Interactive input for the repository forms.

use std::io::{self, BufRead, Write};

pub trait Prompt {
    /// Asks for a line of text. Empty input returns `default`.
    fn text(&mut self, label: &str, default: Option<&str>) -> io::Result<String>;

    /// Asks a yes/no question where empty input returns `default`.
    fn flag(&mut self, label: &str, default: bool) -> io::Result<bool>;

    /// Asks for confirmation of a destructive action. Empty input means no.
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        self.flag(question, false)
    }
}

/// Prompts on stderr and reads answers from stdin.
pub struct Terminal;

impl Terminal {
    fn read_line(&self) -> io::Result<String> {
        let mut input = String::new();
        let n = io::stdin().lock().read_line(&mut input)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(input.trim().to_string())
    }
}

impl Prompt for Terminal {
    fn text(&mut self, label: &str, default: Option<&str>) -> io::Result<String> {
        let mut err = io::stderr();
        match default {
            Some(d) if !d.is_empty() => write!(err, "{} [{}]: ", label, d)?,
            _ => write!(err, "{}: ", label)?,
        }
        err.flush()?;

        let input = self.read_line()?;
        if input.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(input)
        }
    }

    fn flag(&mut self, label: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let mut err = io::stderr();
            write!(err, "{} ({}): ", label, hint)?;
            err.flush()?;

            match parse_yes_no(&self.read_line()?, default) {
                Some(answer) => return Ok(answer),
                None => eprintln!("Please enter 'y' for yes or 'n' for no."),
            }
        }
    }
}

pub fn parse_yes_no(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Answers prompts from a fixed script; used by tests.
#[cfg(test)]
pub(crate) struct ScriptedPrompt {
    answers: std::collections::VecDeque<String>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub(crate) fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|s| s.to_string()).collect(),
            asked: Vec::new(),
        }
    }

    fn next(&mut self, label: &str) -> io::Result<String> {
        self.asked.push(label.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }
}

#[cfg(test)]
impl Prompt for ScriptedPrompt {
    fn text(&mut self, label: &str, default: Option<&str>) -> io::Result<String> {
        let answer = self.next(label)?;
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer)
        }
    }

    fn flag(&mut self, label: &str, default: bool) -> io::Result<bool> {
        let answer = self.next(label)?;
        parse_yes_no(&answer, default)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_yes_no("y", false), Some(true));
        assert_eq!(parse_yes_no("YES", false), Some(true));
        assert_eq!(parse_yes_no("no", true), Some(false));
        assert_eq!(parse_yes_no("", true), Some(true));
        assert_eq!(parse_yes_no("  ", false), Some(false));
        assert_eq!(parse_yes_no("maybe", false), None);
    }

    #[test]
    fn test_confirm_defaults_to_no() {
        let mut prompt = ScriptedPrompt::new(&[""]);
        assert!(!prompt.confirm("Delete?").unwrap());
    }
}
