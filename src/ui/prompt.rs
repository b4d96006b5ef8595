use std::io::{self, BufRead, Write};

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

/// Input that clears a setting instead of keeping it.
pub const CLEAR_TOKEN: &str = "-";

/// Reply to a setting prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Empty input: keep the current value.
    Keep,
    Set(String),
    /// The operator asked for the setting to be removed.
    Clear,
}

impl Answer {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "" => Answer::Keep,
            CLEAR_TOKEN => Answer::Clear,
            value => Answer::Set(value.to_string()),
        }
    }
}

/// Operator interaction. Every prompt blocks until a valid reply arrives;
/// invalid replies are re-asked, never turned into errors. End of input is
/// reported as `io::ErrorKind::UnexpectedEof`.
pub trait Prompter {
    /// Ask for a setting. `current` is displayed as the default (callers
    /// pass a masked value for secrets).
    fn ask(&self, label: &str, current: Option<&str>) -> io::Result<Answer>;

    /// Free-form line, trimmed.
    fn input(&self, label: &str) -> io::Result<String>;

    fn confirm(&self, question: &str, default: bool) -> io::Result<bool>;

    /// Pick one of `options`; returns its index.
    fn choose(&self, title: &str, options: &[&str]) -> io::Result<usize>;
}

/// Prompts on stdout, reads replies from stdin.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_line(&self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;
        drop(stdout);

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for an answer",
            ));
        }
        Ok(line.trim().to_string())
    }

    fn styled_label(&self, label: &str) -> String {
        if io::stdout().is_terminal() {
            label.bold().to_string()
        } else {
            label.to_string()
        }
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&self, label: &str, current: Option<&str>) -> io::Result<Answer> {
        let label = self.styled_label(label);
        let prompt = match current {
            Some(value) if !value.is_empty() => format!("  {} [{}]: ", label, value),
            _ => format!("  {}: ", label),
        };
        self.read_line(&prompt).map(|line| Answer::parse(&line))
    }

    fn input(&self, label: &str) -> io::Result<String> {
        let label = self.styled_label(label);
        self.read_line(&format!("  {}: ", label))
    }

    fn confirm(&self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let line = self.read_line(&format!("  {} [{}] ", question, hint))?;
            match parse_yes_no(&line, default) {
                Some(answer) => return Ok(answer),
                None => println!("  Please answer y or n."),
            }
        }
    }

    fn choose(&self, title: &str, options: &[&str]) -> io::Result<usize> {
        println!("  {}", self.styled_label(title));
        for (i, option) in options.iter().enumerate() {
            println!("    {}) {}", i + 1, option);
        }
        loop {
            let line = self.read_line("  Choice: ")?;
            match parse_choice(&line, options.len()) {
                Some(index) => return Ok(index),
                None => println!("  Enter a number between 1 and {}.", options.len()),
            }
        }
    }
}

/// `None` means the reply was not understood.
pub fn parse_yes_no(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Parse a 1-based menu choice into an index below `count`.
pub fn parse_choice(input: &str, count: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Some(n - 1),
        _ => None,
    }
}
