pub mod output;
pub mod prompt;

pub use prompt::{Answer, Prompter, TerminalPrompter};
