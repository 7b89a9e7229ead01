//! Classification of line-oriented symbol input on the client.

/// Line that ends the client's outbound direction.
pub const EXIT_SENTINEL: &str = "exit";

/// Meaning of one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    /// Subscribe to the contained symbol.
    Subscribe(String),
    /// Sentinel: stop sending and half-close.
    Exit,
    /// Nothing to send (blank line).
    Skip,
}

/// Classifies a raw input line.
///
/// Surrounding whitespace is trimmed; the symbol is otherwise sent exactly as
/// typed, so `aapl` and `AAPL` are distinct subscriptions.
pub fn parse_input_line(line: &str) -> InputLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        InputLine::Skip
    } else if trimmed == EXIT_SENTINEL {
        InputLine::Exit
    } else {
        InputLine::Subscribe(trimmed.to_string())
    }
}
