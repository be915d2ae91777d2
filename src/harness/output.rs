//! Interpreter output parsing
//!
//! The interpreter echoes prompts and diagnostics alongside results. Result lines are the ones
//! carrying a `>` delimiter; the token is whatever follows the first `>`, trimmed. Lines without
//! the delimiter are dropped without a warning.

/// Separates the interpreter's prefix from a result value.
pub const RESULT_DELIMITER: char = '>';

/// Extract result tokens from raw interpreter stdout, in line order.
pub fn parse_output(raw: &str) -> Vec<String> {
    raw.lines()
        .filter_map(|line| line.split_once(RESULT_DELIMITER))
        .map(|(_, value)| value.trim().to_string())
        .collect()
}
