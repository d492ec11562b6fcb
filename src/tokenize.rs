//! Quote-aware splitting of a single delimited line.
//!
//! The tokenizer is a two-state machine. A double quote toggles between
//! [`State::Unquoted`] and [`State::Quoted`] and is dropped from the output;
//! a comma ends the current field only while unquoted. Doubled quotes are not
//! treated as an escape, so `"a ""b"""` yields `a b`. Unbalanced quotes are
//! not an error: the line simply ends while still quoted.

pub const DELIMITER: char = ',';
pub const QUOTE: char = '"';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unquoted,
    Quoted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Quote,
    Delimiter,
    Other,
}

/// What the machine does with the character it just consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Drop the character.
    Skip,
    /// Append the character to the current field.
    Push,
    /// Close the current field and start a new one.
    Emit,
}

pub fn classify(c: char) -> CharClass {
    match c {
        QUOTE => CharClass::Quote,
        DELIMITER => CharClass::Delimiter,
        _ => CharClass::Other,
    }
}

/// Transition table of the tokenizer.
pub fn step(state: State, class: CharClass) -> (State, Action) {
    match (state, class) {
        (State::Unquoted, CharClass::Quote) => (State::Quoted, Action::Skip),
        (State::Quoted, CharClass::Quote) => (State::Unquoted, Action::Skip),
        (State::Unquoted, CharClass::Delimiter) => (State::Unquoted, Action::Emit),
        (State::Quoted, CharClass::Delimiter) => (State::Quoted, Action::Push),
        (state, CharClass::Other) => (state, Action::Push),
    }
}

/// Splits one line into trimmed fields.
///
/// Always returns at least one field; an empty line yields `[""]`.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut state = State::Unquoted;

    for c in line.chars() {
        let (next, action) = step(state, classify(c));
        match action {
            Action::Skip => {}
            Action::Push => current.push(c),
            Action::Emit => {
                fields.push(current.trim().to_string());
                current.clear();
            }
        }
        state = next;
    }

    fields.push(current.trim().to_string());
    fields
}
