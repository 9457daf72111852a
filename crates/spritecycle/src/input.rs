/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Request(String),
    Show,
    Hide,
    Quit,
    Unknown(String),
}

/// Lines starting with `:` are commands; anything else, including a blank
/// line, is a resource request.
pub fn parse_line(line: &str) -> Input {
    let trimmed = line.trim();
    match trimmed.strip_prefix(':') {
        Some(command) => match command.trim().to_ascii_lowercase().as_str() {
            "show" => Input::Show,
            "hide" => Input::Hide,
            "quit" | "q" | "exit" => Input::Quit,
            _ => Input::Unknown(trimmed.to_string()),
        },
        None => Input::Request(trimmed.to_string()),
    }
}
