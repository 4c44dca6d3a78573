/// Classified inbound text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `/start` - begin profile setup
    Start,
    /// `/find` - request a partner
    Find,
    /// `/stop` - leave the chat or stop waiting
    Stop,
    /// `/help` - list commands
    Help,
    /// Any other slash command
    Unknown(&'a str),
    /// Plain text
    Text(&'a str),
}

impl<'a> Command<'a> {
    /// Classify a message
    ///
    /// Commands are matched case-insensitively on the first word. A trailing
    /// `@botname` and any arguments are ignored. Everything not starting with
    /// `/` is plain text and is passed through untouched.
    pub fn parse(text: &'a str) -> Self {
        let Some(rest) = text.trim_start().strip_prefix('/') else {
            return Command::Text(text);
        };

        let word = rest.split_whitespace().next().unwrap_or("");
        let name = word.split('@').next().unwrap_or("");

        match name.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "find" => Command::Find,
            "stop" => Command::Stop,
            "help" => Command::Help,
            _ => Command::Unknown(name),
        }
    }
}
