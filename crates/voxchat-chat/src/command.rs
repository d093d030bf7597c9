//! Control words a user can type instead of a message.

use std::fmt;

/// A chat command. Commands are handled locally: they never reach the
/// language model and never add turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatCommand {
    /// Empty the session transcript.
    Clear,
    /// Switch replies to text only.
    TypeMode,
    /// Switch replies to text and audio.
    VoiceMode,
    /// End the session.
    Quit,
}

impl ChatCommand {
    /// Recognize `message` as a command. Matching is case-insensitive and
    /// covers the whole trimmed message, so "clear the table" is a query.
    pub fn parse(message: &str) -> Option<Self> {
        match message.trim().to_lowercase().as_str() {
            "clear" => Some(ChatCommand::Clear),
            "type" => Some(ChatCommand::TypeMode),
            "voice" => Some(ChatCommand::VoiceMode),
            "quit" => Some(ChatCommand::Quit),
            _ => None,
        }
    }

    /// Acknowledgement shown to the user.
    pub fn acknowledgement(self) -> &'static str {
        match self {
            ChatCommand::Clear => "Conversation cleared.",
            ChatCommand::TypeMode => "Switched to text replies.",
            ChatCommand::VoiceMode => "Switched to spoken replies.",
            ChatCommand::Quit => "Goodbye!",
        }
    }
}

impl fmt::Display for ChatCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChatCommand::Clear => "clear",
            ChatCommand::TypeMode => "type",
            ChatCommand::VoiceMode => "voice",
            ChatCommand::Quit => "quit",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ChatCommand::parse("clear"), Some(ChatCommand::Clear));
        assert_eq!(ChatCommand::parse("TYPE"), Some(ChatCommand::TypeMode));
        assert_eq!(ChatCommand::parse("  Voice \n"), Some(ChatCommand::VoiceMode));
        assert_eq!(ChatCommand::parse("Quit"), Some(ChatCommand::Quit));
    }

    #[test]
    fn test_parse_requires_whole_message() {
        assert_eq!(ChatCommand::parse("clear the table"), None);
        assert_eq!(ChatCommand::parse("please quit"), None);
        assert_eq!(ChatCommand::parse(""), None);
        assert_eq!(ChatCommand::parse("exit"), None);
    }

    #[test]
    fn test_display_matches_keyword() {
        for cmd in [
            ChatCommand::Clear,
            ChatCommand::TypeMode,
            ChatCommand::VoiceMode,
            ChatCommand::Quit,
        ] {
            assert_eq!(ChatCommand::parse(&cmd.to_string()), Some(cmd));
        }
    }
}
