//! Chat command surface
//!
//! The bot side of the system is a thin collaborator: two text commands and
//! read-only roster lookups against the published snapshot. Transport is
//! owned by the hosting process; this module only turns incoming message
//! text into replies.

use once_cell::sync::Lazy;
use regex::Regex;

/// Messages that don't start with this are ignored outright
pub const COMMAND_PREFIX: char = '!';

pub const HELP_TEXT: &str = "\
 BOT UTILITY FUNCTIONS
-----------------------
!ping                           Checks if online
!help                           Displays this message";

static PING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^!ping").expect("static regex"));
static HELP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^!help").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	/// `!ping` - liveness check
	Ping,
	/// `!help` - command listing
	Help,
}

/// Parse a raw chat message.
///
/// Anything that does not start with the command prefix, or matches no
/// known command, is ignored.
pub fn parse(content: &str) -> Option<Command> {
	if !content.starts_with(COMMAND_PREFIX) {
		return None;
	}
	if PING_RE.is_match(content) {
		Some(Command::Ping)
	} else if HELP_RE.is_match(content) {
		Some(Command::Help)
	} else {
		None
	}
}

/// Render the reply for a parsed command, addressed to the invoking user
pub fn respond(command: Command, author: &str) -> String {
	match command {
		Command::Ping => format!("@{author} pong!"),
		Command::Help => HELP_TEXT.to_string(),
	}
}

/// Parse and respond in one step, for transports
pub fn dispatch(author: &str, content: &str) -> Option<String> {
	parse(content).map(|command| respond(command, author))
}
