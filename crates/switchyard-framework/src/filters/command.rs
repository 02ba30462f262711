//! Text command filters.
//!
//! A command is a message whose text starts with a prefix character, a
//! command name, an optional `@mention` of the bot, and optional arguments:
//!
//! ```text
//! /ban@my_bot spammer 7d
//! ^ ^   ^     ^
//! | |   |     args
//! | |   mention
//! | command
//! prefix
//! ```
//!
//! ```rust,ignore
//! router
//!     .message_created()
//!     .with(Command::new(["ban", "kick"]).prefixes("/!").bot_username("my_bot"))
//!     .handler(|cmd: CommandObject| async move {
//!         format!("{} {}", cmd.command, cmd.args.unwrap_or_default())
//!     });
//! ```

use async_trait::async_trait;
use thiserror::Error;
use tracing::trace;

use switchyard_core::Update;

use crate::context::Context;
use crate::error::BoxError;
use crate::filter::Filter;
use crate::filters::deeplink::read_payload;

/// Why a message was not accepted as a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The update carries no message text.
    #[error("update has no message text")]
    NoText,

    /// The text does not start with a command.
    #[error("text is not a command")]
    NotACommand,

    /// The command uses a prefix the filter does not accept.
    #[error("invalid command prefix '{0}'")]
    InvalidPrefix(char),

    /// The command is addressed to another bot.
    #[error("command is addressed to '@{got}', not '@{expected}'")]
    MentionMismatch {
        /// Configured bot username.
        expected: String,
        /// Username found in the command.
        got: String,
    },

    /// The command name is not one the filter accepts.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

/// A parsed command, stashed by [`Command`] for the handler it guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandObject {
    pub prefix: char,
    pub command: String,
    pub mention: Option<String>,
    /// Everything after the first whitespace, trimmed. `None` if empty.
    pub args: Option<String>,
}

impl CommandObject {
    /// Splits command text into its parts without validating them.
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let mut chars = text.chars();
        let prefix = match chars.next() {
            Some(c) if !c.is_alphanumeric() && !c.is_whitespace() => c,
            _ => return Err(CommandError::NotACommand),
        };
        let rest = chars.as_str();

        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, Some(args.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };
        let (command, mention) = match head.split_once('@') {
            Some((command, mention)) => (command, Some(mention)),
            None => (head, None),
        };
        if command.is_empty() {
            return Err(CommandError::NotACommand);
        }

        Ok(Self {
            prefix,
            command: command.to_string(),
            mention: mention.filter(|m| !m.is_empty()).map(str::to_string),
            args: args.map(str::to_string),
        })
    }

    /// Reassembles the command text.
    pub fn text(&self) -> String {
        let mut out = format!("{}{}", self.prefix, self.command);
        if let Some(mention) = &self.mention {
            out.push('@');
            out.push_str(mention);
        }
        if let Some(args) = &self.args {
            out.push(' ');
            out.push_str(args);
        }
        out
    }
}

/// Text of a created or edited message.
fn message_text(update: &Update) -> Option<&str> {
    match update {
        Update::MessageCreated(m) => m.message.text(),
        Update::MessageEdited(m) => m.message.text(),
        _ => None,
    }
}

/// Matches messages starting with one of a set of commands.
#[derive(Debug, Clone)]
pub struct Command {
    commands: Vec<String>,
    prefixes: Vec<char>,
    ignore_case: bool,
    ignore_mention: bool,
    bot_username: Option<String>,
}

impl Command {
    /// Creates a filter for the given command names, without prefix.
    ///
    /// The default prefix is `/`.
    pub fn new(commands: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            prefixes: vec!['/'],
            ignore_case: false,
            ignore_mention: false,
            bot_username: None,
        }
    }

    /// Sets the accepted prefix characters.
    pub fn prefixes(mut self, prefixes: &str) -> Self {
        self.prefixes = prefixes.chars().collect();
        self
    }

    /// Compares command names case-insensitively.
    pub fn ignore_case(mut self, ignore: bool) -> Self {
        self.ignore_case = ignore;
        self
    }

    /// Accepts commands addressed to any bot.
    pub fn ignore_mention(mut self, ignore: bool) -> Self {
        self.ignore_mention = ignore;
        self
    }

    /// The bot's own username, used to reject commands mentioning other bots.
    ///
    /// Without it every mention is accepted.
    pub fn bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// Parses and validates `text` against this filter.
    pub fn parse(&self, text: &str) -> Result<CommandObject, CommandError> {
        let command = CommandObject::parse(text)?;

        if !self.prefixes.contains(&command.prefix) {
            return Err(CommandError::InvalidPrefix(command.prefix));
        }

        if let (false, Some(mention), Some(username)) =
            (self.ignore_mention, &command.mention, &self.bot_username)
        {
            if !mention.eq_ignore_ascii_case(username) {
                return Err(CommandError::MentionMismatch {
                    expected: username.clone(),
                    got: mention.clone(),
                });
            }
        }

        let known = self.commands.iter().any(|name| {
            if self.ignore_case {
                name.to_lowercase() == command.command.to_lowercase()
            } else {
                *name == command.command
            }
        });
        if !known {
            return Err(CommandError::UnknownCommand(command.command));
        }

        Ok(command)
    }
}

#[async_trait]
impl Filter for Command {
    async fn check(&self, update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        let parsed = message_text(update)
            .ok_or(CommandError::NoText)
            .and_then(|text| self.parse(text));

        match parsed {
            Ok(command) => {
                ctx.insert(command);
                Ok(true)
            }
            Err(reason) => {
                trace!(%reason, "command filter rejected update");
                Ok(false)
            }
        }
    }
}

/// Matches `/start`, optionally requiring a deep-link payload.
///
/// When arguments are present they are also stashed as a
/// [`Deeplink`](crate::Deeplink), base64-decoded if
/// [`encoded`](Self::encoded) is set.
#[derive(Debug, Clone)]
pub struct CommandStart {
    command: Command,
    deep_link: bool,
    encoded: bool,
}

impl CommandStart {
    pub fn new() -> Self {
        Self {
            command: Command::new(["start"]),
            deep_link: false,
            encoded: false,
        }
    }

    /// Only match `/start` with arguments.
    pub fn deep_link(mut self, required: bool) -> Self {
        self.deep_link = required;
        self
    }

    /// Decode the arguments as URL-safe base64.
    ///
    /// Arguments that fail to decode make the filter return an error.
    pub fn encoded(mut self, encoded: bool) -> Self {
        self.encoded = encoded;
        self
    }

    pub fn bot_username(mut self, username: impl Into<String>) -> Self {
        self.command = self.command.bot_username(username);
        self
    }
}

impl Default for CommandStart {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Filter for CommandStart {
    async fn check(&self, update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        let Some(command) = message_text(update).and_then(|text| self.command.parse(text).ok())
        else {
            return Ok(false);
        };
        if self.deep_link && command.args.is_none() {
            return Ok(false);
        }

        if let Some(args) = &command.args {
            ctx.insert(read_payload(args, self.encoded)?);
        }
        ctx.insert(command);
        Ok(true)
    }
}
