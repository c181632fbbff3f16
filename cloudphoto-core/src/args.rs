use std::fmt;
use std::str::FromStr;

use crate::parser::ParseError;

/// Flags accepted after a command verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Argument {
    Path,
    Album,
    Illegal,
}

impl Argument {
    pub const RECOGNIZED: [Argument; 2] = [Argument::Path, Argument::Album];

    /// Canonical flag token, `None` for [`Argument::Illegal`].
    pub fn flag(self) -> Option<&'static str> {
        match self {
            Argument::Path => Some("-p"),
            Argument::Album => Some("-a"),
            Argument::Illegal => None,
        }
    }

    /// Resolve a token to its argument. Unknown tokens map to [`Argument::Illegal`].
    pub fn lookup(token: &str) -> Argument {
        Self::RECOGNIZED
            .into_iter()
            .find(|argument| argument.flag() == Some(token))
            .unwrap_or(Argument::Illegal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Upload,
    Download,
    List,
    Exit,
}

impl CommandType {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandType::Upload => "upload",
            CommandType::Download => "download",
            CommandType::List => "list",
            CommandType::Exit => "exit",
        }
    }
}

impl FromStr for CommandType {
    type Err = ParseError;

    fn from_str(verb: &str) -> Result<Self, Self::Err> {
        match verb {
            "upload" => Ok(CommandType::Upload),
            "download" => Ok(CommandType::Download),
            "list" => Ok(CommandType::List),
            "exit" => Ok(CommandType::Exit),
            _ => Err(ParseError::UnknownVerb(verb.to_string())),
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_resolves_known_flags() {
        assert_eq!(Argument::lookup("-p"), Argument::Path);
        assert_eq!(Argument::lookup("-a"), Argument::Album);
    }

    #[test]
    fn lookup_maps_unknown_tokens_to_illegal() {
        assert_eq!(Argument::lookup("-x"), Argument::Illegal);
        assert_eq!(Argument::lookup("p"), Argument::Illegal);
        assert_eq!(Argument::lookup(""), Argument::Illegal);
        assert_eq!(Argument::Illegal.flag(), None);
    }

    #[test]
    fn command_type_parses_every_verb() {
        for kind in [
            CommandType::Upload,
            CommandType::Download,
            CommandType::List,
            CommandType::Exit,
        ] {
            assert_eq!(kind.as_str().parse::<CommandType>().unwrap(), kind);
        }
        assert!("delete".parse::<CommandType>().is_err());
    }

    #[test]
    fn verbs_are_case_sensitive() {
        for verb in ["Upload", "LIST", "Exit", "downLoad"] {
            assert_eq!(
                verb.parse::<CommandType>(),
                Err(ParseError::UnknownVerb(verb.to_string()))
            );
        }
    }
}
