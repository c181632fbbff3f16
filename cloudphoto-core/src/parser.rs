use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::args::CommandType;
use crate::command::Command;

/// Stands in for whitespace inside a path while the line is tokenized.
/// Private-use code point, never produced by a keyboard.
const WHITESPACE_PLACEHOLDER: char = '\u{E000}';

const PROGRAM_TOKEN: &str = "cloudphoto";

static COMMAND_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*cloudphoto\s+(?:(?:upload|download)\s+-p\s+(?P<path>\S(?:.*\S)?)\s+-a\s+\S+|list(?:\s+-a\s+\S+)?|exit)\s*$",
    )
    .expect("Invalid command line pattern")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid command!")]
    InvalidCommand,

    /// Only produced by [`CommandType`]'s `FromStr`; lines reaching that
    /// point in [`parse`] already carry a known verb.
    #[error("No such command: {0}")]
    UnknownVerb(String),
}

/// Whole-line structural check against the command grammar.
pub fn is_valid(line: &str) -> bool {
    !line.contains(WHITESPACE_PLACEHOLDER) && COMMAND_LINE.is_match(line)
}

/// Parse one input line into a [`Command`]. Nothing is returned for a line
/// that does not match the grammar.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    if !is_valid(line) {
        return Err(ParseError::InvalidCommand);
    }

    let line = shield_path_whitespace(line);
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let (program, verb, rest) = match tokens.as_slice() {
        [program, verb, rest @ ..] => (*program, *verb, rest),
        _ => return Err(ParseError::InvalidCommand),
    };
    if program != PROGRAM_TOKEN {
        return Err(ParseError::InvalidCommand);
    }

    let mut command = Command::new(verb.parse::<CommandType>()?);
    for pair in rest.chunks(2) {
        if let [flag, value] = pair {
            command.set_parameter(flag, restore_whitespace(value));
        }
    }

    tracing::debug!(
        "Parsed command: kind={}, parameters={:?}",
        command.kind(),
        command.parameters()
    );
    Ok(command)
}

/// Swap every whitespace character of the `-p` segment for the placeholder so
/// the path survives whitespace splitting as a single token.
fn shield_path_whitespace(line: &str) -> String {
    let Some(path) = COMMAND_LINE.captures(line).and_then(|caps| caps.name("path")) else {
        return line.to_string();
    };

    let shielded: String = path
        .as_str()
        .chars()
        .map(|c| if c.is_whitespace() { WHITESPACE_PLACEHOLDER } else { c })
        .collect();

    format!("{}{}{}", &line[..path.start()], shielded, &line[path.end()..])
}

fn restore_whitespace(token: &str) -> String {
    token.replace(WHITESPACE_PLACEHOLDER, " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Argument;

    #[test]
    fn accepts_every_command_form() {
        for line in [
            "cloudphoto exit",
            "cloudphoto list",
            "cloudphoto list -a dogs",
            "cloudphoto upload -p /home/alice/photos -a dogs",
            "cloudphoto download -p ./out -a dogs",
            "   cloudphoto   list   -a   dogs   ",
            "cloudphoto\tupload\t-p\t/tmp\t-a\tdogs",
        ] {
            assert!(is_valid(line), "expected valid: {line:?}");
        }
    }

    #[test]
    fn rejects_lines_outside_the_grammar() {
        for line in [
            "",
            "   ",
            "cloudphoto",
            "list",
            "cloudphoto delete -a dogs",
            "cloudphoto upload -a dogs",
            "cloudphoto upload -p /tmp",
            "cloudphoto upload -p -a dogs",
            "cloudphoto upload -p /tmp -a my dogs",
            "cloudphoto list -a",
            "cloudphoto list -p /tmp",
            "cloudphoto exit now",
            "cloudphotoexit",
            "CLOUDPHOTO exit",
            "cloudphoto EXIT",
            "cloudphoto List -a dogs",
            "cloudphoto upload -p /tmp\u{E000}x -a dogs",
        ] {
            assert!(!is_valid(line), "expected invalid: {line:?}");
            assert_eq!(parse(line), Err(ParseError::InvalidCommand));
        }
    }

    #[test]
    fn parses_exit_and_bare_list_without_parameters() {
        let exit = parse("cloudphoto exit").unwrap();
        assert_eq!(exit.kind(), CommandType::Exit);
        assert!(exit.parameters().is_empty());

        let list = parse("cloudphoto list").unwrap();
        assert_eq!(list.kind(), CommandType::List);
        assert!(list.parameters().is_empty());
    }

    #[test]
    fn parses_list_with_album_filter() {
        let command = parse("cloudphoto list -a Holiday").unwrap();
        assert_eq!(command.kind(), CommandType::List);
        assert_eq!(command.parameter(Argument::Album), Some("Holiday"));
        assert_eq!(command.parameter(Argument::Path), None);
    }

    #[test]
    fn keeps_internal_spaces_of_the_path() {
        let command = parse("cloudphoto upload -p /home/alice/My Photos -a dogs").unwrap();
        assert_eq!(command.kind(), CommandType::Upload);
        assert_eq!(command.parameter(Argument::Path), Some("/home/alice/My Photos"));
        assert_eq!(command.parameter(Argument::Album), Some("dogs"));
    }

    #[test]
    fn path_with_repeated_spaces_round_trips_exactly() {
        let path = "/data/summer  2020/best of";
        let line = format!("cloudphoto download -p {path} -a beach");
        let command = parse(&line).unwrap();
        assert_eq!(command.kind(), CommandType::Download);
        assert_eq!(command.parameter(Argument::Path), Some(path));
    }

    #[test]
    fn surrounding_whitespace_does_not_leak_into_values() {
        let command = parse("  cloudphoto upload   -p   photos dir   -a  cats  ").unwrap();
        assert_eq!(command.parameter(Argument::Path), Some("photos dir"));
        assert_eq!(command.parameter(Argument::Album), Some("cats"));
    }
}
