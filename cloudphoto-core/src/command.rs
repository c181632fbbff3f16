use std::collections::HashMap;

use crate::args::{Argument, CommandType};

/// One parsed input line: a verb plus the values of its recognized flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    kind: CommandType,
    parameters: HashMap<Argument, String>,
}

impl Command {
    pub fn new(kind: CommandType) -> Self {
        Self {
            kind,
            parameters: HashMap::new(),
        }
    }

    /// Register a flag/value pair. Unrecognized flags are dropped.
    pub fn set_parameter(&mut self, flag: &str, value: impl Into<String>) {
        match Argument::lookup(flag) {
            Argument::Illegal => {
                tracing::debug!("Ignoring unrecognized flag: {}", flag);
            }
            argument => {
                self.parameters.insert(argument, value.into());
            }
        }
    }

    pub fn kind(&self) -> CommandType {
        self.kind
    }

    pub fn parameter(&self, argument: Argument) -> Option<&str> {
        self.parameters.get(&argument).map(String::as_str)
    }

    pub fn parameters(&self) -> &HashMap<Argument, String> {
        &self.parameters
    }
}
