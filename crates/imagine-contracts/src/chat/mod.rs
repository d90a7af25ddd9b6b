pub mod command_registry;
pub mod intent_parser;

pub use command_registry::{command_help_lines, CommandSpec, COMMANDS};
pub use intent_parser::{parse_intent, Intent};
