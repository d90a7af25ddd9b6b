use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{find_command, ArgMode};

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub prompt: Option<String>,
    pub settings_update: BTreeMap<String, Value>,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            prompt: None,
            settings_update: BTreeMap::new(),
            command_args: BTreeMap::new(),
        }
    }
}

fn raw_arg_key(action: &str) -> &'static str {
    match action {
        "set_model" | "set_compare_model" => "model",
        "set_seed" => "seed",
        "set_ratio" => "ratio",
        "set_style" => "style",
        "set_size" => "size",
        "set_variations" => "count",
        "set_steps" => "steps",
        "set_strength" => "strength",
        "remix" | "use_prompt" => "index",
        _ => "value",
    }
}

fn parse_tokens(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_on_off(arg: &str) -> Option<bool> {
    match arg.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn template_intent(raw: &str, arg: &str) -> Intent {
    let tokens = parse_tokens(arg);
    let mut intent = Intent::new("apply_template", raw);
    let Some(id) = tokens.first() else {
        return intent;
    };
    intent
        .command_args
        .insert("id".to_string(), Value::String(id.clone()));

    let mut values = serde_json::Map::new();
    let mut mode = "replace";
    for token in &tokens[1..] {
        if let Some((field, value)) = token.split_once('=') {
            values.insert(field.trim().to_string(), Value::String(value.to_string()));
            continue;
        }
        match token.to_ascii_lowercase().as_str() {
            "append" => mode = "append",
            "replace" => mode = "replace",
            _ => {}
        }
    }
    intent
        .command_args
        .insert("values".to_string(), Value::Object(values));
    intent
        .command_args
        .insert("mode".to_string(), Value::String(mode.to_string()));
    intent
}

fn transfer_intent(action: &str, raw: &str, arg: &str) -> Intent {
    let tokens = parse_tokens(arg);
    let mut intent = Intent::new(action, raw);
    if let Some(label) = tokens.first() {
        intent
            .command_args
            .insert("label".to_string(), Value::String(label.clone()));
    }
    if action == "download" {
        if let Some(dir) = tokens.get(1) {
            intent
                .command_args
                .insert("dir".to_string(), Value::String(dir.clone()));
        }
    }
    intent
}

/// Parses one studio input line. Slash commands resolve through the
/// command registry; bare text becomes a generate intent carrying the text
/// as the prompt.
pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let remainder = &slash_tail[command_len..];
            let arg = remainder.trim();

            let Some(spec) = find_command(&command) else {
                let mut intent = Intent::new("unknown", text);
                intent
                    .command_args
                    .insert("command".to_string(), Value::String(command));
                intent
                    .command_args
                    .insert("arg".to_string(), Value::String(arg.to_string()));
                return intent;
            };

            return match spec.arg_mode {
                ArgMode::None => Intent::new(spec.action, text),
                ArgMode::Toggle => {
                    let mut intent = Intent::new(spec.action, text);
                    intent
                        .command_args
                        .insert("name".to_string(), Value::String(spec.command.to_string()));
                    if let Some(state) = parse_on_off(arg) {
                        intent
                            .settings_update
                            .insert(spec.command.to_string(), Value::Bool(state));
                    }
                    intent
                }
                ArgMode::Tokens => match spec.action {
                    "apply_template" => template_intent(text, arg),
                    _ => transfer_intent(spec.action, text, arg),
                },
                ArgMode::Raw => match spec.action {
                    "feed" => {
                        if arg.is_empty() {
                            Intent::new("feed_status", text)
                        } else {
                            let mut intent = Intent::new("set_feed", text);
                            if let Some(state) = parse_on_off(arg) {
                                intent
                                    .settings_update
                                    .insert("feed_enabled".to_string(), Value::Bool(state));
                            }
                            intent
                        }
                    }
                    "set_speed" => {
                        let mut intent = Intent::new(spec.action, text);
                        let speed = arg.to_ascii_lowercase();
                        if speed == "slow" || speed == "normal" {
                            intent
                                .settings_update
                                .insert("feed_speed".to_string(), Value::String(speed));
                        }
                        intent
                    }
                    _ => {
                        let mut intent = Intent::new(spec.action, text);
                        intent.command_args.insert(
                            raw_arg_key(spec.action).to_string(),
                            Value::String(arg.to_string()),
                        );
                        intent
                    }
                },
            };
        }
    }

    let mut intent = Intent::new("generate", text);
    intent.prompt = Some(raw_trimmed.to_string());
    intent
}
