/// How a slash command consumes the text after its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgMode {
    /// No argument; trailing text is ignored.
    None,
    /// The remainder is a single raw value.
    Raw,
    /// The remainder is tokenized with shell quoting rules.
    Tokens,
    /// The remainder must be `on` or `off`.
    Toggle,
}

#[derive(Clone, Copy, Debug)]
pub struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
    pub arg_mode: ArgMode,
    pub summary: &'static str,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "help",
        action: "help",
        arg_mode: ArgMode::None,
        summary: "/help - list commands",
    },
    CommandSpec {
        command: "status",
        action: "status",
        arg_mode: ArgMode::None,
        summary: "/status - show draft parameters and feed state",
    },
    CommandSpec {
        command: "generate",
        action: "generate",
        arg_mode: ArgMode::None,
        summary: "/generate - generate with the current draft",
    },
    CommandSpec {
        command: "model",
        action: "set_model",
        arg_mode: ArgMode::Raw,
        summary: "/model <id> - select the generation model",
    },
    CommandSpec {
        command: "models",
        action: "list_models",
        arg_mode: ArgMode::None,
        summary: "/models - list available models",
    },
    CommandSpec {
        command: "seed",
        action: "set_seed",
        arg_mode: ArgMode::Raw,
        summary: "/seed <n> - set the seed",
    },
    CommandSpec {
        command: "random",
        action: "randomize_seed",
        arg_mode: ArgMode::None,
        summary: "/random - draw a fresh random seed",
    },
    CommandSpec {
        command: "lock",
        action: "toggle_seed_lock",
        arg_mode: ArgMode::None,
        summary: "/lock - toggle the seed lock",
    },
    CommandSpec {
        command: "ratio",
        action: "set_ratio",
        arg_mode: ArgMode::Raw,
        summary: "/ratio <id> - select an aspect ratio preset",
    },
    CommandSpec {
        command: "ratios",
        action: "list_ratios",
        arg_mode: ArgMode::None,
        summary: "/ratios - list aspect ratio presets",
    },
    CommandSpec {
        command: "style",
        action: "set_style",
        arg_mode: ArgMode::Raw,
        summary: "/style <id|off> - select a style preset",
    },
    CommandSpec {
        command: "styles",
        action: "list_styles",
        arg_mode: ArgMode::None,
        summary: "/styles - list style presets",
    },
    CommandSpec {
        command: "size",
        action: "set_size",
        arg_mode: ArgMode::Raw,
        summary: "/size <WxH> - set explicit dimensions",
    },
    CommandSpec {
        command: "variations",
        action: "set_variations",
        arg_mode: ArgMode::Raw,
        summary: "/variations <n> - generate 1..4 seed variations",
    },
    CommandSpec {
        command: "ab",
        action: "set_compare_model",
        arg_mode: ArgMode::Raw,
        summary: "/ab <model|off> - A/B compare against a second model",
    },
    CommandSpec {
        command: "nologo",
        action: "set_toggle",
        arg_mode: ArgMode::Toggle,
        summary: "/nologo on|off - toggle the watermark opt-out",
    },
    CommandSpec {
        command: "enhance",
        action: "set_toggle",
        arg_mode: ArgMode::Toggle,
        summary: "/enhance on|off - toggle prompt enhancement",
    },
    CommandSpec {
        command: "safe",
        action: "set_toggle",
        arg_mode: ArgMode::Toggle,
        summary: "/safe on|off - toggle the safety filter",
    },
    CommandSpec {
        command: "steps",
        action: "set_steps",
        arg_mode: ArgMode::Raw,
        summary: "/steps <n|off> - set or clear sampling steps",
    },
    CommandSpec {
        command: "strength",
        action: "set_strength",
        arg_mode: ArgMode::Raw,
        summary: "/strength <x|off> - set or clear denoise strength",
    },
    CommandSpec {
        command: "download",
        action: "download",
        arg_mode: ArgMode::Tokens,
        summary: "/download [label] [dir] - save a variant to disk",
    },
    CommandSpec {
        command: "copy",
        action: "copy_link",
        arg_mode: ArgMode::Tokens,
        summary: "/copy [label] - copy a variant URL to the clipboard",
    },
    CommandSpec {
        command: "share",
        action: "share",
        arg_mode: ArgMode::Tokens,
        summary: "/share [label] - share a variant link",
    },
    CommandSpec {
        command: "history",
        action: "list_history",
        arg_mode: ArgMode::None,
        summary: "/history - list past generations",
    },
    CommandSpec {
        command: "remix",
        action: "remix",
        arg_mode: ArgMode::Raw,
        summary: "/remix <n> - load a history entry back into the draft",
    },
    CommandSpec {
        command: "clear-history",
        action: "clear_history",
        arg_mode: ArgMode::None,
        summary: "/clear-history - forget all history",
    },
    CommandSpec {
        command: "use",
        action: "use_prompt",
        arg_mode: ArgMode::Raw,
        summary: "/use <n> - take the prompt of a visible feed item",
    },
    CommandSpec {
        command: "template",
        action: "apply_template",
        arg_mode: ArgMode::Tokens,
        summary: "/template <id> field=value ... [append] - fill a prompt template",
    },
    CommandSpec {
        command: "templates",
        action: "list_templates",
        arg_mode: ArgMode::None,
        summary: "/templates - list prompt templates",
    },
    CommandSpec {
        command: "feed",
        action: "feed",
        arg_mode: ArgMode::Raw,
        summary: "/feed [on|off] - show, resume, or pause the live feed",
    },
    CommandSpec {
        command: "older",
        action: "page_older",
        arg_mode: ArgMode::None,
        summary: "/older - page the feed toward older items",
    },
    CommandSpec {
        command: "newer",
        action: "page_newer",
        arg_mode: ArgMode::None,
        summary: "/newer - page the feed toward newer items",
    },
    CommandSpec {
        command: "speed",
        action: "set_speed",
        arg_mode: ArgMode::Raw,
        summary: "/speed slow|normal - set the feed drain rate",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
        arg_mode: ArgMode::None,
        summary: "/quit - exit the studio",
    },
];

pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.command == name)
}

pub fn command_help_lines() -> Vec<&'static str> {
    COMMANDS.iter().map(|spec| spec.summary).collect()
}
