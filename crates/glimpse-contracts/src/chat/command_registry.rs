#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "hint",
        action: "hint",
    },
    CommandSpec {
        command: "status",
        action: "status",
    },
    CommandSpec {
        command: "reset",
        action: "reset",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
];

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "new",
    action: "new_game",
}];

pub const CHAT_HELP_COMMANDS: &[&str] = &["/help", "/hint", "/status", "/new", "/reset", "/quit"];
