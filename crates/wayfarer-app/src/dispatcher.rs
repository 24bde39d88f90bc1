//! Command dispatch.
//!
//! Resolves a parsed [`Command`] to its handler and runs it. Every handler
//! has the same shape, so the table is a plain `match` over [`CommandName`].
//! Nothing a handler does can escape this boundary: usage errors become
//! warnings and panics become a command-failure line.

use std::panic::{self, AssertUnwindSafe};

use wayfarer_agent::{AgentConnector, panic_message};

use crate::{
    Command, CommandId, CommandName, Controller, ControllerAction, LogLine, UsageError,
    parse_flag, parse_join, parse_vec3,
};

type Handler<C> = fn(&mut Controller<C>, &[String]) -> Result<Vec<ControllerAction>, UsageError>;

/// Parse one input line and run it against the controller.
///
/// Blank lines produce no actions. Unknown commands produce exactly one
/// warning.
pub fn dispatch<C: AgentConnector>(
    controller: &mut Controller<C>,
    line: &str,
) -> Vec<ControllerAction> {
    let Some(Command { name, args }) = Command::parse(line) else {
        return vec![];
    };

    let name = match name {
        CommandId::Known(name) => name,
        CommandId::Unknown(typed) => {
            tracing::debug!(command = %typed, "unknown command");
            let line = format!("Unknown command '{typed}'. Type 'help' for a list of commands");
            return vec![LogLine::warning(line).into()];
        },
    };

    tracing::debug!(command = %name, ?args, "dispatching command");
    let handler = handler_for::<C>(name);
    match panic::catch_unwind(AssertUnwindSafe(|| handler(controller, &args))) {
        Ok(Ok(actions)) => actions,
        Ok(Err(e)) => vec![LogLine::warning(format!("{e}. Usage: {}", name.usage())).into()],
        Err(payload) => {
            let reason = panic_message(&*payload);
            tracing::error!(command = %name, %reason, "command handler panicked");
            vec![LogLine::error(format!("Command '{name}' failed: {reason}")).into()]
        },
    }
}

fn handler_for<C: AgentConnector>(name: CommandName) -> Handler<C> {
    match name {
        CommandName::Join => join,
        CommandName::Leave => leave,
        CommandName::Say => say,
        CommandName::Query => query,
        CommandName::LookAt => look_at,
        CommandName::Goto => goto,
        CommandName::AutoReconnect => auto_reconnect,
        CommandName::Help => help,
        CommandName::Exit => exit,
        CommandName::Clear => clear,
    }
}

fn join<C: AgentConnector>(
    controller: &mut Controller<C>,
    args: &[String],
) -> Result<Vec<ControllerAction>, UsageError> {
    let target = parse_join(args, controller.config().default_port)?;
    Ok(controller.connect(target))
}

fn leave<C: AgentConnector>(
    controller: &mut Controller<C>,
    _args: &[String],
) -> Result<Vec<ControllerAction>, UsageError> {
    Ok(controller.disconnect())
}

fn say<C: AgentConnector>(
    controller: &mut Controller<C>,
    args: &[String],
) -> Result<Vec<ControllerAction>, UsageError> {
    if args.is_empty() {
        return Err(UsageError::Missing("message"));
    }
    Ok(controller.say(&args.join(" ")))
}

fn query<C: AgentConnector>(
    controller: &mut Controller<C>,
    args: &[String],
) -> Result<Vec<ControllerAction>, UsageError> {
    let kind = args.first().ok_or(UsageError::Missing("query kind"))?;
    Ok(controller.query(kind))
}

fn look_at<C: AgentConnector>(
    controller: &mut Controller<C>,
    args: &[String],
) -> Result<Vec<ControllerAction>, UsageError> {
    let target = parse_vec3(args)?;
    Ok(controller.look_at(target))
}

fn goto<C: AgentConnector>(
    controller: &mut Controller<C>,
    args: &[String],
) -> Result<Vec<ControllerAction>, UsageError> {
    let target = parse_vec3(args)?;
    Ok(controller.goto(target))
}

fn auto_reconnect<C: AgentConnector>(
    controller: &mut Controller<C>,
    args: &[String],
) -> Result<Vec<ControllerAction>, UsageError> {
    let enabled = parse_flag(args)?;
    Ok(controller.set_auto_reconnect(enabled))
}

fn help<C: AgentConnector>(
    _controller: &mut Controller<C>,
    _args: &[String],
) -> Result<Vec<ControllerAction>, UsageError> {
    Ok(help_table().into_iter().map(ControllerAction::Log).collect())
}

fn exit<C: AgentConnector>(
    controller: &mut Controller<C>,
    _args: &[String],
) -> Result<Vec<ControllerAction>, UsageError> {
    let mut actions = controller.shutdown();
    actions.push(ControllerAction::Exit);
    Ok(actions)
}

fn clear<C: AgentConnector>(
    _controller: &mut Controller<C>,
    _args: &[String],
) -> Result<Vec<ControllerAction>, UsageError> {
    Ok(vec![ControllerAction::ClearScreen])
}

/// The command table printed by `help`.
pub fn help_table() -> Vec<LogLine> {
    let width = CommandName::ALL.iter().map(|name| name.usage().len()).max().unwrap_or(0) + 2;
    std::iter::once(LogLine::info("Commands:"))
        .chain(CommandName::ALL.iter().map(|name| {
            LogLine::info(format!("  {:<width$}{}", name.usage(), name.description()))
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_every_command() {
        let text =
            help_table().iter().map(|line| line.message.as_str()).collect::<Vec<_>>().join("\n");

        insta::assert_snapshot!(text, @r"
        Commands:
          join <host> [port|version] [version]  Connect to a server
          leave                                 Disconnect from the server
          say <message...>                      Send a chat message
          query <position|players>              Report position or online players
          lookat <x> <y> <z>                    Turn to face a point
          goto <x> <y> <z>                      Walk to a block
          autoreconnect <true|false>            Reconnect automatically after a disconnect
          help                                  Show this table
          exit                                  Disconnect and quit
          clear                                 Clear the console
        ");
    }

    #[test]
    fn help_lines_are_info() {
        assert!(help_table().iter().all(|line| line.severity == crate::Severity::Info));
    }
}
