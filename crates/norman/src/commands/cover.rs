//! Cover movement commands.

use norman_core::{CommandResult, CoverCommand, Hub, HubConfig, PeripheralId};

use crate::cli::{CoverAction, CoverArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

impl From<CoverAction> for CoverCommand {
    fn from(action: CoverAction) -> Self {
        match action {
            CoverAction::Open => Self::Open,
            CoverAction::Close => Self::Close,
            CoverAction::Stop => Self::Stop,
            CoverAction::Position { value } => Self::SetPosition(value),
            CoverAction::Tilt { value } => Self::SetTilt(value),
            CoverAction::OpenTilt => Self::OpenTilt,
            CoverAction::CloseTilt => Self::CloseTilt,
        }
    }
}

fn summary(id: PeripheralId, command: CoverCommand, result: &CommandResult) -> String {
    match result {
        CommandResult::Sent { target } => format!(
            "{}: {} (bottom {}, middle {})",
            id,
            command.action(),
            target.bottom,
            target.middle
        ),
        CommandResult::Skipped => format!("{id}: position unknown, nothing to stop"),
    }
}

pub async fn handle(config: HubConfig, args: CoverArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let id = PeripheralId(args.id);
    let command = CoverCommand::from(args.action);

    let result =
        Hub::oneshot(config, |hub| async move { hub.execute(id, command).await }).await?;

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &result,
        |r| match r {
            CommandResult::Sent { .. } => output::success(&summary(id, command, r), color),
            CommandResult::Skipped => summary(id, command, r),
        },
        |r| match r {
            CommandResult::Sent { target } => format!("{} {}", target.bottom, target.middle),
            CommandResult::Skipped => "skipped".into(),
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use norman_core::RailTarget;

    #[test]
    fn actions_map_to_commands() {
        assert_eq!(CoverCommand::from(CoverAction::Open), CoverCommand::Open);
        assert_eq!(
            CoverCommand::from(CoverAction::Tilt { value: 30 }),
            CoverCommand::SetTilt(30)
        );
        assert_eq!(
            CoverCommand::from(CoverAction::Position { value: 70 }),
            CoverCommand::SetPosition(70)
        );
    }

    #[test]
    fn summary_names_both_rails() {
        let text = summary(
            PeripheralId(5),
            CoverCommand::CloseTilt,
            &CommandResult::Sent {
                target: RailTarget {
                    bottom: 40,
                    middle: 0,
                },
            },
        );
        assert_eq!(text, "5: close tilt (bottom 40, middle 0)");
    }
}
