use anyhow::Context as _;
use poise::{CreateReply, FrameworkError};
use std::{
    error::Error as StdError,
    num::{IntErrorKind, ParseIntError},
};
use tracing::{debug, error, info};

use crate::{
    audio::source::{MAX_VOLUME_PERCENT, MIN_VOLUME_PERCENT},
    bot::{
        music::{Reply, ReplyKind},
        Context, Data,
    },
    error::{MusicError, MusicResult},
    ui::embeds,
};

/// Sends `reply` as an embed, answering the invoking message when asked to.
pub async fn respond(ctx: Context<'_>, reply: Reply) -> MusicResult<()> {
    let message = CreateReply::default()
        .embed(embeds::membed(Some(&reply.text)))
        .reply(reply.kind == ReplyKind::Reply);

    ctx.send(message).await.context("Failed to send reply")?;
    Ok(())
}

pub async fn log_invocation(ctx: Context<'_>) {
    info!(
        "📝 Command {} used by {} in guild {:?}",
        ctx.command().name,
        ctx.author().name,
        ctx.guild_id()
    );
}

/// Framework error hook.
///
/// User-state and argument errors are answered with an embed; internal
/// errors are only logged.
pub async fn on_error(error: FrameworkError<'_, Data, MusicError>) {
    match error {
        FrameworkError::Command { error, ctx, .. } => {
            if error.is_user_facing() {
                send_error(ctx, error.to_string()).await;
            } else {
                error!("Error in command {}: {:?}", ctx.command().name, error);
            }
        }
        FrameworkError::ArgumentParse {
            error, input, ctx, ..
        } => {
            debug!(
                "Rejected arguments {:?} for {} from {}: {}",
                input,
                ctx.command().name,
                ctx.author().name,
                error
            );
            let text =
                argument_error_text(ctx.prefix(), &ctx.command().name, error.as_ref(), input.as_deref());
            send_error(ctx, text).await;
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {:?}", e);
            }
        }
    }
}

async fn send_error(ctx: Context<'_>, text: String) {
    if let Err(e) = respond(ctx, Reply::reply(text)).await {
        error!("Failed to send error reply: {:?}", e);
    }
}

/// Reply text for an argument the framework could not parse.
///
/// An integer too large for any volume is reported as out of range.
fn argument_error_text(
    prefix: &str,
    command: &str,
    error: &(dyn StdError + Send + Sync + 'static),
    input: Option<&str>,
) -> String {
    let overflowed = error
        .downcast_ref::<ParseIntError>()
        .is_some_and(|e| matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow));
    if overflowed {
        return MusicError::VolumeOutOfRange {
            min: MIN_VOLUME_PERCENT,
            max: MAX_VOLUME_PERCENT,
        }
        .to_string();
    }

    match input {
        Some(input) => format!(
            "`{input}` is not a valid argument. See `{prefix}help {command}`."
        ),
        None => format!("Missing argument. See `{prefix}help {command}`."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_error(input: &str) -> Box<dyn StdError + Send + Sync> {
        Box::new(input.parse::<i64>().unwrap_err())
    }

    #[test]
    fn oversized_volume_is_reported_as_out_of_range() {
        for input in ["99999999999999999999", "-99999999999999999999"] {
            let text = argument_error_text("!", "volume", parse_error(input).as_ref(), Some(input));
            assert_eq!(text, "Volume needs to be between 1 and 250.");
        }
    }

    #[test]
    fn non_numeric_volume_points_at_help() {
        let text = argument_error_text("!", "volume", parse_error("loud").as_ref(), Some("loud"));
        assert_eq!(text, "`loud` is not a valid argument. See `!help volume`.");
    }

    #[test]
    fn missing_arguments_point_at_help() {
        let error: Box<dyn StdError + Send + Sync> = "too few arguments".into();
        let text = argument_error_text("jb!", "play", error.as_ref(), None);
        assert_eq!(text, "Missing argument. See `jb!help play`.");
    }
}
