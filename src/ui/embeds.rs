use serenity::{all::Colour, builder::CreateEmbed};

/// Accent colour shared by every reply.
pub const ACCENT: Colour = Colour::new(0x2B2D31);

/// Quickly constructs an embed with an optional description.
pub fn membed(description: Option<&str>) -> CreateEmbed {
    let embed = CreateEmbed::new().colour(ACCENT);

    match description {
        Some(text) => embed.description(text),
        None => embed,
    }
}
