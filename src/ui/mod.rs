//! Discord presentation: embeds and link buttons.

pub mod buttons;
pub mod embeds;
