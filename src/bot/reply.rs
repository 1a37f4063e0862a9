use serenity::builder::{
    CreateActionRow, CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage,
    EditInteractionResponse,
};

use crate::error::MusicError;

/// Outcome of a command, sent back as the interaction response.
#[derive(Debug, Clone)]
pub enum Reply {
    Success {
        embed: CreateEmbed,
        components: Vec<CreateActionRow>,
    },
    Failure {
        kind: MusicError,
        message: String,
    },
}

impl Reply {
    pub fn embed(embed: CreateEmbed) -> Self {
        Reply::Success {
            embed,
            components: Vec::new(),
        }
    }

    pub fn with_components(embed: CreateEmbed, components: Vec<CreateActionRow>) -> Self {
        Reply::Success { embed, components }
    }

    pub fn failure(kind: MusicError) -> Self {
        let message = kind.user_message();
        Reply::Failure { kind, message }
    }

    /// Failure with a message other than the kind's default text.
    pub fn failure_with(kind: MusicError, message: impl Into<String>) -> Self {
        Reply::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success { .. })
    }

    pub fn into_response(self) -> CreateInteractionResponse {
        CreateInteractionResponse::Message(self.into_message())
    }

    pub fn into_message(self) -> CreateInteractionResponseMessage {
        match self {
            Reply::Success { embed, components } => CreateInteractionResponseMessage::new()
                .embed(embed)
                .components(components),
            Reply::Failure { message, .. } => {
                CreateInteractionResponseMessage::new().content(message)
            }
        }
    }

    /// For replies sent after the interaction was deferred.
    pub fn into_edit(self) -> EditInteractionResponse {
        match self {
            Reply::Success { embed, components } => EditInteractionResponse::new()
                .embed(embed)
                .components(components),
            Reply::Failure { message, .. } => EditInteractionResponse::new().content(message),
        }
    }
}

impl From<Result<Reply, MusicError>> for Reply {
    fn from(result: Result<Reply, MusicError>) -> Self {
        result.unwrap_or_else(Reply::failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn failures_render_as_plain_content() {
        let message = Reply::failure(MusicError::NotInVoiceChannel).into_message();
        let value = serde_json::to_value(message).unwrap();

        assert_eq!(
            value["content"],
            "❌ You need to be in a voice channel to play music!"
        );
        assert!(value["embeds"].as_array().map_or(true, |e| e.is_empty()));
    }

    #[test]
    fn custom_failure_text_wins() {
        let reply = Reply::failure_with(MusicError::NothingPlaying, "❌ The queue is empty!");
        match reply {
            Reply::Failure { kind, message } => {
                assert_eq!(kind, MusicError::NothingPlaying);
                assert_eq!(message, "❌ The queue is empty!");
            }
            Reply::Success { .. } => panic!("expected a failure"),
        }
    }

    #[test]
    fn errors_convert_into_failures() {
        let reply: Reply = Err(MusicError::NoResultsFound("x".into())).into();
        assert!(!reply.is_success());

        let reply: Reply = Ok(Reply::embed(CreateEmbed::default().title("ok"))).into();
        assert!(reply.is_success());
    }
}
