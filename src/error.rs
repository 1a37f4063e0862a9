use thiserror::Error;

/// Failures a music command can report back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MusicError {
    #[error("requester is not connected to a voice channel")]
    NotInVoiceChannel,

    #[error("no results found for `{0}`")]
    NoResultsFound(String),

    #[error("nothing is currently playing")]
    NothingPlaying,

    #[error("playback failed: {0}")]
    PlaybackFailure(String),

    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
}

impl MusicError {
    /// Text shown in the interaction reply. Internal details of collaborator
    /// faults stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            MusicError::NotInVoiceChannel => {
                "❌ You need to be in a voice channel to play music!".to_string()
            }
            MusicError::NoResultsFound(_) => "❌ No results found for your search!".to_string(),
            MusicError::NothingPlaying => "❌ No song is currently playing!".to_string(),
            MusicError::PlaybackFailure(_) => {
                "❌ An error occurred while trying to play the song.".to_string()
            }
            MusicError::CollaboratorUnavailable(_) => {
                "❌ That information is not available right now, try again later.".to_string()
            }
        }
    }
}
