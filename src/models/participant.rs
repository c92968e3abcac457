//! Club participant model.

use serde::{Deserialize, Serialize};

use super::{ModelError, ParticipantId};

/// A competing athlete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParticipant")]
pub struct Participant {
    /// Athlete id from the telemetry provider
    pub id: ParticipantId,

    /// Display name
    pub name: String,

    /// Profile picture URL
    pub profile_url: Option<String>,
}

#[derive(Deserialize)]
struct RawParticipant {
    id: ParticipantId,
    name: String,
    #[serde(default)]
    profile_url: Option<String>,
}

impl TryFrom<RawParticipant> for Participant {
    type Error = ModelError;

    fn try_from(raw: RawParticipant) -> Result<Self, Self::Error> {
        let participant = Participant::new(raw.id, raw.name)?;
        Ok(match raw.profile_url {
            Some(url) => participant.with_profile_url(url),
            None => participant,
        })
    }
}

impl Participant {
    pub fn new(id: ParticipantId, name: String) -> Result<Self, ModelError> {
        if id.is_empty() {
            return Err(ModelError::MissingField("participant.id"));
        }
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ModelError::MissingField("participant.name"));
        }
        Ok(Self {
            id,
            name,
            profile_url: None,
        })
    }

    /// Builder method to set the profile picture URL.
    pub fn with_profile_url(mut self, url: String) -> Self {
        self.profile_url = Some(url);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_creation_trims_name() {
        let p = Participant::new("1001".into(), "  Ada Climber ".to_string()).unwrap();
        assert_eq!(p.name, "Ada Climber");
        assert!(p.profile_url.is_none());
    }

    #[test]
    fn test_participant_rejects_blank_name() {
        assert!(Participant::new("1001".into(), "   ".to_string()).is_err());
        assert!(Participant::new("".into(), "Ada".to_string()).is_err());
    }

    #[test]
    fn test_participant_deserialization_rejects_malformed_row() {
        let row = r#"{"id":"1001","name":""}"#;
        assert!(serde_json::from_str::<Participant>(row).is_err());

        let row = r#"{"id":"1001","name":"Ada","profile_url":"https://img/1001.png"}"#;
        let p: Participant = serde_json::from_str(row).unwrap();
        assert_eq!(p.profile_url.as_deref(), Some("https://img/1001.png"));
    }
}
