//! Read-only view over the parts of a request the handlers care about.

use shared::ApiAccess;

use crate::envelope::{AudioPlayerState, Intent, Request, RequestEnvelope, System, User};

pub const MASS_DAY_SLOT: &str = "massDay";
pub const DESIRES_REMINDER_SLOT: &str = "DESIRES_REMINDER";

pub struct SkillSession<'a> {
    envelope: &'a RequestEnvelope,
}

impl<'a> SkillSession<'a> {
    pub fn new(envelope: &'a RequestEnvelope) -> Self {
        Self { envelope }
    }

    pub fn request(&self) -> &'a Request {
        &self.envelope.request
    }

    fn system(&self) -> Option<&'a System> {
        self.envelope.context.as_ref()?.system.as_ref()
    }

    /// Caller identity. AudioPlayer requests carry no session, so the
    /// context is checked first.
    fn user(&self) -> Option<&'a User> {
        self.system()
            .and_then(|system| system.user.as_ref())
            .or_else(|| self.envelope.session.as_ref()?.user.as_ref())
    }

    pub fn user_id(&self) -> Option<&'a str> {
        self.user().map(|user| user.user_id.as_str())
    }

    pub fn application_id(&self) -> Option<&'a str> {
        self.system()
            .and_then(|system| system.application.as_ref())
            .or_else(|| self.envelope.session.as_ref()?.application.as_ref())
            .map(|application| application.application_id.as_str())
    }

    pub fn consent_token(&self) -> Option<&'a str> {
        self.user()?
            .permissions
            .as_ref()?
            .consent_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }

    /// Endpoint and token for calling Alexa service APIs on the caller's behalf.
    pub fn api_access(&self) -> Option<ApiAccess> {
        let system = self.system()?;
        Some(ApiAccess {
            endpoint: system.api_endpoint.clone()?,
            token: system.api_access_token.clone()?,
        })
    }

    pub fn audio_player(&self) -> Option<&'a AudioPlayerState> {
        self.envelope.context.as_ref()?.audio_player.as_ref()
    }

    pub fn intent(&self) -> Option<&'a Intent> {
        match &self.envelope.request {
            Request::IntentRequest(request) => Some(&request.intent),
            _ => None,
        }
    }

    pub fn slot(&self, name: &str) -> Option<&'a str> {
        self.intent()?.slots.get(name)?.resolved_value()
    }

    /// The day the listener asked about, if they named one.
    pub fn mass_day(&self) -> Option<&'a str> {
        self.slot(MASS_DAY_SLOT)
    }

    /// Answer to "would you like a reminder", when this turn follows that question.
    pub fn desires_reminder(&self) -> Option<&'a str> {
        self.slot(DESIRES_REMINDER_SLOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> RequestEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_reads_identity_consent_and_slots() {
        let envelope = envelope(json!({
            "session": {"application": {"applicationId": "skill"}, "user": {"userId": "session-user"}},
            "context": {"System": {
                "user": {"userId": "u1", "permissions": {"consentToken": "consent"}},
                "apiEndpoint": "https://api.amazonalexa.com",
                "apiAccessToken": "access"
            }},
            "request": {"type": "IntentRequest", "intent": {"name": "NotifyNextMassIntent", "slots": {
                "DESIRES_REMINDER": {"name": "DESIRES_REMINDER", "value": "no thanks"}
            }}}
        }));
        let session = SkillSession::new(&envelope);

        assert_eq!(session.user_id(), Some("u1"));
        assert_eq!(session.application_id(), Some("skill"));
        assert_eq!(session.consent_token(), Some("consent"));
        assert_eq!(session.desires_reminder(), Some("no thanks"));
        assert_eq!(session.mass_day(), None);
        assert_eq!(
            session.api_access(),
            Some(ApiAccess {
                endpoint: "https://api.amazonalexa.com".to_string(),
                token: "access".to_string()
            })
        );
    }

    #[test]
    fn test_audio_request_without_session() {
        let envelope = envelope(json!({
            "context": {
                "System": {"user": {"userId": "u2"}},
                "AudioPlayer": {"playerActivity": "STOPPED", "token": "t", "offsetInMilliseconds": 700}
            },
            "request": {"type": "AudioPlayer.PlaybackStopped", "offsetInMilliseconds": 700}
        }));
        let session = SkillSession::new(&envelope);

        assert_eq!(session.user_id(), Some("u2"));
        assert!(session.audio_player().unwrap().is_stopped());
        assert!(session.consent_token().is_none());
        assert!(session.api_access().is_none());
        assert!(session.intent().is_none());
    }
}
