//! Alexa request and response envelopes.
//!
//! Only the parts of the Alexa Skills Kit JSON the skill reads or writes are
//! modelled; unknown fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub context: Option<Context>,
    pub request: Request,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub application: Option<Application>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub permissions: Option<Permissions>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub consent_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Context {
    #[serde(rename = "System")]
    pub system: Option<System>,
    #[serde(rename = "AudioPlayer")]
    pub audio_player: Option<AudioPlayerState>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct System {
    pub application: Option<Application>,
    pub user: Option<User>,
    pub api_endpoint: Option<String>,
    pub api_access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioPlayerState {
    pub player_activity: Option<String>,
    pub token: Option<String>,
    #[serde(default)]
    pub offset_in_milliseconds: i64,
}

impl AudioPlayerState {
    pub fn is_stopped(&self) -> bool {
        self.player_activity.as_deref() == Some("STOPPED")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    LaunchRequest {},
    IntentRequest(IntentRequest),
    SessionEndedRequest(SessionEndedRequest),
    #[serde(rename = "AudioPlayer.PlaybackStarted")]
    PlaybackStarted(PlaybackEvent),
    #[serde(rename = "AudioPlayer.PlaybackFinished")]
    PlaybackFinished(PlaybackEvent),
    #[serde(rename = "AudioPlayer.PlaybackStopped")]
    PlaybackStopped(PlaybackEvent),
    #[serde(rename = "AudioPlayer.PlaybackNearlyFinished")]
    PlaybackNearlyFinished(PlaybackEvent),
    #[serde(rename = "AudioPlayer.PlaybackFailed")]
    PlaybackFailed(PlaybackEvent),
    #[serde(other)]
    Unsupported,
}

impl Request {
    /// Name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::LaunchRequest {} => "LaunchRequest",
            Request::IntentRequest(_) => "IntentRequest",
            Request::SessionEndedRequest(_) => "SessionEndedRequest",
            Request::PlaybackStarted(_) => "AudioPlayer.PlaybackStarted",
            Request::PlaybackFinished(_) => "AudioPlayer.PlaybackFinished",
            Request::PlaybackStopped(_) => "AudioPlayer.PlaybackStopped",
            Request::PlaybackNearlyFinished(_) => "AudioPlayer.PlaybackNearlyFinished",
            Request::PlaybackFailed(_) => "AudioPlayer.PlaybackFailed",
            Request::Unsupported => "Unsupported",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    pub dialog_state: Option<String>,
    pub intent: Intent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub name: String,
    pub value: Option<String>,
    pub resolutions: Option<Resolutions>,
}

impl Slot {
    /// The entity-resolved value when resolution matched, else the raw value.
    pub fn resolved_value(&self) -> Option<&str> {
        let resolved = self.resolutions.as_ref().and_then(|resolutions| {
            resolutions
                .resolutions_per_authority
                .iter()
                .filter(|authority| authority.status.code == "ER_SUCCESS_MATCH")
                .find_map(|authority| authority.values.first())
                .map(|wrapper| wrapper.value.name.as_str())
        });
        resolved
            .or(self.value.as_deref())
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolutions {
    #[serde(default)]
    pub resolutions_per_authority: Vec<Resolution>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resolution {
    pub status: ResolutionStatus,
    #[serde(default)]
    pub values: Vec<ResolvedValueWrapper>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionStatus {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedValueWrapper {
    pub value: ResolvedValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedValue {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndedRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackEvent {
    pub token: Option<String>,
    #[serde(default)]
    pub offset_in_milliseconds: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_attributes: Option<Map<String, Value>>,
    pub response: ResponseBody,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<Directive>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_end_session: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    PlainText { text: String },
    #[serde(rename = "SSML")]
    Ssml { ssml: String },
}

impl OutputSpeech {
    /// SSML when the text is already wrapped in `<speak>`, plain text otherwise.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim_start().starts_with("<speak>") {
            OutputSpeech::Ssml { ssml: text }
        } else {
            OutputSpeech::PlainText { text }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            OutputSpeech::PlainText { text } => text,
            OutputSpeech::Ssml { ssml } => ssml,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Card {
    Simple { title: String, content: String },
    Standard { title: String, text: String },
    AskForPermissionsConsent { permissions: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Directive {
    #[serde(rename = "AudioPlayer.Play", rename_all = "camelCase")]
    Play {
        play_behavior: String,
        audio_item: AudioItem,
    },
    #[serde(rename = "AudioPlayer.Stop")]
    Stop,
    #[serde(rename = "Dialog.ElicitSlot", rename_all = "camelCase")]
    ElicitSlot {
        slot_to_elicit: String,
        updated_intent: UpdatedIntent,
    },
}

impl Directive {
    /// Replace whatever is playing with `url`, starting at `offset_in_milliseconds`.
    pub fn play(token: &str, url: &str, offset_in_milliseconds: i64, title: &str, subtitle: &str) -> Self {
        Directive::Play {
            play_behavior: "REPLACE_ALL".to_string(),
            audio_item: AudioItem {
                stream: Stream {
                    token: token.to_string(),
                    url: url.to_string(),
                    offset_in_milliseconds,
                },
                metadata: AudioMetadata {
                    title: title.to_string(),
                    subtitle: subtitle.to_string(),
                },
            },
        }
    }

    /// Ask for `slot` while switching the dialog to `intent`.
    pub fn elicit_slot(intent: &str, slot: &str) -> Self {
        let mut slots = HashMap::new();
        slots.insert(
            slot.to_string(),
            UpdatedSlot {
                name: slot.to_string(),
                confirmation_status: "NONE".to_string(),
            },
        );
        Directive::ElicitSlot {
            slot_to_elicit: slot.to_string(),
            updated_intent: UpdatedIntent {
                name: intent.to_string(),
                confirmation_status: "NONE".to_string(),
                slots,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioItem {
    pub stream: Stream,
    pub metadata: AudioMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub token: String,
    pub url: String,
    pub offset_in_milliseconds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioMetadata {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedIntent {
    pub name: String,
    pub confirmation_status: String,
    pub slots: HashMap<String, UpdatedSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedSlot {
    pub name: String,
    pub confirmation_status: String,
}

/// Builds a [`ResponseEnvelope`] step by step.
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    body: ResponseBody,
    session_attributes: Option<Map<String, Value>>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speak(mut self, speech: impl Into<String>) -> Self {
        let speech = speech.into();
        if !speech.is_empty() {
            self.body.output_speech = Some(OutputSpeech::from_text(speech));
        }
        self
    }

    pub fn ask(mut self, reprompt: impl Into<String>) -> Self {
        self.body.reprompt = Some(Reprompt {
            output_speech: OutputSpeech::from_text(reprompt),
        });
        self
    }

    pub fn card(mut self, card: Card) -> Self {
        self.body.card = Some(card);
        self
    }

    pub fn standard_card(self, title: impl Into<String>, text: impl Into<String>) -> Self {
        self.card(Card::Standard {
            title: title.into(),
            text: text.into(),
        })
    }

    pub fn simple_card(self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.card(Card::Simple {
            title: title.into(),
            content: content.into(),
        })
    }

    pub fn directive(mut self, directive: Directive) -> Self {
        self.body.directives.push(directive);
        self
    }

    pub fn session_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.session_attributes
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn end_session(mut self, end: bool) -> Self {
        self.body.should_end_session = Some(end);
        self
    }

    pub fn build(self) -> ResponseEnvelope {
        ResponseEnvelope {
            version: "1.0".to_string(),
            session_attributes: self.session_attributes,
            response: self.body,
        }
    }
}

impl ResponseEnvelope {
    /// Response with nothing to say, for AudioPlayer events and no-ops.
    pub fn empty() -> Self {
        ResponseBuilder::new().build()
    }
}
