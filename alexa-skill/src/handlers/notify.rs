use chrono::DateTime;
use chrono_tz::Tz;
use shared::reminder::{self, ReminderDecision, ReminderRequest, REMINDER_PERMISSION};
use shared::{schedule, Error, Result};
use tracing::info;

use crate::envelope::{Card, ResponseBuilder, ResponseEnvelope};
use crate::session::SkillSession;
use crate::AppState;

/// NotifyNextMassIntent: the answer to the reminder offer, or a direct
/// "remind me to go to mass".
pub async fn notify_next_mass(
    state: &AppState,
    session: &SkillSession<'_>,
    now: DateTime<Tz>,
) -> Result<ResponseEnvelope> {
    let masses = schedule::masses_on(&state.data, now.date_naive()).await;
    let next = schedule::next_after(now.time(), &masses).map(|entry| entry.time);

    let decision = reminder::decide(
        session.desires_reminder(),
        session.consent_token().is_some(),
        now,
        next,
        state.config.reminder_lead,
    );
    info!(decision = ?decision, "Reminder decision");

    let response = reminder::response(&decision, &state.config.parish_name);
    let builder = ResponseBuilder::new().speak(response.speech);

    let builder = match decision {
        ReminderDecision::PermissionRequired => builder.card(Card::AskForPermissionsConsent {
            permissions: vec![REMINDER_PERMISSION.to_string()],
        }),
        ReminderDecision::Schedule { remind_at, .. } => {
            let access = session
                .api_access()
                .ok_or_else(|| Error::Validation("Request carries no API access token".to_string()))?;
            let request = ReminderRequest::at(remind_at, now, &state.config.reminder_locale);
            state.reminders.create(&access, &request).await?;
            builder.simple_card(response.title, response.text)
        }
        _ => builder.simple_card(response.title, response.text),
    };

    Ok(builder.end_session(true).build())
}
