use chrono::DateTime;
use chrono_tz::Tz;
use shared::days::{self, DayError, ResolvedDay};
use shared::{format, schedule};
use tracing::{info, warn};

use super::respond;
use crate::envelope::{Directive, ResponseEnvelope};
use crate::session::{SkillSession, DESIRES_REMINDER_SLOT};
use crate::AppState;

const REMINDER_INTENT: &str = "NotifyNextMassIntent";

/// MassTimeIntent: "when is mass on Sunday".
pub async fn mass_time(state: &AppState, session: &SkillSession<'_>, now: DateTime<Tz>) -> ResponseEnvelope {
    let today = now.date_naive();

    let resolved = match days::resolve(session.mass_day(), today) {
        Ok(resolved) => resolved,
        Err(DayError::Unrecognized(spoken)) => {
            warn!(spoken = %spoken, "Unrecognized day");
            return respond(format::unrecognized_day(&spoken)).end_session(false).build();
        }
    };

    let schedule = schedule::mass_times(&state.data, &resolved, today).await;
    info!(
        day = %resolved.display_name,
        day_id = resolved.day.id(),
        masses = schedule.entries().len(),
        "Mass times lookup"
    );

    respond(format::mass_times(&resolved.label(), &schedule))
        .end_session(true)
        .build()
}

/// NextMassIntent: answers with today's next mass and offers a reminder for
/// it, or reads tomorrow's schedule when today's masses are over.
pub async fn next_mass(state: &AppState, now: DateTime<Tz>) -> ResponseEnvelope {
    let today = now.date_naive();
    let masses = schedule::masses_on(&state.data, today).await;

    if let Some(entry) = schedule::next_after(now.time(), &masses) {
        info!(next = %entry.time, "Found next mass, offering reminder");
        let mut response = format::next_mass(entry);
        response.speech = format!(
            "{} Would you like me to remind you {} minutes prior to mass?",
            response.speech,
            state.config.reminder_lead.num_minutes()
        );
        response.reprompt = Some("Would you like a reminder before mass?".to_string());
        return respond(response)
            .directive(Directive::elicit_slot(REMINDER_INTENT, DESIRES_REMINDER_SLOT))
            .end_session(false)
            .build();
    }

    info!("No more masses today");
    let tomorrow = ResolvedDay::tomorrow(today);
    let schedule = schedule::mass_times(&state.data, &tomorrow, today).await;
    respond(format::no_more_masses(format::mass_times(&tomorrow.label(), &schedule)))
        .end_session(true)
        .build()
}
