//! Template-based narration. Output depends only on the arguments, so the same
//! recovery always reads the same way.

use super::clock;
use super::domain::{RecoveryCategory, RecoveryOption, ReplanTrigger};
use super::scoring::Deadline;

/// Text carried by unresolved results in place of a narrative.
pub const UNRESOLVED_MESSAGE: &str = "We could not find a safe alternative that keeps every \
booking and gets you back in time. The current plan stays as it is; consider shortening \
the day or heading back early.";

/// Experience-oriented lead sentence for a trigger and category.
pub fn template(trigger: ReplanTrigger, category: RecoveryCategory) -> &'static str {
    use RecoveryCategory::*;

    match (trigger, category) {
        (ReplanTrigger::Rain, Indoor) => {
            "The rain turns into an excuse to slow down indoors, somewhere dry with plenty to look at."
        }
        (ReplanTrigger::Rain, Food) => {
            "A chance to linger over coffee while the rain passes, watching the street shine outside."
        }
        (ReplanTrigger::Rain, Culture) => {
            "Rainy afternoons suit quiet halls and old collections; the crowds thin out and the details come forward."
        }
        (ReplanTrigger::Rain, Rest) => {
            "Let the rain set the pace: a warm corner and an unhurried break before the evening."
        }
        (ReplanTrigger::Rain, Outdoor) => {
            "If you do not mind getting wet, the streets take on a different mood in the rain."
        }
        (ReplanTrigger::Fatigue, Rest) => {
            "Time to give your legs a break; a proper rest now keeps the evening enjoyable."
        }
        (ReplanTrigger::Fatigue, Food) => {
            "Sit down for something good to eat and let the energy come back at its own pace."
        }
        (ReplanTrigger::Fatigue, Indoor) => {
            "An easy indoor stop with places to sit keeps the day going without wearing you out."
        }
        (ReplanTrigger::Fatigue, Culture) => {
            "A short, calm visit keeps the day interesting without asking much of tired feet."
        }
        (ReplanTrigger::Fatigue, Outdoor) => {
            "A gentle stroll in the open air, taken slowly, with the option to stop whenever you like."
        }
        (ReplanTrigger::Delay, Food) => {
            "Running late becomes a good reason for a relaxed meal close by before picking the plan back up."
        }
        (ReplanTrigger::Delay, Indoor) => {
            "A nearby indoor stop fits the time you have left without any rushing."
        }
        (ReplanTrigger::Delay, Culture) => {
            "A compact visit close at hand makes the most of the time that is left."
        }
        (ReplanTrigger::Delay, Rest) => {
            "Instead of racing to catch up, take a breather and rejoin the plan refreshed."
        }
        (ReplanTrigger::Delay, Outdoor) => {
            "A short walk around the neighbourhood uses the gap without committing to much."
        }
    }
}

/// Narrative for one option: the template lead, the option's own explanation when it
/// adds something, and its duration when known.
pub fn explain(trigger: ReplanTrigger, category: RecoveryCategory, option: &RecoveryOption) -> String {
    let lead = template(trigger, category);
    let mut text = lead.to_string();

    let own = option.explanation.trim();
    if !own.is_empty() && own != lead {
        text.push(' ');
        text.push_str(own);
        if !own.ends_with(['.', '!', '?']) {
            text.push('.');
        }
    }

    if let Some(minutes) = option.duration_minutes() {
        text.push_str(&format!(" Plan on about {}.", clock::format_span(minutes)));
    }

    text
}

/// Timing note appended to the primary narrative.
pub fn timing_note(end_minutes: u32, deadline: Option<&Deadline>) -> String {
    let back = clock::format_minutes(end_minutes);
    match deadline {
        Some(deadline) if deadline.at >= end_minutes => format!(
            "You will be back on track by {back}, with {} to spare before {}.",
            clock::format_span(deadline.at - end_minutes),
            deadline.label
        ),
        _ => format!("You will be back on track by {back}."),
    }
}
