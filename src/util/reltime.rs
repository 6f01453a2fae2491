//! Human labels for "how long ago" and "how long until". The app ships in
//! French, so the labels are French.

use chrono::{DateTime, Datelike, Utc};

const MONTHS_SHORT: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin",
    "juil.", "août", "sept.", "oct.", "nov.", "déc.",
];

/// Label for a past timestamp relative to `now`.
///
/// Whole days between the two decide the tier: same day gets minutes or
/// hours, one day is "Hier", under a week is "Il y a N jours", anything older
/// is a short calendar date. Timestamps in the future read as "À l'instant".
pub fn relative_time_label(timestamp: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(*timestamp);
    if diff.num_seconds() < 0 {
        return String::from("À l'instant");
    }
    let days = diff.num_days();
    match days {
        0 => {
            let minutes = diff.num_minutes();
            if minutes < 1 {
                String::from("À l'instant")
            } else if minutes < 60 {
                format!("Il y a {} min", minutes)
            } else {
                format!("Il y a {}h", diff.num_hours())
            }
        }
        1 => String::from("Hier"),
        2..=6 => format!("Il y a {} jours", days),
        _ => short_date(timestamp),
    }
}

/// Label for how long an invitation has left before it expires
pub fn expiry_label(expires_at: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    if now > expires_at {
        return String::from("Expirée");
    }
    let left = expires_at.signed_duration_since(*now);
    let days = left.num_days();
    if days >= 2 {
        format!("Expire dans {} jours", days)
    } else if days == 1 {
        String::from("Expire dans 1 jour")
    } else if left.num_hours() >= 1 {
        format!("Expire dans {}h", left.num_hours())
    } else {
        String::from("Expire bientôt")
    }
}

/// "3 janv.", "14 août"
pub fn short_date(dt: &DateTime<Utc>) -> String {
    format!("{} {}", dt.day(), MONTHS_SHORT[dt.month0() as usize])
}
