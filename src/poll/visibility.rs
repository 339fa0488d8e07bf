use chrono::{DateTime, Duration, Utc};

use crate::model::Question;

/// A question needs at least this many choices to be a proper poll.
pub const MIN_CHOICES: u64 = 2;

/// Whether voters may see the question at `now`.
pub fn is_published(question: &Question, now: DateTime<Utc>) -> bool {
    question.pub_date <= now
}

/// Whether the question has enough choices to be worth voting on.
pub fn is_proper_poll(question: &Question) -> bool {
    question.choice_count >= MIN_CHOICES
}

pub fn is_votable(question: &Question, now: DateTime<Utc>) -> bool {
    is_published(question, now) && is_proper_poll(question)
}

/// Published within the day leading up to `now`.
pub fn was_published_recently(question: &Question, now: DateTime<Utc>) -> bool {
    now - Duration::days(1) <= question.pub_date && question.pub_date <= now
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::QuestionId;

    fn question(now: DateTime<Utc>, offset: Duration, choice_count: u64) -> Question {
        Question {
            id: QuestionId::new(1),
            text: "Is this a poll?".to_string(),
            pub_date: now + offset,
            choice_count,
        }
    }

    #[test]
    fn published_boundary_is_inclusive() {
        let now = Utc::now();
        assert!(is_published(&question(now, Duration::zero(), 2), now));
        assert!(is_published(&question(now, -Duration::days(30), 2), now));
        assert!(!is_published(&question(now, Duration::seconds(1), 2), now));
    }

    #[test]
    fn proper_poll_needs_two_choices() {
        let now = Utc::now();
        assert!(!is_proper_poll(&question(now, Duration::zero(), 0)));
        assert!(!is_proper_poll(&question(now, Duration::zero(), 1)));
        assert!(is_proper_poll(&question(now, Duration::zero(), 2)));
        assert!(is_proper_poll(&question(now, Duration::zero(), 3)));
    }

    #[test]
    fn votable_needs_both() {
        let now = Utc::now();
        assert!(is_votable(&question(now, -Duration::days(1), 2), now));
        assert!(!is_votable(&question(now, Duration::days(30), 2), now));
        assert!(!is_votable(&question(now, -Duration::days(1), 1), now));
    }

    #[test]
    fn future_question_was_not_published_recently() {
        let now = Utc::now();
        assert!(!was_published_recently(&question(now, Duration::days(30), 2), now));
    }

    #[test]
    fn old_question_was_not_published_recently() {
        let now = Utc::now();
        let offset = -(Duration::days(1) + Duration::seconds(1));
        assert!(!was_published_recently(&question(now, offset, 2), now));
    }

    #[test]
    fn question_from_last_day_was_published_recently() {
        let now = Utc::now();
        let offset = -(Duration::hours(23) + Duration::minutes(59) + Duration::seconds(59));
        assert!(was_published_recently(&question(now, offset, 2), now));
    }
}
