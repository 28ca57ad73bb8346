//! Preference-based event ranking.
//!
//! A pure, deterministic reordering of an event list against a viewer's
//! interests and followed organizers. Following an event's organizer
//! outweighs any realistic tag overlap; ties fall back to the chronological
//! order anonymous viewers see.

use std::collections::BTreeSet;

use super::event::Event;
use super::user::{Preferences, UserId};

/// Score contributed by following the event's organizer.
pub const FOLLOW_WEIGHT: u32 = 5;

/// Score one event against the viewer's preferences: `FOLLOW_WEIGHT` when
/// the organizer is followed, plus one per tag shared with the interest set.
pub fn score(event: &Event, interests: &BTreeSet<&str>, followed: &BTreeSet<UserId>) -> u32 {
    let follow_bonus = if followed.contains(&event.organizer) {
        FOLLOW_WEIGHT
    } else {
        0
    };
    let tag_matches = event
        .tags
        .iter()
        .filter(|tag| interests.contains(tag.as_str()))
        .count() as u32;
    follow_bonus + tag_matches
}

/// Order events for an authenticated viewer: descending score, ties broken
/// by ascending start date. The sort is stable, so exact duplicates keep
/// their input order.
pub fn rank(mut events: Vec<Event>, preferences: &Preferences) -> Vec<Event> {
    let interests: BTreeSet<&str> = preferences.interests.iter().map(String::as_str).collect();
    let followed = &preferences.followed_organizers;
    events.sort_by(|a, b| {
        score(b, &interests, followed)
            .cmp(&score(a, &interests, followed))
            .then(a.schedule.start_date.cmp(&b.schedule.start_date))
    });
    events
}

/// Order events for an anonymous viewer: ascending start date, stable.
pub fn chronological(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by(|a, b| a.schedule.start_date.cmp(&b.schedule.start_date));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{EventId, EventKind, EventStatus, Schedule};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rstest::rstest;

    fn day(offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("ts") + Duration::days(offset)
    }

    fn event(organizer: &UserId, tags: &[&str], start_offset: i64) -> Event {
        Event {
            id: EventId::random(),
            organizer: organizer.clone(),
            kind: EventKind::Normal,
            status: EventStatus::Published,
            name: "fixture".into(),
            description: None,
            eligibility: "All".into(),
            schedule: Schedule::new(day(start_offset) - Duration::days(1), day(start_offset), day(start_offset + 1))
                .expect("schedule"),
            registration_limit: 10,
            registration_fee: 0,
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            form_fields: Vec::new(),
            form_locked: false,
            merch_items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn preferences(interests: &[&str], followed: &[&UserId]) -> Preferences {
        Preferences {
            interests: interests.iter().map(|t| (*t).to_owned()).collect(),
            followed_organizers: followed.iter().map(|id| (*id).clone()).collect(),
        }
    }

    #[rstest]
    fn follow_bonus_matches_the_exported_weight() {
        let organizer = UserId::random();
        let prefs = preferences(&[], &[&organizer]);
        let followed = event(&organizer, &[], 1);
        let interests: BTreeSet<&str> = prefs.interests.iter().map(String::as_str).collect();

        assert_eq!(
            score(&followed, &interests, &prefs.followed_organizers),
            crate::domain::FOLLOW_WEIGHT
        );
    }

    #[rstest]
    fn follow_weight_dominates_tag_match() {
        let org_a = UserId::random();
        let org_b = UserId::random();
        // OrgA's event starts later but the follow bonus dominates the
        // single tag match on OrgB's event.
        let followed_event = event(&org_a, &[], 2);
        let tagged_event = event(&org_b, &["robotics"], 1);
        let prefs = preferences(&["robotics"], &[&org_a]);

        let ranked = rank(vec![followed_event.clone(), tagged_event.clone()], &prefs);
        assert_eq!(ranked[0].id, followed_event.id);
        assert_eq!(ranked[1].id, tagged_event.id);
    }

    #[rstest]
    fn tag_overlap_counts_each_match() {
        let organizer = UserId::random();
        let prefs = preferences(&["robotics", "ai"], &[]);
        let two_tags = event(&organizer, &["robotics", "ai"], 5);
        let one_tag = event(&organizer, &["robotics", "music"], 1);

        let ranked = rank(vec![one_tag.clone(), two_tags.clone()], &prefs);
        assert_eq!(ranked[0].id, two_tags.id);
        assert_eq!(ranked[1].id, one_tag.id);
    }

    #[rstest]
    fn ties_break_on_ascending_start_date() {
        let organizer = UserId::random();
        let prefs = preferences(&[], &[]);
        let later = event(&organizer, &[], 4);
        let earlier = event(&organizer, &[], 2);

        let ranked = rank(vec![later.clone(), earlier.clone()], &prefs);
        assert_eq!(ranked[0].id, earlier.id);
        assert_eq!(ranked[1].id, later.id);
    }

    #[rstest]
    fn equal_score_and_start_preserve_input_order() {
        let organizer = UserId::random();
        let prefs = preferences(&[], &[]);
        let first = event(&organizer, &[], 3);
        let second = event(&organizer, &[], 3);

        let ranked = rank(vec![first.clone(), second.clone()], &prefs);
        assert_eq!(ranked[0].id, first.id);
        assert_eq!(ranked[1].id, second.id);
    }

    #[rstest]
    fn anonymous_viewers_get_chronological_order() {
        let organizer = UserId::random();
        let late = event(&organizer, &["robotics"], 9);
        let early = event(&organizer, &[], 1);

        let ordered = chronological(vec![late.clone(), early.clone()]);
        assert_eq!(ordered[0].id, early.id);
        assert_eq!(ordered[1].id, late.id);
    }
}
