use crate::model::Program;
use chrono::{FixedOffset, NaiveDate};

/// Select the occurrences that are due for notification on `today`.
///
/// An occurrence is due iff it carries episode data and its start instant
/// falls on `today` in the configured offset. Two instants are only "the
/// same day" relative to a fixed zone, so the comparison never uses the
/// host's local zone. Input order is preserved; nothing is deduplicated.
pub fn select_due(items: Vec<Program>, today: NaiveDate, offset: FixedOffset) -> Vec<Program> {
    items
        .into_iter()
        .filter(|item| {
            item.episode.is_some()
                && item.started_at.with_timezone(&offset).date_naive() == today
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Episode;
    use chrono::{DateTime, TimeZone, Utc};

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn program(id: u64, started_at: DateTime<Utc>, episode: bool) -> Program {
        Program {
            id,
            started_at,
            is_rebroadcast: false,
            channel: Default::default(),
            work: Default::default(),
            episode: episode.then(Episode::default),
        }
    }

    #[test]
    fn rejects_items_without_episode() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        // Starts today in JST but carries no episode data.
        let start = Utc.with_ymd_and_hms(2024, 1, 5, 3, 0, 0).unwrap();
        let selected = select_due(vec![program(1, start, false)], today, jst());
        assert!(selected.is_empty());
    }

    #[test]
    fn rejects_other_calendar_days() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let day_before = Utc.with_ymd_and_hms(2024, 1, 3, 15, 0, 0).unwrap();
        let day_after = Utc.with_ymd_and_hms(2024, 1, 5, 15, 1, 0).unwrap();
        let selected = select_due(
            vec![program(1, day_before, true), program(2, day_after, true)],
            today,
            jst(),
        );
        assert!(selected.is_empty());
    }

    #[test]
    fn day_boundary_follows_configured_offset_not_utc() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        // 23:30 JST on the 5th is 14:30 UTC the same day: due.
        let late_evening = Utc.with_ymd_and_hms(2024, 1, 5, 14, 30, 0).unwrap();
        // 23:30 UTC on the 5th is already 08:30 JST on the 6th: not due.
        let next_day_in_jst = Utc.with_ymd_and_hms(2024, 1, 5, 23, 30, 0).unwrap();
        // 00:15 JST on the 5th is 15:15 UTC on the 4th: due despite the UTC date.
        let early_morning = Utc.with_ymd_and_hms(2024, 1, 4, 15, 15, 0).unwrap();

        let selected = select_due(
            vec![
                program(1, late_evening, true),
                program(2, next_day_in_jst, true),
                program(3, early_morning, true),
            ],
            today,
            jst(),
        );
        let ids: Vec<u64> = selected.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn preserves_input_order() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let items: Vec<Program> = (0..5)
            .map(|i| {
                program(
                    10 - i,
                    Utc.with_ymd_and_hms(2024, 1, 5, 10, i as u32, 0).unwrap(),
                    true,
                )
            })
            .collect();
        let selected = select_due(items, today, jst());
        let ids: Vec<u64> = selected.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![10, 9, 8, 7, 6]);
    }

    #[test]
    fn empty_input_selects_nothing() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert!(select_due(Vec::new(), today, jst()).is_empty());
    }
}
