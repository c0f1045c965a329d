use crate::domain::ResolvedTask;
use chrono::{DateTime, NaiveDate, TimeZone};
use std::collections::BTreeMap;
use tracing::warn;

/// Tasks completed on one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub tasks: Vec<ResolvedTask>,
}

/// Calendar date of a unix timestamp in `tz`
pub fn local_date<Tz: TimeZone>(timestamp: f64, tz: &Tz) -> Option<NaiveDate> {
    if !timestamp.is_finite() {
        return None;
    }
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    let utc = DateTime::from_timestamp(secs as i64, nanos)?;
    Some(tz.from_utc_datetime(&utc.naive_utc()).date_naive())
}

/// Unix timestamp of the start of the day containing `timestamp` in `tz`
pub fn start_of_day<Tz: TimeZone>(timestamp: f64, tz: &Tz) -> f64 {
    local_date(timestamp, tz)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map(|start| start.timestamp() as f64)
        .unwrap_or(timestamp)
}

/// Split tasks by the day they were stopped, days ascending.
///
/// Task order inside a day is preserved. Tasks without a stop date have
/// no day to go to and are skipped.
pub fn group_by_day<Tz: TimeZone>(tasks: Vec<ResolvedTask>, tz: &Tz) -> Vec<DayGroup> {
    let mut days: BTreeMap<NaiveDate, Vec<ResolvedTask>> = BTreeMap::new();
    for task in tasks {
        match task.stop_date.and_then(|stop| local_date(stop, tz)) {
            Some(date) => days.entry(date).or_default().push(task),
            None => warn!(task = %task.uuid, "skipping task without a stop date"),
        }
    }
    days.into_iter()
        .map(|(date, tasks)| DayGroup { date, tasks })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::tests::task;
    use chrono::{FixedOffset, Utc};

    // 2023-11-14T22:13:20Z
    const STOP: f64 = 1_700_000_000.0;

    fn stopped(uuid: &str, stop: Option<f64>) -> ResolvedTask {
        let mut t = task(uuid, uuid);
        t.stop_date = stop;
        t
    }

    #[test]
    fn test_local_date_follows_timezone() {
        assert_eq!(local_date(STOP, &Utc), NaiveDate::from_ymd_opt(2023, 11, 14));
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(local_date(STOP, &tokyo), NaiveDate::from_ymd_opt(2023, 11, 15));
    }

    #[test]
    fn test_start_of_day() {
        assert_eq!(start_of_day(STOP, &Utc), 1_699_920_000.0);
        assert_eq!(start_of_day(1_699_920_000.0, &Utc), 1_699_920_000.0);
    }

    #[test]
    fn test_group_by_day_sorts_days_and_keeps_task_order() {
        let day = 86_400.0;
        let tasks = vec![
            stopped("late", Some(STOP + day)),
            stopped("first", Some(STOP)),
            stopped("none", None),
            stopped("second", Some(STOP - 60.0)),
        ];

        let groups = group_by_day(tasks, &Utc);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, NaiveDate::from_ymd_opt(2023, 11, 14).unwrap());
        let first: Vec<&str> = groups[0].tasks.iter().map(|t| t.uuid.as_str()).collect();
        assert_eq!(first, vec!["first", "second"]);
        assert_eq!(groups[1].tasks[0].uuid, "late");
    }
}
