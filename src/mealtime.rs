use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Source of "now". Handlers hold a `SystemClock`; tests substitute a
/// fixed instant so cutoff decisions are deterministic.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Lunch,
    Dinner,
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            _ => Err(anyhow::anyhow!("Unknown meal type: {s}")),
        }
    }
}

/// Why a submission was refused by the cutoff policy. A rejection is a
/// normal negative-path result, not a server error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CutoffRejection {
    #[error("{meal} is closed for today, cutoff was {}", .cutoff.format("%-I:%M %p"))]
    ClosedForToday { meal: MealType, cutoff: NaiveTime },
    #[error("cannot submit {meal} attendance for a past date ({target})")]
    PastDate { meal: MealType, target: NaiveDate },
}

/// All wall-clock rules of the mess in one place: the institute-local
/// offset, the per-meal submission cutoffs, and the time from which
/// aggregate reports may be read. Constructed once from configuration so
/// tests can inject arbitrary cutoffs without touching a clock.
#[derive(Debug, Clone)]
pub struct MealSchedule {
    tz: FixedOffset,
    lunch_cutoff: NaiveTime,
    dinner_cutoff: NaiveTime,
    report_visible_from: NaiveTime,
}

impl Default for MealSchedule {
    /// Institute defaults: UTC+05:30, lunch closes 09:00, dinner closes
    /// 16:30, reports readable from 07:00.
    fn default() -> Self {
        Self {
            tz: FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap(),
            lunch_cutoff: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            dinner_cutoff: NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
            report_visible_from: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
        }
    }
}

impl MealSchedule {
    pub fn new(
        tz: FixedOffset,
        lunch_cutoff: NaiveTime,
        dinner_cutoff: NaiveTime,
        report_visible_from: NaiveTime,
    ) -> Self {
        Self {
            tz,
            lunch_cutoff,
            dinner_cutoff,
            report_visible_from,
        }
    }

    /// The instant expressed in institute-local time, regardless of the
    /// host timezone.
    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.tz)
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local(instant).date_naive()
    }

    pub fn report_visible_from(&self) -> NaiveTime {
        self.report_visible_from
    }

    pub fn cutoff(&self, meal: MealType) -> NaiveTime {
        match meal {
            MealType::Lunch => self.lunch_cutoff,
            MealType::Dinner => self.dinner_cutoff,
        }
    }

    /// The calendar date a new submission at `instant` applies to. Past
    /// the meal's cutoff the intent rolls forward to tomorrow: a 10 AM
    /// lunch submission registers for tomorrow's lunch, it does not close
    /// out today's.
    pub fn resolve_target_date(&self, meal: MealType, instant: DateTime<Utc>) -> NaiveDate {
        let local = self.local(instant);
        if local.time() >= self.cutoff(meal) {
            local.date_naive() + Duration::days(1)
        } else {
            local.date_naive()
        }
    }

    /// Whether a submission for `target` is still open at `instant`.
    /// Future dates are always open; today closes at the meal's cutoff;
    /// past dates are refused outright.
    pub fn can_submit(
        &self,
        meal: MealType,
        instant: DateTime<Utc>,
        target: NaiveDate,
    ) -> Result<(), CutoffRejection> {
        let local = self.local(instant);
        let today = local.date_naive();

        if target > today {
            return Ok(());
        }
        if target < today {
            return Err(CutoffRejection::PastDate { meal, target });
        }
        if local.time() < self.cutoff(meal) {
            Ok(())
        } else {
            Err(CutoffRejection::ClosedForToday {
                meal,
                cutoff: self.cutoff(meal),
            })
        }
    }

    /// Aggregate reports are gated until 07:00 local for both meals,
    /// independent of the submission cutoffs.
    pub fn is_report_visible(&self, instant: DateTime<Utc>) -> bool {
        self.local(instant).time() >= self.report_visible_from
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, TimeZone};

    fn sched() -> MealSchedule {
        MealSchedule::default()
    }

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
    }

    /// Build the UTC instant corresponding to an institute-local
    /// wall-clock reading.
    fn at(date: &str, h: u32, m: u32) -> DateTime<Utc> {
        let d: NaiveDate = date.parse().unwrap();
        let ndt = NaiveDateTime::new(d, NaiveTime::from_hms_opt(h, m, 0).unwrap());
        ist().from_local_datetime(&ndt).unwrap().to_utc()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn lunch_target_rolls_forward_at_cutoff() {
        let s = sched();
        let d = date("2025-07-25");
        assert_eq!(s.resolve_target_date(MealType::Lunch, at("2025-07-25", 8, 59)), d);
        assert_eq!(
            s.resolve_target_date(MealType::Lunch, at("2025-07-25", 9, 0)),
            date("2025-07-26")
        );
        assert_eq!(
            s.resolve_target_date(MealType::Lunch, at("2025-07-25", 10, 0)),
            date("2025-07-26")
        );
    }

    #[test]
    fn dinner_target_rolls_forward_at_cutoff() {
        let s = sched();
        assert_eq!(
            s.resolve_target_date(MealType::Dinner, at("2025-07-25", 16, 29)),
            date("2025-07-25")
        );
        assert_eq!(
            s.resolve_target_date(MealType::Dinner, at("2025-07-25", 16, 30)),
            date("2025-07-26")
        );
    }

    #[test]
    fn local_decisions_ignore_host_timezone() {
        // 03:00 UTC is 08:30 in the institute zone: still before the
        // lunch cutoff even though a UTC host would call it mid-morning.
        let s = sched();
        let instant = Utc.with_ymd_and_hms(2025, 7, 25, 3, 0, 0).unwrap();
        assert_eq!(s.resolve_target_date(MealType::Lunch, instant), date("2025-07-25"));

        let instant = Utc.with_ymd_and_hms(2025, 7, 25, 3, 31, 0).unwrap();
        assert_eq!(s.resolve_target_date(MealType::Lunch, instant), date("2025-07-26"));
    }

    #[test]
    fn today_accepted_strictly_before_cutoff() {
        let s = sched();
        let d = date("2025-07-25");
        assert!(s.can_submit(MealType::Lunch, at("2025-07-25", 8, 59), d).is_ok());
        assert!(s.can_submit(MealType::Lunch, at("2025-07-25", 9, 0), d).is_err());
        assert!(s.can_submit(MealType::Dinner, at("2025-07-25", 16, 29), d).is_ok());
        assert!(s.can_submit(MealType::Dinner, at("2025-07-25", 16, 30), d).is_err());
    }

    #[test]
    fn future_dates_always_open() {
        let s = sched();
        let tomorrow = date("2025-07-26");
        // Even well past today's cutoff a future-day submission is open.
        assert!(s.can_submit(MealType::Lunch, at("2025-07-25", 23, 59), tomorrow).is_ok());
        assert!(s.can_submit(MealType::Dinner, at("2025-07-25", 23, 59), tomorrow).is_ok());
    }

    #[test]
    fn past_dates_rejected() {
        let s = sched();
        let err = s
            .can_submit(MealType::Lunch, at("2025-07-25", 8, 0), date("2025-07-24"))
            .unwrap_err();
        assert!(matches!(err, CutoffRejection::PastDate { .. }));
    }

    #[test]
    fn rejection_once_closed_stays_closed_for_the_day() {
        let s = sched();
        let d = date("2025-07-25");
        assert!(s.can_submit(MealType::Lunch, at("2025-07-25", 9, 0), d).is_err());
        for (h, m) in [(9, 1), (12, 0), (18, 45), (23, 59)] {
            assert!(
                s.can_submit(MealType::Lunch, at("2025-07-25", h, m), d).is_err(),
                "expected lunch to stay closed at {h:02}:{m:02}"
            );
        }
    }

    #[test]
    fn rejection_message_names_the_cutoff() {
        let s = sched();
        let d = date("2025-07-25");
        let err = s
            .can_submit(MealType::Dinner, at("2025-07-25", 16, 31), d)
            .unwrap_err();
        assert!(err.to_string().contains("4:30 PM"), "got: {err}");

        let err = s
            .can_submit(MealType::Lunch, at("2025-07-25", 9, 30), d)
            .unwrap_err();
        assert!(err.to_string().contains("9:00 AM"), "got: {err}");
    }

    #[test]
    fn report_visibility_boundary() {
        let s = sched();
        assert!(!s.is_report_visible(at("2025-07-25", 6, 59)));
        assert!(s.is_report_visible(at("2025-07-25", 7, 0)));
        assert!(s.is_report_visible(at("2025-07-25", 22, 0)));
    }

    #[test]
    fn custom_cutoffs_are_honoured() {
        // Config-driven schedule: no global constants to monkeypatch.
        let s = MealSchedule::new(
            ist(),
            NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        );
        let d = date("2025-07-25");
        assert!(s.can_submit(MealType::Lunch, at("2025-07-25", 10, 14), d).is_ok());
        assert!(s.can_submit(MealType::Lunch, at("2025-07-25", 10, 15), d).is_err());
        assert!(s.is_report_visible(at("2025-07-25", 6, 0)));
    }

    #[test]
    fn meal_type_round_trips_through_strings() {
        assert_eq!("lunch".parse::<MealType>().unwrap(), MealType::Lunch);
        assert_eq!("DINNER".parse::<MealType>().unwrap(), MealType::Dinner);
        assert!("breakfast".parse::<MealType>().is_err());
        assert_eq!(MealType::Lunch.to_string(), "lunch");
    }
}
