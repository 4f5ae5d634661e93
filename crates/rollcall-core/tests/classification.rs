//! Month-level properties of the classifier across policies and years

use chrono::{Datelike, NaiveDate, Weekday};
use pretty_assertions::assert_eq;
use rollcall_core::{
    aggregate, classify, days_in_month, plan_timesheet, Activity, AttendanceRequest, DateSets,
    DayKind, ValidationError, WeekendPolicy,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn partition_is_exhaustive_for_every_month() {
    for year in [2024, 2025, 2100] {
        for month in 1..=12 {
            let len = days_in_month(year, month).unwrap();
            for policy in WeekendPolicy::ALL {
                let m = aggregate(year, month, policy, &DateSets::new()).unwrap();
                assert_eq!(m.days.len() as u32, len);
                assert_eq!(m.summary.total(), len, "{year}-{month} {policy}");
                assert!(m.days.windows(2).all(|w| w[0].date < w[1].date));
            }
        }
    }
}

#[test]
fn sundays_are_always_off() {
    for policy in WeekendPolicy::ALL {
        let m = aggregate(2025, 6, policy, &DateSets::new()).unwrap();
        for day in m.days.iter().filter(|d| d.weekday == Weekday::Sun) {
            assert_eq!(day.kind, DayKind::WeekOff, "{}", day.date);
        }
    }
}

#[test]
fn saturday_counts_follow_policy() {
    // March 2025 has five Saturdays: 1, 8, 15, 22, 29
    let off_saturdays = |policy| {
        aggregate(2025, 3, policy, &DateSets::new())
            .unwrap()
            .days
            .iter()
            .filter(|d| d.weekday == Weekday::Sat && d.kind == DayKind::WeekOff)
            .count()
    };
    assert_eq!(off_saturdays(WeekendPolicy::FirstThird), 2);
    assert_eq!(off_saturdays(WeekendPolicy::SecondFourth), 2);
    assert_eq!(off_saturdays(WeekendPolicy::AllOff), 5);
    assert_eq!(off_saturdays(WeekendPolicy::None), 0);
}

#[test]
fn worked_sunday_counts_as_worked() {
    let sets = DateSets::new().week_off_worked([date(2025, 2, 2)]);
    let m = aggregate(2025, 2, WeekendPolicy::AllOff, &sets).unwrap();

    assert_eq!(m.day(2).unwrap().kind, DayKind::WeekOffWorked);
    assert_eq!(m.summary.week_off_worked, 1);
    assert_eq!(m.summary.worked(), m.summary.present + 1);
    // Worked weekend days do not add to the working-day total
    assert_eq!(
        m.summary.total_working_days(),
        m.summary.present + m.summary.leave + m.summary.comp_off
    );
}

#[test]
fn request_to_summary() {
    let request = AttendanceRequest::new("13536906", 2025, 2)
        .policy(WeekendPolicy::AllOff)
        .holidays(&["2025-02-26"])
        .leave(&["2025-02-10", " "]);
    let sets = request.date_sets().unwrap();
    let m = aggregate(request.year, request.month, request.saturday_weekoff, &sets).unwrap();

    assert_eq!(m.summary.present, 18);
    assert_eq!(m.summary.total_working_days(), 19);
}

#[test]
fn conflicts_name_the_date() {
    let sets = DateSets::new().comp_off([date(2025, 2, 22)]);
    let err = aggregate(2025, 2, WeekendPolicy::SecondFourth, &sets).unwrap_err();
    assert!(matches!(
        err,
        ValidationError::OffDayConflict { date: d, .. } if d == date(2025, 2, 22)
    ));
    assert!(err.to_string().contains("2025-02-22"));
}

#[test]
fn classify_agrees_with_aggregate() {
    let sets = DateSets::new()
        .leave([date(2025, 7, 14)])
        .comp_off([date(2025, 7, 15)])
        .public_holidays([date(2025, 7, 4)]);
    let m = aggregate(2025, 7, WeekendPolicy::FirstThird, &sets).unwrap();
    for day in &m.days {
        assert_eq!(classify(day.date, WeekendPolicy::FirstThird, &sets), *day);
        assert_eq!(day.date.month(), 7);
    }
}

#[test]
fn timesheet_rows_match_attendance() {
    let sets = DateSets::new()
        .public_holidays([date(2025, 2, 26)])
        .leave([date(2025, 2, 10)]);
    let plan = plan_timesheet(
        2025,
        2,
        WeekendPolicy::AllOff,
        &sets,
        &Default::default(),
        "",
    )
    .unwrap();
    let m = aggregate(2025, 2, WeekendPolicy::AllOff, &sets).unwrap();

    assert_eq!(plan.days.len(), m.days.len());
    for (row, day) in plan.days.iter().zip(&m.days) {
        assert_eq!(row.activity, Activity::from_kind(day.kind));
    }
    assert_eq!(plan.regular_work_days, m.summary.present);
}
