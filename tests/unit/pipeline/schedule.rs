use super::*;

fn fps(n: u32) -> Fps {
    Fps::whole(n).unwrap()
}

#[test]
fn ticker_covers_half_open_range() {
    let ticks: Vec<u64> = Ticker::new(fps(4), 1_000_000_000).collect();
    assert_eq!(ticks, vec![0, 250_000_000, 500_000_000, 750_000_000]);
    assert_eq!(Ticker::new(fps(4), 1_000_000_000).total(), 4);
}

#[test]
fn ticker_total_matches_iteration() {
    for (rate, end) in [
        (fps(30), 10_000_000_000u64),
        (fps(60), 2_500_000_000),
        (Fps::new(1000, 100).unwrap(), 1_050_000_000),
        (Fps::new(30000, 1001).unwrap(), 3_000_000_000),
        (fps(30), 1),
        (fps(30), 0),
    ] {
        let t = Ticker::new(rate, end);
        assert_eq!(t.total(), t.clone().count() as u64, "{rate:?} {end}");
    }
}

#[test]
fn ten_second_clip_captures_three_hundred_frames() {
    let s = Schedule::new(10.0, fps(60), fps(30), Fps::new(1000, 100).unwrap());
    assert_eq!(s.capture_total(), 300);

    let tasks: Vec<ScheduledTask> = s.collect();
    let count = |k| tasks.iter().filter(|t| t.kind == k).count();
    assert_eq!(count(TaskKind::Draw), 600);
    assert_eq!(count(TaskKind::Capture), 300);
    assert_eq!(count(TaskKind::Progress), 100);
    assert!(tasks.iter().all(|t| t.at_ns < 10_000_000_000));
}

#[test]
fn tasks_are_time_ordered_with_fixed_tie_break() {
    let s = Schedule::new(0.1, fps(60), fps(30), Fps::new(1000, 100).unwrap());
    let tasks: Vec<ScheduledTask> = s.collect();
    assert_eq!(
        &tasks[..3],
        &[
            ScheduledTask {
                at_ns: 0,
                kind: TaskKind::Draw
            },
            ScheduledTask {
                at_ns: 0,
                kind: TaskKind::Capture
            },
            ScheduledTask {
                at_ns: 0,
                kind: TaskKind::Progress
            },
        ]
    );
    assert!(tasks.windows(2).all(|w| w[0].at_ns <= w[1].at_ns));
}

#[test]
fn stop_drawing_drops_only_draw_tasks() {
    let mut s = Schedule::new(1.0, fps(60), fps(30), Fps::new(1000, 100).unwrap());
    assert_eq!(s.next().map(|t| t.kind), Some(TaskKind::Draw));
    s.stop_drawing();
    assert!(!s.is_drawing());
    let rest: Vec<ScheduledTask> = s.collect();
    assert!(rest.iter().all(|t| t.kind != TaskKind::Draw));
    assert_eq!(rest.iter().filter(|t| t.kind == TaskKind::Capture).count(), 30);
}

#[test]
fn zero_or_invalid_duration_yields_nothing() {
    assert_eq!(Schedule::new(0.0, fps(60), fps(30), fps(10)).count(), 0);
    assert_eq!(Schedule::new(f64::NAN, fps(60), fps(30), fps(10)).count(), 0);
    assert_eq!(secs_to_ns(1.5), 1_500_000_000);
}
