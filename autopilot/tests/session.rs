use anyhow::Result;
use pod_autopilot::config::PlannerConfig;
use pod_autopilot::driver::run_session;
use pod_autopilot::search::Planner;
use pod_race_core::protocol::{format_telemetry, format_track, ActionLine, PodTelemetry, Power};
use pod_race_core::{Race, Track, Vec2};

fn long_opening() -> Track {
    Track::new(
        3,
        vec![
            Vec2::new(1_000.0, 4_500.0),
            Vec2::new(13_000.0, 4_500.0),
            Vec2::new(7_000.0, 8_000.0),
        ],
    )
    .expect("non-empty")
}

fn instant_config() -> PlannerConfig {
    PlannerConfig {
        flag_chance_pct: 0,
        first_turn_timeout_ms: 0,
        turn_timeout_ms: 0,
        ..PlannerConfig::default()
    }
}

fn start_block(angle: i32) -> Vec<PodTelemetry> {
    [4_000, 5_000, 3_000, 6_000]
        .iter()
        .map(|&y| PodTelemetry {
            x: 1_000,
            y,
            vx: 0,
            vy: 0,
            angle,
            next_checkpoint: 1,
        })
        .collect()
}

fn run(input: &str, cfg: PlannerConfig) -> Result<(u32, Vec<ActionLine>)> {
    let mut out = Vec::new();
    let turns = run_session(cfg, input.as_bytes(), &mut out)?;
    let text = String::from_utf8(out)?;
    let actions = text
        .lines()
        .map(|line| line.parse::<ActionLine>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok((turns, actions))
}

#[test]
fn long_opening_seeds_boost_into_every_plan() {
    let planner = Planner::new(&PlannerConfig::default(), Race::standard(long_opening()));
    for plan in planner.population() {
        let first = plan.first_turn().expect("non-empty plan");
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|cmd| cmd.boost));
    }
}

#[test]
fn session_answers_every_turn_and_stops_at_eof() -> Result<()> {
    let track = long_opening();
    let mut input = format_track(&track);
    input.push_str(&format_telemetry(&start_block(-1)));
    input.push_str(&format_telemetry(&start_block(0)));
    input.push_str(&format_telemetry(&start_block(0)));

    let (turns, actions) = run(&input, instant_config())?;

    assert_eq!(turns, 3);
    assert_eq!(actions.len(), 6);
    assert_eq!(actions[0].power, Power::Boost);
    assert_eq!(actions[1].power, Power::Boost);
    for action in &actions[2..] {
        assert_ne!(action.power, Power::Boost, "boost is single use");
    }
    Ok(())
}

#[test]
fn first_answer_steers_from_the_initial_heading_toward_checkpoint_one() -> Result<()> {
    let mut input = format_track(&long_opening());
    input.push_str(&format_telemetry(&start_block(-1)));

    let (_, actions) = run(&input, instant_config())?;

    // Initial headings are within 3 degrees of checkpoint 1; one turn adds at most 18.
    let max_dy = (21f64.to_radians().sin() * 10_000.0).ceil() as i32;
    for (action, y) in actions.iter().zip([4_000, 5_000]) {
        assert!(action.target.0 > 1_000 + 9_000);
        assert!((action.target.1 - y).abs() <= max_dy, "target={:?}", action.target);
    }
    Ok(())
}

#[test]
fn header_only_input_plays_no_turns() -> Result<()> {
    let input = format_track(&long_opening());
    let (turns, actions) = run(&input, instant_config())?;
    assert_eq!(turns, 0);
    assert!(actions.is_empty());
    Ok(())
}

#[test]
fn truncated_telemetry_is_an_error() {
    let mut input = format_track(&long_opening());
    input.push_str("1000 4000 0 0 -1 1\n1000 5000 0 0 -1 1\n");

    let mut out = Vec::new();
    let err = run_session(instant_config(), input.as_bytes(), &mut out)
        .expect_err("half a telemetry block");
    assert!(format!("{err:#}").contains("pod telemetry"), "{err:#}");
}

#[test]
fn malformed_header_is_an_error() {
    let mut out = Vec::new();
    let err = run_session(instant_config(), "three\n".as_bytes(), &mut out)
        .expect_err("bad lap count");
    assert!(format!("{err:#}").contains("track header"), "{err:#}");
}
