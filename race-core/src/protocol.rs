//! Line-oriented text protocol spoken with the race environment.
//!
//! ```text
//! laps
//! checkpoint_count
//! x y                      (checkpoint_count lines)
//! x y vx vy angle next_cp  (one line per pod, every turn)
//! ```
//!
//! Each controlled pod answers with `x y POWER`, where `POWER` is an integer
//! thrust, `SHIELD` or `BOOST`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::command::PodCommand;
use crate::constants::{MAX_THRUST, TARGET_PROJECTION};
use crate::error::ProtocolError;
use crate::pod::Pod;
use crate::track::Track;
use crate::vector::Vec2;

pub const SHIELD_TOKEN: &str = "SHIELD";
pub const BOOST_TOKEN: &str = "BOOST";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodTelemetry {
    pub x: i32,
    pub y: i32,
    pub vx: i32,
    pub vy: i32,
    /// Degrees; `-1` when the environment has not assigned one yet.
    pub angle: i32,
    pub next_checkpoint: usize,
}

impl PodTelemetry {
    pub fn from_pod(pod: &Pod) -> Self {
        let (x, y) = pod.position.to_i32();
        Self {
            x,
            y,
            vx: pod.velocity.x as i32,
            vy: pod.velocity.y as i32,
            angle: pod.heading.unwrap_or(-1),
            next_checkpoint: pod.target,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from((self.x, self.y))
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::from((self.vx, self.vy))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Power {
    Thrust(i32),
    Shield,
    Boost,
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thrust(t) => write!(f, "{t}"),
            Self::Shield => f.write_str(SHIELD_TOKEN),
            Self::Boost => f.write_str(BOOST_TOKEN),
        }
    }
}

impl FromStr for Power {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            SHIELD_TOKEN => Ok(Self::Shield),
            BOOST_TOKEN => Ok(Self::Boost),
            other => match other.parse::<i32>() {
                Ok(t) if (0..=MAX_THRUST).contains(&t) => Ok(Self::Thrust(t)),
                _ => Err(ProtocolError::InvalidPower {
                    token: other.to_string(),
                }),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLine {
    pub target: (i32, i32),
    pub power: Power,
}

impl ActionLine {
    /// Projects the commanded heading far ahead of the pod. Shield wins over
    /// boost, and a spent boost falls back to the commanded thrust.
    pub fn for_command(pod: &Pod, cmd: &PodCommand) -> Self {
        let heading = (pod.heading_deg() + cmd.rotation).rem_euclid(360);
        let target = pod.position + Vec2::from_degrees(heading as f64) * TARGET_PROJECTION;
        let power = if cmd.shield {
            Power::Shield
        } else if cmd.boost && pod.boost_available() {
            Power::Boost
        } else {
            Power::Thrust(cmd.thrust.clamp(0, MAX_THRUST))
        };
        Self {
            target: target.to_i32(),
            power,
        }
    }
}

impl fmt::Display for ActionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.target.0, self.target.1, self.power)
    }
}

impl FromStr for ActionLine {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let mut next = |expected: &'static str| {
            tokens.next().ok_or_else(|| ProtocolError::MissingField {
                line: line.to_string(),
                expected,
            })
        };
        let x = parse_int(next("target x")?, "target x")?;
        let y = parse_int(next("target y")?, "target y")?;
        let power = next("power")?.parse()?;
        Ok(Self {
            target: (x as i32, y as i32),
            power,
        })
    }
}

fn parse_int(token: &str, field: &'static str) -> Result<i64, ProtocolError> {
    token.parse::<i64>().map_err(|_| ProtocolError::InvalidNumber {
        field,
        token: token.to_string(),
    })
}

fn next_line<I, S>(lines: &mut I, expected: &'static str) -> Result<S, ProtocolError>
where
    I: Iterator<Item = S>,
{
    lines
        .next()
        .ok_or(ProtocolError::UnexpectedEof { expected })
}

fn parse_fields<const N: usize>(
    line: &str,
    names: [&'static str; N],
) -> Result<[i64; N], ProtocolError> {
    let mut values = [0i64; N];
    let mut tokens = line.split_whitespace();
    for (value, name) in values.iter_mut().zip(names) {
        let token = tokens.next().ok_or_else(|| ProtocolError::MissingField {
            line: line.to_string(),
            expected: name,
        })?;
        *value = parse_int(token, name)?;
    }
    Ok(values)
}

/// Reads the race header: lap count, checkpoint count and the checkpoints.
pub fn parse_track<I, S>(lines: &mut I) -> Result<Track, ProtocolError>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    let [laps] = parse_fields(next_line(lines, "lap count")?.as_ref(), ["laps"])?;
    let [count] = parse_fields(
        next_line(lines, "checkpoint count")?.as_ref(),
        ["checkpoint count"],
    )?;

    let mut checkpoints = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count.max(0) {
        let line = next_line(lines, "checkpoint coordinates")?;
        let [x, y] = parse_fields(line.as_ref(), ["checkpoint x", "checkpoint y"])?;
        checkpoints.push(Vec2::new(x as f64, y as f64));
    }

    Track::new(laps.max(0) as u32, checkpoints).ok_or(ProtocolError::EmptyTrack)
}

pub fn parse_telemetry<I, S>(
    lines: &mut I,
    pods: usize,
    track: &Track,
) -> Result<Vec<PodTelemetry>, ProtocolError>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    let mut telemetry = Vec::with_capacity(pods);
    for _ in 0..pods {
        let line = next_line(lines, "pod telemetry")?;
        let [x, y, vx, vy, angle, next] = parse_fields(
            line.as_ref(),
            ["x", "y", "vx", "vy", "angle", "next checkpoint"],
        )?;
        if next < 0 || next as usize >= track.len() {
            return Err(ProtocolError::CheckpointOutOfRange {
                index: next,
                count: track.len(),
            });
        }
        telemetry.push(PodTelemetry {
            x: x as i32,
            y: y as i32,
            vx: vx as i32,
            vy: vy as i32,
            angle: angle as i32,
            next_checkpoint: next as usize,
        });
    }
    Ok(telemetry)
}

pub fn format_track(track: &Track) -> String {
    let mut out = format!("{}\n{}\n", track.laps(), track.len());
    for cp in track.checkpoints() {
        let (x, y) = cp.to_i32();
        out.push_str(&format!("{x} {y}\n"));
    }
    out
}

pub fn format_telemetry(pods: &[PodTelemetry]) -> String {
    let mut out = String::new();
    for p in pods {
        out.push_str(&format!(
            "{} {} {} {} {} {}\n",
            p.x, p.y, p.vx, p.vy, p.angle, p.next_checkpoint
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "3\n3\n1000 1000\n9000 1000\n5000 6000\n";

    #[test]
    fn parses_header_and_telemetry() {
        let mut lines = HEADER.lines().chain("100 200 -3 4 90 1\n".lines());
        let track = parse_track(&mut lines).expect("track");
        assert_eq!(track.laps(), 3);
        assert_eq!(track.checkpoint(1), Vec2::new(9000.0, 1000.0));

        let pods = parse_telemetry(&mut lines, 1, &track).expect("telemetry");
        assert_eq!(
            pods[0],
            PodTelemetry {
                x: 100,
                y: 200,
                vx: -3,
                vy: 4,
                angle: 90,
                next_checkpoint: 1,
            }
        );
    }

    #[test]
    fn short_and_malformed_input_is_reported() {
        let mut lines = "3\n".lines();
        assert_eq!(
            parse_track(&mut lines),
            Err(ProtocolError::UnexpectedEof {
                expected: "checkpoint count"
            })
        );

        let mut lines = "3\n1\n10 ten\n".lines();
        assert!(matches!(
            parse_track(&mut lines),
            Err(ProtocolError::InvalidNumber {
                field: "checkpoint y",
                ..
            })
        ));

        let mut lines = "3\n0\n".lines();
        assert_eq!(parse_track(&mut lines), Err(ProtocolError::EmptyTrack));

        let track = parse_track(&mut HEADER.lines()).expect("track");
        let mut lines = "0 0 0 0 0 7\n".lines();
        assert!(matches!(
            parse_telemetry(&mut lines, 1, &track),
            Err(ProtocolError::CheckpointOutOfRange { index: 7, count: 3 })
        ));
    }

    #[test]
    fn action_projects_heading_and_prefers_shield() {
        let pod = Pod::new(Vec2::new(1000.0, 2000.0)).with_heading(80);
        let cmd = PodCommand::new(10, 55);
        let line = ActionLine::for_command(&pod, &cmd);
        assert_eq!(line.to_string(), "1000 12000 55");

        let both = cmd.with_boost().with_shield();
        assert_eq!(ActionLine::for_command(&pod, &both).power, Power::Shield);
        assert_eq!(
            ActionLine::for_command(&pod, &cmd.with_boost()).power,
            Power::Boost
        );

        let mut spent = pod;
        spent.use_boost();
        assert_eq!(
            ActionLine::for_command(&spent, &cmd.with_boost()).power,
            Power::Thrust(55)
        );
    }

    #[test]
    fn action_line_parses_back() {
        let line: ActionLine = "-40 9000 BOOST".parse().expect("valid");
        assert_eq!(line.target, (-40, 9000));
        assert_eq!(line.power, Power::Boost);
        assert!("1 2 101".parse::<ActionLine>().is_err());
        assert!("1 2".parse::<ActionLine>().is_err());
    }

    #[test]
    fn track_text_reads_back() {
        let track = parse_track(&mut HEADER.lines()).expect("track");
        assert_eq!(format_track(&track), HEADER);
    }
}
