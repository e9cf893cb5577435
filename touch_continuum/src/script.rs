//! Touch scripts: a line-oriented text format for replaying a performance
//! without a touch screen.
//!
//! ```text
//! # slide a fifth up, then let it round
//! down 1 120 500
//! wait 30
//! move 1 200 520
//! move 1 300 540
//! wait 400
//! up 1
//! ```
//!
//! Commands: `down <id> <x> <y>`, `move <id> <x> <y>`, `up <id>`,
//! `wait <ms>`, `lock on|off`, `yaxis aftertouch|volume`, `scroll <left>`,
//! `quit`.  Blank lines and `#` comments are ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use continuum_midi::YAxisMode;
use thiserror::Error;

use crate::session::TouchId;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("cannot read touch script {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One script command.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptStep {
    Down { id: TouchId, x: f32, y: f32 },
    Move { id: TouchId, x: f32, y: f32 },
    Up   { id: TouchId },
    Wait(Duration),
    PitchLock(bool),
    YAxis(YAxisMode),
    Scroll(f32),
    Quit,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TouchScript {
    steps: Vec<ScriptStep>,
}

impl TouchScript {
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut steps = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let step = parse_line(line)
                .map_err(|message| ScriptError::Syntax { line: index + 1, message })?;
            steps.push(step);
        }
        Ok(TouchScript { steps })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| ScriptError::Io { path: path.to_path_buf(), source })?;
        Self::parse(&text)
    }

    pub fn steps(&self) -> &[ScriptStep] { &self.steps }

    pub fn len(&self) -> usize { self.steps.len() }

    pub fn is_empty(&self) -> bool { self.steps.is_empty() }

    /// Sum of all `wait` steps.
    pub fn duration(&self) -> Duration {
        self.steps
            .iter()
            .filter_map(|s| match s {
                ScriptStep::Wait(d) => Some(*d),
                _ => None,
            })
            .sum()
    }
}

impl FromStr for TouchScript {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl IntoIterator for TouchScript {
    type Item = ScriptStep;
    type IntoIter = std::vec::IntoIter<ScriptStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

// ── line parser ──────────────────────────────────────────────────────────────

fn parse_line(line: &str) -> Result<ScriptStep, String> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("").to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let expect = |n: usize| -> Result<(), String> {
        if args.len() == n {
            Ok(())
        } else {
            Err(format!("`{command}` takes {n} argument(s), got {}", args.len()))
        }
    };

    let step = match command.as_str() {
        "down" => {
            expect(3)?;
            ScriptStep::Down { id: touch_id(args[0])?, x: number(args[1])?, y: number(args[2])? }
        }
        "move" => {
            expect(3)?;
            ScriptStep::Move { id: touch_id(args[0])?, x: number(args[1])?, y: number(args[2])? }
        }
        "up" => {
            expect(1)?;
            ScriptStep::Up { id: touch_id(args[0])? }
        }
        "wait" => {
            expect(1)?;
            let ms: u64 = args[0]
                .parse()
                .map_err(|_| format!("bad wait time `{}` (milliseconds)", args[0]))?;
            ScriptStep::Wait(Duration::from_millis(ms))
        }
        "lock" => {
            expect(1)?;
            match args[0].to_ascii_lowercase().as_str() {
                "on"  => ScriptStep::PitchLock(true),
                "off" => ScriptStep::PitchLock(false),
                other => return Err(format!("`lock` expects on|off, got `{other}`")),
            }
        }
        "yaxis" => {
            expect(1)?;
            match args[0].to_ascii_lowercase().as_str() {
                "aftertouch" => ScriptStep::YAxis(YAxisMode::Aftertouch),
                "volume"     => ScriptStep::YAxis(YAxisMode::Volume),
                other => return Err(format!("`yaxis` expects aftertouch|volume, got `{other}`")),
            }
        }
        "scroll" => {
            expect(1)?;
            ScriptStep::Scroll(number(args[0])?)
        }
        "quit" => {
            expect(0)?;
            ScriptStep::Quit
        }
        other => return Err(format!("unknown command `{other}`")),
    };
    Ok(step)
}

fn touch_id(word: &str) -> Result<TouchId, String> {
    word.parse().map(TouchId).map_err(|_| format!("bad touch id `{word}`"))
}

fn number(word: &str) -> Result<f32, String> {
    match word.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("bad coordinate `{word}`")),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        let script: TouchScript = "
            # warm up
            down 1 120 500
            move 1 130.5 510   # trailing comment
            wait 25
            LOCK on
            yaxis Volume
            scroll -300
            up 1
            quit
        "
        .parse()
        .unwrap();

        assert_eq!(script.steps(), &[
            ScriptStep::Down { id: TouchId(1), x: 120.0, y: 500.0 },
            ScriptStep::Move { id: TouchId(1), x: 130.5, y: 510.0 },
            ScriptStep::Wait(Duration::from_millis(25)),
            ScriptStep::PitchLock(true),
            ScriptStep::YAxis(YAxisMode::Volume),
            ScriptStep::Scroll(-300.0),
            ScriptStep::Up { id: TouchId(1) },
            ScriptStep::Quit,
        ]);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = TouchScript::parse("down 1 2 3\n\nmove 1 x 3").unwrap_err();
        match err {
            ScriptError::Syntax { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("`x`"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_arity_and_unknown_commands_fail() {
        assert!(TouchScript::parse("up").is_err());
        assert!(TouchScript::parse("down 1 2").is_err());
        assert!(TouchScript::parse("tap 1").is_err());
        assert!(TouchScript::parse("lock maybe").is_err());
        assert!(TouchScript::parse("move 1 nan 3").is_err());
    }

    #[test]
    fn duration_sums_waits() {
        let s = TouchScript::parse("wait 10\ndown 1 0 0\nwait 15").unwrap();
        assert_eq!(s.duration(), Duration::from_millis(25));
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn empty_script_is_fine() {
        assert!(TouchScript::parse("# nothing\n\n").unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TouchScript::from_file(dir.path().join("none.touch")).unwrap_err();
        assert!(matches!(err, ScriptError::Io { .. }));
    }
}
