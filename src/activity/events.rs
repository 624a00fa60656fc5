use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use super::store::{DisplayState, LevelInfo};
use crate::error::EventError;

/// Periodic full status report from the activity monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStatus {
    #[serde(alias = "isIdeRunning")]
    pub is_tool_running: bool,
    #[serde(default, alias = "activeIde")]
    pub active_tool: Option<String>,
    #[serde(default)]
    pub idle_seconds: u64,
}

/// Every event the host can send, one JSON object per line:
///
/// ```text
/// {"event":"tool-detected","payload":"vscode"}
/// {"event":"new-commit"}
/// {"event":"status","payload":{"isToolRunning":true,"activeTool":"Zed","idleSeconds":4}}
/// ```
///
/// Legacy `domain:action` names are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum HostEvent {
    #[serde(alias = "activity:ide-detected")]
    ToolDetected(String),
    #[serde(alias = "activity:ide-closed", deserialize_with = "ignore_payload")]
    ToolClosed,
    /// Seconds without activity.
    #[serde(alias = "activity:idle")]
    Idle(u64),
    #[serde(alias = "activity:sleeping")]
    Sleeping(u64),
    /// Local hour the monitor saw the editor running at.
    #[serde(alias = "activity:late-night-coding")]
    LateNightCoding(u32),
    /// Any payload (e.g. `{repo, head}`) is ignored.
    #[serde(alias = "git:new-commit", deserialize_with = "ignore_payload")]
    NewCommit,
    #[serde(alias = "activity:status")]
    Status(ActivityStatus),
    #[serde(alias = "activity:fullscreen")]
    Fullscreen(bool),
    #[serde(alias = "cat:state-changed")]
    StateChanged(DisplayState),
    #[serde(alias = "cat:level-up")]
    Level(LevelInfo),
    /// Seconds remaining on the running pomodoro.
    #[serde(alias = "pomodoro:tick")]
    PomodoroTick(u32),
    #[serde(alias = "pomodoro:complete", deserialize_with = "ignore_payload")]
    PomodoroComplete,
    /// The host stopped the pomodoro early.
    #[serde(alias = "pomodoro:cancelled", deserialize_with = "ignore_payload")]
    PomodoroCancelled,
}

/// Payload-less events still accept whatever payload the sender attached.
fn ignore_payload<'de, D: Deserializer<'de>>(deserializer: D) -> Result<(), D::Error> {
    IgnoredAny::deserialize(deserializer).map(|_| ())
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToolDetected(_) => "tool-detected",
            Self::ToolClosed => "tool-closed",
            Self::Idle(_) => "idle",
            Self::Sleeping(_) => "sleeping",
            Self::LateNightCoding(_) => "late-night-coding",
            Self::NewCommit => "new-commit",
            Self::Status(_) => "status",
            Self::Fullscreen(_) => "fullscreen",
            Self::StateChanged(_) => "state-changed",
            Self::Level(_) => "level",
            Self::PomodoroTick(_) => "pomodoro-tick",
            Self::PomodoroComplete => "pomodoro-complete",
            Self::PomodoroCancelled => "pomodoro-cancelled",
        }
    }

    /// Reject payloads that decode but make no sense.
    pub fn validate(self) -> Result<Self, EventError> {
        let reason = match &self {
            Self::ToolDetected(name) if name.trim().is_empty() => Some("tool name is empty"),
            Self::LateNightCoding(hour) if *hour >= 24 => Some("hour out of range"),
            Self::Level(info) if info.level == 0 => Some("level starts at 1"),
            Self::Status(status)
                if status
                    .active_tool
                    .as_deref()
                    .is_some_and(|t| t.trim().is_empty()) =>
            {
                Some("tool name is empty")
            }
            _ => None,
        };
        match reason {
            Some(reason) => Err(EventError::Invalid {
                event: self.name(),
                reason,
            }),
            None => Ok(self),
        }
    }
}

/// Decode and validate one line from the host pipe.
pub fn parse_line(line: &str) -> Result<HostEvent, EventError> {
    let event: HostEvent = serde_json::from_str(line)?;
    event.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_every_kind() {
        let cases = [
            (
                r#"{"event":"tool-detected","payload":"vscode"}"#,
                HostEvent::ToolDetected("vscode".into()),
            ),
            (r#"{"event":"tool-closed"}"#, HostEvent::ToolClosed),
            (r#"{"event":"idle","payload":200}"#, HostEvent::Idle(200)),
            (r#"{"event":"sleeping","payload":601}"#, HostEvent::Sleeping(601)),
            (
                r#"{"event":"late-night-coding","payload":23}"#,
                HostEvent::LateNightCoding(23),
            ),
            (r#"{"event":"new-commit"}"#, HostEvent::NewCommit),
            (
                r#"{"event":"fullscreen","payload":true}"#,
                HostEvent::Fullscreen(true),
            ),
            (
                r#"{"event":"state-changed","payload":"frustrated"}"#,
                HostEvent::StateChanged(DisplayState::Frustrated),
            ),
            (
                r#"{"event":"pomodoro-tick","payload":1499}"#,
                HostEvent::PomodoroTick(1499),
            ),
            (r#"{"event":"pomodoro-complete"}"#, HostEvent::PomodoroComplete),
        ];
        for (line, expected) in cases {
            assert_eq!(parse_line(line).unwrap(), expected, "{line}");
        }
    }

    #[test]
    fn parses_status_with_legacy_field_names() {
        let event = parse_line(
            r#"{"event":"activity:status","payload":{"isIdeRunning":true,"activeIde":"VS Code","idleSeconds":0}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            HostEvent::Status(ActivityStatus {
                is_tool_running: true,
                active_tool: Some("VS Code".into()),
                idle_seconds: 0,
            })
        );
    }

    #[test]
    fn accepts_legacy_event_names() {
        assert_eq!(
            parse_line(r#"{"event":"activity:ide-detected","payload":"Zed"}"#).unwrap(),
            HostEvent::ToolDetected("Zed".into())
        );
        assert_eq!(
            parse_line(r#"{"event":"git:new-commit"}"#).unwrap(),
            HostEvent::NewCommit
        );
    }

    #[test]
    fn payload_less_events_ignore_attached_payloads() {
        let cases = [
            (
                r#"{"event":"activity:ide-closed","payload":""}"#,
                HostEvent::ToolClosed,
            ),
            (
                r#"{"event":"git:new-commit","payload":{"repo":"/src/cat","head":"3f2a9c1"}}"#,
                HostEvent::NewCommit,
            ),
            (r#"{"event":"new-commit","payload":null}"#, HostEvent::NewCommit),
            (r#"{"event":"pomodoro:cancelled"}"#, HostEvent::PomodoroCancelled),
            (
                r#"{"event":"pomodoro-cancelled","payload":0}"#,
                HostEvent::PomodoroCancelled,
            ),
        ];
        for (line, expected) in cases {
            assert_eq!(parse_line(line).unwrap(), expected, "{line}");
        }
    }

    #[test]
    fn level_payload_defaults_streak() {
        let event =
            parse_line(r#"{"event":"level","payload":{"level":3,"exp":10,"expToNext":250}}"#)
                .unwrap();
        assert_eq!(
            event,
            HostEvent::Level(LevelInfo {
                level: 3,
                exp: 10,
                exp_to_next: 250,
                streak_days: 0,
            })
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in [
            "",
            "not json",
            r#"{"event":"warp-drive"}"#,
            r#"{"event":"idle","payload":-5}"#,
            r#"{"event":"tool-detected","payload":42}"#,
            r#"{"event":"fullscreen","payload":"yes"}"#,
        ] {
            assert!(
                matches!(parse_line(line), Err(EventError::Malformed(_))),
                "{line}"
            );
        }
    }

    #[test]
    fn rejects_nonsense_payloads() {
        for line in [
            r#"{"event":"tool-detected","payload":"   "}"#,
            r#"{"event":"late-night-coding","payload":25}"#,
            r#"{"event":"level","payload":{"level":0,"exp":0,"expToNext":60}}"#,
        ] {
            assert!(
                matches!(parse_line(line), Err(EventError::Invalid { .. })),
                "{line}"
            );
        }
    }
}
