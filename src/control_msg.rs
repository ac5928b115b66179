use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Display brightness in percent. Always within 0..=100.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u64", into = "u8")]
pub struct Brightness(u8);

impl Brightness {
    pub const MAX: Brightness = Brightness(100);

    /// Values above 100 are clamped.
    pub fn new(percent: u8) -> Brightness {
        Brightness(percent.min(100))
    }

    /// Parses user input such as the contents of a number field.
    pub fn parse(input: &str) -> Result<Brightness, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyBrightness);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidBrightness(trimmed.to_string()));
        }
        // Digits only, so the only failure left is overflow. Clamp it
        // like any other value above 100.
        let value = trimmed.parse::<u64>().unwrap_or(u64::MAX);
        return Ok(Brightness::from(value));
    }

    pub fn percent(&self) -> u8 {
        self.0
    }
}

impl From<u8> for Brightness {
    fn from(percent: u8) -> Self {
        Brightness::new(percent)
    }
}

/// Any unsigned value is accepted, above 100 clamps.
impl From<u64> for Brightness {
    fn from(percent: u64) -> Self {
        Brightness(percent.min(100) as u8)
    }
}

impl From<Brightness> for u8 {
    fn from(brightness: Brightness) -> Self {
        brightness.0
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// The named brightness actions a front end can invoke on the daemon.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SetBrightness,
    FadeBrightness,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetBrightness => "sd_set_brightness",
            Action::FadeBrightness => "sd_fade_brightness",
        }
    }

    pub fn from_string(name: &str) -> Result<Action, ParseError> {
        match name.trim() {
            "sd_set_brightness" | "set" => Ok(Action::SetBrightness),
            "sd_fade_brightness" | "fade" => Ok(Action::FadeBrightness),
            other => Err(ParseError::UnknownAction(other.to_string())),
        }
    }

    /// Builds the request invoking this action with `brightness`.
    /// Fades use the daemon's default duration and step count.
    pub fn request(&self, brightness: Brightness) -> Request {
        match self {
            Action::SetBrightness => Request::SetBrightness { brightness },
            Action::FadeBrightness => Request::FadeBrightness {
                brightness,
                duration_ms: None,
                steps: None,
            },
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sent by clients to the daemon, one JSON object per line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Request {
    #[serde(rename = "sd_set_brightness")]
    SetBrightness { brightness: Brightness },
    #[serde(rename = "sd_fade_brightness")]
    FadeBrightness {
        brightness: Brightness,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        steps: Option<u32>,
    },
    #[serde(rename = "sd_status")]
    Status,
    #[serde(rename = "sd_reset")]
    Reset,
}

impl Request {
    /// Overrides the fade parameters of a fade request. Other requests
    /// are returned unchanged.
    pub fn with_fade(self, duration_ms: Option<u64>, steps: Option<u32>) -> Request {
        match self {
            Request::FadeBrightness {
                brightness,
                duration_ms: old_duration,
                steps: old_steps,
            } => Request::FadeBrightness {
                brightness,
                duration_ms: duration_ms.or(old_duration),
                steps: steps.or(old_steps),
            },
            other => other,
        }
    }
}

/// Turns an action name and the raw text of a brightness field into a request.
pub fn invocation(action: &str, brightness: &str) -> Result<Request, ParseError> {
    let action = Action::from_string(action)?;
    Ok(action.request(Brightness::parse(brightness)?))
}

/// Snapshot of what the daemon last did to the panel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub panel: String,
    pub firmware: Option<String>,
    /// Last brightness written to the device, if any.
    pub brightness: Option<u8>,
    /// Set while a fade is running.
    pub fade_target: Option<u8>,
    pub last_error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl Response {
    pub fn accepted() -> Response {
        Response { ok: true, error: None, status: None }
    }

    pub fn failed(error: impl Into<String>) -> Response {
        Response { ok: false, error: Some(error.into()), status: None }
    }

    pub fn with_status(status: Status) -> Response {
        Response { ok: true, error: None, status: Some(status) }
    }
}

/// Fade parameters used when a request leaves them out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FadeDefaults {
    pub duration: Duration,
    pub steps: u32,
}

impl Default for FadeDefaults {
    fn default() -> Self {
        FadeDefaults {
            duration: Duration::from_secs(10),
            steps: 50,
        }
    }
}

/// What the fader thread should do to the panel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Set(Brightness),
    Fade {
        target: Brightness,
        duration: Duration,
        steps: u32,
    },
    Reset,
}

pub(crate) enum ControlMsg {
    Shutdown,
    External(Command),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_parse() {
        assert_eq!(Brightness::parse("40"), Ok(Brightness::new(40)));
        assert_eq!(Brightness::parse(" 0 "), Ok(Brightness::new(0)));
        assert_eq!(Brightness::parse("250"), Ok(Brightness::MAX));
        assert_eq!(Brightness::parse("99999999999999999999"), Ok(Brightness::MAX));
        assert!(matches!(Brightness::parse("+5"), Err(ParseError::InvalidBrightness(_))));
        assert_eq!(Brightness::parse(""), Err(ParseError::EmptyBrightness));
        assert!(matches!(Brightness::parse("-5"), Err(ParseError::InvalidBrightness(_))));
        assert!(matches!(Brightness::parse("4.5"), Err(ParseError::InvalidBrightness(_))));
    }

    #[test]
    fn set_button_dispatches_set_brightness() {
        let action = Action::from_string("sd_set_brightness").unwrap();
        let request = action.request(Brightness::parse("40").unwrap());
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"action":"sd_set_brightness","brightness":40}"#);
    }

    #[test]
    fn fade_button_dispatches_fade_brightness() {
        let action = Action::from_string("sd_fade_brightness").unwrap();
        let request = action.request(Brightness::new(75));
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"action":"sd_fade_brightness","brightness":75}"#);
    }

    #[test]
    fn invocation_from_form_fields() {
        assert_eq!(
            invocation("sd_set_brightness", "15"),
            Ok(Request::SetBrightness { brightness: Brightness::new(15) })
        );
        assert_eq!(invocation("sd_set_brightness", ""), Err(ParseError::EmptyBrightness));
        assert!(invocation("sd_dim", "15").is_err());

        let fade = invocation("sd_fade_brightness", "80").unwrap().with_fade(Some(250), None);
        assert_eq!(
            fade,
            Request::FadeBrightness {
                brightness: Brightness::new(80),
                duration_ms: Some(250),
                steps: None,
            }
        );
        assert_eq!(Request::Reset.with_fade(Some(1), Some(1)), Request::Reset);
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert_eq!(
            Action::from_string("sd_blink"),
            Err(ParseError::UnknownAction("sd_blink".to_string()))
        );
    }

    #[test]
    fn requests_decode_from_wire() {
        let request: Request =
            serde_json::from_str(r#"{"action":"sd_fade_brightness","brightness":180,"duration_ms":500}"#).unwrap();
        assert_eq!(
            request,
            Request::FadeBrightness {
                brightness: Brightness::MAX,
                duration_ms: Some(500),
                steps: None,
            }
        );
        let status: Request = serde_json::from_str(r#"{"action":"sd_status"}"#).unwrap();
        assert_eq!(status, Request::Status);
        assert!(serde_json::from_str::<Request>(r#"{"action":"sd_blink"}"#).is_err());
    }

    #[test]
    fn wire_brightness_clamps_like_text() {
        let request: Request =
            serde_json::from_str(r#"{"action":"sd_set_brightness","brightness":300}"#).unwrap();
        assert_eq!(request, Request::SetBrightness { brightness: Brightness::MAX });
        assert_eq!(
            request,
            invocation("sd_set_brightness", "300").unwrap()
        );
        assert!(serde_json::from_str::<Request>(r#"{"action":"sd_set_brightness","brightness":-1}"#).is_err());
    }

    #[test]
    fn failed_response_omits_status() {
        let json = serde_json::to_string(&Response::failed("nope")).unwrap();
        assert_eq!(json, r#"{"ok":false,"error":"nope"}"#);
    }
}
