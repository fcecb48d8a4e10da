//! TwiML response builder.
//!
//! Every webhook answers with a `<Response>` document built here. Text nodes
//! and attribute values are XML-escaped.

use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::language::Language;

/// Voice used for `<Say>`
pub const SAY_VOICE: &str = "alice";

pub fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<Stream>` inside `<Start>` or `<Connect>`
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub url: String,
    pub track: Option<String>,
    pub parameters: Vec<(String, String)>,
}

impl Stream {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            track: None,
            parameters: Vec::new(),
        }
    }

    /// `inbound_track`, `outbound_track` or `both_tracks`
    pub fn track(mut self, track: impl Into<String>) -> Self {
        self.track = Some(track.into());
        self
    }

    /// Custom parameter echoed back in the stream's `start` event
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    fn write(&self, out: &mut String) {
        out.push_str("<Stream");
        attr(out, "url", &self.url);
        if let Some(track) = &self.track {
            attr(out, "track", track);
        }
        if self.parameters.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for (name, value) in &self.parameters {
            out.push_str("<Parameter");
            attr(out, "name", name);
            attr(out, "value", value);
            out.push_str("/>");
        }
        out.push_str("</Stream>");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialTarget {
    Number {
        number: String,
        /// TwiML fetched and played to the called party on answer
        url: Option<String>,
    },
    Conference {
        name: String,
        status_callback: Option<String>,
        status_callback_event: Option<String>,
        start_on_enter: bool,
        end_on_exit: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dial {
    pub target: DialTarget,
    pub action: Option<String>,
    pub caller_id: Option<String>,
    pub timeout: Option<u32>,
}

impl Dial {
    pub fn number(number: impl Into<String>) -> Self {
        Self::with_target(DialTarget::Number {
            number: number.into(),
            url: None,
        })
    }

    pub fn conference(name: impl Into<String>) -> Self {
        Self::with_target(DialTarget::Conference {
            name: name.into(),
            status_callback: None,
            status_callback_event: None,
            start_on_enter: true,
            end_on_exit: false,
        })
    }

    fn with_target(target: DialTarget) -> Self {
        Self {
            target,
            action: None,
            caller_id: None,
            timeout: None,
        }
    }

    pub fn action(mut self, url: impl Into<String>) -> Self {
        self.action = Some(url.into());
        self
    }

    pub fn caller_id(mut self, number: impl Into<String>) -> Self {
        self.caller_id = Some(number.into());
        self
    }

    pub fn timeout(mut self, secs: u32) -> Self {
        self.timeout = Some(secs);
        self
    }

    /// Sets the `<Number url>`; ignored for conferences
    pub fn number_url(mut self, url: impl Into<String>) -> Self {
        if let DialTarget::Number { url: slot, .. } = &mut self.target {
            *slot = Some(url.into());
        }
        self
    }

    /// Sets the conference status callback; ignored for numbers
    pub fn status_callback(mut self, url: impl Into<String>, events: impl Into<String>) -> Self {
        if let DialTarget::Conference {
            status_callback,
            status_callback_event,
            ..
        } = &mut self.target
        {
            *status_callback = Some(url.into());
            *status_callback_event = Some(events.into());
        }
        self
    }

    pub fn end_on_exit(mut self, value: bool) -> Self {
        if let DialTarget::Conference { end_on_exit, .. } = &mut self.target {
            *end_on_exit = value;
        }
        self
    }

    fn write(&self, out: &mut String) {
        out.push_str("<Dial");
        if let Some(action) = &self.action {
            attr(out, "action", action);
        }
        if let Some(caller_id) = &self.caller_id {
            attr(out, "callerId", caller_id);
        }
        if let Some(timeout) = self.timeout {
            attr(out, "timeout", &timeout.to_string());
        }
        out.push('>');

        match &self.target {
            DialTarget::Number { number, url } => {
                out.push_str("<Number");
                if let Some(url) = url {
                    attr(out, "url", url);
                }
                out.push('>');
                out.push_str(&escape_xml(number));
                out.push_str("</Number>");
            }
            DialTarget::Conference {
                name,
                status_callback,
                status_callback_event,
                start_on_enter,
                end_on_exit,
            } => {
                out.push_str("<Conference");
                attr(out, "startConferenceOnEnter", bool_str(*start_on_enter));
                attr(out, "endConferenceOnExit", bool_str(*end_on_exit));
                if let Some(url) = status_callback {
                    attr(out, "statusCallback", url);
                }
                if let Some(events) = status_callback_event {
                    attr(out, "statusCallbackEvent", events);
                }
                out.push('>');
                out.push_str(&escape_xml(name));
                out.push_str("</Conference>");
            }
        }

        out.push_str("</Dial>");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub action: String,
    pub max_length: u32,
    pub timeout: u32,
    pub play_beep: bool,
    pub finish_on_key: String,
    pub transcribe_callback: Option<String>,
}

impl Record {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            max_length: 10,
            timeout: 5,
            play_beep: false,
            finish_on_key: "#".to_string(),
            transcribe_callback: None,
        }
    }

    pub fn max_length(mut self, secs: u32) -> Self {
        self.max_length = secs;
        self
    }

    pub fn timeout(mut self, secs: u32) -> Self {
        self.timeout = secs;
        self
    }

    /// Ask the provider to transcribe and post the text to `url`
    pub fn transcribe(mut self, url: impl Into<String>) -> Self {
        self.transcribe_callback = Some(url.into());
        self
    }

    fn write(&self, out: &mut String) {
        out.push_str("<Record");
        attr(out, "action", &self.action);
        attr(out, "method", "POST");
        attr(out, "maxLength", &self.max_length.to_string());
        attr(out, "timeout", &self.timeout.to_string());
        attr(out, "playBeep", bool_str(self.play_beep));
        attr(out, "finishOnKey", &self.finish_on_key);
        if let Some(callback) = &self.transcribe_callback {
            attr(out, "transcribe", "true");
            attr(out, "transcribeCallback", callback);
        }
        out.push_str("/>");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gather {
    pub action: String,
    pub language: Language,
    pub speech_timeout: String,
    pub timeout: u32,
    pub hints: Option<String>,
}

impl Gather {
    pub fn speech(action: impl Into<String>, language: Language) -> Self {
        Self {
            action: action.into(),
            language,
            speech_timeout: "auto".to_string(),
            timeout: 20,
            hints: None,
        }
    }

    pub fn timeout(mut self, secs: u32) -> Self {
        self.timeout = secs;
        self
    }

    pub fn hints(mut self, hints: impl Into<String>) -> Self {
        self.hints = Some(hints.into());
        self
    }

    fn write(&self, out: &mut String) {
        out.push_str("<Gather");
        attr(out, "input", "speech");
        attr(out, "action", &self.action);
        attr(out, "method", "POST");
        attr(out, "language", self.language.locale());
        attr(out, "speechTimeout", &self.speech_timeout);
        attr(out, "timeout", &self.timeout.to_string());
        if let Some(hints) = &self.hints {
            attr(out, "hints", hints);
        }
        out.push_str("/>");
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Verb {
    Say { language: Language, text: String },
    Play { url: String },
    Pause { length: u32 },
    Start(Stream),
    Connect(Stream),
    Dial(Dial),
    Record(Record),
    Gather(Gather),
    Hangup,
}

/// A TwiML `<Response>` document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TwimlResponse {
    verbs: Vec<Verb>,
}

impl TwimlResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, language: Language, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say {
            language,
            text: text.into(),
        });
        self
    }

    pub fn play(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Play { url: url.into() });
        self
    }

    pub fn pause(mut self, length: u32) -> Self {
        self.verbs.push(Verb::Pause { length });
        self
    }

    /// Fork call audio to a stream while the rest of the document continues
    pub fn start_stream(mut self, stream: Stream) -> Self {
        self.verbs.push(Verb::Start(stream));
        self
    }

    /// Hand the call over to a bidirectional stream
    pub fn connect_stream(mut self, stream: Stream) -> Self {
        self.verbs.push(Verb::Connect(stream));
        self
    }

    pub fn dial(mut self, dial: Dial) -> Self {
        self.verbs.push(Verb::Dial(dial));
        self
    }

    pub fn record(mut self, record: Record) -> Self {
        self.verbs.push(Verb::Record(record));
        self
    }

    pub fn gather(mut self, gather: Gather) -> Self {
        self.verbs.push(Verb::Gather(gather));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);

        for verb in &self.verbs {
            match verb {
                Verb::Say { language, text } => write_say(&mut out, *language, text),
                Verb::Play { url } => {
                    out.push_str("<Play>");
                    out.push_str(&escape_xml(url));
                    out.push_str("</Play>");
                }
                Verb::Pause { length } => {
                    out.push_str("<Pause");
                    attr(&mut out, "length", &length.to_string());
                    out.push_str("/>");
                }
                Verb::Start(stream) => {
                    out.push_str("<Start>");
                    stream.write(&mut out);
                    out.push_str("</Start>");
                }
                Verb::Connect(stream) => {
                    out.push_str("<Connect>");
                    stream.write(&mut out);
                    out.push_str("</Connect>");
                }
                Verb::Dial(dial) => dial.write(&mut out),
                Verb::Record(record) => record.write(&mut out),
                Verb::Gather(gather) => gather.write(&mut out),
                Verb::Hangup => out.push_str("<Hangup/>"),
            }
        }

        out.push_str("</Response>");
        out
    }
}

impl IntoResponse for TwimlResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "text/xml")], self.to_xml()).into_response()
    }
}

fn attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_xml(value));
    out.push('"');
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn write_say(out: &mut String, language: Language, text: &str) {
    out.push_str("<Say");
    attr(out, "voice", SAY_VOICE);
    attr(out, "language", language.locale());
    out.push('>');
    out.push_str(&escape_xml(text));
    out.push_str("</Say>");
}
