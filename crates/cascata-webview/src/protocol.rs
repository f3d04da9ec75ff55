//! Opcode protocol - the closed vocabulary of commands (native to engine
//! host) and events (engine host to native) carried inside frames.
//!
//! Every opcode has exactly one payload shape, fixed bit-exactly: packed
//! little-endian integers, NUL-terminated UTF-8 strings, and for script
//! messages a tagged-argument sequence. Unknown opcodes indicate version
//! skew and are never silently ignored.

use std::fmt;

use crate::error::{Result, WebViewError};
use crate::script::{ScriptValue, ScriptValueVector};
use crate::transport::Frame;

/// Frame type tags. Values 0-6 are commands, 7-8 are events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum Opcode {
    SetBackgroundColor = 0,
    SetParentWindow = 1,
    SetSize = 2,
    Navigate = 3,
    RunScript = 4,
    InjectScript = 5,
    KeyEvent = 6,
    ScriptMessage = 7,
    LoadFinished = 8,
}

impl Opcode {
    pub fn from_wire(raw: i16) -> Result<Self> {
        match raw {
            0 => Ok(Opcode::SetBackgroundColor),
            1 => Ok(Opcode::SetParentWindow),
            2 => Ok(Opcode::SetSize),
            3 => Ok(Opcode::Navigate),
            4 => Ok(Opcode::RunScript),
            5 => Ok(Opcode::InjectScript),
            6 => Ok(Opcode::KeyEvent),
            7 => Ok(Opcode::ScriptMessage),
            8 => Ok(Opcode::LoadFinished),
            other => Err(WebViewError::UnknownOpcode(other)),
        }
    }

    pub fn to_wire(self) -> i16 {
        self as i16
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::SetBackgroundColor => "set-background-color",
            Opcode::SetParentWindow => "set-parent-window",
            Opcode::SetSize => "set-size",
            Opcode::Navigate => "navigate",
            Opcode::RunScript => "run-script",
            Opcode::InjectScript => "inject-script",
            Opcode::KeyEvent => "key-event",
            Opcode::ScriptMessage => "script-message",
            Opcode::LoadFinished => "load-finished",
        };
        write!(f, "{name}")
    }
}

/// View size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Keyboard modifier state carried with forwarded key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub super_key: bool,
}

impl KeyModifiers {
    const SHIFT: u32 = 1 << 0;
    const CONTROL: u32 = 1 << 1;
    const ALT: u32 = 1 << 2;
    const SUPER: u32 = 1 << 3;

    pub fn bits(self) -> u32 {
        let mut bits = 0;
        if self.shift {
            bits |= Self::SHIFT;
        }
        if self.control {
            bits |= Self::CONTROL;
        }
        if self.alt {
            bits |= Self::ALT;
        }
        if self.super_key {
            bits |= Self::SUPER;
        }
        bits
    }

    pub fn from_bits(bits: u32) -> Self {
        Self {
            shift: bits & Self::SHIFT != 0,
            control: bits & Self::CONTROL != 0,
            alt: bits & Self::ALT != 0,
            super_key: bits & Self::SUPER != 0,
        }
    }
}

/// A key press or release forwarded to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub press: bool,
    pub key_code: u32,
    pub hardware_code: u32,
    pub modifiers: KeyModifiers,
}

/// Native to engine-host messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetBackgroundColor { rgba: u32 },
    SetParentWindow { handle: u64 },
    SetSize { size: Size },
    Navigate { url: String },
    RunScript { source: String },
    InjectScript { source: String },
    ForwardKeyEvent { event: KeyEvent },
}

/// Engine-host to native messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ScriptMessageReceived { args: ScriptValueVector },
    LoadFinished,
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::SetBackgroundColor { .. } => Opcode::SetBackgroundColor,
            Command::SetParentWindow { .. } => Opcode::SetParentWindow,
            Command::SetSize { .. } => Opcode::SetSize,
            Command::Navigate { .. } => Opcode::Navigate,
            Command::RunScript { .. } => Opcode::RunScript,
            Command::InjectScript { .. } => Opcode::InjectScript,
            Command::ForwardKeyEvent { .. } => Opcode::KeyEvent,
        }
    }

    pub fn encode(&self) -> Frame {
        let mut payload = Vec::new();
        match self {
            Command::SetBackgroundColor { rgba } => {
                payload.extend_from_slice(&rgba.to_le_bytes());
            }
            Command::SetParentWindow { handle } => {
                payload.extend_from_slice(&handle.to_le_bytes());
            }
            Command::SetSize { size } => {
                payload.extend_from_slice(&size.width.to_le_bytes());
                payload.extend_from_slice(&size.height.to_le_bytes());
            }
            Command::Navigate { url } => put_string(&mut payload, url),
            Command::RunScript { source } => put_string(&mut payload, source),
            Command::InjectScript { source } => put_string(&mut payload, source),
            Command::ForwardKeyEvent { event } => {
                payload.push(event.press as u8);
                payload.extend_from_slice(&event.key_code.to_le_bytes());
                payload.extend_from_slice(&event.hardware_code.to_le_bytes());
                payload.extend_from_slice(&event.modifiers.bits().to_le_bytes());
            }
        }
        Frame {
            opcode: self.opcode().to_wire(),
            payload,
        }
    }

    pub fn decode(frame: &Frame) -> Result<Self> {
        let opcode = Opcode::from_wire(frame.opcode)?;
        let mut payload = Payload::new(opcode, &frame.payload);
        let command = match opcode {
            Opcode::SetBackgroundColor => Command::SetBackgroundColor {
                rgba: payload.take_u32()?,
            },
            Opcode::SetParentWindow => Command::SetParentWindow {
                handle: payload.take_u64()?,
            },
            Opcode::SetSize => Command::SetSize {
                size: Size::new(payload.take_u32()?, payload.take_u32()?),
            },
            Opcode::Navigate => Command::Navigate {
                url: payload.take_string()?,
            },
            Opcode::RunScript => Command::RunScript {
                source: payload.take_string()?,
            },
            Opcode::InjectScript => Command::InjectScript {
                source: payload.take_string()?,
            },
            Opcode::KeyEvent => Command::ForwardKeyEvent {
                event: KeyEvent {
                    press: payload.take_u8()? != 0,
                    key_code: payload.take_u32()?,
                    hardware_code: payload.take_u32()?,
                    modifiers: KeyModifiers::from_bits(payload.take_u32()?),
                },
            },
            Opcode::ScriptMessage | Opcode::LoadFinished => {
                return Err(WebViewError::UnexpectedOpcode(opcode));
            }
        };
        payload.finish()?;
        Ok(command)
    }
}

impl Event {
    pub fn opcode(&self) -> Opcode {
        match self {
            Event::ScriptMessageReceived { .. } => Opcode::ScriptMessage,
            Event::LoadFinished => Opcode::LoadFinished,
        }
    }

    pub fn encode(&self) -> Frame {
        let mut payload = Vec::new();
        match self {
            Event::ScriptMessageReceived { args } => put_script_values(&mut payload, args),
            Event::LoadFinished => {}
        }
        Frame {
            opcode: self.opcode().to_wire(),
            payload,
        }
    }

    pub fn decode(frame: &Frame) -> Result<Self> {
        let opcode = Opcode::from_wire(frame.opcode)?;
        let mut payload = Payload::new(opcode, &frame.payload);
        let event = match opcode {
            Opcode::ScriptMessage => Event::ScriptMessageReceived {
                args: payload.take_script_values()?,
            },
            Opcode::LoadFinished => Event::LoadFinished,
            _ => return Err(WebViewError::UnexpectedOpcode(opcode)),
        };
        payload.finish()?;
        Ok(event)
    }
}

// Script value argument tags on the wire.
const ARG_NULL: u8 = 0;
const ARG_FALSE: u8 = 1;
const ARG_TRUE: u8 = 2;
const ARG_DOUBLE: u8 = 3;
const ARG_STRING: u8 = 4;

fn put_string(payload: &mut Vec<u8>, value: &str) {
    payload.extend_from_slice(value.as_bytes());
    payload.push(0);
}

fn put_script_values(payload: &mut Vec<u8>, args: &[ScriptValue]) {
    for arg in args {
        match arg {
            ScriptValue::Null => payload.push(ARG_NULL),
            ScriptValue::Bool(false) => payload.push(ARG_FALSE),
            ScriptValue::Bool(true) => payload.push(ARG_TRUE),
            ScriptValue::Number(n) => {
                payload.push(ARG_DOUBLE);
                payload.extend_from_slice(&n.to_le_bytes());
            }
            ScriptValue::String(s) => {
                payload.push(ARG_STRING);
                put_string(payload, s);
            }
        }
    }
}

/// Cursor over a frame payload. All reads are bounds-checked; leftover
/// bytes at the end are a protocol violation.
struct Payload<'a> {
    opcode: Opcode,
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Payload<'a> {
    fn new(opcode: Opcode, buf: &'a [u8]) -> Self {
        Self {
            opcode,
            buf,
            pos: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(WebViewError::malformed(
                self.opcode,
                format!("expected {len} more bytes, found {}", self.remaining()),
            ));
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn take_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("4-byte slice")))
    }

    fn take_u64(&mut self) -> Result<u64> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().expect("8-byte slice")))
    }

    fn take_f64(&mut self) -> Result<f64> {
        let bytes = self.take(8)?;
        Ok(f64::from_le_bytes(bytes.try_into().expect("8-byte slice")))
    }

    /// NUL-terminated UTF-8 string.
    fn take_string(&mut self) -> Result<String> {
        let rest = &self.buf[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| WebViewError::malformed(self.opcode, "missing string terminator"))?;
        let bytes = &rest[..nul];
        self.pos += nul + 1;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| WebViewError::malformed(self.opcode, "string is not valid UTF-8"))
    }

    fn take_script_values(&mut self) -> Result<ScriptValueVector> {
        let mut args = ScriptValueVector::new();
        while self.remaining() > 0 {
            let value = match self.take_u8()? {
                ARG_NULL => ScriptValue::Null,
                ARG_FALSE => ScriptValue::Bool(false),
                ARG_TRUE => ScriptValue::Bool(true),
                ARG_DOUBLE => ScriptValue::Number(self.take_f64()?),
                ARG_STRING => ScriptValue::String(self.take_string()?),
                tag => {
                    return Err(WebViewError::malformed(
                        self.opcode,
                        format!("unknown argument tag {tag}"),
                    ));
                }
            };
            args.push(value);
        }
        Ok(args)
    }

    fn finish(self) -> Result<()> {
        if self.remaining() > 0 {
            return Err(WebViewError::malformed(
                self.opcode,
                format!("{} trailing bytes", self.remaining()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_command_round_trip() {
        let commands = [
            Command::SetBackgroundColor { rgba: 0x1122_33ff },
            Command::SetParentWindow {
                handle: 0xdead_beef_0042,
            },
            Command::SetSize {
                size: Size::new(600, 300),
            },
            Command::Navigate {
                url: "file:///opt/cascata/index.html".into(),
            },
            Command::RunScript {
                source: "console.log('hi')".into(),
            },
            Command::InjectScript {
                source: "window.x = 1;".into(),
            },
            Command::ForwardKeyEvent {
                event: KeyEvent {
                    press: true,
                    key_code: 0xff51,
                    hardware_code: 113,
                    modifiers: KeyModifiers {
                        shift: true,
                        control: false,
                        alt: true,
                        super_key: false,
                    },
                },
            },
        ];
        for command in commands {
            let frame = command.encode();
            assert_eq!(Command::decode(&frame).unwrap(), command);
        }
    }

    #[test]
    fn test_event_round_trip() {
        let args: ScriptValueVector = smallvec![
            ScriptValue::from("WebUI"),
            ScriptValue::from("parameterChanged"),
            ScriptValue::Number(1.0),
            ScriptValue::Number(0.75),
            ScriptValue::Null,
            ScriptValue::Bool(true),
        ];
        let event = Event::ScriptMessageReceived { args };
        let frame = event.encode();
        assert_eq!(frame.opcode, Opcode::ScriptMessage.to_wire());
        assert_eq!(Event::decode(&frame).unwrap(), event);

        let frame = Event::LoadFinished.encode();
        assert!(frame.payload.is_empty());
        assert_eq!(Event::decode(&frame).unwrap(), Event::LoadFinished);
    }

    #[test]
    fn test_string_payload_layout() {
        let frame = Command::Navigate { url: "abc".into() }.encode();
        assert_eq!(frame.payload, b"abc\0");
    }

    #[test]
    fn test_key_event_layout() {
        let frame = Command::ForwardKeyEvent {
            event: KeyEvent {
                press: true,
                key_code: 2,
                hardware_code: 3,
                modifiers: KeyModifiers::from_bits(0b1010),
            },
        }
        .encode();
        assert_eq!(frame.payload.len(), 13);
        assert_eq!(frame.payload[0], 1);
        assert_eq!(&frame.payload[1..5], &2u32.to_le_bytes());
        assert_eq!(&frame.payload[5..9], &3u32.to_le_bytes());
        assert_eq!(&frame.payload[9..13], &0b1010u32.to_le_bytes());
    }

    #[test]
    fn test_unknown_opcode_rejected() {
        let frame = Frame {
            opcode: 99,
            payload: Vec::new(),
        };
        assert!(matches!(
            Command::decode(&frame),
            Err(WebViewError::UnknownOpcode(99))
        ));
        assert!(matches!(
            Event::decode(&frame),
            Err(WebViewError::UnknownOpcode(99))
        ));
    }

    #[test]
    fn test_wrong_direction_rejected() {
        let frame = Event::LoadFinished.encode();
        assert!(matches!(
            Command::decode(&frame),
            Err(WebViewError::UnexpectedOpcode(Opcode::LoadFinished))
        ));

        let frame = Command::SetBackgroundColor { rgba: 0 }.encode();
        assert!(matches!(
            Event::decode(&frame),
            Err(WebViewError::UnexpectedOpcode(Opcode::SetBackgroundColor))
        ));
    }

    #[test]
    fn test_malformed_payloads_rejected() {
        // Truncated color.
        let frame = Frame {
            opcode: Opcode::SetBackgroundColor.to_wire(),
            payload: vec![1, 2],
        };
        assert!(matches!(
            Command::decode(&frame),
            Err(WebViewError::MalformedPayload { .. })
        ));

        // Missing NUL terminator.
        let frame = Frame {
            opcode: Opcode::Navigate.to_wire(),
            payload: b"no-terminator".to_vec(),
        };
        assert!(matches!(
            Command::decode(&frame),
            Err(WebViewError::MalformedPayload { .. })
        ));

        // Trailing bytes after a fixed-size payload.
        let frame = Frame {
            opcode: Opcode::SetSize.to_wire(),
            payload: vec![0; 12],
        };
        assert!(matches!(
            Command::decode(&frame),
            Err(WebViewError::MalformedPayload { .. })
        ));

        // Unknown script argument tag.
        let frame = Frame {
            opcode: Opcode::ScriptMessage.to_wire(),
            payload: vec![7],
        };
        assert!(matches!(
            Event::decode(&frame),
            Err(WebViewError::MalformedPayload { .. })
        ));

        // Invalid UTF-8 in a string payload.
        let frame = Frame {
            opcode: Opcode::RunScript.to_wire(),
            payload: vec![0xff, 0xfe, 0],
        };
        assert!(matches!(
            Command::decode(&frame),
            Err(WebViewError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_modifier_bits_round_trip() {
        let mods = KeyModifiers {
            shift: true,
            control: true,
            alt: false,
            super_key: true,
        };
        assert_eq!(KeyModifiers::from_bits(mods.bits()), mods);
        // Unknown bits are masked off.
        assert_eq!(
            KeyModifiers::from_bits(0xffff_fff0),
            KeyModifiers::default()
        );
    }
}
