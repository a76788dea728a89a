#![forbid(unsafe_code)]

//! Terminal escape-sequence decoder.
//!
//! A byte-at-a-time state machine over four states: Ground, Escape, Ss3,
//! and Csi. It recognizes the slice of the VT protocol this project needs:
//! plain bytes, SS3 function keys, CSI cursor and function keys with xterm
//! modifiers, SGR mouse reports, and the replies to the three queries the
//! driver issues (device attributes, cell pixel size, cursor position).
//!
//! The decoder is pure: it performs no I/O and keeps no clock. Whether a
//! lone ESC is the Escape key or the start of a sequence is a timing
//! question, and the timing policy belongs to the driver loop, which
//! watches [`SequenceDecoder::in_escape`] and calls
//! [`SequenceDecoder::resolve_escape`] once its deadline expires.
//!
//! Malformed input never wedges the machine: unknown final bytes and short
//! parameter lists are dropped and the state returns to Ground.

use crate::key::{Key, Modifiers};

/// CSI parameter capacity. Excess parameters are dropped.
pub const MAX_PARAMS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    Ss3,
    Csi,
}

/// One decoded dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeqEvent {
    /// A plain byte in Ground state, or a lone ESC resolved as the Escape
    /// key (carried as `0x1B`).
    Ascii(u8),
    /// SS3 function key (F1–F4).
    FunctionKey(Key),
    /// CSI cursor or function key with decoded modifiers.
    CsiKey { key: Key, modifiers: Modifiers },
    /// SGR mouse report: raw button code and 1-based cell coordinates.
    Mouse {
        button: u32,
        col: u32,
        row: u32,
        press: bool,
    },
    /// `CSI ? … c` device-attributes reply.
    DeviceAttributes(Vec<u32>),
    /// `CSI 4 ; height ; width t` cell pixel size reply.
    CellSize { height: u32, width: u32 },
    /// `CSI row ; col R` cursor position reply.
    CursorPos { row: u32, col: u32 },
    /// Ctrl-C seen in the stream, in any state.
    ExitRequested,
}

/// The state machine. One instance per input stream, owned by the driver
/// thread.
#[derive(Debug)]
pub struct SequenceDecoder {
    state: State,
    params: [u32; MAX_PARAMS],
    param_count: usize,
    accum: u32,
    prefix: Option<u8>,
}

impl SequenceDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            params: [0; MAX_PARAMS],
            param_count: 0,
            accum: 0,
            prefix: None,
        }
    }

    /// Feed one byte; completed dispatches are appended to `out`.
    ///
    /// A single byte can produce two events: a lone ESC resolved by the
    /// byte that follows it, plus that byte's own dispatch.
    pub fn feed(&mut self, byte: u8, out: &mut Vec<SeqEvent>) {
        // Ctrl-C requests exit regardless of decoder state.
        if byte == 0x03 {
            out.push(SeqEvent::ExitRequested);
            return;
        }
        match self.state {
            State::Ground => self.process_ground(byte, out),
            State::Escape => self.process_escape(byte, out),
            State::Ss3 => self.process_ss3(byte, out),
            State::Csi => self.process_csi(byte, out),
        }
    }

    /// Feed a whole buffer. Equivalent to feeding byte by byte.
    pub fn feed_all(&mut self, bytes: &[u8], out: &mut Vec<SeqEvent>) {
        for &byte in bytes {
            self.feed(byte, out);
        }
    }

    /// True while a lone ESC is pending disambiguation.
    #[must_use]
    pub fn in_escape(&self) -> bool {
        self.state == State::Escape
    }

    /// Resolve a pending lone ESC as the Escape key. The driver calls this
    /// when no follow-up byte arrived within its deadline.
    pub fn resolve_escape(&mut self, out: &mut Vec<SeqEvent>) {
        if self.state == State::Escape {
            out.push(SeqEvent::Ascii(0x1b));
            self.state = State::Ground;
        }
    }

    fn process_ground(&mut self, byte: u8, out: &mut Vec<SeqEvent>) {
        if byte == 0x1b {
            self.state = State::Escape;
        } else {
            out.push(SeqEvent::Ascii(byte));
        }
    }

    fn process_escape(&mut self, byte: u8, out: &mut Vec<SeqEvent>) {
        match byte {
            b'O' => self.state = State::Ss3,
            b'[' => {
                self.state = State::Csi;
                self.param_count = 0;
                self.accum = 0;
                self.prefix = None;
            }
            0x1b => {
                // The previous ESC was a standalone keypress; this new one
                // may still open a sequence.
                out.push(SeqEvent::Ascii(0x1b));
            }
            _ => {
                out.push(SeqEvent::Ascii(0x1b));
                self.state = State::Ground;
                if (0x20..=0x7e).contains(&byte) {
                    out.push(SeqEvent::Ascii(byte));
                }
            }
        }
    }

    fn process_ss3(&mut self, byte: u8, out: &mut Vec<SeqEvent>) {
        self.state = State::Ground;
        let key = match byte {
            b'P' => Key::F1,
            b'Q' => Key::F2,
            b'R' => Key::F3,
            b'S' => Key::F4,
            _ => return, // unmapped SS3 byte, dropped
        };
        out.push(SeqEvent::FunctionKey(key));
    }

    fn process_csi(&mut self, byte: u8, out: &mut Vec<SeqEvent>) {
        match byte {
            b'?' | b'>' | b'<' => self.prefix = Some(byte),
            b'0'..=b'9' => {
                self.accum = self
                    .accum
                    .saturating_mul(10)
                    .saturating_add(u32::from(byte - b'0'));
            }
            b';' => self.commit_param(),
            _ => {
                self.commit_param();
                self.dispatch_csi(byte, out);
                self.state = State::Ground;
            }
        }
    }

    fn commit_param(&mut self) {
        if self.param_count < MAX_PARAMS {
            self.params[self.param_count] = self.accum;
            self.param_count += 1;
        }
        self.accum = 0;
    }

    fn dispatch_csi(&self, final_byte: u8, out: &mut Vec<SeqEvent>) {
        let params = &self.params[..self.param_count];
        match final_byte {
            b'c' if self.prefix == Some(b'?') => {
                out.push(SeqEvent::DeviceAttributes(params.to_vec()));
            }
            b't' if params.len() >= 3 && params[0] == 4 => {
                out.push(SeqEvent::CellSize {
                    height: params[1],
                    width: params[2],
                });
            }
            b'R' if params.len() >= 2 => {
                out.push(SeqEvent::CursorPos {
                    row: params[0],
                    col: params[1],
                });
            }
            b'M' | b'm' if self.prefix == Some(b'<') && params.len() >= 3 => {
                out.push(SeqEvent::Mouse {
                    button: params[0],
                    col: params[1],
                    row: params[2],
                    press: final_byte == b'M',
                });
            }
            _ => self.dispatch_csi_key(final_byte, out),
        }
    }

    fn dispatch_csi_key(&self, final_byte: u8, out: &mut Vec<SeqEvent>) {
        let params = &self.params[..self.param_count];
        let parm1 = params.first().copied().unwrap_or(0);
        let parm2 = params.get(1).copied().unwrap_or(0);
        let key = match final_byte {
            b'A' => Key::UP,
            b'B' => Key::DOWN,
            b'C' => Key::RIGHT,
            b'D' => Key::LEFT,
            b'~' => match parm1 {
                15 => Key::F5,
                17 => Key::F6,
                18 => Key::F7,
                19 => Key::F8,
                20 => Key::F9,
                21 => Key::F10,
                23 => Key::F11,
                24 => Key::F12,
                _ => return, // unmapped keycode, dropped
            },
            _ => {
                #[cfg(feature = "tracing")]
                tracing::trace!(final_byte, "unrecognized CSI final byte dropped");
                return;
            }
        };
        out.push(SeqEvent::CsiKey {
            key,
            modifiers: Modifiers::from_xterm_param(parm2),
        });
    }
}

impl Default for SequenceDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<SeqEvent> {
        let mut decoder = SequenceDecoder::new();
        let mut out = Vec::new();
        decoder.feed_all(bytes, &mut out);
        out
    }

    #[test]
    fn plain_bytes_pass_through() {
        assert_eq!(decode(b"ab"), vec![SeqEvent::Ascii(b'a'), SeqEvent::Ascii(b'b')]);
    }

    #[test]
    fn arrow_keys() {
        for (bytes, key) in [
            (b"\x1b[A".as_slice(), Key::UP),
            (b"\x1b[B", Key::DOWN),
            (b"\x1b[C", Key::RIGHT),
            (b"\x1b[D", Key::LEFT),
        ] {
            assert_eq!(
                decode(bytes),
                vec![SeqEvent::CsiKey { key, modifiers: Modifiers::empty() }]
            );
        }
    }

    #[test]
    fn function_keys_ss3() {
        for (bytes, key) in [
            (b"\x1bOP".as_slice(), Key::F1),
            (b"\x1bOQ", Key::F2),
            (b"\x1bOR", Key::F3),
            (b"\x1bOS", Key::F4),
        ] {
            assert_eq!(decode(bytes), vec![SeqEvent::FunctionKey(key)]);
        }
    }

    #[test]
    fn unknown_ss3_byte_ignored() {
        assert_eq!(decode(b"\x1bOZ"), vec![]);
        // The decoder is back in Ground afterwards.
        assert_eq!(decode(b"\x1bOZx"), vec![SeqEvent::Ascii(b'x')]);
    }

    #[test]
    fn extended_function_keys() {
        for (bytes, key) in [
            (b"\x1b[15~".as_slice(), Key::F5),
            (b"\x1b[17~", Key::F6),
            (b"\x1b[18~", Key::F7),
            (b"\x1b[19~", Key::F8),
            (b"\x1b[20~", Key::F9),
            (b"\x1b[21~", Key::F10),
            (b"\x1b[23~", Key::F11),
            (b"\x1b[24~", Key::F12),
        ] {
            assert_eq!(
                decode(bytes),
                vec![SeqEvent::CsiKey { key, modifiers: Modifiers::empty() }]
            );
        }
    }

    #[test]
    fn unknown_tilde_code_ignored() {
        assert_eq!(decode(b"\x1b[99~"), vec![]);
        assert_eq!(decode(b"\x1b[16~"), vec![]);
    }

    #[test]
    fn modifiers_in_csi() {
        assert_eq!(
            decode(b"\x1b[1;5A"),
            vec![SeqEvent::CsiKey { key: Key::UP, modifiers: Modifiers::CTRL }]
        );
        assert_eq!(
            decode(b"\x1b[1;2D"),
            vec![SeqEvent::CsiKey { key: Key::LEFT, modifiers: Modifiers::SHIFT }]
        );
        assert_eq!(
            decode(b"\x1b[15;8~"),
            vec![SeqEvent::CsiKey {
                key: Key::F5,
                modifiers: Modifiers::SHIFT | Modifiers::ALT | Modifiers::CTRL,
            }]
        );
    }

    #[test]
    fn esc_then_printable_is_two_keys() {
        assert_eq!(decode(b"\x1bq"), vec![SeqEvent::Ascii(0x1b), SeqEvent::Ascii(b'q')]);
    }

    #[test]
    fn esc_then_control_byte_drops_follower() {
        assert_eq!(decode(b"\x1b\x01"), vec![SeqEvent::Ascii(0x1b)]);
    }

    #[test]
    fn esc_esc_emits_first_and_keeps_second_pending() {
        let mut decoder = SequenceDecoder::new();
        let mut out = Vec::new();
        decoder.feed_all(b"\x1b\x1b", &mut out);
        assert_eq!(out, vec![SeqEvent::Ascii(0x1b)]);
        assert!(decoder.in_escape());
        decoder.feed_all(b"[A", &mut out);
        assert_eq!(
            out,
            vec![
                SeqEvent::Ascii(0x1b),
                SeqEvent::CsiKey { key: Key::UP, modifiers: Modifiers::empty() },
            ]
        );
    }

    #[test]
    fn lone_esc_needs_resolution() {
        let mut decoder = SequenceDecoder::new();
        let mut out = Vec::new();
        decoder.feed(0x1b, &mut out);
        assert!(out.is_empty());
        assert!(decoder.in_escape());
        decoder.resolve_escape(&mut out);
        assert_eq!(out, vec![SeqEvent::Ascii(0x1b)]);
        assert!(!decoder.in_escape());
        // Resolving twice is a no-op.
        decoder.resolve_escape(&mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn sgr_mouse_press_and_release() {
        assert_eq!(
            decode(b"\x1b[<0;10;5M"),
            vec![SeqEvent::Mouse { button: 0, col: 10, row: 5, press: true }]
        );
        assert_eq!(
            decode(b"\x1b[<0;10;5m"),
            vec![SeqEvent::Mouse { button: 0, col: 10, row: 5, press: false }]
        );
    }

    #[test]
    fn sgr_mouse_requires_three_params() {
        assert_eq!(decode(b"\x1b[<0;10M"), vec![]);
    }

    #[test]
    fn sgr_mouse_requires_angle_prefix() {
        // Without the `<` prefix, `M` is not a mouse report.
        assert_eq!(decode(b"\x1b[0;10;5M"), vec![]);
    }

    #[test]
    fn device_attributes_reply() {
        assert_eq!(
            decode(b"\x1b[?62;4c"),
            vec![SeqEvent::DeviceAttributes(vec![62, 4])]
        );
    }

    #[test]
    fn device_attributes_requires_question_prefix() {
        assert_eq!(decode(b"\x1b[62c"), vec![]);
    }

    #[test]
    fn cell_size_reply() {
        assert_eq!(
            decode(b"\x1b[4;20;10t"),
            vec![SeqEvent::CellSize { height: 20, width: 10 }]
        );
    }

    #[test]
    fn window_ops_other_than_cell_size_ignored() {
        assert_eq!(decode(b"\x1b[8;24;80t"), vec![]);
        assert_eq!(decode(b"\x1b[4;20t"), vec![]);
    }

    #[test]
    fn cursor_position_reply() {
        assert_eq!(
            decode(b"\x1b[24;80R"),
            vec![SeqEvent::CursorPos { row: 24, col: 80 }]
        );
    }

    #[test]
    fn short_cursor_report_dropped() {
        assert_eq!(decode(b"\x1b[5R"), vec![]);
    }

    #[test]
    fn ctrl_c_in_any_state() {
        assert_eq!(decode(b"\x03"), vec![SeqEvent::ExitRequested]);
        // Mid-sequence Ctrl-C does not disturb the sequence in flight.
        assert_eq!(
            decode(b"\x1b[\x03A"),
            vec![
                SeqEvent::ExitRequested,
                SeqEvent::CsiKey { key: Key::UP, modifiers: Modifiers::empty() },
            ]
        );
    }

    #[test]
    fn params_capped_at_capacity() {
        let mut bytes = b"\x1b[?".to_vec();
        for i in 0..40 {
            if i > 0 {
                bytes.push(b';');
            }
            bytes.push(b'1');
        }
        bytes.push(b'c');
        match decode(&bytes).as_slice() {
            [SeqEvent::DeviceAttributes(params)] => assert_eq!(params.len(), MAX_PARAMS),
            other => panic!("unexpected dispatch: {other:?}"),
        }
    }

    #[test]
    fn huge_parameter_saturates() {
        assert_eq!(
            decode(b"\x1b[99999999999999999999;1R"),
            vec![SeqEvent::CursorPos { row: u32::MAX, col: 1 }]
        );
    }

    #[test]
    fn no_panic_on_arbitrary_bytes() {
        let mut decoder = SequenceDecoder::new();
        let mut out = Vec::new();
        for _ in 0..2 {
            for byte in 0..=255u8 {
                decoder.feed(byte, &mut out);
            }
        }
    }
}
