//! Normalized hardware control events
//!
//! Every raw device message is reduced to a fixed byte triplet before it
//! reaches the mapping layer. Byte layout follows the MIDI channel-voice
//! convention: a status byte followed by two data bytes.

/// Status nibble for Note Off messages
pub const NOTE_OFF: u8 = 0x80;
/// Status nibble for Note On messages
pub const NOTE_ON: u8 = 0x90;
/// Status nibble for Control Change messages
pub const CONTROL_CHANGE: u8 = 0xB0;

/// Largest value a 7-bit data byte can carry
pub const DATA_MAX: u8 = 127;

/// Number of bytes a raw message needs to form a [`ControlEvent`]
pub const EVENT_LEN: usize = 3;

/// A single normalized control message
///
/// Created once per raw hardware callback and consumed synchronously by the
/// velocity mapping. Carries no identity beyond its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlEvent {
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

impl ControlEvent {
    pub fn new(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            status,
            data1,
            data2,
        }
    }

    /// Builds an event from the first three bytes of a raw payload
    ///
    /// Returns `None` for payloads shorter than [`EVENT_LEN`]. Extra bytes
    /// (running status, SysEx tails) are ignored.
    pub fn from_bytes(payload: &[u8]) -> Option<Self> {
        match payload {
            [status, data1, data2, ..] => Some(Self::new(*status, *data1, *data2)),
            _ => None,
        }
    }

    /// Upper nibble of the status byte (message kind)
    pub fn kind(&self) -> u8 {
        self.status & 0xF0
    }

    /// Lower nibble of the status byte (zero-based channel)
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    pub fn is_control_change(&self) -> bool {
        self.kind() == CONTROL_CHANGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_takes_first_three() {
        let event = ControlEvent::from_bytes(&[0xB3, 1, 65, 0xF7]).unwrap();
        assert_eq!(event, ControlEvent::new(0xB3, 1, 65));
        assert_eq!(event.channel(), 3);
        assert!(event.is_control_change());
    }

    #[test]
    fn test_from_bytes_short_payload() {
        assert!(ControlEvent::from_bytes(&[]).is_none());
        assert!(ControlEvent::from_bytes(&[0xB0]).is_none());
        assert!(ControlEvent::from_bytes(&[0xB0, 1]).is_none());
    }

    #[test]
    fn test_kind_masks_channel() {
        let note = ControlEvent::new(0x9F, 60, 100);
        assert_eq!(note.kind(), NOTE_ON);
        assert!(!note.is_control_change());
    }
}
