//! Frame type and stream reassembly codec.
//!
//! Wire layout: `[start: 1 byte] [length: u16 LE] [payload: length bytes]`.
//! The start byte doubles as a direction marker (`<` host→device, `>`
//! device→host); the first payload byte is a command byte or response code.
//!
//! The codec never fails on input. Garbage before a plausible start byte is
//! skipped one byte at a time (resynchronisation), an implausible length is
//! treated as desynchronisation, and the only loss condition it reports is
//! the reassembly buffer exceeding its bound.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    codes::{FRAME_START_DEVICE, FRAME_START_HOST},
    error::{ProtocolError, Result},
};

/// Maximum payload length the codec will accept.
pub const MAX_PAYLOAD: usize = 4096;

/// Reassembly buffer bound. Beyond this the codec truncates from the head
/// and reports the loss via [`PushOutcome::dropped`].
pub const MAX_BUFFER: usize = 2 * (HEADER_LEN + MAX_PAYLOAD);

/// Start byte + two length bytes.
const HEADER_LEN: usize = 3;

/// Direction of a frame on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameDirection {
    /// Host→device; the first payload byte is a command byte.
    HostToDevice,
    /// Device→host; the first payload byte is a response code.
    DeviceToHost,
}

impl FrameDirection {
    /// The start byte marking this direction on the wire.
    #[must_use]
    pub fn start_byte(self) -> u8 {
        match self {
            Self::HostToDevice => FRAME_START_HOST,
            Self::DeviceToHost => FRAME_START_DEVICE,
        }
    }

    /// Decode a start byte. `None` for anything that is not a marker.
    #[must_use]
    pub fn from_start_byte(byte: u8) -> Option<Self> {
        match byte {
            FRAME_START_HOST => Some(Self::HostToDevice),
            FRAME_START_DEVICE => Some(Self::DeviceToHost),
            _ => None,
        }
    }
}

/// An indivisible protocol unit on the wire.
///
/// A frame exists only in transit: the codec emits parsed frames to the
/// transport, and the transport serialises frames back to bytes. The payload
/// is owned (`Bytes`), so receivers may retain it without touching the
/// codec's reassembly buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Which way the frame travels.
    pub direction: FrameDirection,
    /// Code byte followed by the record body.
    pub payload: Bytes,
}

impl Frame {
    /// Create a host→device frame with `code` as the first payload byte.
    #[must_use]
    pub fn host(code: u8, body: &[u8]) -> Self {
        let mut payload = BytesMut::with_capacity(1 + body.len());
        payload.put_u8(code);
        payload.put_slice(body);
        Self { direction: FrameDirection::HostToDevice, payload: payload.freeze() }
    }

    /// Create a device→host frame from a complete payload.
    #[must_use]
    pub fn device(payload: impl Into<Bytes>) -> Self {
        Self { direction: FrameDirection::DeviceToHost, payload: payload.into() }
    }

    /// First payload byte. `None` for an empty payload.
    #[must_use]
    pub fn code(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Record body after the code byte. Empty for bare-code frames.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        self.payload.get(1..).unwrap_or(&[])
    }

    /// Encode into wire bytes.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if the payload exceeds
    ///   [`MAX_PAYLOAD`].
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        if self.payload.len() > MAX_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload.len(),
                max: MAX_PAYLOAD,
            });
        }

        dst.put_u8(self.direction.start_byte());
        dst.put_u16_le(self.payload.len() as u16);
        dst.put_slice(&self.payload);

        Ok(())
    }

    /// Encode into a fresh buffer.
    ///
    /// # Errors
    ///
    /// Same as [`Frame::encode`].
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.payload.len());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Result of feeding bytes into the codec.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    /// Frames completed by this chunk, in wire order.
    pub frames: Vec<Frame>,
    /// Bytes discarded because the reassembly buffer exceeded
    /// [`MAX_BUFFER`]. Zero in normal operation; a non-zero value should be
    /// surfaced to observers as a buffer-overflow event.
    pub dropped: usize,
}

/// Incremental frame reassembler.
///
/// Single-reader: one codec instance belongs to one transport's read loop.
///
/// # Invariants
///
/// - Split-insensitive: `push(a ++ b)` emits the same frames as
///   `push(a); push(b)`.
/// - Never emits a partial frame.
/// - The internal buffer never exceeds [`MAX_BUFFER`] after `push` returns.
#[derive(Debug, Default)]
pub struct FrameCodec {
    buf: BytesMut,
}

impl FrameCodec {
    /// Create an empty codec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently buffered awaiting a complete frame.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Feed a chunk of raw bytes and collect any completed frames.
    ///
    /// Malformed input is never an error: bytes that cannot begin a frame
    /// are skipped until the next plausible start byte. Loss is only
    /// reported when the buffer bound forces truncation.
    pub fn push(&mut self, chunk: &[u8]) -> PushOutcome {
        self.buf.extend_from_slice(chunk);

        let mut outcome = PushOutcome::default();

        loop {
            // Resynchronise: skip to the next plausible start byte.
            match self.buf.iter().position(|&b| FrameDirection::from_start_byte(b).is_some()) {
                Some(0) => {},
                Some(skip) => self.buf.advance(skip),
                None => {
                    self.buf.clear();
                    break;
                },
            }

            if self.buf.len() < HEADER_LEN {
                break;
            }

            let len = u16::from_le_bytes([self.buf[1], self.buf[2]]) as usize;
            if len > MAX_PAYLOAD {
                // Desynchronised: this was not a real header. Drop the start
                // byte and keep searching.
                self.buf.advance(1);
                continue;
            }

            if self.buf.len() < HEADER_LEN + len {
                break;
            }

            // Direction validated by the resynchronisation scan above.
            let Some(direction) = FrameDirection::from_start_byte(self.buf[0]) else {
                self.buf.advance(1);
                continue;
            };

            self.buf.advance(HEADER_LEN);
            let payload = self.buf.split_to(len).freeze();
            outcome.frames.push(Frame { direction, payload });
        }

        // Bound memory under adversarial input: truncate from the head so
        // the freshest bytes survive.
        if self.buf.len() > MAX_BUFFER {
            let excess = self.buf.len() - MAX_BUFFER;
            self.buf.advance(excess);
            outcome.dropped = excess;
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    impl Arbitrary for Frame {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
            (
                prop_oneof![
                    Just(FrameDirection::HostToDevice),
                    Just(FrameDirection::DeviceToHost)
                ],
                prop::collection::vec(any::<u8>(), 0..256),
            )
                .prop_map(|(direction, payload)| Frame { direction, payload: payload.into() })
                .boxed()
        }
    }

    fn encode(frame: &Frame) -> Vec<u8> {
        let mut wire = Vec::new();
        frame.encode(&mut wire).unwrap();
        wire
    }

    #[test]
    fn frame_accessors() {
        let frame = Frame::host(22, &[0x08]);
        assert_eq!(frame.code(), Some(22));
        assert_eq!(frame.body(), &[0x08]);
        assert_eq!(frame.payload.len(), 2);

        let empty = Frame::device(Bytes::new());
        assert_eq!(empty.code(), None);
        assert_eq!(empty.body(), &[] as &[u8]);
    }

    #[test]
    fn encode_layout() {
        let frame = Frame::device(vec![0x00, 0xAB]);
        assert_eq!(encode(&frame), vec![0x3E, 0x02, 0x00, 0x00, 0xAB]);

        let frame = Frame::host(6, &[0x80, 0x00, 0x92, 0x65]);
        assert_eq!(encode(&frame), vec![0x3C, 0x05, 0x00, 6, 0x80, 0x00, 0x92, 0x65]);
    }

    #[test]
    fn reject_oversized_payload() {
        let frame = Frame::device(vec![0u8; MAX_PAYLOAD + 1]);
        let mut wire = Vec::new();
        assert!(matches!(
            frame.encode(&mut wire),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn push_single_frame() {
        let frame = Frame::device(vec![0x00]);
        let mut codec = FrameCodec::new();
        let outcome = codec.push(&encode(&frame));
        assert_eq!(outcome.frames, vec![frame]);
        assert_eq!(outcome.dropped, 0);
        assert_eq!(codec.buffered(), 0);
    }

    #[test]
    fn push_byte_at_a_time() {
        let frame = Frame::device(vec![0x0D, 1, 2, 3]);
        let wire = encode(&frame);

        let mut codec = FrameCodec::new();
        let mut frames = Vec::new();
        for byte in &wire {
            frames.extend(codec.push(std::slice::from_ref(byte)).frames);
        }
        assert_eq!(frames, vec![frame]);
    }

    #[test]
    fn resynchronises_past_noise() {
        let frame = Frame::device(vec![0x09, 0xAA]);
        let mut wire = vec![0x00, 0xFF, 0x13, 0x37];
        wire.extend(encode(&frame));

        let mut codec = FrameCodec::new();
        let outcome = codec.push(&wire);
        assert_eq!(outcome.frames, vec![frame]);
    }

    #[test]
    fn implausible_length_forces_resync() {
        // A start byte followed by a length beyond MAX_PAYLOAD, then a real
        // frame. The bogus header must be skipped, not trusted.
        let frame = Frame::device(vec![0x00]);
        let mut wire = vec![0x3E, 0xFF, 0xFF];
        wire.extend(encode(&frame));

        let mut codec = FrameCodec::new();
        let outcome = codec.push(&wire);
        assert_eq!(outcome.frames, vec![frame]);
    }

    #[test]
    fn pathological_input_stays_bounded() {
        // Runs of start bytes, runs of noise, and an incomplete frame header
        // must all leave the buffer within its bound.
        let mut codec = FrameCodec::new();
        for chunk in [vec![0x3E; 5000], vec![0x00; 5000], vec![0x3E, 0xFF, 0x0F], vec![0xAB; 100]]
        {
            codec.push(&chunk);
            assert!(codec.buffered() <= MAX_BUFFER);
        }
        // The incomplete frame is still pending; completing it flushes the
        // buffer entirely.
        let outcome = codec.push(&vec![0xCD; 4095 - 100]);
        assert_eq!(outcome.frames.len(), 1);
        assert_eq!(outcome.frames[0].payload.len(), 4095);
        assert_eq!(codec.buffered(), 0);
    }

    proptest! {
        #[test]
        fn round_trip(frame in any::<Frame>()) {
            let mut codec = FrameCodec::new();
            let outcome = codec.push(&encode(&frame));
            prop_assert_eq!(outcome.frames, vec![frame]);
            prop_assert_eq!(outcome.dropped, 0);
        }

        #[test]
        fn split_insensitive(frames in prop::collection::vec(any::<Frame>(), 1..8), split in any::<prop::sample::Index>()) {
            let mut wire = Vec::new();
            for frame in &frames {
                frame.encode(&mut wire).unwrap();
            }
            let at = split.index(wire.len() + 1);

            let mut whole = FrameCodec::new();
            let all = whole.push(&wire).frames;

            let mut halves = FrameCodec::new();
            let mut split_frames = halves.push(&wire[..at]).frames;
            split_frames.extend(halves.push(&wire[at..]).frames);

            prop_assert_eq!(all, split_frames);
        }

        #[test]
        fn bounded_buffer(chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 0..64)) {
            let mut codec = FrameCodec::new();
            for chunk in &chunks {
                codec.push(chunk);
                prop_assert!(codec.buffered() <= MAX_BUFFER);
            }
        }
    }
}
