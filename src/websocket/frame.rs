//! RFC 6455 frame codec: header parsing, mask enforcement, fragmentation
//! reassembly and control-frame dispatch.
//!
//! Mirrors the teacher's request parser in shape — a small state machine
//! reading directly off the connection's `TcpStream` with a timeout-guarded
//! read — generalised from HTTP's CRLF framing to WebSocket's binary one.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const MAX_CONTROL_PAYLOAD: usize = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpCode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl OpCode {
    fn from_byte(byte: u8) -> Result<Self, FrameError> {
        match byte {
            0x0 => Ok(OpCode::Continuation),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            other => Err(FrameError::UnknownOpcode(other)),
        }
    }

    fn into_byte(self) -> u8 {
        match self {
            OpCode::Continuation => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
        }
    }

    fn is_control(self) -> bool {
        matches!(self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }
}

#[derive(Debug)]
pub(crate) enum FrameError {
    Io(io::Error),
    UnexpectedEof,
    ReservedBitsSet,
    UnmaskedClientFrame,
    ControlFrameFragmented,
    ControlFrameTooLarge,
    UnknownOpcode(u8),
    ContinuationWithoutMessage,
    MessageTooLarge,
}

impl From<io::Error> for FrameError {
    fn from(err: io::Error) -> Self {
        FrameError::Io(err)
    }
}

struct FrameHeader {
    fin: bool,
    rsv1: bool,
    opcode: OpCode,
    mask: [u8; 4],
    payload_len: u64,
}

async fn read_header<R: AsyncRead + Unpin>(stream: &mut R) -> Result<FrameHeader, FrameError> {
    let mut prefix = [0u8; 2];
    read_exact_or_eof(stream, &mut prefix).await?;

    let fin = prefix[0] & 0b1000_0000 != 0;
    let rsv1 = prefix[0] & 0b0100_0000 != 0;
    let rsv2_rsv3 = prefix[0] & 0b0011_0000 != 0;
    let opcode = OpCode::from_byte(prefix[0] & 0b0000_1111)?;

    if rsv2_rsv3 {
        return Err(FrameError::ReservedBitsSet);
    }

    let masked = prefix[1] & 0b1000_0000 != 0;
    if !masked {
        return Err(FrameError::UnmaskedClientFrame);
    }

    let length_code = prefix[1] & 0x7F;
    let payload_len = match length_code {
        126 => {
            let mut ext = [0u8; 2];
            read_exact_or_eof(stream, &mut ext).await?;
            u16::from_be_bytes(ext) as u64
        }
        127 => {
            let mut ext = [0u8; 8];
            read_exact_or_eof(stream, &mut ext).await?;
            u64::from_be_bytes(ext)
        }
        code => code as u64,
    };

    if opcode.is_control() {
        if !fin {
            return Err(FrameError::ControlFrameFragmented);
        }
        if payload_len > MAX_CONTROL_PAYLOAD as u64 {
            return Err(FrameError::ControlFrameTooLarge);
        }
    }

    let mut mask = [0u8; 4];
    read_exact_or_eof(stream, &mut mask).await?;

    Ok(FrameHeader { fin, rsv1, opcode, mask, payload_len })
}

async fn read_exact_or_eof<R: AsyncRead + Unpin>(
    stream: &mut R,
    buf: &mut [u8],
) -> Result<(), FrameError> {
    stream.read_exact(buf).await.map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => FrameError::UnexpectedEof,
        _ => FrameError::Io(err),
    })
}

fn unmask(mask: [u8; 4], offset: usize, payload: &mut [u8]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= mask[(offset + i) % 4];
    }
}

/// A fully assembled WebSocket message or control event, handed to the
/// active message protocol.
pub(crate) enum Event {
    Text(Vec<u8>),
    Binary(Vec<u8>),
    /// Already answered with a `pong` by [`FrameReader::read_event`]; passed
    /// through only so callers can log/observe it.
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    /// Close has already been echoed back; the connection should shut down.
    Close,
}

/// Reassembles fragmented messages and answers control frames inline.
pub(crate) struct FrameReader {
    max_message_size: u64,
    fragment: Option<(OpCode, Vec<u8>, bool)>,
}

impl FrameReader {
    pub(crate) fn new(max_message_size: u64) -> Self {
        FrameReader { max_message_size, fragment: None }
    }

    /// Reads frames until one complete message or control event is
    /// available, responding to `ping`/`close` as it goes (RFC 6455 §5.5).
    pub(crate) async fn read_event<S: AsyncRead + AsyncWrite + Unpin>(
        &mut self,
        stream: &mut S,
    ) -> Result<Event, FrameError> {
        loop {
            let header = read_header(stream).await?;
            let mut payload = vec![0u8; header.payload_len as usize];
            stream.read_exact(&mut payload).await?;
            unmask(header.mask, 0, &mut payload);

            match header.opcode {
                OpCode::Ping => {
                    write_frame(stream, OpCode::Pong, &payload, true).await?;
                    return Ok(Event::Ping(payload));
                }
                OpCode::Pong => return Ok(Event::Pong(payload)),
                OpCode::Close => {
                    write_frame(stream, OpCode::Close, &payload, true).await?;
                    return Ok(Event::Close);
                }
                OpCode::Continuation => {
                    let Some((opcode, mut buffer, rsv1)) = self.fragment.take() else {
                        return Err(FrameError::ContinuationWithoutMessage);
                    };
                    self.append(&mut buffer, &payload)?;

                    if header.fin {
                        return Ok(self.finish(opcode, buffer, rsv1));
                    }
                    self.fragment = Some((opcode, buffer, rsv1));
                }
                OpCode::Text | OpCode::Binary if header.fin => {
                    return Ok(self.finish(header.opcode, payload, header.rsv1));
                }
                OpCode::Text | OpCode::Binary => {
                    self.fragment = Some((header.opcode, payload, header.rsv1));
                }
            }
        }
    }

    fn append(&self, buffer: &mut Vec<u8>, chunk: &[u8]) -> Result<(), FrameError> {
        if buffer.len() as u64 + chunk.len() as u64 > self.max_message_size {
            return Err(FrameError::MessageTooLarge);
        }
        buffer.extend_from_slice(chunk);
        Ok(())
    }

    fn finish(&mut self, opcode: OpCode, payload: Vec<u8>, rsv1: bool) -> Event {
        // Compressed-message decompression happens one layer up, in the
        // message protocol, which owns the `PerMessageDeflate` state; this
        // reader only tracks whether RSV1 was set on the opening frame.
        let _ = rsv1;
        match opcode {
            OpCode::Text => Event::Text(payload),
            _ => Event::Binary(payload),
        }
    }
}

/// Writes an unmasked server-to-client frame (servers never mask, RFC 6455
/// §5.1).
pub(crate) async fn write_frame<S: AsyncWrite + Unpin>(
    stream: &mut S,
    opcode: OpCode,
    payload: &[u8],
    rsv1: bool,
) -> Result<(), io::Error> {
    let mut head = Vec::with_capacity(10 + payload.len());
    let first = 0b1000_0000 | (if rsv1 { 0b0100_0000 } else { 0 }) | opcode.into_byte();
    head.push(first);

    match payload.len() {
        len @ 0..=125 => head.push(len as u8),
        len @ 126..=0xFFFF => {
            head.push(126);
            head.extend_from_slice(&(len as u16).to_be_bytes());
        }
        len => {
            head.push(127);
            head.extend_from_slice(&(len as u64).to_be_bytes());
        }
    }

    head.extend_from_slice(payload);
    stream.write_all(&head).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masked_frame(fin: bool, opcode: OpCode, mask: [u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.push((if fin { 0x80 } else { 0 }) | opcode.into_byte());
        frame.push(0x80 | payload.len() as u8);
        frame.extend_from_slice(&mask);
        let mut masked = payload.to_vec();
        unmask(mask, 0, &mut masked);
        frame.extend_from_slice(&masked);
        frame
    }

    #[tokio::test]
    async fn reads_a_single_text_frame() {
        let frame = masked_frame(true, OpCode::Text, [1, 2, 3, 4], b"hi");
        let (mut client, mut server) = tokio::io::duplex(256);
        client.write_all(&frame).await.unwrap();
        drop(client);

        let mut reader = FrameReader::new(1 << 20);
        match reader.read_event(&mut server).await.unwrap() {
            Event::Text(payload) => assert_eq!(payload, b"hi"),
            _ => panic!("expected a text message"),
        }
    }

    #[tokio::test]
    async fn reassembles_a_fragmented_message() {
        let mut frames = masked_frame(false, OpCode::Text, [9, 9, 9, 9], b"hel");
        frames.extend(masked_frame(true, OpCode::Continuation, [1, 1, 1, 1], b"lo"));

        let (mut client, mut server) = tokio::io::duplex(256);
        client.write_all(&frames).await.unwrap();
        drop(client);

        let mut reader = FrameReader::new(1 << 20);
        match reader.read_event(&mut server).await.unwrap() {
            Event::Text(payload) => assert_eq!(payload, b"hello"),
            _ => panic!("expected a reassembled text message"),
        }
    }

    #[tokio::test]
    async fn answers_ping_with_pong() {
        let frame = masked_frame(true, OpCode::Ping, [5, 6, 7, 8], b"ok");
        let (mut client, mut server) = tokio::io::duplex(256);
        client.write_all(&frame).await.unwrap();

        let mut reader = FrameReader::new(1 << 20);
        match reader.read_event(&mut server).await.unwrap() {
            Event::Ping(payload) => assert_eq!(payload, b"ok"),
            _ => panic!("expected a ping event"),
        }

        let mut echoed = [0u8; 4];
        client.read_exact(&mut echoed).await.unwrap();
        assert_eq!(echoed[0], 0x80 | OpCode::Pong.into_byte());
    }

    #[tokio::test]
    async fn rejects_unmasked_client_frames() {
        let frame = [0x81, 0x02, b'h', b'i'];
        let (mut client, mut server) = tokio::io::duplex(256);
        client.write_all(&frame).await.unwrap();
        drop(client);

        let mut reader = FrameReader::new(1 << 20);
        assert!(matches!(
            reader.read_event(&mut server).await,
            Err(FrameError::UnmaskedClientFrame)
        ));
    }
}
