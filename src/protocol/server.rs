//! Request/response loop.

use std::io::{self, BufRead, Write};

use super::command::Response;
use super::dispatcher::Dispatcher;
use super::transport::{Frame, FrameReader, FrameWriter};
use crate::engine::CpSolver;

/// Serves framed requests from `input` until end of input.
///
/// Each request is answered before the next is read. Returns the number of
/// frames answered. Only I/O failures end the loop early.
pub fn serve<S, R, W>(
    dispatcher: &Dispatcher<S>,
    input: R,
    output: W,
    max_frame_bytes: usize,
) -> io::Result<u64>
where
    S: CpSolver,
    R: BufRead,
    W: Write,
{
    let mut reader = FrameReader::new(input, max_frame_bytes);
    let mut writer = FrameWriter::new(output);
    let mut answered = 0u64;

    tracing::info!(max_frame_bytes, "server ready");

    while let Some(frame) = reader.read_frame()? {
        let reply = match frame {
            Frame::Payload(request) => dispatcher.handle_request(&request),
            Frame::Invalid(reason) => {
                tracing::warn!(%reason, "rejected frame");
                Response::error(reason).to_json()
            }
        };
        writer.write_frame(&reply)?;
        answered += 1;
    }

    tracing::info!(answered, "input closed, server stopping");
    Ok(answered)
}
