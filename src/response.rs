use std::{fs::File, io::Write};

use bytes::Bytes;

use crate::status::{Status, Success};

pub struct ErrResponse {
    pub status: Status,
    pub msg: Option<Bytes>,
}

/// A response whose body is already in memory (the directory listing).
pub struct FixedResponse {
    pub status: Success,
    pub body: Bytes,
}

/// A response streamed straight from an open file. The handle lives inside
/// the response, so it is closed when the response is dropped, whichever
/// way sending goes.
pub struct StreamResponse {
    pub status: Success,
    pub file: File,
}

pub enum Response {
    Err(ErrResponse),
    Fixed(FixedResponse),
    Stream(StreamResponse),
}

impl Response {
    pub fn status(&self) -> Status {
        match self {
            Self::Err(resp) => resp.status,
            Self::Fixed(resp) => Status::Success(resp.status),
            Self::Stream(resp) => Status::Success(resp.status),
        }
    }

    /// Send this response. The connection is always closed afterwards, so
    /// no Content-Length is needed; what the body is is left to the client
    /// to infer from its content.
    pub fn send<W: Write>(self, mut writer: W) -> std::io::Result<()> {
        write!(writer, "HTTP/1.1 {}\r\nConnection: close\r\n\r\n", self.status())?;
        match self {
            Self::Err(resp) => {
                if let Some(msg) = resp.msg {
                    writer.write_all(&msg)?;
                    writer.write_all(b"\n")?;
                }
            }
            Self::Fixed(resp) => {
                writer.write_all(&resp.body)?;
            }
            Self::Stream(mut resp) => {
                // Best effort: a read error mid-copy aborts the body.
                std::io::copy(&mut resp.file, &mut writer)?;
            }
        }
        Ok(())
    }
}
