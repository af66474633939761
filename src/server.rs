use std::{
    io::{BufRead, BufReader, Read},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::Arc,
    thread,
};

use log::{debug, info, warn};

use crate::{
    handler::StaticHandler,
    request::{Request, RequestError},
    response::{ErrResponse, Response},
    status::{ClientError, Status},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO failed: `{0:?}`")]
    IO(#[from] std::io::Error),
    #[error("Invalid request: `{0:?}`")]
    Request(#[from] RequestError),
    #[error("Request not utf8: `{0:?}`")]
    Utf8(#[from] std::string::FromUtf8Error),
}

type Result<T> = std::result::Result<T, Error>;

/// Read the request line, then drain header lines without interpreting
/// them, so the peer isn't cut off before it finishes writing.
fn read_request<R: BufRead>(reader: &mut R) -> Result<Request> {
    let mut line = Vec::with_capacity(1024);
    (&mut *reader).take(8194).read_until(b'\n', &mut line)?;
    let request = String::from_utf8(line)?.parse()?;
    loop {
        let mut header = Vec::with_capacity(1024);
        let n = (&mut *reader).take(8194).read_until(b'\n', &mut header)?;
        if n == 0 || header == b"\r\n" || header == b"\n" {
            break;
        }
    }
    Ok(request)
}

fn error_response(e: Error) -> Response {
    let msg = match e {
        // The connection is broken; whatever we say is unlikely to arrive.
        Error::IO(_) => None,
        Error::Utf8(e) => Some(format!("{e:?}").replace('\n', " ").into()), // HACK
        Error::Request(ref e) => Some(e.to_string().into()),
    };
    Response::Err(ErrResponse {
        status: Status::ClientError(ClientError::BadRequest),
        msg,
    })
}

fn handle(handler: &StaticHandler, stream: &TcpStream) {
    let mut reader = BufReader::new(stream);
    let response = match read_request(&mut reader) {
        Ok(request) => handler.handle_request(&request),
        Err(e) => error_response(e),
    };
    let _ = response
        .send(stream)
        .inspect_err(|e| warn!("Failed to send response: {e:?}"));
}

pub struct Server {
    listener: TcpListener,
    handler: Arc<StaticHandler>,
}

impl Server {
    pub fn new(handler: StaticHandler, port: u16) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(format!("[::]:{port}"))?;
        Ok(Self {
            listener,
            handler: Arc::new(handler),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept forever, one thread per connection. Requests share nothing
    /// but the immutable handler, so they need no coordination.
    pub fn run(self) -> anyhow::Result<()> {
        info!("listening on {}", self.listener.local_addr()?);
        loop {
            let (stream, peer) = self.listener.accept()?;
            debug!("connection from {peer}");
            let handler = self.handler.clone();
            thread::spawn(move || handle(&handler, &stream));
        }
    }
}
