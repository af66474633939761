/// An HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(u16);

/// The server has succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Success {
    Ok,
}

/// The client asked for something it shouldn't have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientError {
    BadRequest,
    Forbidden,
    NotFound,
    MethodNotAllowed,
}

/// The server isn't feeling so well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerError {
    Internal,
}

/// A status, according to its logical kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success(Success),
    ClientError(ClientError),
    ServerError(ServerError),
}

#[rustfmt::skip]
impl From<&Status> for StatusCode {
    fn from(value: &Status) -> Self {
        match value {
            Status::Success(Success::Ok)                        => StatusCode(200),
            Status::ClientError(ClientError::BadRequest)        => StatusCode(400),
            Status::ClientError(ClientError::Forbidden)         => StatusCode(403),
            Status::ClientError(ClientError::NotFound)          => StatusCode(404),
            Status::ClientError(ClientError::MethodNotAllowed)  => StatusCode(405),
            Status::ServerError(ServerError::Internal)          => StatusCode(500),
        }
    }
}

#[rustfmt::skip]
impl Status {
    pub fn reason(&self) -> &'static str {
        match self {
            Status::Success(Success::Ok)                        => "OK",
            Status::ClientError(ClientError::BadRequest)        => "Bad Request",
            Status::ClientError(ClientError::Forbidden)         => "Forbidden",
            Status::ClientError(ClientError::NotFound)          => "Not Found",
            Status::ClientError(ClientError::MethodNotAllowed)  => "Method Not Allowed",
            Status::ServerError(ServerError::Internal)          => "Internal Server Error",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", StatusCode::from(self).0, self.reason())
    }
}
