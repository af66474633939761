use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use bytes::Bytes;
use log::debug;

use crate::{
    request::{Method, Request},
    response::{ErrResponse, FixedResponse, Response, StreamResponse},
    status::{ClientError, ServerError, Status, Success},
};

/// The directory this server exposes. Validated once at startup and
/// immutable from then on.
#[derive(Debug, Clone)]
pub struct ServerRoot(PathBuf);

#[derive(Debug, thiserror::Error)]
pub enum ServerRootError {
    #[error("{}: no such directory", .0.display())]
    Missing(PathBuf),
    #[error("{} isn't a directory", .0.display())]
    NotADirectory(PathBuf),
}

impl ServerRoot {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ServerRootError> {
        let path: PathBuf = path.into();
        let path = path
            .canonicalize()
            .map_err(|_| ServerRootError::Missing(path))?;
        if !path.is_dir() {
            return Err(ServerRootError::NotADirectory(path));
        }
        Ok(Self(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// What a request path turned out to denote, per a non-follow stat.
/// Symlinks land in `Other` no matter what they point at: a symlinked
/// directory is never traversed as a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    RegularFile,
    Other,
}

#[derive(Debug)]
pub struct ResolvedEntry {
    path: PathBuf,
    kind: EntryKind,
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("file not found")]
    NotFound,
    #[error("failed to open file")]
    Open(#[source] std::io::Error),
    #[error("file isn't a regular file or directory")]
    UnsupportedEntryKind,
    #[error("failed to render directory listing: {0}")]
    ListingRead(std::io::Error),
    #[error("method not allowed")]
    MethodNotAllowed,
}

#[rustfmt::skip]
impl From<&ServeError> for Status {
    fn from(value: &ServeError) -> Self {
        match value {
            ServeError::NotFound             => Status::ClientError(ClientError::NotFound),
            ServeError::Open(_)              => Status::ServerError(ServerError::Internal),
            ServeError::UnsupportedEntryKind => Status::ClientError(ClientError::Forbidden),
            ServeError::ListingRead(_)       => Status::ServerError(ServerError::Internal),
            ServeError::MethodNotAllowed     => Status::ClientError(ClientError::MethodNotAllowed),
        }
    }
}

/// Structurally join a request path onto the root: empty and `.` segments
/// vanish, `..` pops a component (bottoming out at the filesystem root),
/// anything else is pushed. Purely lexical, so a path with enough leading
/// `..` segments resolves outside the root; see `handle_request`.
fn lexical_join(root: &Path, request_path: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                path.pop();
            }
            segment => path.push(segment),
        }
    }
    path
}

const LISTING_STYLE: &str = "<style>html { font-family: monospace; } \
     table { border: none; margin: 1rem; } td { padding-right: 2rem; }</style>\n";

/// Render a directory's immediate children as an HTML table, one row per
/// child, in whatever order the filesystem hands them back.
fn render_listing(dir: &Path, request_path: &str) -> std::io::Result<Bytes> {
    let base = request_path.trim_end_matches('/');
    let mut html = String::from(LISTING_STYLE);
    html.push_str("<table>");
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let href = format!("{base}/{name}");
        html.push_str("<tr>");
        if file_type.is_dir() {
            html.push_str(&format!("<td><a href=\"{href}/\">{name}/</a></td>\n"));
        } else if !file_type.is_file() {
            html.push_str(&format!("<td><p style=\"color: #777\">{name}</p></td>\n"));
        } else {
            let size = entry.metadata()?.len();
            html.push_str(&format!(
                "<td><a href=\"{href}\">{name}</a></td><td>{size}</td>\n"
            ));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    Ok(html.into())
}

/// Serves the tree under a [`ServerRoot`]: files verbatim, directories as
/// their `index.html` or a generated listing. Holds no per-request state,
/// so one instance is shared by every connection thread.
#[derive(Debug)]
pub struct StaticHandler {
    root: ServerRoot,
}

impl StaticHandler {
    pub fn new(root: ServerRoot) -> Self {
        Self { root }
    }

    fn resolve(&self, request_path: &str) -> Result<ResolvedEntry, ServeError> {
        let path = lexical_join(self.root.path(), request_path);
        // Missing, permission denied, I/O trouble: all the same 404.
        let meta = fs::symlink_metadata(&path).map_err(|_| ServeError::NotFound)?;
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else if meta.is_file() {
            EntryKind::RegularFile
        } else {
            EntryKind::Other
        };
        Ok(ResolvedEntry { path, kind })
    }

    fn serve(&self, request: &Request) -> Result<Response, ServeError> {
        if request.method() != &Method::Get {
            return Err(ServeError::MethodNotAllowed);
        }
        let entry = self.resolve(request.path())?;
        debug!("{} -> {} ({:?})", request.path(), entry.path.display(), entry.kind);
        match entry.kind {
            EntryKind::Other => Err(ServeError::UnsupportedEntryKind),
            EntryKind::RegularFile => {
                let file = File::open(&entry.path).map_err(ServeError::Open)?;
                Ok(Response::Stream(StreamResponse {
                    status: Success::Ok,
                    file,
                }))
            }
            EntryKind::Directory => {
                // XXX: a symlink named "index.html" is followed and served
                // here. An extra lstat would catch it, but the scenario is
                // too rare to justify the additional file operation.
                if let Ok(file) = File::open(entry.path.join("index.html")) {
                    return Ok(Response::Stream(StreamResponse {
                        status: Success::Ok,
                        file,
                    }));
                }
                let body = render_listing(&entry.path, request.path())
                    .map_err(ServeError::ListingRead)?;
                Ok(Response::Fixed(FixedResponse {
                    status: Success::Ok,
                    body,
                }))
            }
        }
    }

    /// Map one request to one terminal response. The join onto the root is
    /// lexical, not a sandbox: a request carrying enough `..` segments will
    /// be served from outside the root. Deliberate; see the tests.
    pub fn handle_request(&self, request: &Request) -> Response {
        self.serve(request).unwrap_or_else(|e| {
            Response::Err(ErrResponse {
                status: Status::from(&e),
                msg: Some(e.to_string().into()),
            })
        })
    }
}

#[cfg(test)]
mod test_server_root {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn can_only_be_constructed_around_an_extant_directory() -> Result<()> {
        assert!(!PathBuf::from("/foo/bar/baz/blah").exists()); // sanity
        assert!(matches!(
            ServerRoot::new("/foo/bar/baz/blah"),
            Err(ServerRootError::Missing(_))
        ));

        let dir = TempDir::new()?;
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "not a directory")?;
        assert!(matches!(
            ServerRoot::new(&file),
            Err(ServerRootError::NotADirectory(_))
        ));

        let root = ServerRoot::new(dir.path())?;
        assert!(root.path().is_absolute());
        Ok(())
    }
}

#[cfg(test)]
mod test_lexical_join {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::bare_root("/", "")]
    #[case::dot("/.", "")]
    #[case::simple("/foo", "foo")]
    #[case::nested("/foo/bar", "foo/bar")]
    #[case::redundant_separators("//foo///bar", "foo/bar")]
    #[case::dot_segments("/./foo/./bar", "foo/bar")]
    #[case::parent_within_root("/foo/../bar", "bar")]
    #[case::trailing_slash("/foo/", "foo")]
    fn stays_within_the_root_for_well_formed_paths(
        #[case] request_path: &str,
        #[case] relative: &str,
    ) {
        let root = Path::new("/srv/root");
        assert_eq!(lexical_join(root, request_path), root.join(relative));
    }

    #[test]
    fn escapes_the_root_given_enough_parent_segments() {
        let root = Path::new("/srv/root");
        assert_eq!(
            lexical_join(root, "/../../etc/passwd"),
            PathBuf::from("/etc/passwd")
        );
    }

    #[test]
    fn popping_bottoms_out_at_the_filesystem_root() {
        assert_eq!(
            lexical_join(Path::new("/srv"), "/../../../.."),
            PathBuf::from("/")
        );
    }
}
