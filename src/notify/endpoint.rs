// SPDX-License-Identifier: Apache-2.0 OR MIT
// Endpoints: the sinks formatted log lines are written to

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

/// What makes two sinks "the same" endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SinkIdentity {
    /// The process console (stdout)
    Console,
    /// A file, keyed by device and inode
    File { dev: u64, ino: u64 },
    /// A file on platforms without inode numbers, keyed by canonical path
    Path(PathBuf),
}

/// Output sink for formatted log lines
pub trait LogSink: Send {
    /// Write one line; the sink appends the newline
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Flush any buffered output
    fn flush(&mut self) -> io::Result<()>;

    /// Identity used to collapse duplicates. `None` means the sink is never
    /// considered equal to another one.
    fn identity(&self) -> Option<SinkIdentity> {
        None
    }

    /// Short human-readable name for warnings
    fn describe(&self) -> String;
}

/// Standard output sink. Never closed by a notifier.
pub struct ConsoleSink {
    stdout: io::Stdout,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for ConsoleSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut out = self.stdout.lock();
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }

    fn identity(&self) -> Option<SinkIdentity> {
        Some(SinkIdentity::Console)
    }

    fn describe(&self) -> String {
        "stdout".to_string()
    }
}

/// Append-only file sink. The file is closed when the sink is dropped.
pub struct FileSink {
    writer: BufWriter<File>,
    identity: Option<SinkIdentity>,
    label: String,
}

impl FileSink {
    /// Open `path` for appending, creating it (mode 0600) if needed
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = open_append(path)?;
        Ok(Self::from_file(file, Some(path)))
    }

    /// Wrap an already-open handle
    pub fn from_file(file: File, path: Option<&Path>) -> Self {
        let identity = file_identity(&file, path);
        let label = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "file handle".to_string());
        Self {
            writer: BufWriter::new(file),
            identity,
            label,
        }
    }
}

impl LogSink for FileSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn identity(&self) -> Option<SinkIdentity> {
        self.identity.clone()
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Sink that keeps lines in memory. Clones share the same buffer, so one
/// clone can be handed to a notifier and another kept for reading.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LogSink for MemorySink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Something that can become an endpoint
pub enum EndpointRef {
    /// The process console
    Console,
    /// A log file path (opened append-only, parents created)
    Path(PathBuf),
    /// An already-open file handle
    File(File),
    /// Any other sink
    Sink(Box<dyn LogSink>),
}

impl EndpointRef {
    /// Interpret a textual endpoint: `stdout` and `-` name the console,
    /// anything else is a path.
    pub fn from_spec(spec: &str) -> Self {
        match spec {
            "stdout" | "-" => EndpointRef::Console,
            path => EndpointRef::Path(PathBuf::from(path)),
        }
    }
}

impl fmt::Debug for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRef::Console => write!(f, "Console"),
            EndpointRef::Path(path) => f.debug_tuple("Path").field(path).finish(),
            EndpointRef::File(file) => f.debug_tuple("File").field(file).finish(),
            EndpointRef::Sink(sink) => write!(f, "Sink({})", sink.describe()),
        }
    }
}

impl From<&str> for EndpointRef {
    fn from(path: &str) -> Self {
        EndpointRef::Path(PathBuf::from(path))
    }
}

impl From<String> for EndpointRef {
    fn from(path: String) -> Self {
        EndpointRef::Path(PathBuf::from(path))
    }
}

impl From<&Path> for EndpointRef {
    fn from(path: &Path) -> Self {
        EndpointRef::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for EndpointRef {
    fn from(path: PathBuf) -> Self {
        EndpointRef::Path(path)
    }
}

impl From<File> for EndpointRef {
    fn from(file: File) -> Self {
        EndpointRef::File(file)
    }
}

impl From<Box<dyn LogSink>> for EndpointRef {
    fn from(sink: Box<dyn LogSink>) -> Self {
        EndpointRef::Sink(sink)
    }
}

impl From<MemorySink> for EndpointRef {
    fn from(sink: MemorySink) -> Self {
        EndpointRef::Sink(Box::new(sink))
    }
}

/// Tracks which files are owned by live notifiers, so two notifiers sharing
/// a registry never write to the same file.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    claimed: Arc<Mutex<HashSet<SinkIdentity>>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `identity`; false if another notifier already holds it
    pub fn claim(&self, identity: &SinkIdentity) -> bool {
        self.lock().insert(identity.clone())
    }

    pub fn release(&self, identity: &SinkIdentity) {
        self.lock().remove(identity);
    }

    pub fn is_claimed(&self, identity: &SinkIdentity) -> bool {
        self.lock().contains(identity)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<SinkIdentity>> {
        self.claimed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ordered, duplicate-free list of sinks owned by one notifier
pub struct EndpointSet {
    sinks: Vec<Box<dyn LogSink>>,
    registry: Option<EndpointRegistry>,
    claimed: Vec<SinkIdentity>,
}

impl EndpointSet {
    pub fn new(registry: Option<EndpointRegistry>) -> Self {
        Self {
            sinks: Vec::new(),
            registry,
            claimed: Vec::new(),
        }
    }

    /// Add an endpoint. Returns false when the reference was rejected and
    /// contributes no sink. Duplicates are accepted but collapse onto the
    /// first entry.
    pub fn add(&mut self, reference: impl Into<EndpointRef>) -> bool {
        let sink: Box<dyn LogSink> = match reference.into() {
            EndpointRef::Console => Box::new(ConsoleSink::new()),
            EndpointRef::Path(path) => match open_log_path(&path) {
                Some(sink) => sink,
                None => return false,
            },
            EndpointRef::File(file) => Box::new(FileSink::from_file(file, None)),
            EndpointRef::Sink(sink) => sink,
        };
        self.insert(sink)
    }

    fn insert(&mut self, sink: Box<dyn LogSink>) -> bool {
        let Some(identity) = sink.identity() else {
            self.sinks.push(sink);
            return true;
        };

        if self
            .sinks
            .iter()
            .any(|existing| existing.identity().as_ref() == Some(&identity))
        {
            return true;
        }

        if identity != SinkIdentity::Console {
            if let Some(registry) = &self.registry {
                if !registry.claim(&identity) {
                    warn!(
                        target: "notify",
                        "{} is already used by another notifier; skipping it",
                        sink.describe()
                    );
                    return false;
                }
                self.claimed.push(identity);
            }
        }

        self.sinks.push(sink);
        true
    }

    /// Fall back to the console when nothing usable was added
    pub fn ensure_console(&mut self) {
        if self.sinks.is_empty() {
            warn!(target: "notify", "no usable endpoints; routing all notes to stdout");
            self.sinks.push(Box::new(ConsoleSink::new()));
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Identities in insertion order
    pub fn identities(&self) -> Vec<Option<SinkIdentity>> {
        self.sinks.iter().map(|sink| sink.identity()).collect()
    }

    /// Write a line to every sink. Failures are warned, never logged, so a
    /// broken endpoint cannot feed back into the queue.
    pub fn write_line(&mut self, line: &str) {
        for (i, sink) in self.sinks.iter_mut().enumerate() {
            if let Err(e) = sink.write_line(line) {
                warn!(
                    target: "notify",
                    "failed writing to endpoint {} ({}): {}",
                    i + 1,
                    sink.describe(),
                    e
                );
            }
        }
    }

    pub fn flush(&mut self) {
        for (i, sink) in self.sinks.iter_mut().enumerate() {
            if let Err(e) = sink.flush() {
                warn!(
                    target: "notify",
                    "failed flushing endpoint {} ({}): {}",
                    i + 1,
                    sink.describe(),
                    e
                );
            }
        }
    }

    /// Flush and close every sink except the console
    pub fn close(&mut self) {
        self.flush();
        self.sinks
            .retain(|sink| sink.identity() == Some(SinkIdentity::Console));
        self.release_claims();
    }

    fn release_claims(&mut self) {
        if let Some(registry) = &self.registry {
            for identity in self.claimed.drain(..) {
                registry.release(&identity);
            }
        }
    }
}

impl Drop for EndpointSet {
    fn drop(&mut self) {
        self.release_claims();
    }
}

/// Turn a path into a sink.
///
/// A directory is rejected (`None`). Missing parents are created; any open
/// failure degrades to the console.
fn open_log_path(path: &Path) -> Option<Box<dyn LogSink>> {
    if !path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("log"))
    {
        warn!(target: "notify", "log file {} does not have a .log extension", path.display());
    }

    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            warn!(
                target: "notify",
                "{} is a directory; notifications will not be written to it",
                path.display()
            );
            return None;
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if let Some(dir) = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty() && !dir.exists())
            {
                if let Err(e) = create_parent_dirs(dir) {
                    warn!(
                        target: "notify",
                        "log file directory {} does not exist and could not be created: {}",
                        dir.display(),
                        e
                    );
                }
            }
        }
        // Inaccessible; the open below reports it
        Err(_) => {}
    }

    match FileSink::open(path) {
        Ok(sink) => Some(Box::new(sink)),
        Err(e) => {
            warn!(
                target: "notify",
                "failed opening log file {}: {}; using stdout instead",
                path.display(),
                e
            );
            Some(Box::new(ConsoleSink::new()))
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

fn create_parent_dirs(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

#[cfg(unix)]
fn file_identity(file: &File, _path: Option<&Path>) -> Option<SinkIdentity> {
    use std::os::unix::fs::MetadataExt;
    file.metadata().ok().map(|meta| SinkIdentity::File {
        dev: meta.dev(),
        ino: meta.ino(),
    })
}

#[cfg(not(unix))]
fn file_identity(_file: &File, path: Option<&Path>) -> Option<SinkIdentity> {
    path.and_then(|p| fs::canonicalize(p).ok())
        .map(SinkIdentity::Path)
}
