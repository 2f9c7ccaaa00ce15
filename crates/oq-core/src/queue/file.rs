//! Durable queue stored in a single file
//!
//! # File layout
//!
//! ```text
//! offset 0   magic "OQF1"
//!        4   format version (u32)
//!        8   entry count    (u64)
//!       16   head offset    (u64)  first live record
//!       24   tail offset    (u64)  end of the last record
//!       32   records: [len: u32][payload: len bytes] ...
//! ```
//!
//! All integers are big-endian. Records are appended at the tail and
//! consumed by moving the head forward. The file is truncated back to the
//! header whenever the queue empties, and live records are moved to the
//! front once the consumed prefix grows past the compaction threshold.

use super::{ObjectQueue, check_remove_count};
use crate::config::FileQueueConfig;
use crate::converter::Converter;
use crate::error::QueueError;
use crate::lock::{FileLock, acquire_lock, lock_path_for};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MAGIC: [u8; 4] = *b"OQF1";
const VERSION: u32 = 1;
const HEADER_LEN: u64 = 32;
const LEN_PREFIX: u64 = 4;
const COPY_CHUNK: usize = 64 * 1024;

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

fn be_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(raw)
}

fn be_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    count: u64,
    head: u64,
    tail: u64,
}

impl Header {
    const EMPTY: Header = Header {
        count: 0,
        head: HEADER_LEN,
        tail: HEADER_LEN,
    };

    fn encode(&self) -> [u8; HEADER_LEN as usize] {
        let mut buf = [0u8; HEADER_LEN as usize];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..8].copy_from_slice(&VERSION.to_be_bytes());
        buf[8..16].copy_from_slice(&self.count.to_be_bytes());
        buf[16..24].copy_from_slice(&self.head.to_be_bytes());
        buf[24..32].copy_from_slice(&self.tail.to_be_bytes());
        buf
    }

    fn decode(buf: &[u8; HEADER_LEN as usize], file_len: u64) -> io::Result<Self> {
        if buf[0..4] != MAGIC {
            return Err(invalid_data("not an object queue file (bad magic)".to_string()));
        }
        let version = be_u32(&buf[4..8]);
        if version != VERSION {
            return Err(invalid_data(format!(
                "unsupported queue file version {version} (expected {VERSION})"
            )));
        }

        let header = Self {
            count: be_u64(&buf[8..16]),
            head: be_u64(&buf[16..24]),
            tail: be_u64(&buf[24..32]),
        };

        let offsets_ok =
            HEADER_LEN <= header.head && header.head <= header.tail && header.tail <= file_len;
        // Every record takes at least its length prefix.
        let count_ok = (header.count == 0) == (header.head == header.tail)
            && header.count <= header.live_bytes() / LEN_PREFIX;
        if !offsets_ok || !count_ok {
            return Err(invalid_data(format!(
                "corrupt queue header: count={} head={} tail={} file_len={file_len}",
                header.count, header.head, header.tail
            )));
        }

        Ok(header)
    }

    fn live_bytes(&self) -> u64 {
        self.tail - self.head
    }

    fn dead_bytes(&self) -> u64 {
        self.head - HEADER_LEN
    }
}

/// Open file plus the header it currently carries
#[derive(Debug)]
struct Store {
    file: File,
    header: Header,
    sync_writes: bool,
}

impl Store {
    fn open(path: &Path, sync_writes: bool) -> io::Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let file_len = file.metadata()?.len();
        if file_len == 0 {
            let mut store = Self {
                file,
                header: Header::EMPTY,
                sync_writes,
            };
            store.write_header(Header::EMPTY)?;
            return Ok(store);
        }
        if file_len < HEADER_LEN {
            return Err(invalid_data(format!(
                "queue file is {file_len} bytes, shorter than its header"
            )));
        }

        let mut buf = [0u8; HEADER_LEN as usize];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut buf)?;
        let header = Header::decode(&buf, file_len)?;

        Ok(Self {
            file,
            header,
            sync_writes,
        })
    }

    fn sync(&mut self) -> io::Result<()> {
        if self.sync_writes {
            self.file.sync_data()?;
        }
        Ok(())
    }

    fn write_header(&mut self, header: Header) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&header.encode())?;
        self.sync()?;
        self.header = header;
        Ok(())
    }

    fn append(&mut self, payload: &[u8], len: u32) -> io::Result<()> {
        let header = self.header;
        self.file.seek(SeekFrom::Start(header.tail))?;
        self.file.write_all(&len.to_be_bytes())?;
        self.file.write_all(payload)?;
        self.sync()?;

        self.write_header(Header {
            count: header.count + 1,
            tail: header.tail + LEN_PREFIX + u64::from(len),
            ..header
        })
    }

    /// Length of the record at `offset`, checked against the tail.
    fn record_len(&mut self, offset: u64) -> io::Result<u64> {
        let mut prefix = [0u8; LEN_PREFIX as usize];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut prefix)?;
        let len = u64::from(u32::from_be_bytes(prefix));

        if offset + LEN_PREFIX + len > self.header.tail {
            return Err(invalid_data(format!(
                "record at offset {offset} ({len} bytes) runs past the tail at {}",
                self.header.tail
            )));
        }
        Ok(len)
    }

    /// Read the record at `offset`, returning its payload and the next offset.
    fn read_record(&mut self, offset: u64) -> io::Result<(Vec<u8>, u64)> {
        let len = self.record_len(offset)?;
        let mut payload = vec![0u8; len as usize];
        self.file.read_exact(&mut payload)?;
        Ok((payload, offset + LEN_PREFIX + len))
    }

    fn advance(&mut self, n: u64, compact_threshold: u64) -> io::Result<()> {
        let header = self.header;
        if n == header.count {
            return self.reset();
        }

        let mut head = header.head;
        for _ in 0..n {
            head += LEN_PREFIX + self.record_len(head)?;
        }

        self.write_header(Header {
            count: header.count - n,
            head,
            ..header
        })?;

        self.maybe_compact(compact_threshold);
        Ok(())
    }

    /// Compact once the consumed prefix is large enough.
    ///
    /// The removal is already committed, so a failed compaction is logged
    /// and left for a later removal to retry.
    fn maybe_compact(&mut self, compact_threshold: u64) {
        if self.header.dead_bytes() < compact_threshold
            || self.header.dead_bytes() <= self.header.live_bytes()
        {
            return;
        }
        if let Err(e) = self.compact() {
            warn!(error = %e, "queue file compaction failed");
        }
    }

    fn reset(&mut self) -> io::Result<()> {
        self.write_header(Header::EMPTY)?;
        self.file.set_len(HEADER_LEN)?;
        self.sync()
    }

    /// Move the live records to just after the header.
    ///
    /// Only called while the consumed prefix is larger than the live region,
    /// so source and destination never overlap and the old records stay
    /// intact until the header is rewritten.
    fn compact(&mut self) -> io::Result<()> {
        let header = self.header;
        let live = header.live_bytes();
        let mut chunk = vec![0u8; COPY_CHUNK];
        let mut copied = 0u64;

        while copied < live {
            let n = (live - copied).min(COPY_CHUNK as u64) as usize;
            self.file.seek(SeekFrom::Start(header.head + copied))?;
            self.file.read_exact(&mut chunk[..n])?;
            self.file.seek(SeekFrom::Start(HEADER_LEN + copied))?;
            self.file.write_all(&chunk[..n])?;
            copied += n as u64;
        }
        self.sync()?;

        let compacted = Header {
            count: header.count,
            head: HEADER_LEN,
            tail: HEADER_LEN + live,
        };
        self.write_header(compacted)?;
        self.file.set_len(compacted.tail)?;
        self.sync()?;

        debug!(
            reclaimed = header.dead_bytes(),
            live, "compacted queue file"
        );
        Ok(())
    }
}

/// A queue persisted to a single file.
///
/// Entries are encoded with the [`Converter`] given at open time. The queue
/// holds an exclusive lock on `<path>.lock` until it is closed or dropped.
///
/// # Example
///
/// ```rust,no_run
/// use object_queue_core::{FileObjectQueue, ObjectQueue, StringConverter};
///
/// # fn example() -> Result<(), object_queue_core::QueueError> {
/// let mut queue = FileObjectQueue::open("/var/spool/app/uploads.q", StringConverter)?;
/// queue.add("photo-1.jpg".to_string())?;
/// assert_eq!(queue.peek()?, "photo-1.jpg");
/// queue.remove()?;
/// queue.close()?;
/// # Ok(())
/// # }
/// ```
pub struct FileObjectQueue<T, C> {
    path: PathBuf,
    store: Option<Store>,
    lock: Option<FileLock>,
    converter: C,
    compact_threshold: u64,
    scratch: Vec<u8>,
    _entries: PhantomData<fn() -> T>,
}

impl<T, C> std::fmt::Debug for FileObjectQueue<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileObjectQueue")
            .field("path", &self.path)
            .field("header", &self.store.as_ref().map(|s| s.header))
            .finish()
    }
}

impl<T, C> FileObjectQueue<T, C>
where
    C: Converter<T>,
{
    /// Open (or create) the queue file at `path` with default settings.
    pub fn open(path: impl AsRef<Path>, converter: C) -> Result<Self, QueueError> {
        Self::open_with_config(path, converter, &FileQueueConfig::default())
    }

    /// Open (or create) the queue file at `path`.
    ///
    /// Missing parent directories are created. Fails with
    /// [`QueueError::LockTimeout`] if another queue holds the file, and with
    /// [`QueueError::Io`] (kind `InvalidData`) if the file is not a queue
    /// file or its header is inconsistent.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        converter: C,
        config: &FileQueueConfig,
    ) -> Result<Self, QueueError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| QueueError::io(parent, e))?;
        }

        let lock = acquire_lock(&lock_path_for(&path), config.lock_retries)?;
        let store = Store::open(&path, config.sync_writes).map_err(|e| QueueError::io(&path, e))?;

        info!(
            path = %path.display(),
            lock = %lock.path().display(),
            entries = store.header.count,
            "opened queue file"
        );

        Ok(Self {
            path,
            store: Some(store),
            lock: Some(lock),
            converter,
            compact_threshold: config.compact_threshold,
            scratch: Vec::new(),
            _entries: PhantomData,
        })
    }

    /// Location of the queue file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(&self, payload: &[u8]) -> Result<T, QueueError> {
        self.converter
            .from_bytes(payload)
            .map_err(|e| QueueError::io(&self.path, e))
    }
}

impl<T, C> ObjectQueue<T> for FileObjectQueue<T, C>
where
    C: Converter<T>,
{
    fn add(&mut self, entry: T) -> Result<(), QueueError> {
        let store = self.store.as_mut().ok_or(QueueError::Closed)?;

        self.scratch.clear();
        self.converter
            .to_writer(&entry, &mut self.scratch)
            .map_err(|e| QueueError::io(&self.path, e))?;
        let len = u32::try_from(self.scratch.len()).map_err(|_| QueueError::InvalidArgument {
            message: format!(
                "entry encodes to {} bytes, over the {} byte record limit",
                self.scratch.len(),
                u32::MAX
            ),
        })?;

        store
            .append(&self.scratch, len)
            .map_err(|e| QueueError::io(&self.path, e))
    }

    fn size(&self) -> usize {
        self.store
            .as_ref()
            .map_or(0, |s| usize::try_from(s.header.count).unwrap_or(usize::MAX))
    }

    fn peek(&mut self) -> Result<T, QueueError> {
        let store = self.store.as_mut().ok_or(QueueError::Closed)?;
        if store.header.count == 0 {
            return Err(QueueError::Empty);
        }

        let head = store.header.head;
        let (payload, _) = store
            .read_record(head)
            .map_err(|e| QueueError::io(&self.path, e))?;
        self.decode(&payload)
    }

    fn peek_n(&mut self, max: usize) -> Result<Vec<T>, QueueError> {
        let store = self.store.as_mut().ok_or(QueueError::Closed)?;
        let take = store.header.count.min(max as u64);

        let mut payloads = Vec::new();
        let mut offset = store.header.head;
        for _ in 0..take {
            let (payload, next) = store
                .read_record(offset)
                .map_err(|e| QueueError::io(&self.path, e))?;
            payloads.push(payload);
            offset = next;
        }

        payloads.iter().map(|p| self.decode(p)).collect()
    }

    fn remove_n(&mut self, n: usize) -> Result<(), QueueError> {
        let store = self.store.as_mut().ok_or(QueueError::Closed)?;
        check_remove_count(n, usize::try_from(store.header.count).unwrap_or(usize::MAX))?;
        if n == 0 {
            return Ok(());
        }

        store
            .advance(n as u64, self.compact_threshold)
            .map_err(|e| QueueError::io(&self.path, e))
    }

    fn clear(&mut self) -> Result<(), QueueError> {
        let store = self.store.as_mut().ok_or(QueueError::Closed)?;
        store.reset().map_err(|e| QueueError::io(&self.path, e))
    }

    fn close(&mut self) -> Result<(), QueueError> {
        let store = self.store.take().ok_or(QueueError::Closed)?;
        let synced = store.file.sync_all();
        drop(store);
        self.lock.take();

        info!(path = %self.path.display(), "closed queue file");
        synced.map_err(|e| QueueError::io(&self.path, e))
    }
}
