use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;

/// Size of `struct inotify_event` without the trailing name.
pub const HEADER_SIZE: usize = 16;

/// Longest entry name the kernel will report, excluding the NUL.
pub const NAME_MAX: usize = 255;

/// The kinds of change that produce mirroring work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Deleted,
    MovedFrom,
    MovedTo,
}

impl ChangeKind {
    /// Order in which kinds sharing one record are emitted.
    const ALL: [(u32, ChangeKind); 4] = [
        (libc::IN_CREATE, ChangeKind::Created),
        (libc::IN_DELETE, ChangeKind::Deleted),
        (libc::IN_MOVED_FROM, ChangeKind::MovedFrom),
        (libc::IN_MOVED_TO, ChangeKind::MovedTo),
    ];
}

/// One decoded notification for a named entry of the watched directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent<'a> {
    pub kind: ChangeKind,
    pub name: &'a OsStr,
    /// Links the two halves of a move; zero for other kinds.
    pub cookie: u32,
}

/// Decode the first `valid` bytes of `buf` as inotify records.
///
/// The returned iterator is lazy and single-pass. A record whose header or
/// name runs past `valid` ends the sequence.
pub fn decode(buf: &[u8], valid: usize) -> Events<'_> {
    Events {
        buf: &buf[..valid.min(buf.len())],
        offset: 0,
        current: None,
    }
}

struct Record<'a> {
    mask: u32,
    cookie: u32,
    name: &'a OsStr,
}

pub struct Events<'a> {
    buf: &'a [u8],
    offset: usize,
    current: Option<Record<'a>>,
}

impl<'a> Events<'a> {
    fn next_record(&mut self) -> Option<Record<'a>> {
        let buf = self.buf;
        loop {
            let rest = &buf[self.offset..];
            if rest.len() < HEADER_SIZE {
                if !rest.is_empty() {
                    tracing::debug!(bytes = rest.len(), "dropping torn record header");
                }
                return None;
            }

            let mask = read_u32(rest, 4);
            let cookie = read_u32(rest, 8);
            let len = read_u32(rest, 12) as usize;
            let Some(name_bytes) = rest.get(HEADER_SIZE..HEADER_SIZE + len) else {
                tracing::debug!(
                    declared = len,
                    available = rest.len() - HEADER_SIZE,
                    "dropping torn record"
                );
                self.offset = buf.len();
                return None;
            };
            self.offset += HEADER_SIZE + len;

            if mask & libc::IN_Q_OVERFLOW != 0 {
                tracing::warn!("notification queue overflowed, some changes were lost");
            }
            if mask & libc::IN_IGNORED != 0 {
                tracing::warn!("watch on the source directory was removed");
            }

            // The name field is NUL-padded to an alignment boundary.
            let end = name_bytes
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(name_bytes.len());
            if end == 0 {
                continue;
            }

            return Some(Record {
                mask,
                cookie,
                name: OsStr::from_bytes(&name_bytes[..end]),
            });
        }
    }
}

impl<'a> Iterator for Events<'a> {
    type Item = ChangeEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.current.as_mut() {
                if let Some(&(bit, kind)) = ChangeKind::ALL
                    .iter()
                    .find(|(bit, _)| record.mask & bit != 0)
                {
                    record.mask &= !bit;
                    return Some(ChangeEvent {
                        kind,
                        name: record.name,
                        cookie: record.cookie,
                    });
                }
            }
            self.current = Some(self.next_record()?);
        }
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_ne_bytes(word)
}

/// Encode one record the way the kernel lays it out. Test support.
#[cfg(test)]
pub fn encode(mask: u32, cookie: u32, name: &str) -> Vec<u8> {
    let padded = if name.is_empty() {
        0
    } else {
        (name.len() + 1).next_multiple_of(4)
    };
    let mut out = Vec::with_capacity(HEADER_SIZE + padded);
    out.extend_from_slice(&1i32.to_ne_bytes());
    out.extend_from_slice(&mask.to_ne_bytes());
    out.extend_from_slice(&cookie.to_ne_bytes());
    out.extend_from_slice(&(padded as u32).to_ne_bytes());
    out.extend_from_slice(name.as_bytes());
    out.resize(HEADER_SIZE + padded, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(buf: &[u8]) -> Vec<(ChangeKind, String, u32)> {
        decode(buf, buf.len())
            .map(|e| (e.kind, e.name.to_string_lossy().into_owned(), e.cookie))
            .collect()
    }

    #[test]
    fn test_decode_sequence_in_order() {
        let mut buf = encode(libc::IN_CREATE, 0, "a.txt");
        buf.extend(encode(libc::IN_MOVED_FROM, 7, "b.txt"));
        buf.extend(encode(libc::IN_MOVED_TO, 7, "c.txt"));
        buf.extend(encode(libc::IN_DELETE, 0, "a.txt"));

        assert_eq!(
            kinds(&buf),
            vec![
                (ChangeKind::Created, "a.txt".into(), 0),
                (ChangeKind::MovedFrom, "b.txt".into(), 7),
                (ChangeKind::MovedTo, "c.txt".into(), 7),
                (ChangeKind::Deleted, "a.txt".into(), 0),
            ]
        );
    }

    #[test]
    fn test_decode_skips_nameless_and_unrelated_records() {
        let mut buf = encode(libc::IN_IGNORED, 0, "");
        buf.extend(encode(libc::IN_MODIFY, 0, "x"));
        buf.extend(encode(libc::IN_CREATE | libc::IN_ISDIR, 0, "dir"));

        assert_eq!(kinds(&buf), vec![(ChangeKind::Created, "dir".into(), 0)]);
    }

    #[test]
    fn test_decode_splits_combined_bits() {
        let buf = encode(libc::IN_CREATE | libc::IN_DELETE, 0, "both");
        let got: Vec<ChangeKind> = decode(&buf, buf.len()).map(|e| e.kind).collect();
        assert_eq!(got, vec![ChangeKind::Created, ChangeKind::Deleted]);
    }

    #[test]
    fn test_decode_drops_torn_trailing_record() {
        let mut buf = encode(libc::IN_CREATE, 0, "whole");
        let second = encode(libc::IN_CREATE, 0, "partial-name");
        let cut = buf.len() + HEADER_SIZE + 3;
        buf.extend(second);

        assert_eq!(
            kinds(&buf[..cut]),
            vec![(ChangeKind::Created, "whole".into(), 0)]
        );
        // Same buffer, but the valid count stops inside the second header.
        let valid = buf.len() - 20;
        let got: Vec<_> = decode(&buf, valid).collect();
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn test_decode_never_reads_past_valid() {
        let mut buf = encode(libc::IN_CREATE, 0, "first");
        let first_len = buf.len();
        buf.extend(encode(libc::IN_CREATE, 0, "second"));

        let got: Vec<_> = decode(&buf, first_len).collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, OsStr::new("first"));
        assert_eq!(decode(&buf, 0).count(), 0);
    }
}
