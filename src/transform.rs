use std::borrow::Cow;

use memchr::memchr_iter;

const NEWLINE: u8 = b'\n';

/// Returns `buf` with `prefix` inserted in front of every line.
///
/// `start_of_line` tells whether `buf` continues a line that was already
/// started (and prefixed) by an earlier write. If it is `false` the first
/// line of `buf` is left alone. A trailing newline never gets a prefix
/// after it, that happens once the next line actually shows up.
///
/// Empty input or an empty prefix borrow `buf` unchanged. Otherwise the
/// output is allocated exactly once.
///
/// ```
/// use indent_writer::prefix_lines;
///
/// assert_eq!(&*prefix_lines(b"ab\nc", b"--", true), b"--ab\n--c");
/// assert_eq!(&*prefix_lines(b"ab\nc", b"--", false), b"ab\n--c");
/// ```
#[must_use]
pub fn prefix_lines<'a>(buf: &'a [u8], prefix: &[u8], start_of_line: bool) -> Cow<'a, [u8]> {
    if buf.is_empty() || prefix.is_empty() {
        return Cow::Borrowed(buf);
    }

    let len = buf.len() + insertions(buf, start_of_line) * prefix.len();
    let mut out = Vec::with_capacity(len);

    let mut lines = buf.split_inclusive(|&byte| byte == NEWLINE);
    if !start_of_line {
        if let Some(first) = lines.next() {
            out.extend_from_slice(first);
        }
    }

    for line in lines {
        out.extend_from_slice(prefix);
        out.extend_from_slice(line);
    }

    debug_assert_eq!(out.len(), len);
    Cow::Owned(out)
}

/// Returns `input` with every line prefixed by `prefix`, assuming `input`
/// starts at the beginning of a line.
///
/// Same output as writing `input` once through a fresh
/// [`crate::PrefixWriter`] into a `Vec`.
///
/// ```
/// assert_eq!(indent_writer::prefix_str("> ", "a\nb\n"), "> a\n> b\n");
/// ```
#[must_use]
pub fn prefix_str<'a>(prefix: &str, input: &'a str) -> Cow<'a, str> {
    if input.is_empty() || prefix.is_empty() {
        return Cow::Borrowed(input);
    }

    let mut out =
        String::with_capacity(input.len() + insertions(input.as_bytes(), true) * prefix.len());

    for line in input.split_inclusive('\n') {
        out.push_str(prefix);
        out.push_str(line);
    }

    Cow::Owned(out)
}

/// Byte version of [`prefix_str`].
#[must_use]
pub fn prefix_bytes<'a>(prefix: &[u8], input: &'a [u8]) -> Cow<'a, [u8]> {
    prefix_lines(input, prefix, true)
}

/// Number of prefixes [`prefix_lines`] inserts into a non-empty `buf`.
fn insertions(buf: &[u8], start_of_line: bool) -> usize {
    let newlines = memchr_iter(NEWLINE, buf).count();
    let trailing = buf.last() == Some(&NEWLINE);

    newlines + usize::from(start_of_line) - usize::from(trailing)
}

/// Where the sink stands relative to the current line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LinePosition {
    /// The next byte begins a line. `emitted` bytes of its prefix already
    /// reached the sink through a short write.
    Start { emitted: usize },
    /// Inside a line, no prefix is due.
    Within,
}

impl LinePosition {
    pub(crate) const START: Self = Self::Start { emitted: 0 };

    /// Position after `bytes` were written in full.
    pub(crate) fn after(bytes: &[u8]) -> Self {
        if bytes.last() == Some(&NEWLINE) {
            Self::START
        } else {
            Self::Within
        }
    }

    /// Caps a partly written prefix at `prefix_len`, for a level whose
    /// prefix is shorter than the one that was cut. The bytes past
    /// `prefix_len` are already in the sink and stay there.
    pub(crate) fn fit(self, prefix_len: usize) -> Self {
        match self {
            Self::Start { emitted } => Self::Start {
                emitted: emitted.min(prefix_len),
            },
            Self::Within => Self::Within,
        }
    }

    /// How many bytes of a `prefix_len` long prefix are already written,
    /// or `None` if no prefix is due before the next byte.
    pub(crate) fn pending(self, prefix_len: usize) -> Option<usize> {
        match self {
            Self::Start { emitted } if emitted < prefix_len => Some(emitted),
            _ => None,
        }
    }
}

/// Outcome of mapping a (possibly short) write of expanded bytes back onto
/// the caller's input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Settled {
    pub(crate) consumed: usize,
    pub(crate) position: LinePosition,
}

/// Maps the first `accepted` bytes of `expanded` (the output of
/// [`prefix_lines`] for `input`) back to a count of `input` bytes.
///
/// Walks the lines of `input`, each one preceded by a prefix unless it
/// continues an already started line. Prefix bytes never count as input.
/// A cut inside a prefix is remembered in the returned position so the
/// rest of the prefix can be written later. The prefix may contain line
/// endings itself, only the input decides where lines start.
pub(crate) fn settle(
    input: &[u8],
    expanded: &[u8],
    prefix_len: usize,
    start_of_line: bool,
    accepted: usize,
) -> Settled {
    if accepted >= expanded.len() {
        return Settled {
            consumed: input.len(),
            position: LinePosition::after(expanded),
        };
    }

    let mut remaining = accepted;
    let mut consumed = 0;

    for (index, line) in input.split_inclusive(|&byte| byte == NEWLINE).enumerate() {
        if start_of_line || index > 0 {
            if remaining <= prefix_len {
                return Settled {
                    consumed,
                    position: LinePosition::Start { emitted: remaining },
                };
            }

            remaining -= prefix_len;
        }

        if remaining < line.len() {
            return Settled {
                consumed: consumed + remaining,
                position: LinePosition::Within,
            };
        }

        consumed += line.len();
        remaining -= line.len();

        if remaining == 0 {
            return Settled {
                consumed,
                position: LinePosition::after(line),
            };
        }
    }

    Settled {
        consumed,
        position: LinePosition::after(input),
    }
}
