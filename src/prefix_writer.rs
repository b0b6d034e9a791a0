use std::{
    cell::{
        Cell,
        Ref,
        RefCell,
    },
    io::{
        self,
        Write,
    },
    ptr,
    rc::{
        Rc,
        Weak,
    },
};

use crate::{
    error::Error,
    transform::{
        prefix_lines,
        settle,
        LinePosition,
    },
};

/// One nesting level. All levels of a chain write straight to the shared
/// sink, the prefix of a nested level already contains the prefixes of
/// the levels it was nested from.
#[derive(Debug)]
struct Level {
    prefix: Box<[u8]>,
    position: Cell<LinePosition>,

    /// The level that most recently nested this one. Its line position
    /// is adopted on the next write through this level.
    wrapped_by: RefCell<Option<Weak<Level>>>,
    /// The level this one was nested from, `None` for the root.
    parent: Option<Rc<Level>>,
}

impl Level {
    fn root() -> Self {
        Self {
            prefix: Box::default(),
            position: Cell::new(LinePosition::START),
            wrapped_by: RefCell::new(None),
            parent: None,
        }
    }

    /// Line position of the sink as seen from this level, following the
    /// nesting back-links to the deepest live level.
    fn current_position(&self) -> LinePosition {
        let mut next = self.wrapped_by.borrow().as_ref().and_then(Weak::upgrade);
        let mut position = self.position.get();

        while let Some(level) = next {
            position = level.position.get();
            next = level.wrapped_by.borrow().as_ref().and_then(Weak::upgrade);
        }

        position
    }

    /// Adopts the position of the deepest nested level and drops the
    /// back-link.
    fn resolve(&self) {
        if self.wrapped_by.borrow().is_none() {
            return;
        }

        self.position.set(self.current_position().fit(self.prefix.len()));
        *self.wrapped_by.borrow_mut() = None;
    }
}

impl Drop for Level {
    fn drop(&mut self) {
        // Levels nested from this one keep it alive, so they are gone by
        // now and already handed their position up to us.
        let Some(parent) = self.parent.as_ref() else {
            return;
        };

        let mut link = parent.wrapped_by.borrow_mut();
        if link
            .as_ref()
            .is_some_and(|weak| ptr::eq(weak.as_ptr(), &*self))
        {
            *link = None;
            parent.position.set(self.position.get().fit(parent.prefix.len()));
        }
    }
}

/// Writer that inserts a prefix in front of every line written to it.
///
/// Lines may span multiple writes and a single write may contain any
/// number of lines. A newline at the end of a write does not produce a
/// prefix until the next line actually starts.
///
/// Writers nest through [`PrefixWriter::nest`]. The nested writer does not
/// forward through its parent, it writes to the same sink with the
/// combined prefix. Both handles stay usable and keep track of where the
/// shared sink stands, so writing through the outer handle after the
/// nested one continues the current line correctly.
///
/// Handles of one chain share state without synchronization and are
/// neither `Send` nor `Sync`.
///
/// ```
/// use std::io::Write;
///
/// use indent_writer::PrefixWriter;
///
/// let mut outer = PrefixWriter::new(Vec::new(), "> ");
/// writeln!(outer, "line 1")?;
///
/// let mut inner = outer.nest("..");
/// writeln!(inner, "line 2")?;
/// drop(inner);
///
/// writeln!(outer, "line 3")?;
///
/// assert_eq!(
///     "> line 1\n> ..line 2\n> line 3\n",
///     String::from_utf8_lossy(&outer.into_inner().unwrap_or_default())
/// );
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct PrefixWriter<W> {
    sink: Rc<RefCell<W>>,
    level: Rc<Level>,
}

impl<W> Clone for PrefixWriter<W> {
    fn clone(&self) -> Self {
        Self {
            sink: Rc::clone(&self.sink),
            level: Rc::clone(&self.level),
        }
    }
}

impl<W> PrefixWriter<W> {
    /// Create a new [`PrefixWriter`] that writes to `writer` and prefixes
    /// every line with `prefix`.
    ///
    /// With an empty prefix the returned handle passes everything through
    /// unchanged. It is the same handle [`PrefixWriter::unwrap`] returns
    /// when unwrapping past the outermost prefix.
    ///
    /// To add a prefix to an existing [`PrefixWriter`] use
    /// [`PrefixWriter::nest`]. Passing one in here stacks a separate
    /// writer on top that knows nothing about the line the inner one is
    /// in, so a line that is already started gets prefixed again.
    pub fn new(writer: W, prefix: impl AsRef<[u8]>) -> Self {
        let root = Self {
            sink: Rc::new(RefCell::new(writer)),
            level: Rc::new(Level::root()),
        };

        root.nest(prefix)
    }

    /// Nest another prefix inside this writer.
    ///
    /// The returned writer prefixes lines with this writer's prefix
    /// followed by `prefix` and writes directly to the shared sink. It
    /// starts wherever the sink currently stands, so nesting in the middle
    /// of a line does not prefix the rest of that line.
    ///
    /// An empty `prefix` returns this writer again.
    #[must_use]
    pub fn nest(&self, prefix: impl AsRef<[u8]>) -> Self {
        let prefix = prefix.as_ref();
        if prefix.is_empty() {
            return self.clone();
        }

        self.level.resolve();

        let level = Rc::new(Level {
            prefix: [&self.level.prefix[..], prefix].concat().into_boxed_slice(),
            position: Cell::new(self.level.position.get()),
            wrapped_by: RefCell::new(None),
            parent: Some(Rc::clone(&self.level)),
        });

        *self.level.wrapped_by.borrow_mut() = Some(Rc::downgrade(&level));

        #[cfg(feature = "tracing")]
        tracing::trace!(
            prefix = %String::from_utf8_lossy(&level.prefix),
            depth = self.depth() + 1,
            "nested prefix writer"
        );

        Self {
            sink: Rc::clone(&self.sink),
            level,
        }
    }

    /// Peel off `depth` levels of nesting.
    ///
    /// `unwrap(0)` returns this writer, `unwrap(1)` the writer it was
    /// nested from and so on. Going past the outermost prefix returns a
    /// writer that passes everything straight to the sink.
    #[must_use]
    pub fn unwrap(&self, depth: usize) -> Self {
        let mut level = &self.level;

        for _ in 0..depth {
            match &level.parent {
                Some(parent) => level = parent,
                None => break,
            }
        }

        Self {
            sink: Rc::clone(&self.sink),
            level: Rc::clone(level),
        }
    }

    /// The full prefix this writer puts in front of every line.
    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.level.prefix
    }

    /// Number of prefixes nested into this writer. Zero for the
    /// pass-through writer at the root of a chain.
    #[must_use]
    pub fn depth(&self) -> usize {
        std::iter::successors(self.level.parent.as_ref(), |&level| level.parent.as_ref()).count()
    }

    /// Whether the next byte written through this writer starts a new
    /// line.
    #[must_use]
    pub fn is_start_of_line(&self) -> bool {
        matches!(
            self.level.current_position(),
            LinePosition::Start { .. }
        )
    }

    /// Whether both handles refer to the same nesting level.
    #[must_use]
    pub fn same_level(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.level, &other.level)
    }

    /// Borrow the underlying writer.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::SinkBusy`] while a write through this chain is
    /// in progress.
    pub fn get_ref(&self) -> Result<Ref<'_, W>, Error> {
        self.sink.try_borrow().map_err(|_| Error::SinkBusy)
    }

    /// Unwrap the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns the writer back if other handles still share the sink.
    pub fn into_inner(self) -> Result<W, Self> {
        let Self { sink, level } = self;

        match Rc::try_unwrap(sink) {
            Ok(sink) => Ok(sink.into_inner()),
            Err(sink) => Err(Self { sink, level }),
        }
    }
}

impl<W: Write> Write for PrefixWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.level.resolve();

        if buf.is_empty() {
            return Ok(0);
        }

        let mut sink = self.sink.try_borrow_mut().map_err(|_| Error::SinkBusy)?;

        let prefix = &self.level.prefix;
        let pending = self.level.position.get().pending(prefix.len());
        let expanded = prefix_lines(buf, prefix, pending.is_some());

        // Part of the leading prefix may already be in the sink.
        let mut offered = pending.unwrap_or(0);

        loop {
            let accepted = match sink.write(&expanded[offered..]) {
                Ok(accepted) => accepted,
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(error = %err, "prefix writer sink failed");

                    return Err(err);
                }
            };

            if accepted == 0 {
                return Ok(0);
            }

            offered = (offered + accepted).min(expanded.len());

            let settled = settle(buf, &expanded, prefix.len(), pending.is_some(), offered);
            self.level.position.set(settled.position);

            // Only prefix bytes went through, keep going while the sink
            // makes progress.
            if settled.consumed == 0 {
                continue;
            }

            #[cfg(feature = "tracing")]
            {
                if offered < expanded.len() {
                    tracing::trace!(
                        offered,
                        expanded = expanded.len(),
                        consumed = settled.consumed,
                        input = buf.len(),
                        "short write through prefix writer"
                    );
                }
            }

            return Ok(settled.consumed);
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink
            .try_borrow_mut()
            .map_err(|_| Error::SinkBusy)?
            .flush()
    }
}
