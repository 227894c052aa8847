/*! Executes automata on some input.

The [`Scanner`] simulates an automaton without backtracking. All the live
threads advance in lock-step, one input byte at a time. Before consuming
each byte, every thread follows epsilon transitions until it reaches a
consuming state or the accepting state. The set of consuming states
reached this way is the set of live threads, a state is never live twice
at the same offset. The input is matched if the accepting state is reached
after consuming the last byte.

The same scanner runs both NFAs and DFAs, as they share the same
representation. For a DFA there's at most one live epsilon state at any
given time.
*/

use std::io;
use std::io::Read;

use log::trace;
use thiserror::Error;

use crate::re::bitmapset::BitmapSet;
use crate::re::nfa::{Automaton, StateId};

/// Error returned when a scan operation fails.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScanError {
    /// The input reader returned an error.
    #[error("can not read input: {0}")]
    Reader(#[from] io::Error),
}

/// Supplies the input to [`Scanner::is_match_reader`] in chunks.
pub trait Reader {
    /// Returns the next chunk of input. An empty chunk means that there
    /// is no more input.
    fn read(&mut self) -> io::Result<&[u8]>;

    /// Pushes back the last `n` bytes returned by [`Reader::read`], they
    /// will be returned again by the next call to `read`.
    fn unwind(&mut self, n: usize) -> io::Result<()>;
}

/// A [`Reader`] for in-memory data, that yields chunks of a fixed size.
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
    chunk_size: usize,
}

impl<'a> SliceReader<'a> {
    /// # Panics
    ///
    /// If `chunk_size` is zero.
    pub fn new(data: &'a [u8], chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be greater than zero");
        Self { data, pos: 0, chunk_size }
    }

    /// Number of bytes returned so far, minus the unwound ones.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Reader for SliceReader<'_> {
    fn read(&mut self) -> io::Result<&[u8]> {
        let start = self.pos;
        let end = start.saturating_add(self.chunk_size);
        self.pos = self.data.len().min(end);
        Ok(&self.data[start..self.pos])
    }

    fn unwind(&mut self, n: usize) -> io::Result<()> {
        if n > self.pos {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "can not unwind past the start of input",
            ));
        }
        self.pos -= n;
        Ok(())
    }
}

/// A [`Reader`] on top of any [`std::io::Read`].
///
/// Data is read into an internal buffer, only the bytes in the last chunk
/// can be unwound.
pub struct IoReader<R: Read> {
    inner: R,
    buf: Vec<u8>,
    // Bytes in `buf[..filled]` were read from `inner`, the ones in
    // `buf[..pos]` were already returned.
    pos: usize,
    filled: usize,
}

impl<R: Read> IoReader<R> {
    const DEFAULT_BUF_SIZE: usize = 8 * 1024;

    pub fn new(inner: R) -> Self {
        Self::with_capacity(Self::DEFAULT_BUF_SIZE, inner)
    }

    /// # Panics
    ///
    /// If `capacity` is zero.
    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        assert!(capacity > 0, "capacity must be greater than zero");
        Self { inner, buf: vec![0; capacity], pos: 0, filled: 0 }
    }

    /// Returns the bytes that were read from the underlying reader but
    /// not returned yet, like the ones pushed back with
    /// [`Reader::unwind`].
    pub fn buffered(&self) -> &[u8] {
        &self.buf[self.pos..self.filled]
    }
}

impl<R: Read> Reader for IoReader<R> {
    fn read(&mut self) -> io::Result<&[u8]> {
        if self.pos == self.filled {
            self.filled = loop {
                match self.inner.read(self.buf.as_mut_slice()) {
                    Ok(n) => break n,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                    Err(err) => return Err(err),
                }
            };
            self.pos = 0;
        }
        let start = self.pos;
        self.pos = self.filled;
        Ok(&self.buf[start..self.filled])
    }

    fn unwind(&mut self, n: usize) -> io::Result<()> {
        if n > self.pos {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "can not unwind more bytes than the ones in the last chunk",
            ));
        }
        self.pos -= n;
        Ok(())
    }
}

/// Matches inputs against an automaton.
///
/// The automaton is never modified, many scanners can run the same
/// automaton at the same time. A scanner can be reused for matching any
/// number of inputs.
pub struct Scanner<'a> {
    automaton: &'a Automaton,
    // Consuming states live at the current offset.
    threads: BitmapSet,
    // Consuming states that will be live after the current step.
    next_threads: BitmapSet,
    // States already visited during the current step.
    visited: BitmapSet,
    stack: Vec<StateId>,
    // True if the accepting state is reachable at the current offset.
    accepting: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(automaton: &'a Automaton) -> Self {
        Self {
            automaton,
            threads: BitmapSet::with_capacity(automaton.len()),
            next_threads: BitmapSet::with_capacity(automaton.len()),
            visited: BitmapSet::with_capacity(automaton.len()),
            stack: Vec::new(),
            accepting: false,
        }
    }

    /// Returns true if the whole `input` is accepted by the automaton.
    pub fn is_match(&mut self, input: &[u8]) -> bool {
        self.start();
        for byte in input {
            // The rest of the input can't be consumed.
            if self.threads.is_empty() {
                return false;
            }
            self.step(*byte);
        }
        self.accepting
    }

    /// Like [`Scanner::is_match`], but reading the input from `reader`.
    ///
    /// If every thread dies before the end of input, the scanner stops
    /// reading and the bytes of the last chunk that were not examined are
    /// unwound back into the reader.
    pub fn is_match_reader<R: Reader + ?Sized>(
        &mut self,
        reader: &mut R,
    ) -> Result<bool, ScanError> {
        self.start();
        loop {
            let chunk = reader.read()?;

            if chunk.is_empty() {
                return Ok(self.accepting);
            }

            let len = chunk.len();
            let mut examined = len;

            for (i, byte) in chunk.iter().enumerate() {
                if self.threads.is_empty() {
                    examined = i;
                    break;
                }
                self.step(*byte);
            }

            if examined < len {
                trace!("no live threads, unwinding {} bytes", len - examined);
                reader.unwind(len - examined)?;
                return Ok(false);
            }
        }
    }

    /// Makes the sources live at offset zero.
    fn start(&mut self) {
        self.threads.clear();
        self.visited.clear();
        self.accepting = false;

        for source in self.automaton.sources() {
            self.accepting |= epsilon_closure(
                self.automaton,
                *source,
                &mut self.visited,
                &mut self.stack,
                &mut self.threads,
            );
        }
    }

    /// Consumes `byte` with every live thread.
    fn step(&mut self, byte: u8) {
        self.next_threads.clear();
        self.visited.clear();
        self.accepting = false;

        for id in self.threads.iter() {
            let state = self.automaton.state(StateId::from(id));
            let matches =
                state.condition().is_some_and(|class| class.matches(byte));
            if !matches {
                continue;
            }
            for next in state.next() {
                self.accepting |= epsilon_closure(
                    self.automaton,
                    *next,
                    &mut self.visited,
                    &mut self.stack,
                    &mut self.next_threads,
                );
            }
        }

        std::mem::swap(&mut self.threads, &mut self.next_threads);
    }
}

/// Follows the epsilon transitions that start at `start` and adds the
/// consuming states found to `threads`. States in `visited` are skipped,
/// and every state reached is added to it.
///
/// Returns true if the accepting state was reached.
fn epsilon_closure(
    automaton: &Automaton,
    start: StateId,
    visited: &mut BitmapSet,
    stack: &mut Vec<StateId>,
    threads: &mut BitmapSet,
) -> bool {
    let mut accepting = false;

    stack.push(start);

    while let Some(id) = stack.pop() {
        if !visited.insert(id.index()) {
            continue;
        }
        let state = automaton.state(id);
        if !state.is_epsilon() {
            threads.insert(id.index());
        } else if id == automaton.accept() {
            accepting = true;
        } else {
            stack.extend(state.next().iter().rev().copied());
        }
    }

    accepting
}
