/*! Flat representation of automata, for handing them over to external
execution backends and for storing them.

A [`FlatAutomaton`] is a struct-of-arrays copy of an [`Automaton`]. Instead
of each state owning its successors and character ranges, every state
refers to a slice of the shared `next` and `ranges` arrays, so the whole
automaton is made of a handful of contiguous buffers without pointers.
*/

use std::io;
use std::io::{BufWriter, Read, Write};

use bincode::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::re::nfa::{
    Automaton, CharClass, CharRange, State, StateId, StateKind,
};

const MAGIC: &[u8] = b"REGEX-FA";

/// Errors returned while serializing/deserializing automata.
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("not a serialized automaton")]
    InvalidFormat,

    #[error("invalid serialized automaton")]
    InvalidEncoding(#[from] bincode::Error),

    #[error("invalid automaton: {0}")]
    InvalidAutomaton(String),

    #[error(transparent)]
    IoError(#[from] io::Error),
}

/// A state in a [`FlatAutomaton`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FlatState {
    /// Index of the first successor in [`FlatAutomaton::next`].
    pub next_start: u32,
    /// Number of successors.
    pub next_len: u32,
    /// Index of the first range in [`FlatAutomaton::ranges`].
    pub ranges_start: u32,
    /// Number of ranges.
    pub ranges_len: u32,
    /// Combination of [`FlatState::EPSILON`], [`FlatState::INVERTED`] and
    /// [`FlatState::BACK`].
    pub flags: u8,
}

impl FlatState {
    /// The state doesn't consume input.
    pub const EPSILON: u8 = 0x01;
    /// The class of a consuming state is inverted.
    pub const INVERTED: u8 = 0x02;
    /// The state closes a loop.
    pub const BACK: u8 = 0x04;

    #[inline]
    pub fn is_epsilon(&self) -> bool {
        self.flags & Self::EPSILON != 0
    }

    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.flags & Self::INVERTED != 0
    }

    #[inline]
    pub fn is_back(&self) -> bool {
        self.flags & Self::BACK != 0
    }
}

/// Struct-of-arrays copy of an [`Automaton`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FlatAutomaton {
    states: Vec<FlatState>,
    next: Vec<u32>,
    ranges: Vec<(u8, u8)>,
    sources: Vec<u32>,
    accept: u32,
}

impl FlatAutomaton {
    #[inline]
    pub fn states(&self) -> &[FlatState] {
        self.states.as_slice()
    }

    /// Successors of all states, see [`FlatState::next_start`].
    #[inline]
    pub fn next(&self) -> &[u32] {
        self.next.as_slice()
    }

    /// Inclusive byte ranges of all states, see
    /// [`FlatState::ranges_start`].
    #[inline]
    pub fn ranges(&self) -> &[(u8, u8)] {
        self.ranges.as_slice()
    }

    #[inline]
    pub fn sources(&self) -> &[u32] {
        self.sources.as_slice()
    }

    #[inline]
    pub fn accept(&self) -> u32 {
        self.accept
    }

    /// Converts the flat automaton back into an [`Automaton`].
    ///
    /// Fails if some index is out of bounds, or the accepting state is not
    /// an epsilon state without successors.
    pub fn to_automaton(&self) -> Result<Automaton, SerializationError> {
        self.validate()?;

        let states = self
            .states
            .iter()
            .map(|flat| {
                let kind = if flat.is_epsilon() {
                    StateKind::Epsilon
                } else {
                    let ranges = self.ranges[slice(
                        flat.ranges_start,
                        flat.ranges_len,
                    )]
                    .iter()
                    .map(|(from, to)| CharRange::new(*from, *to))
                    .collect();
                    StateKind::Consuming(CharClass::new(
                        ranges,
                        flat.is_inverted(),
                    ))
                };
                let next = self.next[slice(flat.next_start, flat.next_len)]
                    .iter()
                    .map(|id| StateId::from(*id as usize))
                    .collect();
                State::new(kind, flat.is_back(), next)
            })
            .collect();

        Ok(Automaton::new(
            states,
            self.sources
                .iter()
                .map(|id| StateId::from(*id as usize))
                .collect(),
            StateId::from(self.accept as usize),
        ))
    }

    fn validate(&self) -> Result<(), SerializationError> {
        let invalid =
            |msg: String| Err(SerializationError::InvalidAutomaton(msg));
        let num_states = self.states.len();

        if self.sources.is_empty() {
            return invalid("no sources".to_string());
        }

        for id in self.sources.iter().chain(std::iter::once(&self.accept)) {
            if *id as usize >= num_states {
                return invalid(format!("state {} doesn't exist", id));
            }
        }

        for (i, state) in self.states.iter().enumerate() {
            let next = slice(state.next_start, state.next_len);
            let ranges = slice(state.ranges_start, state.ranges_len);

            if next.end > self.next.len() {
                return invalid(format!(
                    "successors of state {} out of bounds",
                    i
                ));
            }
            if ranges.end > self.ranges.len() {
                return invalid(format!("ranges of state {} out of bounds", i));
            }
            if let Some(id) =
                self.next[next].iter().find(|id| **id as usize >= num_states)
            {
                return invalid(format!(
                    "state {} has a transition to non-existing state {}",
                    i, id
                ));
            }
            if self.ranges[ranges].iter().any(|(from, to)| from > to) {
                return invalid(format!("state {} has an invalid range", i));
            }
        }

        let accept = &self.states[self.accept as usize];

        if !accept.is_epsilon() || accept.next_len != 0 {
            return invalid(format!(
                "accepting state {} is not an epsilon sink",
                self.accept
            ));
        }

        Ok(())
    }

    /// Serializes the automaton into a sequence of bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializationError> {
        let mut bytes = Vec::new();
        self.serialize_into(&mut bytes)?;
        Ok(bytes)
    }

    /// Deserializes an automaton from a sequence of bytes produced by
    /// [`FlatAutomaton::serialize`].
    pub fn deserialize<B>(bytes: B) -> Result<Self, SerializationError>
    where
        B: AsRef<[u8]>,
    {
        let bytes = bytes.as_ref();

        if bytes.len() < MAGIC.len() || &bytes[0..MAGIC.len()] != MAGIC {
            return Err(SerializationError::InvalidFormat);
        }

        // Skip the magic and deserialize the remaining data.
        let automaton = bincode::DefaultOptions::new()
            .with_varint_encoding()
            .deserialize::<Self>(&bytes[MAGIC.len()..])?;

        automaton.validate()?;

        Ok(automaton)
    }

    /// Serializes the automaton into a `writer`.
    pub fn serialize_into<W>(
        &self,
        writer: W,
    ) -> Result<(), SerializationError>
    where
        W: Write,
    {
        let mut writer = BufWriter::new(writer);

        writer.write_all(MAGIC)?;

        bincode::DefaultOptions::new()
            .with_varint_encoding()
            .serialize_into(&mut writer, self)?;

        writer.flush()?;

        Ok(())
    }

    /// Deserializes an automaton from a `reader`.
    pub fn deserialize_from<R>(
        mut reader: R,
    ) -> Result<Self, SerializationError>
    where
        R: Read,
    {
        let mut bytes = Vec::new();
        let _ = reader.read_to_end(&mut bytes)?;
        Self::deserialize(bytes)
    }
}

impl From<&Automaton> for FlatAutomaton {
    fn from(automaton: &Automaton) -> Self {
        let mut states = Vec::with_capacity(automaton.len());
        let mut next = Vec::new();
        let mut ranges = Vec::new();

        for (_, state) in automaton.iter() {
            let mut flags = 0;

            if state.is_back() {
                flags |= FlatState::BACK;
            }

            let ranges_start = ranges.len() as u32;

            match state.kind() {
                StateKind::Epsilon => flags |= FlatState::EPSILON,
                StateKind::Consuming(class) => {
                    if class.is_inverted() {
                        flags |= FlatState::INVERTED;
                    }
                    ranges.extend(
                        class
                            .ranges()
                            .iter()
                            .map(|range| (range.from, range.to)),
                    );
                }
            }

            let next_start = next.len() as u32;

            next.extend(state.next().iter().map(|id| id.index() as u32));

            states.push(FlatState {
                next_start,
                next_len: next.len() as u32 - next_start,
                ranges_start,
                ranges_len: ranges.len() as u32 - ranges_start,
                flags,
            });
        }

        Self {
            states,
            next,
            ranges,
            sources: automaton
                .sources()
                .iter()
                .map(|id| id.index() as u32)
                .collect(),
            accept: automaton.accept().index() as u32,
        }
    }
}

#[inline]
fn slice(start: u32, len: u32) -> std::ops::Range<usize> {
    start as usize..start as usize + len as usize
}
