/*! Data model shared by every automaton produced in this crate.

An [`Automaton`] is an arena of [`State`]s addressed by [`StateId`]. States
refer to their successors by id, never by reference, so loops introduced by
the `+` and `*` quantifiers are ordinary cycles in the id graph.

There are two kinds of states. Epsilon states don't consume input, they
simply fork into their successors. Consuming states carry a [`CharClass`]
and their transitions are taken only after consuming one byte that belongs
to the class. The accepting state is always an epsilon state without
successors.
*/

use std::fmt::{Display, Formatter};

/// Inclusive range of byte values `[from, to]`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct CharRange {
    pub from: u8,
    pub to: u8,
}

impl CharRange {
    pub fn new(from: u8, to: u8) -> Self {
        Self { from, to }
    }

    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        self.from <= byte && byte <= self.to
    }
}

/// A set of byte values described by a list of ranges plus an inversion
/// flag.
///
/// Ranges are neither sorted nor disjoint. A non-inverted class matches the
/// bytes that fall in any of the ranges, an inverted one matches the bytes
/// that don't fall in any of them.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CharClass {
    ranges: Vec<CharRange>,
    inverted: bool,
}

impl CharClass {
    pub fn new(ranges: Vec<CharRange>, inverted: bool) -> Self {
        Self { ranges, inverted }
    }

    /// Class that matches any byte, used for the dot.
    pub fn any() -> Self {
        Self::new(Vec::new(), true)
    }

    /// Class that matches exactly one byte.
    pub fn single(byte: u8) -> Self {
        Self::new(vec![CharRange::new(byte, byte)], false)
    }

    /// Class that matches the given bytes.
    pub fn list(bytes: &[u8]) -> Self {
        Self::new(
            bytes.iter().map(|b| CharRange::new(*b, *b)).collect(),
            false,
        )
    }

    /// Returns a copy of this class with the inversion flag flipped.
    pub fn inverted(&self) -> Self {
        Self::new(self.ranges.clone(), !self.inverted)
    }

    #[inline]
    pub fn ranges(&self) -> &[CharRange] {
        self.ranges.as_slice()
    }

    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Returns true if `byte` belongs to the class.
    #[inline]
    pub fn matches(&self, byte: u8) -> bool {
        self.ranges.iter().any(|range| range.contains(byte)) != self.inverted
    }
}

impl Display for CharClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.inverted {
            write!(f, "^")?;
        }
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "[{:#04x}-{:#04x}]", range.from, range.to)?;
        }
        Ok(())
    }
}

/// Identifies a state within an [`Automaton`].
///
/// The id is the position of the state in [`Automaton::states`], ids are
/// dense and start at zero.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StateId(u32);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for StateId {
    fn from(value: usize) -> Self {
        Self(value.try_into().expect("too many automaton states"))
    }
}

impl From<StateId> for usize {
    fn from(value: StateId) -> Self {
        value.index()
    }
}

impl Display for StateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:05x}", self.0)
    }
}

/// The two kinds of automaton states.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StateKind {
    /// Doesn't consume input.
    Epsilon,
    /// Consumes one byte matching the class.
    Consuming(CharClass),
}

/// A state in an automaton.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct State {
    kind: StateKind,
    /// Set on the intermediate epsilon states that close the loops created
    /// by `+` and `*`. Matching doesn't depend on it.
    back: bool,
    next: Vec<StateId>,
}

impl State {
    pub fn new(kind: StateKind, back: bool, next: Vec<StateId>) -> Self {
        Self { kind, back, next }
    }

    pub fn epsilon() -> Self {
        Self::new(StateKind::Epsilon, false, Vec::new())
    }

    pub fn back() -> Self {
        Self::new(StateKind::Epsilon, true, Vec::new())
    }

    pub fn consuming(class: CharClass) -> Self {
        Self::new(StateKind::Consuming(class), false, Vec::new())
    }

    #[inline]
    pub fn kind(&self) -> &StateKind {
        &self.kind
    }

    /// Returns the class of a consuming state, or `None` for an epsilon
    /// state.
    #[inline]
    pub fn condition(&self) -> Option<&CharClass> {
        match &self.kind {
            StateKind::Epsilon => None,
            StateKind::Consuming(class) => Some(class),
        }
    }

    #[inline]
    pub fn is_epsilon(&self) -> bool {
        matches!(self.kind, StateKind::Epsilon)
    }

    #[inline]
    pub fn is_back(&self) -> bool {
        self.back
    }

    /// A sink is a state without outgoing transitions.
    #[inline]
    pub fn is_sink(&self) -> bool {
        self.next.is_empty()
    }

    #[inline]
    pub fn next(&self) -> &[StateId] {
        self.next.as_slice()
    }

    #[inline]
    pub(crate) fn add_next(&mut self, state: StateId) {
        self.next.push(state);
    }

    /// Returns a copy of this state with the same kind and `back` flag but
    /// without successors.
    pub(crate) fn detached(&self) -> Self {
        Self::new(self.kind.clone(), self.back, Vec::new())
    }
}

/// A finite automaton with epsilon states.
///
/// Invariants:
///
/// * `states()[id.index()]` is the state identified by `id`, for every id
///   stored in the automaton.
/// * There's at least one source.
/// * The accepting state is an epsilon state without successors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Automaton {
    states: Vec<State>,
    sources: Vec<StateId>,
    accept: StateId,
}

impl Automaton {
    /// Creates an automaton from states that already satisfy the
    /// invariants described in [`Automaton`].
    pub(crate) fn new(
        states: Vec<State>,
        sources: Vec<StateId>,
        accept: StateId,
    ) -> Self {
        debug_assert!(!sources.is_empty());
        debug_assert!(states[accept.index()].is_epsilon());
        debug_assert!(states[accept.index()].is_sink());
        Self { states, sources, accept }
    }

    /// Creates an automaton out of an arena that may contain states that
    /// are not reachable from the sources.
    ///
    /// The reachable states are renumbered in depth-first order starting
    /// at the sources, the rest are dropped.
    pub(crate) fn from_arena(
        arena: Vec<State>,
        sources: &[StateId],
        accept: StateId,
    ) -> Self {
        const UNASSIGNED: u32 = u32::MAX;

        let mut new_ids = vec![UNASSIGNED; arena.len()];
        let mut order = Vec::with_capacity(arena.len());
        let mut stack = Vec::new();

        for source in sources.iter().rev() {
            stack.push(*source);
        }

        // Pre-order DFS. Successors are pushed in reverse order so that
        // they are visited in the order they appear in the list.
        while let Some(id) = stack.pop() {
            if new_ids[id.index()] != UNASSIGNED {
                continue;
            }
            new_ids[id.index()] = order.len() as u32;
            order.push(id);
            for next in arena[id.index()].next.iter().rev() {
                if new_ids[next.index()] == UNASSIGNED {
                    stack.push(*next);
                }
            }
        }

        // The accepting state is always kept, even if the pattern can't
        // reach it.
        if new_ids[accept.index()] == UNASSIGNED {
            new_ids[accept.index()] = order.len() as u32;
            order.push(accept);
        }

        let remap = |id: &StateId| StateId(new_ids[id.index()]);

        let mut arena: Vec<Option<State>> =
            arena.into_iter().map(Some).collect();

        let states = order
            .iter()
            .map(|id| {
                let mut state = arena[id.index()]
                    .take()
                    .expect("state visited twice while renumbering");
                state.next = state.next.iter().map(remap).collect();
                state
            })
            .collect();

        let mut new_sources: Vec<StateId> = Vec::with_capacity(sources.len());
        for source in sources.iter().map(remap) {
            if !new_sources.contains(&source) {
                new_sources.push(source);
            }
        }

        Self::new(states, new_sources, remap(&accept))
    }

    #[inline]
    pub fn states(&self) -> &[State] {
        self.states.as_slice()
    }

    #[inline]
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    #[inline]
    pub fn sources(&self) -> &[StateId] {
        self.sources.as_slice()
    }

    #[inline]
    pub fn accept(&self) -> StateId {
        self.accept
    }

    /// Number of states in the automaton.
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns an iterator over the (id, state) pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states
            .iter()
            .enumerate()
            .map(|(i, state)| (StateId::from(i), state))
    }

    /// Returns true if the accepting state is the only epsilon state. This
    /// holds for the output of the optimizer.
    pub fn is_epsilon_free(&self) -> bool {
        self.iter().all(|(id, state)| id == self.accept || !state.is_epsilon())
    }
}

impl Display for Automaton {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        for (id, state) in self.iter() {
            write!(f, "{}:", id)?;
            if self.sources.contains(&id) {
                write!(f, " SOURCE")?;
            }
            match state.kind() {
                StateKind::Epsilon if id == self.accept => {
                    write!(f, " ACCEPT")?
                }
                StateKind::Epsilon if state.is_back() => write!(f, " BACK")?,
                StateKind::Epsilon => write!(f, " EPSILON")?,
                StateKind::Consuming(class) => write!(f, " CLASS {}", class)?,
            }
            if !state.is_sink() {
                write!(f, " ->")?;
                for next in state.next() {
                    write!(f, " {}", next)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
