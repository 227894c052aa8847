/*! Converts an NFA into an equivalent DFA using the subset construction.

Every transition `X -> T` in the (optimized) NFA is seen as an *arrow*.
Each source also gets an arrow of its own, whose target is the source. A
DFA state is the set of arrows that can be traversed after reading some
input prefix, represented as a bitset over the universe of arrows.

From a set of arrows, the DFA state that follows after reading byte `c` is
the set of arrows leaving every arrow target whose class matches `c`. A
DFA state is accepting if any of its arrows leads to the accepting state
of the NFA.

The resulting DFA uses the same representation as the NFA: every DFA state
is an epsilon state that forks into consuming states, one per input byte
with a transition (or one per target state if classes are compacted), and
each consuming state leads to the next DFA state. Accepting DFA states
have an additional transition to the single accepting state.
*/

use std::collections::VecDeque;
use std::ops::Range;

use bitvec::array::BitArray;
use bitvec::order::Lsb0;
use log::debug;
use rustc_hash::FxHashMap;

use crate::re::nfa::{Automaton, CharClass, CharRange, State, StateId};
use crate::re::optimizer::optimize;

use state_set::StateSet;

mod state_set;

#[cfg(test)]
mod tests;

/// The set of byte values a DFA is built for.
///
/// Bytes outside of the alphabet have no transitions in the DFA, inputs
/// that contain them are never matched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Alphabet {
    bytes: BitArray<[u64; 4], Lsb0>,
}

impl Alphabet {
    /// Alphabet that contains every byte value.
    pub fn all() -> Self {
        Self { bytes: BitArray::new([u64::MAX; 4]) }
    }

    /// Alphabet that contains the given bytes. Duplicates are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut alphabet = Self { bytes: BitArray::ZERO };
        for byte in bytes {
            alphabet.bytes.set(*byte as usize, true);
        }
        alphabet
    }

    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        self.bytes[byte as usize]
    }

    /// Number of bytes in the alphabet.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.count_ones()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.not_any()
    }

    /// Returns the bytes in the alphabet in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        // Indexes are lower than 256.
        self.bytes.iter_ones().map(|byte| byte as u8)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::all()
    }
}

/// Builds DFAs out of NFAs.
#[derive(Clone, Debug, Default)]
pub struct Determinizer {
    alphabet: Alphabet,
    compact_classes: bool,
}

impl Determinizer {
    pub fn new(alphabet: Alphabet) -> Self {
        Self { alphabet, compact_classes: false }
    }

    /// If true, the transitions of each DFA state that lead to the same
    /// DFA state are merged into a single consuming state whose class is
    /// the union of the bytes. Otherwise every transition has a class with
    /// a single byte.
    pub fn compact_classes(mut self, yes: bool) -> Self {
        self.compact_classes = yes;
        self
    }

    /// Returns a DFA that accepts the same inputs as `nfa`, restricted to
    /// the bytes in the alphabet.
    ///
    /// The DFA has one source per source in `nfa`. If `nfa` is not epsilon
    /// free it's optimized first.
    pub fn determinize(&self, nfa: &Automaton) -> Automaton {
        let optimized;
        let nfa = if nfa.is_epsilon_free() {
            nfa
        } else {
            debug!(
                "optimizing NFA with {} states before determinizing",
                nfa.len()
            );
            optimized = optimize(nfa);
            &optimized
        };

        let arrows = Arrows::new(nfa);
        let mut subsets = Subsets::new(arrows.len());

        let sources: Vec<StateId> = arrows
            .sources()
            .map(|arrow| {
                subsets.intern(StateSet::singleton(arrows.len(), arrow))
            })
            .collect();

        let mut accepting = Vec::new();
        let mut targets = Vec::new();
        let mut transitions: Vec<(u8, StateId)> = Vec::new();

        while let Some((set, dstate)) = subsets.worklist.pop_front() {
            targets.clear();
            targets.extend(set.iter().map(|arrow| arrows.target(arrow)));
            targets.sort_unstable();
            targets.dedup();

            if targets.contains(&nfa.accept()) {
                accepting.push(dstate);
            }

            transitions.clear();

            for byte in self.alphabet.iter() {
                let mut next = StateSet::new(arrows.len());
                for target in targets.iter() {
                    let matches = nfa
                        .state(*target)
                        .condition()
                        .is_some_and(|class| class.matches(byte));
                    if matches {
                        for arrow in arrows.outgoing(*target) {
                            next.insert(arrow);
                        }
                    }
                }
                if !next.is_empty() {
                    transitions.push((byte, subsets.intern(next)));
                }
            }

            if self.compact_classes {
                for (target, ranges) in group_by_target(&transitions) {
                    subsets.transition(
                        dstate,
                        CharClass::new(ranges, false),
                        target,
                    );
                }
            } else {
                for (byte, target) in transitions.iter() {
                    subsets.transition(
                        dstate,
                        CharClass::single(*byte),
                        *target,
                    );
                }
            }
        }

        let accept = subsets.add_state(State::epsilon());

        for dstate in accepting {
            subsets.link(dstate, accept);
        }

        debug!(
            "determinized NFA with {} states into {} DFA states",
            nfa.len(),
            subsets.dstates.len()
        );

        let dfa = Automaton::from_arena(subsets.arena, &sources, accept);

        debug!("DFA has {} states", dfa.len());

        dfa
    }
}

/// Groups transitions by target, merging consecutive bytes into ranges.
/// Targets appear in the order of their first transition, `transitions`
/// must be sorted by byte.
fn group_by_target(
    transitions: &[(u8, StateId)],
) -> Vec<(StateId, Vec<CharRange>)> {
    let mut groups: Vec<(StateId, Vec<CharRange>)> = Vec::new();

    for (byte, target) in transitions.iter().copied() {
        match groups.iter_mut().find(|(t, _)| *t == target) {
            Some((_, ranges)) => match ranges.last_mut() {
                Some(last) if last.to.checked_add(1) == Some(byte) => {
                    last.to = byte
                }
                _ => ranges.push(CharRange::new(byte, byte)),
            },
            None => groups.push((target, vec![CharRange::new(byte, byte)])),
        }
    }

    groups
}

/// The universe of arrows of an epsilon free NFA.
///
/// Arrows `0..sources` correspond to the sources, the rest are the
/// transitions of each state, grouped by state in index order.
struct Arrows {
    targets: Vec<StateId>,
    outgoing: Vec<Range<usize>>,
    num_sources: usize,
}

impl Arrows {
    fn new(nfa: &Automaton) -> Self {
        let mut targets = Vec::with_capacity(nfa.len() * 2);
        let mut outgoing = Vec::with_capacity(nfa.len());

        targets.extend(nfa.sources().iter().copied());

        for (_, state) in nfa.iter() {
            let start = targets.len();
            targets.extend(state.next().iter().copied());
            outgoing.push(start..targets.len());
        }

        Self { targets, outgoing, num_sources: nfa.sources().len() }
    }

    #[inline]
    fn len(&self) -> usize {
        self.targets.len()
    }

    fn sources(&self) -> Range<usize> {
        0..self.num_sources
    }

    #[inline]
    fn target(&self, arrow: usize) -> StateId {
        self.targets[arrow]
    }

    /// Arrows that leave `state`.
    #[inline]
    fn outgoing(&self, state: StateId) -> Range<usize> {
        self.outgoing[state.index()].clone()
    }
}

/// DFA states discovered so far, and the arena where the DFA is built.
struct Subsets {
    width: usize,
    arena: Vec<State>,
    dstates: FxHashMap<StateSet, StateId>,
    worklist: VecDeque<(StateSet, StateId)>,
}

impl Subsets {
    fn new(width: usize) -> Self {
        Self {
            width,
            arena: Vec::new(),
            dstates: FxHashMap::default(),
            worklist: VecDeque::new(),
        }
    }

    /// Returns the DFA state for `set`, creating it and queueing it for
    /// processing if it was not seen before.
    fn intern(&mut self, set: StateSet) -> StateId {
        debug_assert!(set.iter().all(|arrow| arrow < self.width));

        if let Some(id) = self.dstates.get(&set) {
            return *id;
        }

        let id = self.add_state(State::epsilon());
        self.dstates.insert(set.clone(), id);
        self.worklist.push_back((set, id));
        id
    }

    fn add_state(&mut self, state: State) -> StateId {
        let id = StateId::from(self.arena.len());
        self.arena.push(state);
        id
    }

    #[inline]
    fn link(&mut self, from: StateId, to: StateId) {
        self.arena[from.index()].add_next(to);
    }

    /// dstate -> [class] -> target
    fn transition(
        &mut self,
        dstate: StateId,
        class: CharClass,
        target: StateId,
    ) {
        let c = self.add_state(State::consuming(class));
        self.link(dstate, c);
        self.link(c, target);
    }
}
