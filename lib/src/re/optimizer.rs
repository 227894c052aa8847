/*! Removes epsilon chains from an NFA.

The NFA produced by the [Thompson's construction][`crate::re::thompson`]
is full of epsilon states. Most of them simply connect one consuming state
to the next one. The optimizer replaces every path made of epsilon states
with a direct transition from the path's origin to the first non-epsilon
state (or the accepting state) found at its end, producing an equivalent
NFA where the accepting state is the only epsilon state left.

Optimized states are created in waves. The first wave contains the sources,
each subsequent wave contains the states discovered as path endings while
processing the previous one. Each original state is materialized at most
once.
*/

use log::debug;

use crate::re::bitmapset::BitmapSet;
use crate::re::nfa::{Automaton, State, StateId};

/// Returns an NFA that recognizes the same language as `nfa`, but where
/// the only epsilon state is the accepting one.
///
/// The input is not modified, all the states in the result are new.
pub fn optimize(nfa: &Automaton) -> Automaton {
    // Optimized states, indexed by the index of the original state they
    // correspond to. `None` means that the state was optimized out, or
    // wasn't processed yet. The successors of the optimized states are
    // original ids until the states are compacted at the end.
    let mut optimized: Vec<Option<State>> = vec![None; nfa.len()];

    let mut current_wave: Vec<StateId> = Vec::with_capacity(nfa.len());
    let mut next_wave: Vec<StateId> = Vec::with_capacity(nfa.len());

    let mut paths = EpsilonPaths::new(nfa.len());

    for source in nfa.sources() {
        optimized[source.index()] = Some(nfa.state(*source).detached());
        current_wave.push(*source);
    }

    while !current_wave.is_empty() {
        for id in current_wave.drain(..) {
            let state = nfa.state(id);
            if state.is_sink() {
                continue;
            }
            for ending in paths.endings(nfa, state) {
                if optimized[ending.index()].is_none() {
                    optimized[ending.index()] =
                        Some(nfa.state(ending).detached());
                    next_wave.push(ending);
                }
                // The state being processed was materialized when it was
                // added to a wave.
                if let Some(state) = optimized[id.index()].as_mut() {
                    state.add_next(ending);
                }
            }
        }
        std::mem::swap(&mut current_wave, &mut next_wave);
    }

    // Epsilon sources are replaced by their successors, which are already
    // optimized. Sinks are kept, so there's always some source left.
    let mut sources = Vec::with_capacity(nfa.sources().len());

    for source in nfa.sources() {
        let replace = optimized[source.index()]
            .as_ref()
            .is_some_and(|state| state.is_epsilon() && !state.is_sink());

        if replace {
            if let Some(state) = optimized[source.index()].take() {
                sources.extend(state.next().iter().copied());
            }
        } else {
            sources.push(*source);
        }
    }

    // The accepting state is always reachable as a path ending, unless the
    // NFA doesn't accept anything at all. Keep it anyways, before assigning
    // new ids, so it takes its place in the original order.
    if optimized[nfa.accept().index()].is_none() {
        optimized[nfa.accept().index()] =
            Some(nfa.state(nfa.accept()).detached());
    }

    // Compact the optimized states, preserving the relative order of the
    // original ones.
    let mut new_ids = vec![None; nfa.len()];
    let mut count = 0;

    for (index, state) in optimized.iter().enumerate() {
        if state.is_some() {
            new_ids[index] = Some(StateId::from(count));
            count += 1;
        }
    }

    let remap = |id: &StateId| {
        new_ids[id.index()].expect("transition to a state optimized out")
    };

    let mut states = Vec::with_capacity(count + 1);

    for state in optimized.into_iter().flatten() {
        let mut new_state = state.detached();
        for next in state.next() {
            new_state.add_next(remap(next));
        }
        states.push(new_state);
    }

    let mut unique_sources: Vec<StateId> = Vec::with_capacity(sources.len());
    for source in sources.iter().map(remap) {
        if !unique_sources.contains(&source) {
            unique_sources.push(source);
        }
    }

    let optimized =
        Automaton::new(states, unique_sources, remap(&nfa.accept()));

    debug!("optimized NFA from {} to {} states", nfa.len(), optimized.len());

    optimized
}

/// Finds the paths `O -> e1 -> ... -> en -> T` that start at some origin
/// `O`, traverse epsilon states `e1 ... en` only, and end at `T`, which is
/// either a consuming state or a sink.
struct EpsilonPaths {
    visited: BitmapSet,
    stack: Vec<StateId>,
}

impl EpsilonPaths {
    fn new(num_states: usize) -> Self {
        Self {
            visited: BitmapSet::with_capacity(num_states),
            stack: Vec::new(),
        }
    }

    /// Returns the ending `T` of every path starting at `origin`. Each
    /// ending is returned once, in depth-first order.
    fn endings(&mut self, nfa: &Automaton, origin: &State) -> Vec<StateId> {
        let mut endings = Vec::new();

        self.stack.extend(origin.next().iter().rev().copied());

        while let Some(id) = self.stack.pop() {
            if !self.visited.insert(id.index()) {
                continue;
            }

            let state = nfa.state(id);

            if !state.is_epsilon() || state.is_sink() {
                endings.push(id);
            }

            if state.is_epsilon() {
                self.stack.extend(state.next().iter().rev().copied());
            }
        }

        self.visited.clear();

        endings
    }
}
