use crate::access_log::AccessLog;
use crate::error::SigilError;
use meridian_trie::MerkleTrieState;

/// The state threaded through a sequence of table operations: the trie
/// itself, plus the access log accumulated so far.
#[derive(Clone, Debug)]
pub struct StoreState {
    pub trie: MerkleTrieState,
    pub access_log: AccessLog,
}

impl StoreState {
    pub fn genesis() -> Self {
        StoreState {
            trie: MerkleTrieState::genesis(),
            access_log: AccessLog::empty(),
        }
    }
}

/// A stateful, fallible computation over `StoreState`. Composition is
/// sequential: `bind` threads the state through in order and
/// short-circuits on the first failure, discarding the state at the
/// point of failure. There is deliberately no rollback-to-start
/// behavior — a failed `StoreF` simply never produces a successor
/// state.
pub struct StoreF<A> {
    run: Box<dyn FnOnce(StoreState) -> Result<(StoreState, A), SigilError>>,
}

impl<A: 'static> StoreF<A> {
    pub fn from_fn(
        f: impl FnOnce(StoreState) -> Result<(StoreState, A), SigilError> + 'static,
    ) -> Self {
        StoreF { run: Box::new(f) }
    }

    /// Returns `a` unchanged, leaving the state untouched.
    pub fn pure(a: A) -> Self {
        StoreF::from_fn(move |state| Ok((state, a)))
    }

    /// Fails immediately with `error`.
    pub fn raise(error: SigilError) -> Self {
        StoreF::from_fn(move |_state| Err(error))
    }

    pub fn run(self, state: StoreState) -> Result<(StoreState, A), SigilError> {
        (self.run)(state)
    }

    /// Runs `self` to completion, then threads its resulting state and
    /// value into `f`. This is the monad's sequencing operation.
    pub fn bind<B: 'static>(self, f: impl FnOnce(A) -> StoreF<B> + 'static) -> StoreF<B> {
        StoreF::from_fn(move |state| {
            let (state, a) = (self.run)(state)?;
            (f(a).run)(state)
        })
    }

    pub fn map<B: 'static>(self, f: impl FnOnce(A) -> B + 'static) -> StoreF<B> {
        self.bind(move |a| StoreF::pure(f(a)))
    }

    /// Runs `self` then `next`, discarding `self`'s value.
    pub fn then<B: 'static>(self, next: StoreF<B>) -> StoreF<B> {
        self.bind(move |_| next)
    }
}

/// Runs a sequence of `StoreF<()>` computations in order, short-circuiting
/// on the first failure. Useful for a reducer that performs several
/// writes in a row.
pub fn sequence(steps: Vec<StoreF<()>>) -> StoreF<()> {
    steps
        .into_iter()
        .fold(StoreF::pure(()), |acc, step| acc.then(step))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_leaves_state_untouched() {
        let state = StoreState::genesis();
        let (state, value) = StoreF::pure(7).run(state).unwrap();
        assert_eq!(value, 7);
        assert!(state.trie.current_root.is_none());
    }

    #[test]
    fn bind_threads_state_and_short_circuits_on_error() {
        let state = StoreState::genesis();
        let result = StoreF::pure(1)
            .bind(|_| StoreF::<i32>::raise(SigilError::other("boom")))
            .bind(|_| StoreF::pure(2))
            .run(state);
        assert!(result.is_err());
    }

    #[test]
    fn map_transforms_the_value_only() {
        let state = StoreState::genesis();
        let (_, value) = StoreF::pure(3).map(|v| v * 2).run(state).unwrap();
        assert_eq!(value, 6);
    }

    #[test]
    fn sequence_runs_steps_in_order() {
        let state = StoreState::genesis();
        let log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let log1 = log.clone();
        let log2 = log.clone();
        let steps = vec![
            StoreF::from_fn(move |s| {
                log1.lock().unwrap().push(1);
                Ok((s, ()))
            }),
            StoreF::from_fn(move |s| {
                log2.lock().unwrap().push(2);
                Ok((s, ()))
            }),
        ];
        sequence(steps).run(state).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }
}
