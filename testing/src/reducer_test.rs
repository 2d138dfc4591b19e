//! Given-When-Then scenarios for reducers.

#![allow(clippy::module_name_repetitions)]

use busdesk_core::{effect::Effect, reducer::Reducer};

/// One `then_*` check, kept in registration order.
enum Check<S, A> {
    State(Box<dyn FnOnce(&S)>),
    Effects(Box<dyn FnOnce(&[Effect<A>])>),
}

/// A reducer scenario.
///
/// Actions given with [`when_action`](Self::when_action) are reduced in
/// order; state checks see the final state, effect checks see the effects of
/// the last action.
///
/// ```ignore
/// ReducerTest::new(SaleReducer::new())
///     .with_env(env)
///     .given_state(ready_to_submit)
///     .when_action(SaleAction::Submit)
///     .then_state(|s| assert!(s.submitting))
///     .then_effects(assertions::assert_has_future_effect)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    given: Option<S>,
    actions: Vec<A>,
    checks: Vec<Check<S, A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Scenario for `reducer`.
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            given: None,
            actions: Vec::new(),
            checks: Vec::new(),
        }
    }

    /// Environment passed to every `reduce` call.
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Starting state.
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.given = Some(state);
        self
    }

    /// Queue an action.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Check the final state.
    #[must_use]
    pub fn then_state(mut self, check: impl FnOnce(&S) + 'static) -> Self {
        self.checks.push(Check::State(Box::new(check)));
        self
    }

    /// Check the effects returned for the last action.
    #[must_use]
    pub fn then_effects(mut self, check: impl FnOnce(&[Effect<A>]) + 'static) -> Self {
        self.checks.push(Check::Effects(Box::new(check)));
        self
    }

    /// Reduce every queued action, run the checks and hand back the state.
    ///
    /// # Panics
    ///
    /// When the state, environment or actions are missing, or a check fails.
    #[allow(clippy::panic)]
    pub fn run(self) -> S {
        let (Some(mut state), Some(env)) = (self.given, self.environment) else {
            panic!("a scenario needs given_state() and with_env()");
        };
        assert!(!self.actions.is_empty(), "a scenario needs when_action()");

        let mut last_effects = Vec::new();
        for action in self.actions {
            last_effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for check in self.checks {
            match check {
                Check::State(check) => check(&state),
                Check::Effects(check) => check(&last_effects),
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{assertions, resolve_effects};
    use busdesk_core::{SmallVec, smallvec};
    use std::time::Duration;

    /// Seats held for one trip, capped by the environment.
    #[derive(Clone, Debug, Default, PartialEq)]
    struct Holds {
        seats: Vec<u32>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum HoldAction {
        Hold(u32),
        Drop(u32),
        Expire(u32),
    }

    struct Limit(usize);

    struct HoldReducer;

    impl Reducer for HoldReducer {
        type State = Holds;
        type Action = HoldAction;
        type Environment = Limit;

        fn reduce(
            &self,
            state: &mut Holds,
            action: HoldAction,
            env: &Limit,
        ) -> SmallVec<[Effect<HoldAction>; 4]> {
            match action {
                HoldAction::Hold(seat) if state.seats.len() < env.0 => {
                    state.seats.push(seat);
                    smallvec![Effect::delay(
                        Duration::from_secs(600),
                        HoldAction::Expire(seat)
                    )]
                },
                HoldAction::Hold(_) => smallvec![Effect::None],
                HoldAction::Drop(seat) | HoldAction::Expire(seat) => {
                    state.seats.retain(|s| *s != seat);
                    SmallVec::new()
                },
            }
        }
    }

    #[test]
    fn actions_apply_in_order() {
        let state = ReducerTest::new(HoldReducer)
            .with_env(Limit(5))
            .given_state(Holds::default())
            .when_action(HoldAction::Hold(4))
            .when_action(HoldAction::Hold(7))
            .when_action(HoldAction::Drop(4))
            .then_state(|s| assert_eq!(s.seats, [7]))
            .then_effects(assertions::assert_no_effects)
            .run();
        assert_eq!(state.seats.len(), 1);
    }

    #[test]
    fn effects_come_from_the_last_action() {
        ReducerTest::new(HoldReducer)
            .with_env(Limit(1))
            .given_state(Holds { seats: vec![2] })
            .when_action(HoldAction::Hold(3))
            .then_state(|s| assert_eq!(s.seats, [2]))
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn delayed_expiry_resolves_to_its_action() {
        ReducerTest::new(HoldReducer)
            .with_env(Limit(5))
            .given_state(Holds::default())
            .when_action(HoldAction::Hold(9))
            .then_effects(assertions::assert_has_delay_effect)
            .run();

        let effects = HoldReducer
            .reduce(&mut Holds::default(), HoldAction::Hold(9), &Limit(5))
            .into_vec();
        assert_eq!(resolve_effects(effects).await, [HoldAction::Expire(9)]);
    }

    #[test]
    #[should_panic(expected = "needs when_action")]
    fn scenario_without_actions_fails() {
        ReducerTest::new(HoldReducer)
            .with_env(Limit(5))
            .given_state(Holds::default())
            .run();
    }
}
