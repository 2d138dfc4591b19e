//! Inspecting and resolving effects outside a store.

use busdesk_core::effect::Effect;
use std::future::Future;
use std::pin::Pin;

/// Run effects to completion and collect the actions they would feed back.
///
/// `Future` effects are awaited in order. `Delay` effects hand over their
/// action at once, so tests never sleep. `Parallel` effects are flattened.
pub async fn resolve_effects<A: Send + 'static>(effects: Vec<Effect<A>>) -> Vec<A> {
    let mut actions = Vec::new();
    for effect in effects {
        collect(effect, &mut actions).await;
    }
    actions
}

fn collect<A: Send + 'static>(
    effect: Effect<A>,
    actions: &mut Vec<A>,
) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
    Box::pin(async move {
        match effect {
            Effect::None => {},
            Effect::Future(fut) => actions.extend(fut.await),
            Effect::Delay { action, .. } => actions.push(*action),
            Effect::Parallel(effects) => {
                for effect in effects {
                    collect(effect, actions).await;
                }
            },
        }
    })
}

/// Assertions over a reducer's returned effects.
pub mod assertions {
    use busdesk_core::effect::Effect;

    fn kinds<A>(effects: &[Effect<A>]) -> Vec<&'static str> {
        effects
            .iter()
            .map(|effect| match effect {
                Effect::None => "none",
                Effect::Future(_) => "future",
                Effect::Delay { .. } => "delay",
                Effect::Parallel(_) => "parallel",
            })
            .collect()
    }

    /// Nothing to run: the list is empty or holds only `Effect::None`.
    ///
    /// # Panics
    ///
    /// If any effect does work.
    pub fn assert_no_effects<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "expected no effects, got {:?}",
            kinds(effects)
        );
    }

    /// Exactly `expected` effects, `Effect::None` included.
    ///
    /// # Panics
    ///
    /// If the count differs.
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "expected {expected} effects, got {:?}",
            kinds(effects)
        );
    }

    /// At least one top-level `Future`.
    ///
    /// # Panics
    ///
    /// If there is none.
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "expected a future effect, got {:?}",
            kinds(effects)
        );
    }

    /// At least one top-level `Delay`.
    ///
    /// # Panics
    ///
    /// If there is none.
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Delay { .. })),
            "expected a delay effect, got {:?}",
            kinds(effects)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Lookup {
        Fetched(u32),
        Expired,
    }

    #[tokio::test]
    async fn delays_resolve_without_sleeping() {
        let effects = vec![
            Effect::None,
            Effect::merge(vec![
                Effect::future(async { Some(Lookup::Fetched(3)) }),
                Effect::delay(Duration::from_secs(3600), Lookup::Expired),
            ]),
            Effect::future(async { None }),
        ];

        let actions = tokio::time::timeout(Duration::from_secs(1), resolve_effects(effects))
            .await
            .unwrap_or_default();
        assert_eq!(actions, [Lookup::Fetched(3), Lookup::Expired]);
    }

    #[test]
    fn none_effects_count_as_nothing() {
        assertions::assert_no_effects::<Lookup>(&[]);
        assertions::assert_no_effects::<Lookup>(&[Effect::None, Effect::None]);
        assertions::assert_effects_count::<Lookup>(&[Effect::None], 1);
    }

    #[test]
    #[should_panic(expected = "expected a delay effect")]
    fn missing_delay_is_reported() {
        assertions::assert_has_delay_effect(&[Effect::future(async { Some(Lookup::Expired) })]);
    }
}
