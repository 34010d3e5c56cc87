//! End-to-end tests for building, compiling and firing machines.

use statewright::{
    ChainError, ConfigurationError, Definition, FireError, Payload, Phase, SideEffectFilter,
    State, TransitionContext,
};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Order {
    state: State,
    items: Vec<String>,
}

impl Order {
    fn new(state: &str) -> Self {
        Self {
            state: State::from(state),
            items: Vec::new(),
        }
    }
}

impl Payload for Order {
    fn state(&self) -> State {
        self.state.clone()
    }
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn count(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

fn enter(order: &mut Order, ctx: &TransitionContext) -> Result<(), statewright::BoxError> {
    order.state = ctx.destination().clone();
    Ok(())
}

/// NewOrder --Submit--> PublishedOrder --Cancel--> Canceled
fn order_workflow() -> Definition<Order> {
    let mut definition = Definition::new();
    definition
        .configure("NewOrder")
        .unwrap()
        .permit("Submit", "PublishedOrder")
        .unwrap()
        .permit("Cancel", "Canceled")
        .unwrap();
    definition
        .configure("PublishedOrder")
        .unwrap()
        .on_entry(enter)
        .permit("Cancel", "Canceled")
        .unwrap();
    definition.configure("Canceled").unwrap().on_entry(enter);
    definition
}

#[test]
fn duplicate_state_is_a_configuration_error() {
    let mut definition = Definition::<Order>::new();
    definition.configure("NewOrder").unwrap();

    let err = definition.configure("NewOrder").err().unwrap();
    assert_eq!(
        err,
        ConfigurationError::DuplicateState {
            state: State::from("NewOrder")
        }
    );
}

#[test]
fn duplicate_trigger_is_a_configuration_error() {
    let mut definition = Definition::<Order>::new();
    let err = definition
        .configure("NewOrder")
        .unwrap()
        .permit("Submit", "PublishedOrder")
        .unwrap()
        .permit("Submit", "Canceled")
        .err()
        .unwrap();

    assert!(matches!(err, ConfigurationError::DuplicateTrigger { ref trigger, .. } if trigger.as_str() == "Submit"));
}

#[test]
fn fire_reports_unknown_state_and_trigger() {
    let machine = order_workflow().compile().into_machine();

    let err = machine.fire(&mut Order::new("Limbo"), "Submit").unwrap_err();
    assert_eq!(err.error_code(), "STATE_NOT_FOUND");
    assert_eq!(
        err.to_string(),
        "State not found in definition of states: Limbo"
    );

    let err = machine
        .fire(&mut Order::new("NewOrder"), "Deliver")
        .unwrap_err();
    assert_eq!(err.error_code(), "TRIGGER_NOT_FOUND");
    assert_eq!(
        err.to_string(),
        "Trigger 'Deliver' not found in definition for state: NewOrder"
    );
}

#[test]
fn after_transition_filter_sees_one_notification() {
    let after_only = counter();
    let all_phases = Arc::new(Mutex::new(Vec::new()));

    let mut definition = order_workflow();
    let seen = Arc::clone(&after_only);
    definition.filtered_side_effect(SideEffectFilter::AFTER_TRANSITION, move |phase, _, _, _| {
        assert_eq!(phase, Phase::AfterTransition);
        seen.fetch_add(1, Ordering::SeqCst);
    });
    let phases = Arc::clone(&all_phases);
    definition.side_effect(move |phase, _, _, _| {
        phases.lock().unwrap().push(phase);
    });
    let machine = definition.compile().into_machine();

    let mut order = Order::new("NewOrder");
    machine.fire(&mut order, "Submit").unwrap();

    assert_eq!(count(&after_only), 1);
    assert_eq!(
        *all_phases.lock().unwrap(),
        vec![
            Phase::BeforeTransition,
            Phase::BetweenStates,
            Phase::AfterTransition
        ]
    );
}

#[test]
fn side_effects_see_the_transition_context() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut definition = order_workflow();
    let log = Arc::clone(&seen);
    definition.side_effect(move |phase, order: &Order, ctx, _elapsed| {
        log.lock().unwrap().push(format!(
            "{phase} {} {}->{} ({})",
            ctx.trigger(),
            ctx.source(),
            ctx.destination(),
            order.state
        ));
    });
    let machine = definition.compile().into_machine();

    machine.fire(&mut Order::new("NewOrder"), "Submit").unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            "BeforeTransition Submit NewOrder->PublishedOrder (NewOrder)",
            "BetweenStates Submit NewOrder->PublishedOrder (NewOrder)",
            "AfterTransition Submit NewOrder->PublishedOrder (PublishedOrder)",
        ]
    );
}

#[test]
fn failed_entry_chain_skips_after_transition() {
    let phases = Arc::new(Mutex::new(Vec::new()));
    let mut definition = Definition::<Order>::new();
    definition
        .configure("NewOrder")
        .unwrap()
        .permit("Submit", "PublishedOrder")
        .unwrap();
    definition
        .configure("PublishedOrder")
        .unwrap()
        .on_entry(|_, _| Err("misc entry error".into()));
    let log = Arc::clone(&phases);
    definition.side_effect(move |phase, _, _, _| log.lock().unwrap().push(phase));
    let machine = definition.compile().into_machine();

    let err = machine
        .fire(&mut Order::new("NewOrder"), "Submit")
        .unwrap_err();

    assert_eq!(err.error_code(), "CHAIN_FAILED");
    assert_eq!(
        *phases.lock().unwrap(),
        vec![Phase::BeforeTransition, Phase::BetweenStates]
    );
}

#[test]
fn failed_exit_chain_stops_before_entry() {
    let entered = counter();
    let phases = Arc::new(Mutex::new(Vec::new()));
    let mut definition = Definition::<Order>::new();
    definition
        .configure("NewOrder")
        .unwrap()
        .on_exit(|_, _| Err("misc exit error".into()))
        .permit("Submit", "PublishedOrder")
        .unwrap();
    let hits = Arc::clone(&entered);
    definition
        .configure("PublishedOrder")
        .unwrap()
        .on_entry(move |_, _| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    let log = Arc::clone(&phases);
    definition.side_effect(move |phase, _, _, _| log.lock().unwrap().push(phase));
    let machine = definition.compile().into_machine();

    let mut order = Order::new("NewOrder");
    let err = machine.fire(&mut order, "Submit").unwrap_err();

    match err.chain_error() {
        Some(ChainError::Operation { step, source, .. }) => {
            assert_eq!(*step, 0);
            assert_eq!(source.to_string(), "misc exit error");
        }
        other => panic!("Expected operation failure, got {other:?}"),
    }
    assert_eq!(count(&entered), 0);
    assert_eq!(
        *phases.lock().unwrap(),
        vec![Phase::BeforeTransition, Phase::BetweenStates]
    );
    assert_eq!(order.state, State::from("NewOrder"));
}

#[test]
fn panic_reports_step_number_and_inner_error() {
    let mut definition = Definition::<Order>::new();
    definition
        .configure("NewOrder")
        .unwrap()
        .permit("Submit", "PublishedOrder")
        .unwrap();
    definition
        .configure("PublishedOrder")
        .unwrap()
        .on_entry(|order, _| {
            order.items.push("first".to_string());
            Ok(())
        })
        .on_entry_labeled("reserve_stock", |order, _| {
            order.items.push("second".to_string());
            std::panic::panic_any(io::Error::new(io::ErrorKind::Other, "stock service down"))
        })
        .on_entry(|order, _| {
            order.items.push("never".to_string());
            Ok(())
        });
    let machine = definition.compile().into_machine();

    let mut order = Order::new("NewOrder");
    let err = machine.fire(&mut order, "Submit").unwrap_err();

    assert_eq!(err.error_code(), "CALLBACK_PANICKED");
    let panic = err.chain_error().and_then(ChainError::as_panic).unwrap();
    assert_eq!(panic.step_number, 1);
    assert_eq!(panic.label, "reserve_stock");
    assert_eq!(
        panic.inner_error().map(ToString::to_string),
        Some("stock service down".to_string())
    );
    assert_eq!(order.items, vec!["first", "second"]);
}

#[test]
fn panic_with_message_has_no_inner_error() {
    let mut definition = Definition::<Order>::new();
    definition
        .configure("NewOrder")
        .unwrap()
        .on_exit(|_, _| panic!("exit exploded"))
        .permit("Submit", "PublishedOrder")
        .unwrap();
    definition.configure("PublishedOrder").unwrap();
    let machine = definition.compile().into_machine();

    let err = machine
        .fire(&mut Order::new("NewOrder"), "Submit")
        .unwrap_err();

    let panic = err.chain_error().and_then(ChainError::as_panic).unwrap();
    assert_eq!(panic.step_number, 0);
    assert!(panic.inner_error().is_none());
    assert_eq!(panic.payload.to_string(), "exit exploded");
}

#[test]
fn panic_with_format_error_keeps_inner_error() {
    let mut definition = Definition::<Order>::new();
    definition
        .configure("NewOrder")
        .unwrap()
        .permit("Submit", "PublishedOrder")
        .unwrap();
    definition
        .configure("PublishedOrder")
        .unwrap()
        .on_entry(enter)
        .on_entry_labeled("render_invoice", |_, _| {
            std::panic::panic_any(std::fmt::Error)
        });
    let machine = definition.compile().into_machine();

    let err = machine
        .fire(&mut Order::new("NewOrder"), "Submit")
        .unwrap_err();

    assert_eq!(err.error_code(), "CALLBACK_PANICKED");
    let panic = err.chain_error().and_then(ChainError::as_panic).unwrap();
    assert_eq!(panic.step_number, 1);
    assert_eq!(panic.label, "render_invoice");
    assert_eq!(
        panic.inner_error().map(ToString::to_string),
        Some(std::fmt::Error.to_string())
    );
    assert!(panic.unknown_inner().is_none());
}

#[test]
fn side_effect_panic_escapes_fire() {
    let mut definition = order_workflow();
    definition.filtered_side_effect(SideEffectFilter::BETWEEN_STATES, |_, _, _, _| {
        panic!("notifier down")
    });
    let machine = definition.compile().into_machine();
    let mut order = Order::new("NewOrder");

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        machine.fire(&mut order, "Submit")
    }));

    let panic = match outcome {
        Ok(result) => panic!("Expected fire to unwind, it returned {result:?}"),
        Err(panic) => panic,
    };
    assert_eq!(panic.downcast_ref::<&str>(), Some(&"notifier down"));
    assert_eq!(order.state, State::from("NewOrder"));
}

#[test]
fn first_failing_handler_supersedes_and_stops_the_chain() {
    let h1_calls = counter();
    let mut definition = Definition::<Order>::new();
    let h1 = Arc::clone(&h1_calls);
    definition
        .configure("NewOrder")
        .unwrap()
        .on_exit(|_, _| Err("misc exit error".into()))
        .on_error_labeled("h0", |_, _, _| Err("handler failed".into()))
        .on_error_labeled("h1", move |_, ctx, _| {
            h1.fetch_add(1, Ordering::SeqCst);
            ctx.set_destination("Failed");
            Ok(())
        })
        .permit("Submit", "PublishedOrder")
        .unwrap();
    definition.configure("PublishedOrder").unwrap();
    definition.configure("Failed").unwrap();
    let machine = definition.compile().into_machine();

    let err = machine
        .fire(&mut Order::new("NewOrder"), "Submit")
        .unwrap_err();

    match err.chain_error() {
        Some(ChainError::Handler { label, source, .. }) => {
            assert_eq!(label, "h0");
            assert_eq!(source.to_string(), "handler failed");
        }
        other => panic!("Expected handler failure, got {other:?}"),
    }
    assert_eq!(count(&h1_calls), 0);
    assert_eq!(
        err.transition().unwrap().destination(),
        &State::from("PublishedOrder")
    );
}

#[test]
fn handled_error_retargets_reported_destination() {
    let causes = Arc::new(Mutex::new(Vec::new()));
    let reported = Arc::new(Mutex::new(Vec::new()));
    let failed_entries = counter();

    let mut definition = Definition::<Order>::new();
    let first = Arc::clone(&causes);
    let second = Arc::clone(&causes);
    definition
        .configure("NewOrder")
        .unwrap()
        .permit("Submit", "PublishedOrder")
        .unwrap();
    definition
        .configure("PublishedOrder")
        .unwrap()
        .on_entry(|_, _| Err("misc entry error".into()))
        .on_error(move |_, ctx, cause| {
            first.lock().unwrap().push(cause.to_string());
            ctx.set_destination("Failed");
            Ok(())
        })
        .on_error(move |order, ctx, cause| {
            second.lock().unwrap().push(cause.to_string());
            order.state = ctx.destination().clone();
            Ok(())
        });
    let entries = Arc::clone(&failed_entries);
    definition.configure("Failed").unwrap().on_entry(move |_, _| {
        entries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let log = Arc::clone(&reported);
    definition.side_effect(move |phase, _, ctx, _| {
        log.lock().unwrap().push((phase, ctx.destination().clone()));
    });
    let machine = definition.compile().into_machine();

    let mut order = Order::new("NewOrder");
    let err = machine.fire(&mut order, "Submit").unwrap_err();

    // The original failure is still returned.
    assert!(matches!(
        err.chain_error(),
        Some(ChainError::Operation { source, .. }) if source.to_string() == "misc entry error"
    ));
    assert_eq!(err.transition().unwrap().destination(), &State::from("Failed"));
    assert_eq!(order.state, State::from("Failed"));
    assert_eq!(count(&failed_entries), 0);

    let causes = causes.lock().unwrap();
    assert_eq!(causes.len(), 2);
    assert_eq!(causes[0], causes[1]);

    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 2);
    assert!(reported
        .iter()
        .all(|(_, destination)| destination.as_str() == "PublishedOrder"));
}

#[test]
fn exit_failure_dispatches_between_states_with_retargeted_context() {
    let reported = Arc::new(Mutex::new(Vec::new()));
    let mut definition = Definition::<Order>::new();
    definition
        .configure("NewOrder")
        .unwrap()
        .on_exit(|_, _| Err("misc exit error".into()))
        .on_error(|_, ctx, _| {
            ctx.set_destination("Rejected");
            Ok(())
        })
        .permit("Submit", "PublishedOrder")
        .unwrap();
    definition.configure("PublishedOrder").unwrap();
    let log = Arc::clone(&reported);
    definition.filtered_side_effect(SideEffectFilter::BETWEEN_STATES, move |_, _, ctx, _| {
        log.lock().unwrap().push(ctx.destination().clone());
    });
    let machine = definition.compile().into_machine();

    machine
        .fire(&mut Order::new("NewOrder"), "Submit")
        .unwrap_err();

    assert_eq!(*reported.lock().unwrap(), vec![State::from("Rejected")]);
}

#[test]
fn enumerate_returns_configured_triggers() {
    let mut definition = Definition::<Order>::new();
    definition
        .configure("Created")
        .unwrap()
        .permit("Open", "Opened")
        .unwrap()
        .permit("Cancel", "Canceled")
        .unwrap();
    let machine = definition.compile().into_machine();

    let mut triggers: Vec<String> = machine
        .enumerate_active_triggers(&Order::new("Created"))
        .unwrap()
        .into_iter()
        .map(|t| t.as_str().to_string())
        .collect();
    triggers.sort();

    assert_eq!(triggers, vec!["Cancel", "Open"]);
}

#[test]
fn can_fire_with_rejecting_guard_runs_nothing() {
    let guard_calls = counter();
    let chain_calls = counter();
    let effect_calls = counter();

    let mut definition = Definition::<Order>::new();
    let guards = Arc::clone(&guard_calls);
    let exits = Arc::clone(&chain_calls);
    definition
        .configure("Created")
        .unwrap()
        .on_exit(move |_, _| {
            exits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .permit_if(
            move |_, _| {
                guards.fetch_add(1, Ordering::SeqCst);
                Err("not yet".into())
            },
            "Open",
            "Opened",
        )
        .unwrap();
    let entries = Arc::clone(&chain_calls);
    definition
        .configure("Opened")
        .unwrap()
        .on_entry(move |_, _| {
            entries.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    let effects = Arc::clone(&effect_calls);
    definition.side_effect(move |_, _, _, _| {
        effects.fetch_add(1, Ordering::SeqCst);
    });
    let machine = definition.compile().into_machine();

    let err = machine.can_fire(&Order::new("Created"), "Open").unwrap_err();

    match err {
        FireError::GuardRejected { source, .. } => assert_eq!(source.to_string(), "not yet"),
        other => panic!("Expected guard rejection, got {other:?}"),
    }
    assert_eq!(count(&guard_calls), 1);
    assert_eq!(count(&chain_calls), 0);
    assert_eq!(count(&effect_calls), 0);
}

#[test]
fn trigger_scoped_entry_runs_only_for_its_trigger() {
    let always = counter();
    let resupply = counter();

    let mut definition = Definition::<Order>::new();
    definition
        .configure("NewOrder")
        .unwrap()
        .permit("Submit", "PublishedOrder")
        .unwrap();
    let all = Arc::clone(&always);
    let scoped = Arc::clone(&resupply);
    definition
        .configure("PublishedOrder")
        .unwrap()
        .on_entry(move |_, _| {
            all.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .on_trigger_entry("Resupply", move |_, _| {
            scoped.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .permit("Resupply", "PublishedOrder")
        .unwrap();
    let machine = definition.compile().into_machine();

    let mut order = Order::new("NewOrder");
    machine.fire(&mut order, "Submit").unwrap();
    assert_eq!((count(&always), count(&resupply)), (1, 0));

    order.state = State::from("PublishedOrder");
    machine.fire(&mut order, "Resupply").unwrap();
    assert_eq!((count(&always), count(&resupply)), (2, 1));

    machine.fire(&mut order, "Resupply").unwrap();
    assert_eq!((count(&always), count(&resupply)), (3, 2));
}

#[test]
fn elapsed_millis_is_reported_to_side_effects() {
    let elapsed = Arc::new(Mutex::new(Vec::new()));
    let mut definition = order_workflow();
    let log = Arc::clone(&elapsed);
    definition.side_effect(move |_, _, _, millis| log.lock().unwrap().push(millis));
    let machine = definition.compile().into_machine();

    let ctx = machine.fire(&mut Order::new("NewOrder"), "Submit").unwrap();

    let elapsed = elapsed.lock().unwrap();
    assert_eq!(elapsed.len(), 3);
    assert!(elapsed.windows(2).all(|w| w[0] <= w[1]));
    assert!(ctx.started_at() <= chrono::Utc::now());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn compiled_machine_is_shared_across_tasks() {
    let completed = counter();
    let mut definition = order_workflow();
    let done = Arc::clone(&completed);
    definition.filtered_side_effect(SideEffectFilter::AFTER_TRANSITION, move |_, _, _, _| {
        done.fetch_add(1, Ordering::SeqCst);
    });
    let machine = definition.compile().into_machine();

    let mut handles = Vec::new();
    for i in 0..16 {
        let machine = machine.clone();
        handles.push(tokio::spawn(async move {
            let mut order = Order::new("NewOrder");
            order.items.push(format!("item-{i}"));
            let first = machine.fire(&mut order, "Submit").map(|ctx| ctx.id());
            let second = machine.fire(&mut order, "Cancel").map(|ctx| ctx.id());
            (first.is_ok(), second.is_ok(), order.state)
        }));
    }

    for handle in handles {
        let (first, second, state) = handle.await.unwrap();
        assert!(first && second);
        assert_eq!(state, State::from("Canceled"));
    }
    assert_eq!(count(&completed), 32);
}
