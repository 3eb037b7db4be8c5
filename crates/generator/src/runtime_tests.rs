use crate::runtime::{truthy, AutomatonSpec, Direction, Signal, System, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEADLINE: Duration = Duration::from_secs(2);

fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < DEADLINE {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

fn monitor(threshold: i64) -> AutomatonSpec {
    let mut spec = AutomatonSpec::new("monitor");
    spec.add_port("hb", Direction::In);
    spec.add_port("alarm", Direction::Out);
    spec.add_var("counter", Value::Int(0));
    spec.set_param("threshold", Value::Int(threshold));
    spec.add_transition(
        |ctx| ctx.read("hb") != Value::Null,
        |ctx| ctx.set_var("counter", Value::Int(0)),
    );
    spec.add_transition(
        |ctx| ctx.var("counter") >= ctx.param("threshold"),
        |ctx| ctx.write("alarm", Value::Bool(true)),
    );
    spec.add_transition(
        |ctx| ctx.var("counter") < ctx.param("threshold"),
        |ctx| ctx.set_var("counter", ctx.var("counter") + Value::Int(1)),
    );
    spec
}

#[test]
fn values_compare_with_numeric_promotion() {
    assert_eq!(Value::Int(2), Value::Real(2.0));
    assert!(Value::Int(1) < Value::Real(1.5));
    assert_eq!(Value::Int(2) + Value::Real(0.5), Value::Real(2.5));
    assert_ne!(Value::Null, Value::Int(0));
    assert_eq!(Value::Int(1) / Value::Int(0), Value::Null);
    assert_eq!(
        Value::from("a") + Value::from("b"),
        Value::from("ab")
    );
}

#[test]
fn unary_operators_on_values() {
    assert_eq!(-Value::Int(1), Value::Int(-1));
    assert_eq!(-Value::Real(2.5), Value::Real(-2.5));
    assert_eq!(-Value::from("x"), Value::Null);
    assert_eq!(!Value::Int(0), Value::Bool(true));
    assert_eq!(!Value::Bool(true), Value::Bool(false));
    assert_eq!(!Value::Null, Value::Bool(true));
}

#[test]
fn truthiness_of_values() {
    assert!(!truthy(Value::Null));
    assert!(!truthy(Value::Int(0)));
    assert!(truthy(Value::Int(3)));
    assert!(truthy(Value::Bool(true)));
    assert!(!truthy(Value::from("")));
    assert!(truthy(true));
}

#[test]
fn ports_read_without_consuming_and_take_consumes() {
    let mut spec = AutomatonSpec::new("a");
    spec.add_port("p", Direction::In);
    let port = spec.port("p").unwrap();
    port.deliver(Value::Int(7));
    assert!(port.pending());
    assert_eq!(port.read(), Value::Int(7));
    assert_eq!(port.read(), Value::Int(7));
    assert_eq!(port.take(), Value::Int(7));
    assert!(!port.pending());
    assert_eq!(port.read(), Value::Null);

    port.deliver(Value::Int(8));
    port.clear();
    assert!(!port.pending());
    assert_eq!(port.take(), Value::Null);
}

#[test]
fn initial_port_value_is_not_a_delivery() {
    let mut spec = AutomatonSpec::new("seeded");
    spec.add_port("p", Direction::In);
    spec.init_port("p", Value::Int(9));
    let ctx = spec.context();
    // The preset value is not pending, so the automaton does not observe
    // it until something is actually delivered.
    assert_eq!(ctx.read("p"), Value::Null);
    spec.port("p").unwrap().deliver(Value::Int(1));
    assert_eq!(ctx.read("p"), Value::Int(1));
}

#[test]
fn port_direction_is_enforced() {
    let mut spec = AutomatonSpec::new("a");
    spec.add_port("input", Direction::In);
    spec.add_port("output", Direction::Out);
    let ctx = spec.context();

    // A write to an input port leaves it unchanged.
    ctx.write("input", Value::Int(1));
    assert_eq!(spec.port("input").unwrap().read(), Value::Null);

    // A delivery to an output port is ignored, and the owner reads its own
    // output port as Null.
    spec.port("output").unwrap().deliver(Value::Int(2));
    assert!(!spec.port("output").unwrap().pending());
    ctx.write("output", Value::Int(3));
    assert_eq!(ctx.read("output"), Value::Null);
    assert_eq!(spec.port("output").unwrap().take(), Value::Int(3));
}

#[test]
fn first_matching_transition_fires() {
    let spec = monitor(5);
    let ctx = spec.context();
    // A delivered heartbeat makes both the reset and the increment guards
    // true; declaration order picks the reset.
    spec.port("hb").unwrap().deliver(Value::Int(1));
    ctx.set_var("counter", Value::Int(2));
    assert_eq!(spec.step(&ctx), Some(0));
    assert_eq!(ctx.var("counter"), Value::Int(0));
}

#[test]
fn inputs_are_consumed_by_a_firing() {
    let spec = monitor(5);
    let ctx = spec.context();
    spec.port("hb").unwrap().deliver(Value::Int(1));
    assert_eq!(spec.step(&ctx), Some(0));
    // The heartbeat is gone, so the next cycle falls through to the
    // counter transitions.
    assert_eq!(spec.step(&ctx), Some(2));
    assert_eq!(ctx.var("counter"), Value::Int(1));
}

#[test]
fn unread_delivery_survives_a_firing() {
    let mut spec = AutomatonSpec::new("pair");
    spec.add_port("a", Direction::In);
    spec.add_port("b", Direction::In);
    spec.add_transition(|ctx| ctx.read("a") != Value::Null, |_| {});
    spec.add_transition(|ctx| ctx.read("b") != Value::Null, |_| {});
    let ctx = spec.context();
    spec.port("a").unwrap().deliver(Value::Int(1));
    spec.port("b").unwrap().deliver(Value::Int(2));
    // The first firing read only `a`; the delivery on `b` stays pending
    // and drives the next cycle.
    assert_eq!(spec.step(&ctx), Some(0));
    assert_eq!(spec.step(&ctx), Some(1));
    assert_eq!(spec.step(&ctx), None);
}

#[test]
fn failed_guards_do_not_consume_inputs() {
    let mut spec = AutomatonSpec::new("picky");
    spec.add_port("p", Direction::In);
    spec.add_transition(|ctx| ctx.read("p") == Value::Int(5), |_| {});
    let ctx = spec.context();
    spec.port("p").unwrap().deliver(Value::Int(1));
    assert_eq!(spec.step(&ctx), None);
    // Guard evaluation is side-effect free: the unmatched delivery is
    // still there.
    assert!(spec.port("p").unwrap().pending());
    assert_eq!(ctx.read("p"), Value::Int(1));
}

#[test]
fn alarm_raised_after_threshold_idle_cycles() {
    let spec = monitor(3);
    let ctx = spec.context();
    for _ in 0..3 {
        assert_eq!(spec.step(&ctx), Some(2));
    }
    assert_eq!(spec.step(&ctx), Some(1));
    assert_eq!(spec.port("alarm").unwrap().take(), Value::Bool(true));
}

#[test]
fn step_without_matching_guard_is_none() {
    let mut spec = AutomatonSpec::new("idle");
    spec.add_port("p", Direction::In);
    spec.add_transition(|ctx| ctx.read("p") != Value::Null, |_| {});
    let ctx = spec.context();
    assert_eq!(spec.step(&ctx), None);
}

#[test]
fn running_automaton_reacts_to_deliveries() {
    let mut spec = AutomatonSpec::new("echo");
    spec.add_port("input", Direction::In);
    spec.add_port("output", Direction::Out);
    spec.add_transition(
        |ctx| ctx.read("input") != Value::Null,
        |ctx| ctx.write("output", ctx.read("input")),
    );
    let mut handle = spec.start();
    let input = handle.port("input").unwrap();
    let output = handle.port("output").unwrap();
    input.deliver(Value::Int(42));
    assert!(wait_until(|| output.pending()));
    assert_eq!(output.take(), Value::Int(42));
    handle.stop();
}

#[test]
fn stop_terminates_an_idle_automaton() {
    let mut spec = AutomatonSpec::new("idle");
    spec.add_port("p", Direction::In);
    spec.add_transition(|ctx| ctx.read("p") != Value::Null, |_| {});
    let mut handle = spec.start();
    handle.request_stop();
    handle.join();
}

#[test]
fn signal_wakes_a_waiter() {
    let signal = Arc::new(Signal::new());
    let waiter = Arc::clone(&signal);
    let woke = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&woke);
    let thread = std::thread::spawn(move || {
        waiter.wait(DEADLINE);
        counter.fetch_add(1, Ordering::SeqCst);
    });
    signal.notify();
    thread.join().unwrap();
    assert_eq!(woke.load(Ordering::SeqCst), 1);
}

#[test]
fn system_stops_all_components() {
    let fired = Arc::new(AtomicUsize::new(0));
    let mut system = System::new("pair");
    for name in ["a", "b"] {
        let counter = Arc::clone(&fired);
        let mut spec = AutomatonSpec::new(name);
        spec.add_var("n", Value::Int(0));
        spec.add_transition(
            |_| true,
            move |ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                ctx.set_var("n", ctx.var("n") + Value::Int(1));
            },
        );
        system.add_component(name, spec);
    }
    system.declare_connection("a.out", "b.in");
    system.start();
    assert!(system.is_running());
    assert!(wait_until(|| fired.load(Ordering::SeqCst) > 10));
    system.stop();
    assert!(!system.is_running());
    let settled = fired.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(fired.load(Ordering::SeqCst), settled);
}
