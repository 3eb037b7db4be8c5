// Execution runtime embedded into every generated program.
//
// Automata run as threads driven by a guarded-transition scheduler. Ports
// carry dynamically typed values and wake their owner through a condition
// variable, so an idle automaton blocks instead of spinning. This file is
// compiled and tested as part of the generator crate and spliced verbatim
// into generated programs, so it depends on the standard library only.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Not, Rem, Sub};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

// Idle automata recheck their guards at least this often even without a
// port notification.
pub const CYCLE_WAIT: Duration = Duration::from_millis(1);

// ------------------------------------------------------------------------
// Values
// ------------------------------------------------------------------------

// A dynamically typed runtime value. Integer and real values compare and
// combine with numeric promotion; every other cross-type operation yields
// Null rather than a panic.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    Array(Vec<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Int(a), Value::Real(b)) | (Value::Real(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Real(b)) => (*a as f64).partial_cmp(b),
            (Value::Real(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

macro_rules! numeric_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for Value {
            type Output = Value;

            fn $method(self, rhs: Value) -> Value {
                match (self, rhs) {
                    (Value::Int(a), Value::Int(b)) => Value::Int(a $op b),
                    (Value::Real(a), Value::Real(b)) => Value::Real(a $op b),
                    (Value::Int(a), Value::Real(b)) => Value::Real(a as f64 $op b),
                    (Value::Real(a), Value::Int(b)) => Value::Real(a $op b as f64),
                    _ => Value::Null,
                }
            }
        }
    };
}

numeric_op!(Sub, sub, -);
numeric_op!(Mul, mul, *);

impl Add for Value {
    type Output = Value;

    fn add(self, rhs: Value) -> Value {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
            (Value::Real(a), Value::Real(b)) => Value::Real(a + b),
            (Value::Int(a), Value::Real(b)) => Value::Real(a as f64 + b),
            (Value::Real(a), Value::Int(b)) => Value::Real(a + b as f64),
            (Value::Str(a), Value::Str(b)) => Value::Str(a + &b),
            _ => Value::Null,
        }
    }
}

impl Div for Value {
    type Output = Value;

    fn div(self, rhs: Value) -> Value {
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => Value::Null,
            (Value::Int(a), Value::Int(b)) => Value::Int(a / b),
            (Value::Real(a), Value::Real(b)) => Value::Real(a / b),
            (Value::Int(a), Value::Real(b)) => Value::Real(a as f64 / b),
            (Value::Real(a), Value::Int(b)) => Value::Real(a / b as f64),
            _ => Value::Null,
        }
    }
}

impl Rem for Value {
    type Output = Value;

    fn rem(self, rhs: Value) -> Value {
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => Value::Null,
            (Value::Int(a), Value::Int(b)) => Value::Int(a % b),
            _ => Value::Null,
        }
    }
}

impl Neg for Value {
    type Output = Value;

    fn neg(self) -> Value {
        match self {
            Value::Int(v) => Value::Int(-v),
            Value::Real(v) => Value::Real(-v),
            _ => Value::Null,
        }
    }
}

impl Not for Value {
    type Output = Value;

    fn not(self) -> Value {
        Value::Bool(!self.truthy())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

pub trait Truthy {
    fn truthy(self) -> bool;
}

impl Truthy for bool {
    fn truthy(self) -> bool {
        self
    }
}

impl Truthy for Value {
    fn truthy(self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(v) => v,
            Value::Int(v) => v != 0,
            Value::Real(v) => v != 0.0,
            Value::Str(v) => !v.is_empty(),
            Value::Array(items) => !items.is_empty(),
        }
    }
}

// Guard coercion: comparisons already produce bool, bare values go through
// their truthiness.
pub fn truthy<T: Truthy>(value: T) -> bool {
    value.truthy()
}

// ------------------------------------------------------------------------
// Ports and wakeups
// ------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

// One-slot wakeup flag shared by an automaton and its ports.
pub struct Signal {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self {
            flag: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    pub fn notify(&self) {
        let mut flag = self.flag.lock().unwrap_or_else(PoisonError::into_inner);
        *flag = true;
        self.cond.notify_all();
    }

    // Block until notified or the timeout elapses; consumes the flag.
    pub fn wait(&self, timeout: Duration) {
        let mut flag = self.flag.lock().unwrap_or_else(PoisonError::into_inner);
        if !*flag {
            let (guard, _) = self
                .cond
                .wait_timeout(flag, timeout)
                .unwrap_or_else(PoisonError::into_inner);
            flag = guard;
        }
        *flag = false;
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct PortState {
    value: Value,
    pending: bool,
}

// A one-slot channel endpoint owned by an automaton. The owner reads input
// ports and writes output ports; the environment delivers into input ports
// and takes from output ports.
pub struct Port {
    name: String,
    direction: Direction,
    state: Mutex<PortState>,
    signal: Arc<Signal>,
}

impl Port {
    fn new(name: &str, direction: Direction, signal: Arc<Signal>) -> Self {
        Self {
            name: name.to_string(),
            direction,
            state: Mutex::new(PortState::default()),
            signal,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    // Store a value from the environment side and wake the owner. Only
    // input ports accept deliveries.
    pub fn deliver(&self, value: impl Into<Value>) {
        if self.direction == Direction::In {
            self.store(value.into());
        }
    }

    // Store a value from the owning automaton. Only output ports accept
    // writes; a write to an input port leaves it unchanged.
    pub fn write(&self, value: impl Into<Value>) {
        if self.direction == Direction::Out {
            self.store(value.into());
        }
    }

    fn store(&self, value: Value) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.value = value;
            state.pending = true;
        }
        self.signal.notify();
    }

    // Preset the slot without marking a delivery pending. The value is
    // takeable (output ports hand it to the environment) but not readable
    // until a real delivery arrives.
    pub fn set_initial(&self, value: impl Into<Value>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.value = value.into();
    }

    // Pending value, without consuming it. A port with no pending delivery
    // reads as Null.
    pub fn read(&self) -> Value {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.pending {
            state.value.clone()
        } else {
            Value::Null
        }
    }

    // Consume the value, leaving the port empty.
    pub fn take(&self) -> Value {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.pending = false;
        std::mem::take(&mut state.value)
    }

    pub fn pending(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
    }

    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.value = Value::Null;
        state.pending = false;
    }
}

// ------------------------------------------------------------------------
// Automaton state and scheduling
// ------------------------------------------------------------------------

// Runtime state handed to guards and actions.
pub struct Ctx {
    ports: HashMap<String, Arc<Port>>,
    vars: Mutex<HashMap<String, Value>>,
    params: HashMap<String, Value>,
    reads: Mutex<Vec<String>>,
}

impl Ctx {
    // Pending value of an input port; an output port, an unknown name or a
    // port without a pending delivery all read as Null. Reads are recorded
    // so the scheduler can consume exactly the ports a fired transition
    // touched.
    pub fn read(&self, name: &str) -> Value {
        let Some(port) = self.ports.get(name) else {
            return Value::Null;
        };
        if port.direction() != Direction::In {
            return Value::Null;
        }
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_string());
        port.read()
    }

    pub fn write(&self, name: &str, value: impl Into<Value>) {
        if let Some(port) = self.ports.get(name) {
            port.write(value);
        }
    }

    pub fn var(&self, name: &str) -> Value {
        self.vars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_var(&self, name: &str, value: impl Into<Value>) {
        self.vars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.into());
    }

    pub fn param(&self, name: &str) -> Value {
        self.params.get(name).cloned().unwrap_or_default()
    }

    // Synchronization points are declarative; every firing is already
    // atomic with respect to the owning automaton.
    pub fn sync(&self, _name: &str) {}

    pub fn port(&self, name: &str) -> Option<&Arc<Port>> {
        self.ports.get(name)
    }

    fn begin_reads(&self) {
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    // Consume the input ports recorded since begin_reads. Ports other
    // transitions would have read keep their pending deliveries.
    fn consume_reads(&self) {
        let names: Vec<String> = self
            .reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for name in names {
            if let Some(port) = self.ports.get(&name) {
                port.take();
            }
        }
    }
}

struct Transition {
    guard: Box<dyn Fn(&Ctx) -> bool + Send>,
    action: Box<dyn Fn(&Ctx) + Send>,
}

// Built by generated constructor functions, then either started as a thread
// or stepped manually.
pub struct AutomatonSpec {
    name: String,
    signal: Arc<Signal>,
    ports: HashMap<String, Arc<Port>>,
    vars: HashMap<String, Value>,
    params: HashMap<String, Value>,
    transitions: Vec<Transition>,
}

impl AutomatonSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            signal: Arc::new(Signal::new()),
            ports: HashMap::new(),
            vars: HashMap::new(),
            params: HashMap::new(),
            transitions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_port(&mut self, name: &str, direction: Direction) {
        let port = Arc::new(Port::new(name, direction, Arc::clone(&self.signal)));
        self.ports.insert(name.to_string(), port);
    }

    pub fn init_port(&mut self, name: &str, value: impl Into<Value>) {
        if let Some(port) = self.ports.get(name) {
            port.set_initial(value);
        }
    }

    pub fn add_var(&mut self, name: &str, init: impl Into<Value>) {
        self.vars.insert(name.to_string(), init.into());
    }

    pub fn set_param(&mut self, name: &str, value: impl Into<Value>) {
        self.params.insert(name.to_string(), value.into());
    }

    pub fn add_transition(
        &mut self,
        guard: impl Fn(&Ctx) -> bool + Send + 'static,
        action: impl Fn(&Ctx) + Send + 'static,
    ) {
        self.transitions.push(Transition {
            guard: Box::new(guard),
            action: Box::new(action),
        });
    }

    pub fn port(&self, name: &str) -> Option<Arc<Port>> {
        self.ports.get(name).cloned()
    }

    // Fresh runtime state sharing this spec's ports.
    pub fn context(&self) -> Ctx {
        Ctx {
            ports: self.ports.clone(),
            vars: Mutex::new(self.vars.clone()),
            params: self.params.clone(),
            reads: Mutex::new(Vec::new()),
        }
    }

    // One scheduler cycle: fire the first transition whose guard holds, in
    // declaration order, then consume the input ports that transition read
    // (guard and action). A delivery pending on a port the fired transition
    // never read stays pending for a later cycle; a failed guard consumes
    // nothing. Returns the fired index.
    pub fn step(&self, ctx: &Ctx) -> Option<usize> {
        for (idx, transition) in self.transitions.iter().enumerate() {
            ctx.begin_reads();
            if (transition.guard)(ctx) {
                (transition.action)(ctx);
                ctx.consume_reads();
                return Some(idx);
            }
        }
        None
    }

    // Run the scheduler on its own thread until asked to stop. Idle cycles
    // block on the port signal instead of spinning.
    pub fn start(self) -> AutomatonHandle {
        let ctx = Arc::new(self.context());
        let stop = Arc::new(AtomicBool::new(false));
        let name = self.name.clone();
        let signal = Arc::clone(&self.signal);
        let thread_ctx = Arc::clone(&ctx);
        let thread_stop = Arc::clone(&stop);
        let thread = thread::spawn(move || {
            while !thread_stop.load(AtomicOrdering::SeqCst) {
                if self.step(&thread_ctx).is_none() {
                    self.signal.wait(CYCLE_WAIT);
                }
            }
        });
        AutomatonHandle {
            name,
            ctx,
            stop,
            signal,
            thread: Some(thread),
        }
    }
}

// A running automaton. Dropping the handle stops the thread.
pub struct AutomatonHandle {
    name: String,
    ctx: Arc<Ctx>,
    stop: Arc<AtomicBool>,
    signal: Arc<Signal>,
    thread: Option<JoinHandle<()>>,
}

impl AutomatonHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    pub fn port(&self, name: &str) -> Option<Arc<Port>> {
        self.ctx.port(name).cloned()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, AtomicOrdering::SeqCst);
        self.signal.notify();
    }

    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }
}

impl Drop for AutomatonHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

// ------------------------------------------------------------------------
// Systems
// ------------------------------------------------------------------------

// A composition of named automaton instances. Connections are recorded as
// declared; routing values between components is done by the embedding
// program through Port::deliver and Port::take.
pub struct System {
    name: String,
    specs: Vec<(String, AutomatonSpec)>,
    handles: Vec<(String, AutomatonHandle)>,
    internals: Vec<String>,
    connections: Vec<(String, String)>,
}

impl System {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            specs: Vec::new(),
            handles: Vec::new(),
            internals: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_component(&mut self, name: &str, spec: AutomatonSpec) {
        self.specs.push((name.to_string(), spec));
    }

    pub fn add_internal(&mut self, name: &str) {
        self.internals.push(name.to_string());
    }

    pub fn declare_connection(&mut self, from: &str, to: &str) {
        self.connections.push((from.to_string(), to.to_string()));
    }

    pub fn internals(&self) -> &[String] {
        &self.internals
    }

    pub fn connections(&self) -> &[(String, String)] {
        &self.connections
    }

    pub fn component(&self, name: &str) -> Option<&AutomatonHandle> {
        self.handles
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, h)| h)
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    pub fn start(&mut self) {
        for (name, spec) in self.specs.drain(..) {
            self.handles.push((name, spec.start()));
        }
    }

    // All components are asked to stop before any is joined, so no
    // component blocks shutdown by waiting on a peer.
    pub fn stop(&mut self) {
        for (_, handle) in &self.handles {
            handle.request_stop();
        }
        for (_, handle) in &mut self.handles {
            handle.join();
        }
        self.handles.clear();
    }
}

impl Drop for System {
    fn drop(&mut self) {
        self.stop();
    }
}
