//! The scripting context: one virtual clock, one timer queue, one
//! subscription registry and the host they talk to.
//!
//! The host drives a context by calling [`ScriptContext::advance`] once per
//! step. Every callback receives `&mut ScriptContext`, so scripted logic can
//! schedule, cancel, subscribe and reach the host bindings from inside a
//! callback.
//!
//! # Advance
//!
//! 1. **Clock**: the clock moves to the new time and the pending timers are
//!    snapshotted.
//! 2. **Dispatch**: every incoming message is delivered, in batch order, to a
//!    snapshot of its handler list.
//! 3. **Fire**: every snapshotted timer that is due and was not cancelled
//!    runs once.
//!
//! Handlers see the new time and can cancel timers that would fire in the
//! same advance. Timers they schedule are outside the snapshot and wait for
//! the next advance, even with a zero delay. Timers never influence the
//! dispatch phase of their own advance.

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use host_api::{format_vec, BlockId, BufferedHost, Host, IVec3, SfxId, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ScriptConfig;
use crate::dispatcher::{MessageDispatcher, SubscriptionId};
use crate::error::{
    CallbackError, CallbackFailure, CallbackResult, FailureOrigin, Result, ScriptError,
};
use crate::message::Message;
use crate::time::VirtualTime;
use crate::timer::{TimerId, TimerQueue};

/// Unique identifier for a scripting context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(pub Uuid);

impl ContextId {
    /// Create a new random context ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A timer callback.
pub type TimerCallback<H> = Box<dyn FnMut(&mut ScriptContext<H>) -> CallbackResult>;

type HandlerFn<H> = dyn Fn(&mut ScriptContext<H>, &Message) -> CallbackResult;

/// A message handler.
///
/// Cloning a handler yields the *same* handler: clones compare equal and
/// [`ScriptContext::unsubscribe`] with any clone removes every registration
/// of it. Two handlers built from identical closures are different handlers.
pub struct Handler<H = BufferedHost>(Rc<HandlerFn<H>>);

impl<H> Handler<H> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut ScriptContext<H>, &Message) -> CallbackResult + 'static,
    {
        Self(Rc::new(f))
    }

    fn call(&self, cx: &mut ScriptContext<H>, message: &Message) -> CallbackResult {
        (self.0)(cx, message)
    }
}

impl<H> Clone for Handler<H> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<H> PartialEq for Handler<H> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl<H> Eq for Handler<H> {}

impl<H> std::fmt::Debug for Handler<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0))
    }
}

/// What one advance (or a manual dispatch) did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Handler invocations.
    pub delivered: usize,

    /// Timer callbacks run.
    pub fired: usize,

    /// Callbacks that failed. Each was also written to the host's error line.
    pub failures: Vec<CallbackFailure>,

    /// The time the host asked for when it tried to move the clock backwards.
    /// The clock stayed where it was.
    pub clock_regression: Option<VirtualTime>,
}

impl AdvanceReport {
    /// No callback failed and the clock moved as requested.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.clock_regression.is_none()
    }
}

/// One scripting context.
pub struct ScriptContext<H = BufferedHost> {
    id: ContextId,
    config: ScriptConfig,
    timers: TimerQueue<TimerCallback<H>>,
    dispatcher: MessageDispatcher<Handler<H>>,
    host: H,
    advancing: bool,
}

impl<H: Host> ScriptContext<H> {
    /// Create a context with the default configuration.
    pub fn new(host: H) -> Self {
        Self::with_config(host, ScriptConfig::default())
    }

    /// Create a context with an explicit configuration.
    pub fn with_config(host: H, config: ScriptConfig) -> Self {
        let id = ContextId::new();
        tracing::debug!(
            context = %id,
            name = %config.name,
            policy = ?config.repeat_policy,
            "script context created"
        );
        Self {
            id,
            timers: TimerQueue::new(config.repeat_policy),
            dispatcher: MessageDispatcher::new(),
            config,
            host,
            advancing: false,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    /// Current virtual time.
    pub fn now(&self) -> VirtualTime {
        self.timers.now()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Tear the context down and hand the host back.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Run `callback` once, `delay` milliseconds after the current time.
    pub fn schedule_once<F>(&mut self, callback: F, delay: i64) -> Result<TimerId>
    where
        F: FnMut(&mut ScriptContext<H>) -> CallbackResult + 'static,
    {
        self.timers.schedule_once(Box::new(callback), delay)
    }

    /// Run `callback` every `interval` milliseconds until cancelled.
    pub fn schedule_repeating<F>(&mut self, callback: F, interval: i64) -> Result<TimerId>
    where
        F: FnMut(&mut ScriptContext<H>) -> CallbackResult + 'static,
    {
        self.timers.schedule_repeating(Box::new(callback), interval)
    }

    /// Run `callback` on the next advance.
    pub fn set_immediate<F>(&mut self, callback: F) -> Result<TimerId>
    where
        F: FnMut(&mut ScriptContext<H>) -> CallbackResult + 'static,
    {
        self.schedule_once(callback, 0)
    }

    /// Cancel a timer. Unknown ids are ignored.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    /// Number of live timers.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Register `handler` for messages tagged `kind`.
    pub fn subscribe(&mut self, kind: impl Into<String>, handler: Handler<H>) -> SubscriptionId {
        self.dispatcher.subscribe(kind, handler)
    }

    /// Build a handler from a closure, register it and return it for later
    /// removal.
    pub fn on<F>(&mut self, kind: impl Into<String>, f: F) -> Handler<H>
    where
        F: Fn(&mut ScriptContext<H>, &Message) -> CallbackResult + 'static,
    {
        let handler = Handler::new(f);
        self.dispatcher.subscribe(kind, handler.clone());
        handler
    }

    /// Remove every registration of `handler` for `kind`.
    pub fn unsubscribe(&mut self, kind: &str, handler: &Handler<H>) -> usize {
        self.dispatcher.unsubscribe(kind, handler)
    }

    /// Remove one registration by token.
    pub fn unsubscribe_id(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe_id(id)
    }

    /// Drop every subscription.
    pub fn clear_subscriptions(&mut self) {
        self.dispatcher.clear_all();
    }

    pub fn subscription_count(&self, kind: &str) -> usize {
        self.dispatcher.subscription_count(kind)
    }

    /// Deliver one message now.
    pub fn dispatch_one(&mut self, message: &Message) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        self.deliver(message, &mut report);
        report
    }

    /// Deliver a batch now, in order.
    pub fn dispatch_batch(&mut self, messages: &[Message]) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        for message in messages {
            self.deliver(message, &mut report);
        }
        report
    }

    fn deliver(&mut self, message: &Message, report: &mut AdvanceReport) {
        let handlers = self.dispatcher.snapshot(message.kind());
        for handler in handlers {
            tracing::trace!(context = %self.id, message_type = %message.kind(), "delivering message");
            let result = self.run_guarded(|cx| handler.call(cx, message));
            report.delivered += 1;
            if let Err(err) = result {
                let origin = FailureOrigin::Handler {
                    message_type: message.kind().to_string(),
                };
                report.failures.push(self.report_failure(origin, err));
            }
        }
    }

    /// The per-step entry point: move the clock to `new_time`, deliver
    /// `messages`, then fire due timers.
    ///
    /// A `new_time` earlier than the current clock is reported on the host's
    /// error line and ignored: the clock stays put, messages are still
    /// delivered and timers due at the current time still fire. Calling
    /// `advance` from inside a callback of this context fails with
    /// [`ScriptError::ReentrantAdvance`].
    pub fn advance(&mut self, new_time: u64, messages: &[Message]) -> Result<AdvanceReport> {
        if self.advancing {
            return Err(ScriptError::ReentrantAdvance);
        }

        let mut report = AdvanceReport::default();
        self.open_pass(VirtualTime::new(new_time), &mut report)?;
        self.advancing = true;

        // With `catch_panics` off a callback may unwind through here. The
        // pass must still be closed so the context stays usable.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            for message in messages {
                self.deliver(message, &mut report);
            }
            self.fire_due_timers(&mut report);
        }));
        if let Err(payload) = outcome {
            self.timers.end_pass();
            self.advancing = false;
            panic::resume_unwind(payload);
        }

        self.advancing = false;
        Ok(report)
    }

    /// Decode a JSON message batch from the host and advance.
    ///
    /// A batch that does not decode is rejected before anything runs.
    pub fn advance_json(&mut self, new_time: u64, batch: &str) -> Result<AdvanceReport> {
        let messages = Message::parse_batch(batch)?;
        self.advance(new_time, &messages)
    }

    fn open_pass(&mut self, new_time: VirtualTime, report: &mut AdvanceReport) -> Result<()> {
        match self.timers.begin_pass(new_time) {
            Err(err @ ScriptError::ClockRegression { .. }) => {
                tracing::error!(
                    context = %self.id,
                    requested = %new_time,
                    current = %self.now(),
                    "clock regression, keeping current time"
                );
                self.host.print_error_line(&err.to_string());
                report.clock_regression = Some(new_time);
                self.timers.begin_pass(self.timers.now())
            }
            other => other,
        }
    }

    fn fire_due_timers(&mut self, report: &mut AdvanceReport) {
        while let Some(mut entry) = self.timers.next_due() {
            let id = entry.id();
            tracing::trace!(context = %self.id, timer = %id, "firing timer");
            let result = self.run_guarded(|cx| (entry.callback)(cx));
            report.fired += 1;
            if let Err(err) = result {
                report.failures.push(self.report_failure(FailureOrigin::Timer(id), err));
            }
            self.timers.settle(entry);
        }
        self.timers.end_pass();
    }

    fn run_guarded<F>(&mut self, f: F) -> CallbackResult
    where
        F: FnOnce(&mut Self) -> CallbackResult,
    {
        if !self.config.catch_panics {
            return f(self);
        }
        panic::catch_unwind(AssertUnwindSafe(|| f(self)))
            .unwrap_or_else(|payload| Err(CallbackError::from_panic(payload)))
    }

    fn report_failure(&mut self, origin: FailureOrigin, err: CallbackError) -> CallbackFailure {
        let failure = CallbackFailure::new(origin, err);
        tracing::warn!(
            context = %self.id,
            origin = %failure.origin,
            error = %failure.message,
            "callback failed"
        );
        self.host.print_error_line(&failure.to_string());
        failure
    }

    /// Cancel every timer and drop every subscription. The clock is kept.
    pub fn reset(&mut self) {
        tracing::debug!(
            context = %self.id,
            timers = self.timers.len(),
            subscriptions = self.dispatcher.len(),
            "script context reset"
        );
        self.timers.clear();
        self.dispatcher.clear_all();
    }

    /// Print a line and mirror it to the in-game log.
    pub fn log(&mut self, text: impl std::fmt::Display) {
        let text = text.to_string();
        self.host.print_line(&text);
        self.host.game_log(&text);
    }

    /// Print a line on the error channel.
    pub fn error(&mut self, text: impl std::fmt::Display) {
        self.host.print_error_line(&text.to_string());
    }

    /// Log a position as `[x, y, z]`.
    pub fn log_vec(&mut self, v: Vec3) {
        self.log(format_vec(v));
    }

    pub fn get_block(&self, pos: IVec3) -> Option<BlockId> {
        self.host.get_block(pos)
    }

    pub fn set_block(&mut self, pos: IVec3, block: BlockId) {
        self.host.set_block(pos, block);
    }

    pub fn play_sound(&mut self, pos: Vec3, volume: f32, sfx: SfxId) {
        self.host.play_sound(pos, volume, sfx);
    }
}

impl Default for ScriptContext<BufferedHost> {
    fn default() -> Self {
        Self::new(BufferedHost::new())
    }
}
