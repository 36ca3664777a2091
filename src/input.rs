//! Debounced push-button events.
//!
//! The interrupt side ([`EdgeDetector`]) only compares timestamps and queues an event; it
//! never blocks and never touches the display. The consumer side ([`ButtonTask`]) waits on
//! the queue, confirms the button is still held after the debounce time and hands the
//! event to the application.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;

/// Minimum time between two accepted edges of one button, and the confirmation delay
pub const DEBOUNCE_MS: u32 = 5;

/// Events that can wait in the queue before new ones are dropped
pub const QUEUE_DEPTH: usize = 10;

/// The two front-panel buttons
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonId {
    Back,
    Next,
}

impl ButtonId {
    const fn index(self) -> usize {
        match self {
            ButtonId::Back => 0,
            ButtonId::Next => 1,
        }
    }
}

/// A debounced press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    pub id: ButtonId,
}

/// Queue between the edge detector and the consumer task
pub type ButtonQueue<M> = Channel<M, ButtonEvent, QUEUE_DEPTH>;

/// Per-button edge filter on a free-running millisecond tick
#[derive(Clone, Debug)]
pub struct Debouncer {
    last_accepted: [Option<u32>; 2],
    window_ms: u32,
}

impl Debouncer {
    pub const fn new() -> Self {
        Self::with_window(DEBOUNCE_MS)
    }

    pub const fn with_window(window_ms: u32) -> Self {
        Self {
            last_accepted: [None; 2],
            window_ms,
        }
    }

    pub const fn window_ms(&self) -> u32 {
        self.window_ms
    }

    /// True if the edge at `now_ms` is far enough from the last accepted edge of `id`.
    ///
    /// The tick may wrap around. The first edge of each button is always accepted.
    pub fn accept(&mut self, id: ButtonId, now_ms: u32) -> bool {
        let last = &mut self.last_accepted[id.index()];
        match *last {
            Some(prev) if now_ms.wrapping_sub(prev) <= self.window_ms => false,
            _ => {
                *last = Some(now_ms);
                true
            }
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to an edge reported to the [`EdgeDetector`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeOutcome {
    /// Queued for the consumer
    Queued,
    /// Too close to the previous edge of the same button
    Bounced,
    /// The queue was full and the event was lost
    Dropped,
}

/// Interrupt-side half: debounce and enqueue, nothing else
pub struct EdgeDetector<'q, M: RawMutex> {
    debouncer: Debouncer,
    sender: Sender<'q, M, ButtonEvent, QUEUE_DEPTH>,
}

impl<'q, M: RawMutex> EdgeDetector<'q, M> {
    pub fn new(queue: &'q ButtonQueue<M>) -> Self {
        Self::with_debouncer(queue, Debouncer::new())
    }

    /// Use a debouncer with a custom window
    pub fn with_debouncer(queue: &'q ButtonQueue<M>, debouncer: Debouncer) -> Self {
        Self {
            debouncer,
            sender: queue.sender(),
        }
    }

    /// Report a falling edge on `id` seen at tick `now_ms`. Never blocks.
    pub fn on_edge(&mut self, id: ButtonId, now_ms: u32) -> EdgeOutcome {
        if !self.debouncer.accept(id, now_ms) {
            return EdgeOutcome::Bounced;
        }
        match self.sender.try_send(ButtonEvent { id }) {
            Ok(()) => EdgeOutcome::Queued,
            Err(TrySendError::Full(_event)) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("button queue full, dropped {}", _event);
                EdgeOutcome::Dropped
            }
        }
    }
}

/// Reads whether a button is held right now
pub trait ButtonLevels {
    fn is_pressed(&mut self, id: ButtonId) -> bool;
}

impl<F> ButtonLevels for F
where
    F: FnMut(ButtonId) -> bool,
{
    fn is_pressed(&mut self, id: ButtonId) -> bool {
        self(id)
    }
}

/// Two buttons wired to ground with pull-ups, so held reads low
pub struct ActiveLow<BACK, NEXT> {
    pub back: BACK,
    pub next: NEXT,
}

impl<BACK, NEXT> ButtonLevels for ActiveLow<BACK, NEXT>
where
    BACK: InputPin,
    NEXT: InputPin,
{
    fn is_pressed(&mut self, id: ButtonId) -> bool {
        // a pin that cannot be read counts as released
        match id {
            ButtonId::Back => self.back.is_low().unwrap_or(false),
            ButtonId::Next => self.next.is_low().unwrap_or(false),
        }
    }
}

/// Consumer half: turns queued edges into confirmed presses
pub struct ButtonTask<'q, M: RawMutex, L, D> {
    receiver: Receiver<'q, M, ButtonEvent, QUEUE_DEPTH>,
    levels: L,
    delay: D,
    confirm_ms: u32,
}

impl<'q, M, L, D> ButtonTask<'q, M, L, D>
where
    M: RawMutex,
    L: ButtonLevels,
    D: DelayNs,
{
    pub fn new(queue: &'q ButtonQueue<M>, levels: L, delay: D) -> Self {
        Self::with_window(queue, levels, delay, DEBOUNCE_MS)
    }

    /// Confirm presses after `window_ms` instead of [`DEBOUNCE_MS`]; pair it with a
    /// [`Debouncer::with_window`] of the same length on the interrupt side
    pub fn with_window(queue: &'q ButtonQueue<M>, levels: L, delay: D, window_ms: u32) -> Self {
        Self {
            receiver: queue.receiver(),
            levels,
            delay,
            confirm_ms: window_ms,
        }
    }

    /// Wait for the next press that is still held after the debounce window
    pub async fn next_press(&mut self) -> ButtonEvent {
        loop {
            let event = self.receiver.receive().await;
            if !self.levels.is_pressed(event.id) {
                continue;
            }
            self.delay.delay_ms(self.confirm_ms).await;
            if self.levels.is_pressed(event.id) {
                #[cfg(feature = "defmt")]
                defmt::debug!("button {} pressed", event.id);
                return event;
            }
        }
    }

    /// Hand every confirmed press to `handler`, forever
    pub async fn run<F, Fut>(&mut self, mut handler: F) -> !
    where
        F: FnMut(ButtonEvent) -> Fut,
        Fut: core::future::Future<Output = ()>,
    {
        loop {
            let event = self.next_press().await;
            handler(event).await;
        }
    }

    /// Give back the level reader and the delay
    pub fn release(self) -> (L, D) {
        (self.levels, self.delay)
    }
}
