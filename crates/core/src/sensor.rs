//! Simulated hardware sensor.
//!
//! [`SensorSource`] owns the evolving (temperature, voltage) pair and
//! advances it one step per [`update`](SensorSource::update). How each step
//! is computed is delegated to a [`SensorModel`], so the random drift used in
//! production and the deterministic scripts used in tests are
//! interchangeable. Whatever a model proposes is clamped into the valid
//! ranges before it becomes visible.
//!
//! The current pair lives in a [`SharedReading`], a cloneable handle around a
//! single mutex. Readers (the threshold monitor, property handlers) hold a
//! clone of the handle; only the owning `SensorSource` writes through it.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::CoreError;
use crate::reading::{SensorReading, VOLTAGE_RANGE};

/// Half-width of the uniform per-tick temperature drift.
pub const DEFAULT_DRIFT: f64 = 0.5;

/// Per-tick probability of a load spike (one chance in 21).
pub const DEFAULT_SPIKE_PROBABILITY: f64 = 1.0 / 21.0;

/// Smallest temperature jump added by a load spike.
pub const DEFAULT_SPIKE_MIN: f64 = 5.0;

/// Largest temperature jump added by a load spike.
pub const DEFAULT_SPIKE_MAX: f64 = 15.0;

// ---------------------------------------------------------------------------
// SharedReading
// ---------------------------------------------------------------------------

/// Cloneable handle to the current sensor reading.
///
/// All clones share one mutex. The lock is only ever held for a copy-out or
/// a single compute-and-write, never across an `.await` or a sleep.
#[derive(Debug, Clone, Default)]
pub struct SharedReading {
    inner: Arc<Mutex<SensorReading>>,
}

impl SharedReading {
    pub fn new(initial: SensorReading) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    /// Return a consistent snapshot of the current pair.
    pub fn read(&self) -> SensorReading {
        *self.lock()
    }

    // A panic while the guard is held can only happen before the write, so
    // the stored pair is still a whole reading and safe to keep using.
    fn lock(&self) -> MutexGuard<'_, SensorReading> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// SensorModel
// ---------------------------------------------------------------------------

/// Policy that computes the next raw reading from the current one.
///
/// The returned value does not need to be in range; [`SensorSource`] clamps
/// it before storing.
pub trait SensorModel: Send {
    fn next(&mut self, current: SensorReading) -> SensorReading;
}

/// Occasional large positive temperature jump modelling a load spike.
///
/// The spike is rolled independently on every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikePolicy {
    probability: f64,
    min: f64,
    max: f64,
}

impl SpikePolicy {
    /// Build a spike policy, rejecting probabilities outside `[0, 1]` and
    /// empty or negative magnitude ranges.
    pub fn new(probability: f64, min: f64, max: f64) -> Result<Self, CoreError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(CoreError::InvalidConfig(format!(
                "spike probability must be within [0, 1], got {probability}"
            )));
        }
        if !(min >= 0.0 && min <= max) {
            return Err(CoreError::InvalidConfig(format!(
                "spike magnitude range [{min}, {max}] is invalid"
            )));
        }
        Ok(Self {
            probability,
            min,
            max,
        })
    }

    /// A policy that never spikes.
    pub fn disabled() -> Self {
        Self {
            probability: 0.0,
            min: DEFAULT_SPIKE_MIN,
            max: DEFAULT_SPIKE_MAX,
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl Default for SpikePolicy {
    fn default() -> Self {
        Self {
            probability: DEFAULT_SPIKE_PROBABILITY,
            min: DEFAULT_SPIKE_MIN,
            max: DEFAULT_SPIKE_MAX,
        }
    }
}

/// Random-walk temperature with occasional spikes; memoryless voltage.
///
/// Each step:
/// - temperature drifts by a uniform draw in `[-drift, +drift]`, plus a
///   spike drawn from the [`SpikePolicy`] range when the spike roll hits;
/// - voltage is a fresh uniform draw over [`VOLTAGE_RANGE`].
pub struct DriftModel {
    rng: StdRng,
    drift: f64,
    spike: SpikePolicy,
}

impl DriftModel {
    /// Model seeded from the operating system.
    pub fn new(spike: SpikePolicy) -> Self {
        Self::with_rng(StdRng::from_os_rng(), spike)
    }

    /// Reproducible model for tests and replays.
    pub fn seeded(seed: u64, spike: SpikePolicy) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), spike)
    }

    fn with_rng(rng: StdRng, spike: SpikePolicy) -> Self {
        Self {
            rng,
            drift: DEFAULT_DRIFT,
            spike,
        }
    }
}

impl Default for DriftModel {
    fn default() -> Self {
        Self::new(SpikePolicy::default())
    }
}

impl SensorModel for DriftModel {
    fn next(&mut self, current: SensorReading) -> SensorReading {
        let mut drift = self.rng.random_range(-self.drift..=self.drift);
        if self.rng.random_bool(self.spike.probability) {
            let spike = self.rng.random_range(self.spike.min..=self.spike.max);
            tracing::debug!(spike, "Simulated load spike");
            drift += spike;
        }

        let voltage = self.rng.random_range(VOLTAGE_RANGE);

        SensorReading::new(current.temperature + drift, voltage)
    }
}

/// Deterministic model that replays a fixed temperature script.
///
/// Each step consumes the next scripted temperature. Once the script is
/// exhausted the last value is held. Voltage stays constant.
#[derive(Debug, Clone)]
pub struct ScriptedModel {
    temperatures: VecDeque<f64>,
    voltage: f64,
}

impl ScriptedModel {
    pub fn new(temperatures: impl IntoIterator<Item = f64>) -> Self {
        Self {
            temperatures: temperatures.into_iter().collect(),
            voltage: crate::reading::INITIAL_VOLTAGE,
        }
    }

    pub fn with_voltage(mut self, voltage: f64) -> Self {
        self.voltage = voltage;
        self
    }

    /// Number of scripted values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.temperatures.len()
    }
}

impl SensorModel for ScriptedModel {
    fn next(&mut self, current: SensorReading) -> SensorReading {
        let temperature = self
            .temperatures
            .pop_front()
            .unwrap_or(current.temperature);
        SensorReading::new(temperature, self.voltage)
    }
}

// ---------------------------------------------------------------------------
// SensorSource
// ---------------------------------------------------------------------------

/// Owner of the simulated sensor state.
///
/// Not `Clone`: exactly one writer exists. Hand out [`SharedReading`]s via
/// [`handle`](Self::handle) for readers.
pub struct SensorSource {
    reading: SharedReading,
    model: Box<dyn SensorModel>,
}

impl SensorSource {
    /// Start from the default boot reading (65.0 C, 1.1 V).
    pub fn new(model: impl SensorModel + 'static) -> Self {
        Self::with_initial(model, SensorReading::default())
    }

    pub fn with_initial(model: impl SensorModel + 'static, initial: SensorReading) -> Self {
        Self {
            reading: SharedReading::new(initial.clamped()),
            model: Box::new(model),
        }
    }

    /// Advance the simulation by one step and return the stored reading.
    ///
    /// The computation and write happen under a single lock acquisition, so
    /// no reader can observe a half-updated pair.
    pub fn update(&mut self) -> SensorReading {
        let mut guard = self.reading.lock();
        let next = self.model.next(*guard).clamped();
        *guard = next;
        next
    }

    pub fn read(&self) -> SensorReading {
        self.reading.read()
    }

    /// A read-only handle sharing this source's state.
    pub fn handle(&self) -> SharedReading {
        self.reading.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
