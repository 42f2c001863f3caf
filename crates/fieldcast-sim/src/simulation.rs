//! Asynchronous discrete-event simulation of a mobile network.
//!
//! Every device runs rounds on its own jittered schedule. A round first
//! moves the device along its random walk and drops neighbor messages older
//! than `retain`, then runs the case study and hands the export to every
//! device in communication range.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::sync::Arc;

use fieldcast_field::{DeviceId, DeviceState, Message, Point, PositionTable, RoundClock, Storage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::case_study::{tags, CaseStudy};
use crate::config::SimulationConfig;
use crate::error::{Error, Result};
use crate::mobility::{RectangleWalk, Walker};

/// A scheduled round.
#[derive(Debug, Clone, Copy)]
struct Event {
    time: f64,
    device: DeviceId,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.device.cmp(&other.device))
    }
}

struct Agent {
    state: DeviceState,
    walker: Walker,
    moved_at: f64,
}

impl Agent {
    /// Position at `now`, without committing to the walk.
    fn position_at(&self, walk: &RectangleWalk, now: f64) -> Point {
        self.walker.projected(walk, now - self.moved_at)
    }
}

/// State of one device at snapshot time.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub position: Point,
    pub rounds: u64,
    pub storage: Storage,
}

/// State of the whole network at snapshot time.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkSnapshot {
    pub time: f64,
    pub rounds: u64,
    pub devices: Vec<DeviceSnapshot>,
}

impl NetworkSnapshot {
    /// Sum of a storage tag over all devices.
    ///
    /// For the aggregate tags only the source stores a non-zero value, so
    /// this is the source's view.
    pub fn total(&self, tag: &str) -> f64 {
        self.devices
            .iter()
            .filter_map(|d| d.storage.get(tag))
            .sum()
    }
}

/// A running simulation.
pub struct Simulation {
    config: SimulationConfig,
    study: CaseStudy,
    walk: RectangleWalk,
    rng: StdRng,
    time: f64,
    rounds: u64,
    next_log: f64,
    queue: BinaryHeap<Reverse<Event>>,
    agents: BTreeMap<DeviceId, Agent>,
    severed: BTreeSet<(DeviceId, DeviceId)>,
}

impl Simulation {
    /// Create a simulation with devices at random positions.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let walk = RectangleWalk::new(config.width, config.height, config.device_speed);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let positions: Vec<Point> = (0..config.devices)
            .map(|_| walk.random_point(&mut rng))
            .collect();
        Self::build(config, walk, rng, positions)
    }

    /// Create a simulation with one device per position, ids in order.
    pub fn with_positions(mut config: SimulationConfig, positions: Vec<Point>) -> Result<Self> {
        config.devices = positions.len() as u64;
        config.validate()?;
        let walk = RectangleWalk::new(config.width, config.height, config.device_speed);
        let rng = StdRng::seed_from_u64(config.seed);
        Self::build(config, walk, rng, positions)
    }

    fn build(
        config: SimulationConfig,
        walk: RectangleWalk,
        mut rng: StdRng,
        positions: Vec<Point>,
    ) -> Result<Self> {
        let mut agents = BTreeMap::new();
        let mut queue = BinaryHeap::new();
        for (index, position) in positions.into_iter().enumerate() {
            let id = DeviceId(index as u64);
            let walker = walk.spawn_at(position, &mut rng);
            agents.insert(
                id,
                Agent {
                    state: DeviceState::new(id),
                    walker,
                    moved_at: 0.0,
                },
            );
            let start = rng.gen_range(0.0..config.period);
            queue.push(Reverse(Event { time: start, device: id }));
        }

        info!(devices = agents.len(), seed = config.seed, "simulation created");
        Ok(Self {
            study: CaseStudy::from_config(&config),
            next_log: config.log_period,
            config,
            walk,
            rng,
            time: 0.0,
            rounds: 0,
            queue,
            agents,
            severed: BTreeSet::new(),
        })
    }

    /// Current simulated time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Rounds run so far, over all devices.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// The configuration the simulation runs with.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Named outputs of a device.
    pub fn storage(&self, id: DeviceId) -> Option<&Storage> {
        self.agents.get(&id).map(|a| a.state.storage())
    }

    /// One named output of a device.
    pub fn stored(&self, id: DeviceId, tag: &str) -> Option<f64> {
        self.storage(id).and_then(|s| s.get(tag)).copied()
    }

    /// Position of a device at the current time.
    pub fn position(&self, id: DeviceId) -> Option<Point> {
        self.agents.get(&id).map(|a| a.position_at(&self.walk, self.time))
    }

    /// Move a device by hand.
    pub fn set_position(&mut self, id: DeviceId, position: Point) -> Result<()> {
        let agent = self.agents.get_mut(&id).ok_or(Error::UnknownDevice(id))?;
        agent.walker.set_position(position);
        agent.moved_at = self.time;
        Ok(())
    }

    /// Stop delivering messages between two devices.
    pub fn sever(&mut self, a: DeviceId, b: DeviceId) -> Result<()> {
        self.check(a)?;
        self.check(b)?;
        self.severed.insert(edge(a, b));
        Ok(())
    }

    /// Undo [`Simulation::sever`].
    pub fn restore(&mut self, a: DeviceId, b: DeviceId) {
        self.severed.remove(&edge(a, b));
    }

    /// Run every round scheduled up to `until`.
    pub fn run_until(&mut self, until: f64) -> u64 {
        let before = self.rounds;
        while self
            .queue
            .peek()
            .is_some_and(|Reverse(e)| e.time <= until && e.time <= self.config.end_time)
        {
            self.step();
        }
        self.time = self.time.max(until.min(self.config.end_time));
        self.rounds - before
    }

    /// Run to the configured end time.
    pub fn run(&mut self) -> u64 {
        let end = self.config.end_time;
        let rounds = self.run_until(end);
        info!(time = self.time, rounds = self.rounds, "simulation finished");
        rounds
    }

    /// Run the next scheduled round. Returns false when nothing is left
    /// before the end time.
    pub fn step(&mut self) -> bool {
        let Some(Reverse(event)) = self.queue.pop() else {
            return false;
        };
        if event.time > self.config.end_time {
            self.queue.push(Reverse(event));
            return false;
        }
        self.time = event.time;
        self.execute(event.device);
        true
    }

    fn execute(&mut self, id: DeviceId) {
        let now = self.time;
        let jitter = self.config.jitter;
        let next = now + self.config.period * (1.0 + self.rng.gen_range(-jitter..=jitter));

        let Some(agent) = self.agents.get_mut(&id) else {
            return;
        };
        agent.walker.advance(&self.walk, now - agent.moved_at, &mut self.rng);
        agent.moved_at = now;
        agent.state.expire(now, self.config.retain);

        let walk = &self.walk;
        let positions: PositionTable = self
            .agents
            .iter()
            .map(|(id, a)| (*id, a.position_at(walk, now)))
            .collect();

        let Some(agent) = self.agents.get_mut(&id) else {
            return;
        };
        let origin = agent.walker.position();
        let study = &self.study;
        let ((), export) = agent.state.round(
            RoundClock::new(now, next),
            origin,
            &positions,
            |node| study.round(node),
        );

        let mut delivered = 0usize;
        for (to, other) in self.agents.iter_mut() {
            if *to == id || self.severed.contains(&edge(id, *to)) {
                continue;
            }
            let distance = origin.distance(&other.position_at(&self.walk, now));
            if distance > self.config.comm_range {
                continue;
            }
            other.state.receive(id, Message::new(Arc::clone(&export), now, distance));
            delivered += 1;
        }
        debug!(device = %id, time = now, delivered, "round complete");

        self.rounds += 1;
        self.queue.push(Reverse(Event { time: next, device: id }));

        if now >= self.next_log {
            while self.next_log <= now {
                self.next_log += self.config.log_period;
            }
            let snapshot = self.snapshot();
            info!(
                time = now,
                rounds = self.rounds,
                spc = snapshot.total(tags::SPC_SUM),
                mpc = snapshot.total(tags::MPC_SUM),
                wmpc = snapshot.total(tags::WMPC_SUM),
                list = snapshot.total(tags::LIST_SUM),
                ideal = snapshot.total(tags::IDEAL_SUM),
                "collection progress"
            );
        }
    }

    /// Capture positions and outputs of every device.
    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            time: self.time,
            rounds: self.rounds,
            devices: self
                .agents
                .iter()
                .map(|(id, a)| DeviceSnapshot {
                    id: *id,
                    position: a.position_at(&self.walk, self.time),
                    rounds: a.state.rounds(),
                    storage: a.state.storage().clone(),
                })
                .collect(),
        }
    }

    fn check(&self, id: DeviceId) -> Result<()> {
        if self.agents.contains_key(&id) {
            Ok(())
        } else {
            Err(Error::UnknownDevice(id))
        }
    }
}

fn edge(a: DeviceId, b: DeviceId) -> (DeviceId, DeviceId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
