//! Simulated annealing over slot assignments
//!
//! State is one slot index per active burn. Each iteration proposes either
//! a relocation (one burn to another slot) or a swap (two burns exchange
//! slots) with equal probability. Relocations into a full slot are rejected
//! before evaluation and never accepted. A proposal is accepted outright if
//! it lowers the cost, otherwise with probability `exp(-Δ/T)`; T is
//! multiplied by the cooling rate every iteration.
//!
//! The best assignment is replaced only on strict improvement, so among
//! equally good assignments the first one found is kept.
//!
//! # References
//!
//! - Kirkpatrick, S., Gelatt, C.D., Vecchi, M.P. (1983). "Optimization by
//!   Simulated Annealing". Science, 220(4598), 671-680

use crate::config::{AnnealingOptions, SeedStrategy};
use crate::conflict::ConflictMatrix;
use crate::schedule::{CostBreakdown, CostModel, TerminationReason};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

/// Candidate slot assignment with per-slot occupancy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    slot_of: Vec<usize>,
    occupancy: Vec<usize>,
}

impl Candidate {
    fn empty(burns: usize, slots: usize) -> Self {
        Candidate {
            slot_of: Vec::with_capacity(burns),
            occupancy: vec![0; slots],
        }
    }

    fn push(&mut self, slot: usize) {
        self.slot_of.push(slot);
        self.occupancy[slot] += 1;
    }

    /// Slot of each burn
    #[must_use]
    pub fn slots(&self) -> &[usize] {
        &self.slot_of
    }

    /// Burns per slot
    #[must_use]
    pub fn occupancy(&self) -> &[usize] {
        &self.occupancy
    }
}

enum Move {
    Relocate { burn: usize, to: usize },
    Swap { a: usize, b: usize },
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct AnnealOutcome {
    /// Best assignment observed
    pub best: Candidate,
    /// Its cost
    pub best_cost: CostBreakdown,
    /// Cost of the seed assignment
    pub initial_cost: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Why the run stopped
    pub termination: TerminationReason,
    /// Proposals accepted (improving or by the Metropolis test)
    pub accepted_moves: usize,
    /// Relocations refused because the target slot was full
    pub rejected_capacity: usize,
    /// Iterations that produced a new best
    pub improving_moves: usize,
    /// Temperature when the run stopped
    pub final_temperature: f64,
    /// Best cost after each iteration, when requested
    pub trace: Vec<f64>,
}

/// Simulated annealing driver for one scheduling run
pub struct Annealer<'a> {
    cost: &'a CostModel<'a>,
    matrix: &'a ConflictMatrix,
    priority_order: &'a [usize],
    capacity: usize,
    options: &'a AnnealingOptions,
}

impl<'a> Annealer<'a> {
    /// Create a driver.
    ///
    /// `priority_order` lists active burn indices highest priority first;
    /// it drives the greedy seed.
    #[must_use]
    pub fn new(
        cost: &'a CostModel<'a>,
        matrix: &'a ConflictMatrix,
        priority_order: &'a [usize],
        capacity: usize,
        options: &'a AnnealingOptions,
    ) -> Self {
        Annealer {
            cost,
            matrix,
            priority_order,
            capacity,
            options,
        }
    }

    /// Run to termination. The number of burns must not exceed total slot
    /// capacity.
    #[must_use]
    pub fn run(&self) -> AnnealOutcome {
        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let burns = self.priority_order.len();
        let slots = self.cost.slot_count();

        let mut current = match self.options.seed_strategy {
            SeedStrategy::Greedy => self.greedy_seed(burns, slots),
            SeedStrategy::Random => self.random_seed(burns, slots, &mut rng),
        };
        let mut current_cost = self.cost.evaluate(current.slots());
        let initial_cost = current_cost.total;
        let mut best = current.clone();
        let mut best_cost = current_cost;

        let mut temperature = self.options.initial_temperature;
        let mut iterations = 0usize;
        let mut since_improvement = 0usize;
        let mut accepted_moves = 0usize;
        let mut rejected_capacity = 0usize;
        let mut improving_moves = 0usize;
        let mut trace_costs = Vec::new();

        let termination = loop {
            if burns == 0 {
                break TerminationReason::Empty;
            }
            if iterations >= self.options.max_iterations {
                break TerminationReason::MaxIterations;
            }
            if temperature < self.options.min_temperature {
                break TerminationReason::TemperatureFloor;
            }
            if since_improvement >= self.options.stagnation_limit {
                break TerminationReason::Stagnation;
            }
            iterations += 1;

            match self.propose(&current, &mut rng) {
                Some(Move::Relocate { to, .. }) if current.occupancy[to] >= self.capacity => {
                    rejected_capacity += 1;
                }
                Some(mv) => {
                    let candidate = Self::apply(&current, &mv);
                    let candidate_cost = self.cost.evaluate(candidate.slots());
                    let delta = candidate_cost.total - current_cost.total;
                    if delta < 0.0 || rng.random::<f64>() < (-delta / temperature).exp() {
                        current = candidate;
                        current_cost = candidate_cost;
                        accepted_moves += 1;
                    }
                }
                None => {}
            }

            if current_cost.total < best_cost.total {
                trace!(
                    "Iteration {}: best cost {:.6} -> {:.6}",
                    iterations,
                    best_cost.total,
                    current_cost.total
                );
                best = current.clone();
                best_cost = current_cost;
                improving_moves += 1;
                since_improvement = 0;
            } else {
                since_improvement += 1;
            }

            temperature *= self.options.cooling_rate;
            if self.options.record_trace {
                trace_costs.push(best_cost.total);
            }
        };

        debug!(
            "Annealing stopped after {} iterations ({:?}): cost {:.4} -> {:.4}",
            iterations, termination, initial_cost, best_cost.total
        );

        AnnealOutcome {
            best,
            best_cost,
            initial_cost,
            iterations,
            termination,
            accepted_moves,
            rejected_capacity,
            improving_moves,
            final_temperature: temperature,
            trace: trace_costs,
        }
    }

    /// Highest priority first into the earliest slot with room and no
    /// conflict with burns already there; failing that, the earliest slot
    /// with room.
    fn greedy_seed(&self, burns: usize, slots: usize) -> Candidate {
        let mut slot_of = vec![usize::MAX; burns];
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); slots];

        for &burn in self.priority_order {
            let has_room = |s: &usize| members[*s].len() < self.capacity;
            let clear = (0..slots)
                .filter(has_room)
                .find(|&s| members[s].iter().all(|&other| self.matrix.get(burn, other).is_none()));
            let chosen = clear.or_else(|| (0..slots).find(has_room));
            if let Some(slot) = chosen {
                slot_of[burn] = slot;
                members[slot].push(burn);
            }
        }

        let mut candidate = Candidate::empty(burns, slots);
        for slot in slot_of {
            candidate.push(slot);
        }
        candidate
    }

    /// Each burn, in index order, into a uniformly chosen slot with room.
    fn random_seed(&self, burns: usize, slots: usize, rng: &mut StdRng) -> Candidate {
        let mut candidate = Candidate::empty(burns, slots);
        for _ in 0..burns {
            let open: Vec<usize> = (0..slots)
                .filter(|&s| candidate.occupancy[s] < self.capacity)
                .collect();
            let slot = open[rng.random_range(0..open.len())];
            candidate.push(slot);
        }
        candidate
    }

    /// Draw a move; `None` when the draw cannot change the assignment.
    fn propose(&self, current: &Candidate, rng: &mut StdRng) -> Option<Move> {
        let burns = current.slot_of.len();
        let slots = current.occupancy.len();

        if rng.random_bool(0.5) {
            if slots < 2 {
                return None;
            }
            let burn = rng.random_range(0..burns);
            // uniform over the other slots
            let mut to = rng.random_range(0..slots - 1);
            if to >= current.slot_of[burn] {
                to += 1;
            }
            Some(Move::Relocate { burn, to })
        } else {
            if burns < 2 {
                return None;
            }
            let a = rng.random_range(0..burns);
            let mut b = rng.random_range(0..burns - 1);
            if b >= a {
                b += 1;
            }
            if current.slot_of[a] == current.slot_of[b] {
                return None;
            }
            Some(Move::Swap { a, b })
        }
    }

    fn apply(current: &Candidate, mv: &Move) -> Candidate {
        let mut next = current.clone();
        match *mv {
            Move::Relocate { burn, to } => {
                let from = next.slot_of[burn];
                next.occupancy[from] -= 1;
                next.occupancy[to] += 1;
                next.slot_of[burn] = to;
            }
            Move::Swap { a, b } => next.slot_of.swap(a, b),
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Constraints;
    use crate::conflict::ConflictDetector;
    use crate::core_types::{
        Acres, BurnRequest, Celsius, CropType, Degrees, GeoPoint, Meters, MetersPerSecond,
        Percent, StabilityClass, TimeWindow, WeatherSnapshot,
    };
    use crate::dispersion::DispersionModel;
    use chrono::NaiveDate;

    struct Fixture {
        burns: Vec<BurnRequest>,
        matrix: ConflictMatrix,
        constraints: Constraints,
    }

    /// `n` burns 1 km apart in a line, all mutually inside the 5 km floor
    /// for neighbours up to 4 apart.
    fn fixture(n: u64) -> Fixture {
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let weather = WeatherSnapshot {
            temperature: Celsius::new(20.0),
            humidity: Percent::new(45.0),
            wind_speed: MetersPerSecond::new(4.0),
            wind_direction: Degrees::new(0.0),
            stability: StabilityClass::D,
            timestamp: date.and_hms_opt(10, 0, 0).unwrap(),
            location: GeoPoint::new(38.5, -121.7),
        };
        let origin = GeoPoint::new(38.5, -121.7);
        let burns: Vec<_> = (0..n)
            .map(|i| {
                BurnRequest::new(
                    i,
                    origin.destination(Degrees::new(90.0), Meters::new(1_000.0 * i as f64)),
                    Acres::new(10.0),
                    CropType::Cotton,
                    date,
                    TimeWindow::hours(8, 12).unwrap(),
                )
                .with_priority(90.0 - 10.0 * i as f64)
            })
            .collect();
        let model = DispersionModel::default();
        let preds: Vec<_> = burns
            .iter()
            .map(|b| model.predict_dispersion(b, &weather).unwrap())
            .collect();
        let constraints = Constraints::default();
        let matrix = ConflictMatrix::build(
            &ConflictDetector::default(),
            &burns,
            &preds,
            constraints.min_separation_distance,
        );
        Fixture {
            burns,
            matrix,
            constraints,
        }
    }

    fn order(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn test_greedy_seed_avoids_conflicts_when_possible() {
        let f = fixture(4);
        let cost = CostModel::new(&f.burns, &f.matrix, vec![0.0; 4], &f.constraints);
        let opts = AnnealingOptions::default().with_seed(1);
        let order = order(4);
        let annealer = Annealer::new(&cost, &f.matrix, &order, 3, &opts);
        let seed = annealer.greedy_seed(4, 4);
        assert_eq!(seed.slots(), &[0, 1, 2, 3]);
        assert_eq!(cost.evaluate(seed.slots()).conflict_count, 0);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let f = fixture(6);
        let cost = CostModel::new(&f.burns, &f.matrix, vec![0.0, 0.1, 0.2], &f.constraints);
        let opts = AnnealingOptions::default()
            .with_seed(7)
            .with_seed_strategy(SeedStrategy::Random)
            .with_max_iterations(2_000);
        let order = order(6);
        let outcome = Annealer::new(&cost, &f.matrix, &order, 2, &opts).run();
        assert!(outcome.best.occupancy().iter().all(|&c| c <= 2));
        assert_eq!(outcome.best.occupancy().iter().sum::<usize>(), 6);
        assert!(outcome.rejected_capacity > 0);
    }

    #[test]
    fn test_trace_is_non_increasing() {
        let f = fixture(6);
        let cost = CostModel::new(&f.burns, &f.matrix, vec![0.0, 0.05, 0.1, 0.3], &f.constraints);
        let opts = AnnealingOptions::default()
            .with_seed(11)
            .with_seed_strategy(SeedStrategy::Random)
            .with_trace();
        let order = order(6);
        let outcome = Annealer::new(&cost, &f.matrix, &order, 3, &opts).run();
        assert_eq!(outcome.trace.len(), outcome.iterations);
        assert!(outcome.trace.windows(2).all(|w| w[1] <= w[0]));
        assert!(outcome.best_cost.total <= outcome.initial_cost);
        assert_eq!(outcome.trace.last().copied(), Some(outcome.best_cost.total));
    }

    #[test]
    fn test_stagnation_stops_single_slot_run() {
        let f = fixture(2);
        let cost = CostModel::new(&f.burns, &f.matrix, vec![0.0], &f.constraints);
        let opts = AnnealingOptions {
            stagnation_limit: 25,
            ..AnnealingOptions::default().with_seed(3)
        };
        let order = order(2);
        let outcome = Annealer::new(&cost, &f.matrix, &order, 2, &opts).run();
        assert_eq!(outcome.termination, TerminationReason::Stagnation);
        assert_eq!(outcome.iterations, 25);
    }

    #[test]
    fn test_empty_run() {
        let f = fixture(0);
        let cost = CostModel::new(&f.burns, &f.matrix, vec![0.0; 4], &f.constraints);
        let opts = AnnealingOptions::default().with_seed(3);
        let outcome = Annealer::new(&cost, &f.matrix, &[], 3, &opts).run();
        assert_eq!(outcome.termination, TerminationReason::Empty);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_temperature_floor() {
        let f = fixture(3);
        let cost = CostModel::new(&f.burns, &f.matrix, vec![0.0; 4], &f.constraints);
        let opts = AnnealingOptions {
            initial_temperature: 1.0,
            cooling_rate: 0.5,
            min_temperature: 0.1,
            ..AnnealingOptions::default().with_seed(5)
        };
        let order = order(3);
        let outcome = Annealer::new(&cost, &f.matrix, &order, 3, &opts).run();
        assert_eq!(outcome.termination, TerminationReason::TemperatureFloor);
        // 1, 0.5, 0.25, 0.125 are at or above the floor
        assert_eq!(outcome.iterations, 4);
    }
}
