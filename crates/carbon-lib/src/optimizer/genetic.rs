//! Genetic operators over deployment configurations

use super::{Constraints, EmissionEstimator};
use crate::models::Resources;
use rand::Rng;
use serde::Serialize;

/// One candidate deployment configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Individual {
    pub region: String,
    pub time: u32,
    pub resources: Resources,
}

/// Fixed-size generation of candidates
pub type Population = Vec<Individual>;

/// Lower emissions map to higher fitness, always in (0, 1]
pub fn fitness<E: EmissionEstimator + ?Sized>(estimator: &E, individual: &Individual) -> f64 {
    1.0 / (emissions(estimator, individual) + 1.0)
}

pub fn emissions<E: EmissionEstimator + ?Sized>(estimator: &E, individual: &Individual) -> f64 {
    estimator.estimate(&individual.region, individual.time, &individual.resources)
}

fn pick<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

/// Uniform draw from `(0, limit]`
fn draw_allocation<R: Rng + ?Sized>(limit: f64, rng: &mut R) -> f64 {
    limit * (1.0 - rng.gen::<f64>())
}

pub fn random_individual<R: Rng + ?Sized>(constraints: &Constraints, rng: &mut R) -> Individual {
    Individual {
        region: pick(&constraints.regions, rng).clone(),
        time: *pick(&constraints.time_windows, rng),
        resources: Resources {
            cpu: draw_allocation(constraints.resource_limits.cpu, rng),
            memory: draw_allocation(constraints.resource_limits.memory, rng),
        },
    }
}

pub fn initialize<R: Rng + ?Sized>(
    constraints: &Constraints,
    size: usize,
    rng: &mut R,
) -> Population {
    (0..size).map(|_| random_individual(constraints, rng)).collect()
}

/// One tournament per output slot, contestants drawn with replacement
pub fn tournament_select<R: Rng + ?Sized>(
    population: &[Individual],
    fitness: &[f64],
    tournament_size: usize,
    rng: &mut R,
) -> Population {
    (0..population.len())
        .map(|_| {
            let mut winner = rng.gen_range(0..population.len());
            for _ in 1..tournament_size {
                let contender = rng.gen_range(0..population.len());
                if fitness[contender] > fitness[winner] {
                    winner = contender;
                }
            }
            population[winner].clone()
        })
        .collect()
}

/// Region and time by coin flip, resources averaged
pub fn crossover<R: Rng + ?Sized>(a: &Individual, b: &Individual, rng: &mut R) -> Individual {
    Individual {
        region: if rng.gen_bool(0.5) {
            a.region.clone()
        } else {
            b.region.clone()
        },
        time: if rng.gen_bool(0.5) { a.time } else { b.time },
        resources: Resources {
            cpu: (a.resources.cpu + b.resources.cpu) / 2.0,
            memory: (a.resources.memory + b.resources.memory) / 2.0,
        },
    }
}

/// Independently resample region and time, and rescale resources by ±20%
///
/// Rescaled resources never exceed the constraint limits.
pub fn mutate<R: Rng + ?Sized>(
    individual: &mut Individual,
    constraints: &Constraints,
    rate: f64,
    rng: &mut R,
) {
    if rng.gen_bool(rate) {
        individual.region = pick(&constraints.regions, rng).clone();
    }
    if rng.gen_bool(rate) {
        individual.time = *pick(&constraints.time_windows, rng);
    }
    if rng.gen_bool(rate) {
        let limits = constraints.resource_limits;
        individual.resources.cpu =
            (individual.resources.cpu * rng.gen_range(0.8..=1.2)).min(limits.cpu);
        individual.resources.memory =
            (individual.resources.memory * rng.gen_range(0.8..=1.2)).min(limits.memory);
    }
}

/// Pair consecutive parents; each pair yields two mutated children
///
/// An odd trailing parent is paired with the first one. The result is
/// truncated to the parent count.
pub fn next_generation<R: Rng + ?Sized>(
    parents: &[Individual],
    constraints: &Constraints,
    mutation_rate: f64,
    rng: &mut R,
) -> Population {
    let mut next = Vec::with_capacity(parents.len() + 1);
    for i in (0..parents.len()).step_by(2) {
        let first = &parents[i];
        let second = parents.get(i + 1).unwrap_or(&parents[0]);

        let mut child_a = crossover(first, second, rng);
        let mut child_b = crossover(second, first, rng);
        mutate(&mut child_a, constraints, mutation_rate, rng);
        mutate(&mut child_b, constraints, mutation_rate, rng);
        next.push(child_a);
        next.push(child_b);
    }
    next.truncate(parents.len());
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::HeuristicEstimator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn constraints() -> Constraints {
        Constraints {
            regions: vec!["us-east-1".to_string(), "eu-north-1".to_string()],
            time_windows: vec![6, 12, 18],
            resource_limits: Resources::new(4.0, 8.0),
            carbon_budget: 500.0,
        }
    }

    fn individual(region: &str, time: u32, cpu: f64, memory: f64) -> Individual {
        Individual {
            region: region.to_string(),
            time,
            resources: Resources::new(cpu, memory),
        }
    }

    #[test]
    fn test_initialize_respects_constraints() {
        let mut rng = StdRng::seed_from_u64(1);
        let c = constraints();
        let population = initialize(&c, 200, &mut rng);
        assert_eq!(population.len(), 200);
        for ind in &population {
            assert!(c.regions.contains(&ind.region));
            assert!(c.time_windows.contains(&ind.time));
            assert!(ind.resources.cpu > 0.0 && ind.resources.cpu <= 4.0);
            assert!(ind.resources.memory > 0.0 && ind.resources.memory <= 8.0);
        }
    }

    #[test]
    fn test_fitness_favors_lower_emissions() {
        let estimator = HeuristicEstimator::default();
        let green = individual("eu-north-1", 18, 1.0, 1.0);
        let dirty = individual("us-east-1", 6, 1.0, 1.0);
        let f_green = fitness(&estimator, &green);
        let f_dirty = fitness(&estimator, &dirty);
        assert!(f_green > f_dirty);
        assert!(f_green > 0.0 && f_green <= 1.0);
    }

    #[test]
    fn test_tournament_preserves_size_and_prefers_fit() {
        let mut rng = StdRng::seed_from_u64(7);
        let population = vec![
            individual("us-east-1", 6, 4.0, 8.0),
            individual("us-east-1", 6, 3.0, 8.0),
            individual("eu-north-1", 18, 0.1, 0.1),
            individual("us-east-1", 6, 2.0, 8.0),
        ];
        let estimator = HeuristicEstimator::default();
        let scores: Vec<f64> = population.iter().map(|i| fitness(&estimator, i)).collect();

        let mut best_wins = 0;
        for _ in 0..100 {
            let selected = tournament_select(&population, &scores, 3, &mut rng);
            assert_eq!(selected.len(), population.len());
            best_wins += selected.iter().filter(|i| **i == population[2]).count();
        }
        // Uniform selection would pick the best 100 times out of 400
        assert!(best_wins > 150, "best individual won {} slots", best_wins);
    }

    #[test]
    fn test_crossover_averages_resources() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = individual("us-east-1", 6, 2.0, 4.0);
        let b = individual("eu-north-1", 18, 4.0, 8.0);
        let child = crossover(&a, &b, &mut rng);
        assert_eq!(child.resources, Resources::new(3.0, 6.0));
        assert!(child.region == a.region || child.region == b.region);
        assert!(child.time == a.time || child.time == b.time);
    }

    #[test]
    fn test_mutation_rate_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let c = constraints();
        let original = individual("us-east-1", 6, 2.0, 4.0);

        let mut untouched = original.clone();
        mutate(&mut untouched, &c, 0.0, &mut rng);
        assert_eq!(untouched, original);

        let mut mutated = original.clone();
        mutate(&mut mutated, &c, 1.0, &mut rng);
        assert!(c.regions.contains(&mutated.region));
        assert!(c.time_windows.contains(&mutated.time));
        assert!(mutated.resources.cpu >= 1.6 && mutated.resources.cpu <= 2.4);
        assert!(mutated.resources.memory >= 3.2 && mutated.resources.memory <= 4.8);
    }

    #[test]
    fn test_mutation_clamps_to_limits() {
        let mut rng = StdRng::seed_from_u64(13);
        let c = constraints();
        for _ in 0..50 {
            let mut at_limit = individual("us-east-1", 6, 4.0, 8.0);
            mutate(&mut at_limit, &c, 1.0, &mut rng);
            assert!(at_limit.resources.cpu <= 4.0);
            assert!(at_limit.resources.memory <= 8.0);
        }
    }

    #[test]
    fn test_next_generation_keeps_size_for_odd_populations() {
        let mut rng = StdRng::seed_from_u64(5);
        let c = constraints();
        let parents = initialize(&c, 7, &mut rng);
        let next = next_generation(&parents, &c, 0.1, &mut rng);
        assert_eq!(next.len(), 7);
    }
}
