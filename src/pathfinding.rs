use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use bevy::math::{IVec2, IVec3, Vec3Swizzles};

use crate::settings::SearchSettings;
use crate::terrain::TerrainOracle;

const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;

const NEIGHBORS: [IVec2; 8] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
    IVec2::new(1, 1),
    IVec2::new(1, -1),
    IVec2::new(-1, 1),
    IVec2::new(-1, -1),
];

/// Result of a route search.
///
/// Running out of budget is an ordinary outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(Vec<IVec3>),
    NoRoute,
    BudgetExhausted,
}

impl SearchOutcome {
    pub fn into_route(self) -> Option<Vec<IVec3>> {
        match self {
            SearchOutcome::Found(route) => Some(route),
            SearchOutcome::NoRoute | SearchOutcome::BudgetExhausted => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathfindingNode {
    pub position: IVec2,
    pub cost: f32,
    pub heuristic: f32,
}

impl PathfindingNode {
    pub fn total_cost(&self) -> f32 {
        self.cost + self.heuristic
    }
}

impl PartialEq for PathfindingNode {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl Eq for PathfindingNode {}

impl PartialOrd for PathfindingNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathfindingNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.total_cost()
            .partial_cmp(&other.total_cost())
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// A* over terrain columns between two structures
pub struct PathfindingSystem<'a> {
    terrain: &'a dyn TerrainOracle,
    settings: &'a SearchSettings,
}

impl<'a> PathfindingSystem<'a> {
    pub fn new(terrain: &'a dyn TerrainOracle, settings: &'a SearchSettings) -> Self {
        Self { terrain, settings }
    }

    /// Find a walkable route from `start` to `goal`.
    ///
    /// The route lists every column visited, each at road height.
    pub fn find_path(&self, start: IVec3, goal: IVec3) -> SearchOutcome {
        let start = start.xz();
        let goal = goal.xz();

        let mut open_set = BinaryHeap::new();
        let mut closed_set = HashSet::new();
        let mut came_from: HashMap<IVec2, IVec2> = HashMap::new();
        let mut cost_so_far: HashMap<IVec2, f32> = HashMap::new();
        let mut heights: HashMap<IVec2, i32> = HashMap::new();
        let mut expanded = 0usize;

        open_set.push(Reverse(PathfindingNode {
            position: start,
            cost: 0.0,
            heuristic: Self::heuristic(start, goal),
        }));
        cost_so_far.insert(start, 0.0);

        while let Some(Reverse(current)) = open_set.pop() {
            if current.position == goal {
                return SearchOutcome::Found(self.reconstruct_path(&came_from, goal, &mut heights));
            }

            if !closed_set.insert(current.position) {
                continue;
            }

            expanded += 1;
            if expanded > self.settings.step_budget {
                return SearchOutcome::BudgetExhausted;
            }

            let current_height = self.height_at(current.position, &mut heights);

            for offset in NEIGHBORS {
                let neighbor = current.position + offset;
                if closed_set.contains(&neighbor) {
                    continue;
                }

                let Some(step_cost) = self.step_cost(current_height, neighbor, offset, &mut heights)
                else {
                    continue; // Too steep
                };

                let tentative_cost = current.cost + step_cost;
                if let Some(&existing_cost) = cost_so_far.get(&neighbor)
                    && tentative_cost >= existing_cost
                {
                    continue;
                }

                cost_so_far.insert(neighbor, tentative_cost);
                came_from.insert(neighbor, current.position);
                open_set.push(Reverse(PathfindingNode {
                    position: neighbor,
                    cost: tentative_cost,
                    heuristic: Self::heuristic(neighbor, goal),
                }));
            }
        }

        SearchOutcome::NoRoute
    }

    /// Octile distance, admissible for 8-neighbour moves with unit base cost
    fn heuristic(from: IVec2, to: IVec2) -> f32 {
        let d = (to - from).abs();
        let (low, high) = (d.x.min(d.y) as f32, d.x.max(d.y) as f32);
        (high - low) + low * DIAGONAL_COST
    }

    fn height_at(&self, column: IVec2, heights: &mut HashMap<IVec2, i32>) -> i32 {
        *heights
            .entry(column)
            .or_insert_with(|| self.terrain.road_height(column.x, column.y))
    }

    /// Cost of stepping onto `to`, or `None` when the climb is too steep
    fn step_cost(
        &self,
        from_height: i32,
        to: IVec2,
        offset: IVec2,
        heights: &mut HashMap<IVec2, i32>,
    ) -> Option<f32> {
        let to_height = self.height_at(to, heights);
        let climb = (to_height - from_height).abs();
        if climb > self.settings.max_climb {
            return None;
        }

        let base = if offset.x != 0 && offset.y != 0 {
            DIAGONAL_COST
        } else {
            1.0
        };
        let water = if self.terrain.is_underwater(to.x, to.y) {
            self.settings.water_cost
        } else {
            0.0
        };
        Some(base + climb as f32 * self.settings.climb_cost + water)
    }

    fn reconstruct_path(
        &self,
        came_from: &HashMap<IVec2, IVec2>,
        mut current: IVec2,
        heights: &mut HashMap<IVec2, i32>,
    ) -> Vec<IVec3> {
        let mut path = vec![current];
        while let Some(&parent) = came_from.get(&current) {
            current = parent;
            path.push(current);
        }
        path.reverse();

        path.into_iter()
            .map(|c| IVec3::new(c.x, self.height_at(c, heights), c.y))
            .collect()
    }

    /// Total horizontal length of a route
    pub fn route_length(route: &[IVec3]) -> f32 {
        route
            .windows(2)
            .map(|w| (w[1].xz() - w[0].xz()).as_vec2().length())
            .sum()
    }
}
