//! Random walk inside a rectangle.

use fieldcast_field::Point;
use rand::Rng;

/// Deployment rectangle with its corner at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectangleWalk {
    pub width: f64,
    pub height: f64,
    /// Distance covered per unit of time.
    pub speed: f64,
}

impl RectangleWalk {
    /// Create a walk over `width x height` at `speed`.
    pub fn new(width: f64, height: f64, speed: f64) -> Self {
        Self { width, height, speed }
    }

    /// Uniformly random point of the rectangle.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        Point::new(sample(rng, self.width), sample(rng, self.height))
    }

    /// A walker starting at a random point.
    pub fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Walker {
        let start = self.random_point(rng);
        self.spawn_at(start, rng)
    }

    /// A walker starting at `position`.
    pub fn spawn_at<R: Rng + ?Sized>(&self, position: Point, rng: &mut R) -> Walker {
        Walker {
            position,
            target: self.random_point(rng),
        }
    }
}

/// A device following a [`RectangleWalk`].
///
/// Heads in a straight line to a random target, then picks the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Walker {
    position: Point,
    target: Point,
}

impl Walker {
    /// Current position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Current target.
    pub fn target(&self) -> Point {
        self.target
    }

    /// Teleport, keeping the current target.
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Where [`Walker::advance`] would put the walker after `elapsed`,
    /// following the current leg only and stopping at its target.
    pub fn projected(&self, walk: &RectangleWalk, elapsed: f64) -> Point {
        if !(walk.speed > 0.0 && elapsed > 0.0) {
            return self.position;
        }
        self.position.step_towards(&self.target, walk.speed * elapsed)
    }

    /// Advance by `elapsed` time units.
    pub fn advance<R: Rng + ?Sized>(&mut self, walk: &RectangleWalk, elapsed: f64, rng: &mut R) {
        if !(walk.speed > 0.0 && elapsed > 0.0) {
            return;
        }
        let mut budget = walk.speed * elapsed;
        // Bounded so a degenerate rectangle cannot spin forever
        for _ in 0..64 {
            let gap = self.position.distance(&self.target);
            if gap > budget {
                self.position = self.position.step_towards(&self.target, budget);
                return;
            }
            budget -= gap;
            self.position = self.target;
            self.target = walk.random_point(rng);
        }
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, extent: f64) -> f64 {
    if extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn points_stay_inside() {
        let walk = RectangleWalk::new(20.0, 5.0, 1.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let p = walk.random_point(&mut rng);
            assert!((0.0..20.0).contains(&p.x) && (0.0..5.0).contains(&p.y));
        }
    }

    #[test]
    fn walker_covers_speed_times_time() {
        let walk = RectangleWalk::new(1000.0, 1000.0, 2.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut walker = walk.spawn_at(Point::ORIGIN, &mut rng);
        let target = walker.target();
        let gap = Point::ORIGIN.distance(&target);

        let elapsed = gap / 4.0;
        walker.advance(&walk, elapsed, &mut rng);
        let travelled = Point::ORIGIN.distance(&walker.position());
        assert!((travelled - 2.0 * elapsed).abs() < 1e-9);
        assert_eq!(walker.target(), target);
    }

    #[test]
    fn projection_follows_the_current_leg() {
        let walk = RectangleWalk::new(1000.0, 1000.0, 2.0);
        let mut rng = StdRng::seed_from_u64(11);
        let walker = walk.spawn_at(Point::ORIGIN, &mut rng);
        let gap = Point::ORIGIN.distance(&walker.target());

        let elapsed = gap / 8.0;
        let mut moved = walker;
        moved.advance(&walk, elapsed, &mut rng);
        let projected = walker.projected(&walk, elapsed);
        assert!(projected.distance(&moved.position()) < 1e-9);

        // Past the target the next leg is unknown, so the projection waits there
        assert_eq!(walker.projected(&walk, gap), walker.target());
        assert_eq!(walker.projected(&walk, 0.0), Point::ORIGIN);
    }

    #[test]
    fn zero_speed_stays_put() {
        let walk = RectangleWalk::new(10.0, 10.0, 0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let mut walker = walk.spawn_at(Point::new(4.0, 4.0), &mut rng);
        walker.advance(&walk, 100.0, &mut rng);
        assert_eq!(walker.position(), Point::new(4.0, 4.0));
    }

    #[test]
    fn arriving_picks_a_new_target() {
        let walk = RectangleWalk::new(10.0, 10.0, 1000.0);
        let mut rng = StdRng::seed_from_u64(5);
        let mut walker = walk.spawn(&mut rng);
        let first = walker.target();
        walker.advance(&walk, 0.02, &mut rng);
        assert_ne!(walker.target(), first);
    }
}
