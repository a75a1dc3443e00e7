use crate::anim::Ease;
use rand::{rngs::StdRng, Rng};

pub(crate) const PARTICLE_COUNT: usize = 30;

const DRIFT_RANGE: f32 = 200.0;
const FALL_DISTANCE: f32 = 300.0;
pub(crate) const TINT_COUNT: u8 = 5;

/// One confetti streak. Each particle owns its whole lifecycle: a randomized
/// endpoint, its own duration, and its own clock. Nothing waits on it and it
/// waits on nothing.
pub(crate) struct Particle {
    drift: f32,
    spin: f32,
    duration: f32,
    elapsed: f32,
    pub(crate) tint: u8,
}

impl Particle {
    fn spawn(rng: &mut StdRng) -> Self {
        Self {
            drift: rng.gen_range(-DRIFT_RANGE..DRIFT_RANGE),
            spin: rng.gen_range(0.0..360.0),
            duration: rng.gen_range(1.0..2.0),
            elapsed: 0.0,
            tint: rng.gen_range(0..TINT_COUNT),
        }
    }

    /// Current (x, y, rotation-degrees) offset from the burst origin.
    pub(crate) fn pose(&self) -> (f32, f32, f32) {
        let p = Ease::QuadOut.apply(self.elapsed / self.duration);
        (self.drift * p, FALL_DISTANCE * p, self.spin * p)
    }
}

pub(crate) struct Burst {
    parts: Vec<Particle>,
}

impl Burst {
    pub(crate) fn new() -> Self {
        Self { parts: Vec::new() }
    }

    pub(crate) fn spawn(&mut self, count: usize, rng: &mut StdRng) {
        self.parts.extend((0..count).map(|_| Particle::spawn(rng)));
    }

    /// Advance every particle and drop the ones whose own animation has
    /// completed. A slow particle never holds up a fast one.
    pub(crate) fn update(&mut self, dt: f32) {
        for p in &mut self.parts {
            p.elapsed += dt;
        }
        self.parts.retain(|p| p.elapsed < p.duration);
    }

    pub(crate) fn len(&self) -> usize {
        self.parts.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.parts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn spawn_produces_exact_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = Burst::new();
        b.spawn(PARTICLE_COUNT, &mut rng);
        assert_eq!(b.len(), PARTICLE_COUNT);
    }

    #[test]
    fn particles_expire_on_their_own_clocks() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = Burst::new();
        b.spawn(PARTICLE_COUNT, &mut rng);

        // durations are drawn from [1.0, 2.0), so nothing dies before 1.0s
        b.update(0.95);
        assert_eq!(b.len(), PARTICLE_COUNT);

        // and the population only shrinks from here, each on its own clock
        let mut prev = b.len();
        let mut elapsed = 0.95;
        while elapsed < 2.1 {
            b.update(0.05);
            elapsed += 0.05;
            assert!(b.len() <= prev);
            prev = b.len();
        }
        assert_eq!(b.len(), 0);
    }

    #[test]
    fn pose_travels_toward_endpoint() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut p = Particle::spawn(&mut rng);
        assert_eq!(p.pose(), (0.0, 0.0, 0.0));
        p.elapsed = p.duration;
        let (x, y, rot) = p.pose();
        assert!((x - p.drift).abs() < 1e-3);
        assert!((y - FALL_DISTANCE).abs() < 1e-3);
        assert!((rot - p.spin).abs() < 1e-3);
        assert!(p.drift.abs() <= DRIFT_RANGE);
        assert!((0.0..360.0).contains(&p.spin));
        assert!((1.0..2.0).contains(&p.duration));
    }

    #[test]
    fn a_second_burst_is_additive() {
        // idempotence of submission lives in the director; the engine itself
        // just spawns what it is told to
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = Burst::new();
        b.spawn(10, &mut rng);
        b.spawn(10, &mut rng);
        assert_eq!(b.len(), 20);
    }
}
