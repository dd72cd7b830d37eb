/// Particle field — the ambient drifting motes behind a scene.
///
/// The engine only starts and stops the field; the host steps it once per
/// animation frame and draws the snapshot.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::f64::consts::TAU;

use crate::schema::scene::{ParticleConfig, ParticleKind};

/// The collaborator interface the engine drives.
pub trait ParticleField {
    /// Replace whatever is running with a fresh field for `config`.
    fn start(&mut self, config: &ParticleConfig);
    /// Stop the field. Safe to call when nothing is running.
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

#[derive(Debug, Clone, Serialize)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    #[serde(skip)]
    vx: f64,
    #[serde(skip)]
    vy: f64,
    pub alpha: f64,
    #[serde(skip)]
    life: f64,
    #[serde(skip)]
    life_decay: f64,
}

/// Seeded simulation of the dreamy particle field.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    rng: StdRng,
    width: f64,
    height: f64,
    particles: Vec<Particle>,
    running: bool,
    /// Bumped on every start/stop so a host holding an old frame loop can
    /// tell it has been superseded.
    generation: u64,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new(0, 1280.0, 720.0)
    }
}

impl ParticleSystem {
    pub fn new(seed: u64, width: f64, height: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            width,
            height,
            particles: Vec::new(),
            running: false,
            generation: 0,
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn spawn(&mut self, kind: ParticleKind) -> Particle {
        match kind {
            ParticleKind::Dreamy => {
                let radius = self.rng.gen::<f64>() * 5.0 + 2.0;
                let speed = self.rng.gen::<f64>() * 0.4 + 0.1;
                let direction = self.rng.gen::<f64>() * TAU;
                Particle {
                    x: self.rng.gen::<f64>() * self.width,
                    y: self.rng.gen::<f64>() * self.height * 1.3,
                    radius,
                    vx: direction.cos() * speed,
                    vy: direction.sin() * speed - 0.15,
                    alpha: self.rng.gen::<f64>() * 0.5 + 0.25,
                    life: 1.0,
                    life_decay: 0.0003 + self.rng.gen::<f64>() * 0.0004,
                }
            }
        }
    }

    /// Advance every particle by one frame. No-op while stopped.
    pub fn step(&mut self) {
        if !self.running {
            return;
        }
        let (width, height) = (self.width, self.height);
        for p in self.particles.iter_mut() {
            p.x += p.vx;
            p.y += p.vy;
            p.life -= p.life_decay;

            if p.y < -20.0 || p.x < -20.0 || p.x > width + 20.0 || p.life <= 0.0 {
                // respawn below the bottom edge
                p.x = self.rng.gen::<f64>() * width;
                p.y = height + 30.0;
                p.life = 1.0;
            }

            p.alpha = p.life * (0.25 + self.rng.gen::<f64>() * 0.45);
        }
    }
}

impl ParticleField for ParticleSystem {
    fn start(&mut self, config: &ParticleConfig) {
        self.stop();
        self.generation += 1;
        let particles: Vec<Particle> = (0..config.count).map(|_| self.spawn(config.kind)).collect();
        self.particles = particles;
        self.running = true;
    }

    fn stop(&mut self) {
        if self.running {
            self.generation += 1;
        }
        self.running = false;
        self.particles.clear();
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_spawns_configured_count() {
        let mut field = ParticleSystem::new(7, 800.0, 600.0);
        field.start(&ParticleConfig {
            kind: ParticleKind::Dreamy,
            count: 12,
        });
        assert!(field.is_running());
        assert_eq!(field.particles().len(), 12);
    }

    #[test]
    fn restart_replaces_previous_field() {
        let mut field = ParticleSystem::new(7, 800.0, 600.0);
        field.start(&ParticleConfig::default());
        let first = field.generation();
        field.start(&ParticleConfig {
            kind: ParticleKind::Dreamy,
            count: 5,
        });
        assert_eq!(field.particles().len(), 5);
        assert!(field.generation() > first);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut field = ParticleSystem::new(1, 800.0, 600.0);
        field.stop();
        field.stop();
        assert!(!field.is_running());
        field.start(&ParticleConfig::default());
        field.stop();
        let generation = field.generation();
        field.stop();
        assert_eq!(field.generation(), generation);
        assert!(field.particles().is_empty());
    }

    #[test]
    fn step_keeps_particles_in_horizontal_bounds() {
        let mut field = ParticleSystem::new(3, 200.0, 100.0);
        field.start(&ParticleConfig::default());
        for _ in 0..2000 {
            field.step();
        }
        for p in field.particles() {
            assert!(p.x >= -20.0 && p.x <= 220.0, "x out of range: {}", p.x);
            assert!(p.alpha >= 0.0 && p.alpha <= 1.0);
        }
    }

    #[test]
    fn same_seed_same_field() {
        let mut a = ParticleSystem::new(42, 640.0, 480.0);
        let mut b = ParticleSystem::new(42, 640.0, 480.0);
        a.start(&ParticleConfig::default());
        b.start(&ParticleConfig::default());
        a.step();
        b.step();
        assert_eq!(a.particles()[0].x, b.particles()[0].x);
        assert_eq!(a.particles()[0].y, b.particles()[0].y);
    }
}
