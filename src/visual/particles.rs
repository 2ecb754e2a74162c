//! Particle system
//!
//! A shared pool of drifting dots. Each frame a particle stimulus resizes
//! the pool to `floor(intensity * base_count * (1 + stress))`, every live
//! particle moves and ages by one frame, and dead particles are retired
//! once the frame is finished.

use super::color::Color;
use super::surface::Surface;
use crate::settings::EngineSettings;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Margin added before the population is floored.
///
/// Intensities are stored as f32, so a configured `0.7` is held as
/// `0.69999998` and `0.7 * 20` lands just under 14. Widening to f64 keeps
/// that error, so the product is nudged by a margin far below one particle
/// and a decimal intensity floors to the count its decimal product names.
const COUNT_EPSILON: f32 = 1e-4;

/// Appearance and motion for newly spawned particles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleStyle {
    pub size: f32,
    pub color: Color,
    pub speed: f32,
}

/// One animated dot
#[derive(Debug, Clone, PartialEq)]
struct Particle {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    size: f32,
    color: Color,
    life: f32,
    max_life: f32,
}

impl Particle {
    fn update(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        self.life = (self.life - 1.0).max(0.0);
    }

    fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    fn alpha(&self) -> f32 {
        self.life / self.max_life
    }
}

/// Population of particles shared by every particle stimulus
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: ChaCha8Rng,
    base_count: usize,
    life_min: f32,
    life_max: f32,
}

impl ParticleSystem {
    pub fn new(rng: ChaCha8Rng, settings: &EngineSettings) -> Self {
        Self {
            particles: Vec::new(),
            rng,
            base_count: settings.particle_base_count,
            life_min: settings.particle_life_min,
            life_max: settings.particle_life_max,
        }
    }

    /// Population a particle stimulus asks for at `stress`
    pub fn target_count(&self, intensity: f32, stress: f32) -> usize {
        let raw = intensity.max(0.0) * self.base_count as f32 * (1.0 + stress);
        (raw + COUNT_EPSILON).floor() as usize
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Spawn or drop particles until exactly `target` are alive.
    ///
    /// New particles appear anywhere within `width` x `height` logical units.
    pub fn resize(&mut self, target: usize, width: f32, height: f32, style: ParticleStyle) {
        if self.particles.len() > target {
            self.particles.truncate(target);
            return;
        }
        while self.particles.len() < target {
            let particle = self.spawn(width, height, style);
            self.particles.push(particle);
        }
    }

    fn spawn(&mut self, width: f32, height: f32, style: ParticleStyle) -> Particle {
        let rng = &mut self.rng;
        let max_life = self.life_min + rng.gen::<f32>() * (self.life_max - self.life_min);
        Particle {
            x: rng.gen::<f32>() * width,
            y: rng.gen::<f32>() * height,
            vx: (rng.gen::<f32>() - 0.5) * style.speed,
            vy: (rng.gen::<f32>() - 0.5) * style.speed,
            size: style.size,
            color: style.color,
            life: max_life,
            max_life,
        }
    }

    /// Age every particle one frame and draw it, fading with remaining life
    pub fn step_and_draw(&mut self, surface: &mut Surface) {
        for particle in &mut self.particles {
            particle.update();
            if !particle.is_dead() {
                let color = particle.color.with_opacity(particle.alpha());
                surface.fill_circle(particle.x, particle.y, particle.size, color);
            }
        }
    }

    /// Drop every particle whose life has run out; returns how many went
    pub fn retire_dead(&mut self) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| !p.is_dead());
        before - self.particles.len()
    }

    /// Invariant check used by tests and debug assertions
    pub fn lives_in_range(&self) -> bool {
        self.particles
            .iter()
            .all(|p| p.life >= 0.0 && p.life <= p.max_life)
    }
}
