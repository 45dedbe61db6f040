use serde::{Deserialize, Serialize};

use crate::NoiseGenerator;
use crate::error::ConfigError;

// Octave parameters for one fractal field.
// Height map, caves and stone banding each carry their own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OctaveConfig {
    pub octaves: u32,     // number of octaves to sum
    pub persistence: f64, // amplitude scaling per octave
    pub scale: f64,       // frequency of the first octave
}

impl OctaveConfig {
    pub const fn new(octaves: u32, persistence: f64, scale: f64) -> Self {
        Self {
            octaves,
            persistence,
            scale,
        }
    }

    // Check the ranges fbm is meant to be driven with.
    // fbm itself stays total, so this is only enforced where configs are loaded.
    pub fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.octaves == 0 {
            return Err(ConfigError::NoOctaves { field });
        }
        if !(self.persistence > 0.0 && self.persistence <= 1.0) {
            return Err(ConfigError::Persistence {
                field,
                value: self.persistence,
            });
        }
        if !(self.scale > 0.0 && self.scale.is_finite()) {
            return Err(ConfigError::Scale {
                field,
                value: self.scale,
            });
        }
        Ok(())
    }
}

// Trig-based generator driving the permutation shuffle.
// x = sin(x) * 10000, keep the fractional part.
// Worlds only reproduce bit-for-bit where `sin` rounds identically.
struct SineRandom {
    x: f64,
}

impl SineRandom {
    fn new(seed: i64) -> Self {
        Self {
            x: (seed as f64).sin() * 10000.0,
        }
    }

    // Next value in [0, 1).
    fn next_f64(&mut self) -> f64 {
        self.x = self.x.sin() * 10000.0;
        self.x - self.x.floor()
    }
}

// Seeded 3D gradient noise.
// Immutable after construction, so one field can be shared by every
// worker generating chunks.
#[derive(Clone)]
pub struct NoiseField {
    seed: i64,
    perm: [u8; 512], // permutation table (256 duplicated)
}

impl NoiseField {
    pub fn new(seed: i64) -> Self {
        let mut p = [0u8; 256];
        for (i, slot) in p.iter_mut().enumerate() {
            *slot = i as u8;
        }

        // Fisher–Yates from the top index down
        let mut rng = SineRandom::new(seed);
        for i in (1..256).rev() {
            let j = (rng.next_f64() * (i + 1) as f64).floor() as usize;
            p.swap(i, j);
        }

        // Lattice hashing adds at most +1 to an index below 511
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = p[i & 255];
        }

        Self { seed, perm }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn permutation(&self) -> &[u8; 512] {
        &self.perm
    }

    // Quintic 6t^5 - 15t^4 + 10t^3: zero first and second derivative at 0 and 1
    #[inline]
    fn fade(t: f64) -> f64 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    #[inline]
    fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + t * (b - a)
    }

    // Low 4 bits of the hash pick one of 12 edge gradients
    #[inline]
    fn grad(hash: u8, x: f64, y: f64, z: f64) -> f64 {
        let h = hash & 0xF;
        let u = if h < 8 { x } else { y };
        let v = if h < 4 {
            y
        } else if h == 12 || h == 14 {
            x
        } else {
            z
        };
        let sign_u = if (h & 1) == 0 { u } else { -u };
        let sign_v = if (h & 2) == 0 { v } else { -v };
        sign_u + sign_v
    }

    // Single-octave gradient noise at (x, y, z), nominally in [-1, 1].
    pub fn noise3(&self, x: f64, y: f64, z: f64) -> f64 {
        let (x0, y0, z0) = (x.floor(), y.floor(), z.floor());

        // Unit cube that contains the point
        let xi = (x0 as i64 & 255) as usize;
        let yi = (y0 as i64 & 255) as usize;
        let zi = (z0 as i64 & 255) as usize;

        // Relative position inside the cube
        let (x, y, z) = (x - x0, y - y0, z - z0);

        let u = Self::fade(x);
        let v = Self::fade(y);
        let w = Self::fade(z);

        // Hash the eight corners
        let p = &self.perm;
        let a = p[xi] as usize + yi;
        let aa = p[a] as usize + zi;
        let ab = p[a + 1] as usize + zi;
        let b = p[xi + 1] as usize + yi;
        let ba = p[b] as usize + zi;
        let bb = p[b + 1] as usize + zi;

        let near = Self::lerp(
            Self::lerp(
                Self::grad(p[aa], x, y, z),
                Self::grad(p[ba], x - 1.0, y, z),
                u,
            ),
            Self::lerp(
                Self::grad(p[ab], x, y - 1.0, z),
                Self::grad(p[bb], x - 1.0, y - 1.0, z),
                u,
            ),
            v,
        );
        let far = Self::lerp(
            Self::lerp(
                Self::grad(p[aa + 1], x, y, z - 1.0),
                Self::grad(p[ba + 1], x - 1.0, y, z - 1.0),
                u,
            ),
            Self::lerp(
                Self::grad(p[ab + 1], x, y - 1.0, z - 1.0),
                Self::grad(p[bb + 1], x - 1.0, y - 1.0, z - 1.0),
                u,
            ),
            v,
        );

        Self::lerp(near, far, w)
    }

    // Fractal sum of noise3: frequency doubles and amplitude decays by
    // `persistence` per octave, normalized by the total amplitude.
    //
    // Zero octaves contribute nothing and return 0.0. Amplitudes are summed
    // by magnitude, so a non-positive persistence gives a degenerate but
    // finite field instead of dividing by zero.
    pub fn fbm(&self, x: f64, y: f64, z: f64, config: &OctaveConfig) -> f64 {
        if config.octaves == 0 {
            return 0.0;
        }

        let mut amplitude = 1.0;
        let mut freq = config.scale;
        let mut total = 0.0;
        let mut max_amp = 0.0;

        for _ in 0..config.octaves {
            total += self.noise3(x * freq, y * freq, z * freq) * amplitude;
            max_amp += f64::abs(amplitude);
            amplitude *= config.persistence;
            freq *= 2.0;
        }

        total / max_amp
    }

    // Borrow this field as a fixed-octave fractal generator.
    pub fn octaves(&self, config: OctaveConfig) -> Fbm<'_> {
        Fbm {
            field: self,
            config,
        }
    }
}

impl NoiseGenerator for NoiseField {
    fn get3(&self, x: f64, y: f64, z: f64) -> f64 {
        self.noise3(x, y, z)
    }
}

// A noise field paired with one octave configuration.
pub struct Fbm<'a> {
    field: &'a NoiseField,
    config: OctaveConfig,
}

impl NoiseGenerator for Fbm<'_> {
    fn get3(&self, x: f64, y: f64, z: f64) -> f64 {
        self.field.fbm(x, y, z, &self.config)
    }
}
