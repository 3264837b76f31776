use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};

/// Absorption line: (centre, sigma, depth as a fraction of the continuum).
const LINES: [(f64, f64, f64); 6] = [
    (4101.7, 2.5, 0.55), // H delta
    (4226.7, 0.6, 0.35), // Ca I
    (4340.5, 3.0, 0.60), // H gamma
    (4383.5, 0.5, 0.30), // Fe I
    (4471.5, 0.8, 0.25), // He I
    (4481.2, 0.4, 0.20), // Mg II
];

fn gaussian(x: f64, mu: f64, sigma: f64) -> f64 {
    (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Smooth, sloped continuum in arbitrary flux units.
fn continuum(wavelength: f64) -> f64 {
    let t = (wavelength - 4000.0) / 500.0;
    1.0e-13 * (1.8 - 0.6 * t + 0.15 * t * t)
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_spectrum.txt".to_string());

    // 4000 → 4500 Å, step 0.25 Å, S/N ≈ 100
    let samples = 2001;
    let file = File::create(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    let mut out = BufWriter::new(file);

    for i in 0..samples {
        let wavelength = 4000.0 + i as f64 * 0.25;
        let absorption: f64 = LINES
            .iter()
            .map(|&(mu, sigma, depth)| depth * gaussian(wavelength, mu, sigma))
            .sum();
        let clean = continuum(wavelength) * (1.0 - absorption.min(0.95));
        let flux = clean * (1.0 + rng.gauss(0.0, 0.01));
        writeln!(out, "{wavelength:.2} {flux:.6e}").context("writing sample")?;
    }
    out.flush().context("flushing sample")?;

    println!("Wrote {samples} samples (4000–4500 Å) to {output_path}");
    Ok(())
}
