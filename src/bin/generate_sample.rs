use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};

use rusty_catalog::{format_sexagesimal, AngleUnit};

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Fraction of rows with no I-band magnitude / no colour.
const MISSING_FRACTION: f64 = 0.08;

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_catalog.csv".to_string());
    let n_stars = 200;
    let mut rng = SimpleRng::new(42);

    let file = File::create(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "# Synthetic Galactic-bulge catalog")?;
    writeln!(out, "# ra: hours (J2000), dec: degrees (J2000), magnitudes: Vega")?;

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["name", "ra", "dec", "i_mag", "v_i", "n_epochs"])?;

    for i in 0..n_stars {
        // Around the bulge: RA ~ 17h30m-18h10m, Dec ~ -35..-25 deg.
        let ra_deg = rng.uniform(262.5, 272.5);
        let dec_deg = rng.uniform(-35.0, -25.0);
        let i_mag = rng.gauss(17.0, 1.2);
        let v_i = rng.gauss(2.2, 0.4);
        let n_epochs = 50 + (rng.next_u64() % 2000);

        let i_field = if rng.next_f64() < MISSING_FRACTION {
            String::new()
        } else {
            format!("{i_mag:.3}")
        };
        let vi_field = if rng.next_f64() < MISSING_FRACTION {
            String::new()
        } else {
            format!("{v_i:.3}")
        };

        writer.write_record([
            format!("BLG{:03}", 100 + i),
            format_sexagesimal(ra_deg, AngleUnit::Hours, 2),
            format_sexagesimal(dec_deg, AngleUnit::Degrees, 1),
            i_field,
            vi_field,
            n_epochs.to_string(),
        ])?;
    }
    writer.flush()?;

    println!("Wrote {n_stars} stars to {output_path}");
    Ok(())
}
