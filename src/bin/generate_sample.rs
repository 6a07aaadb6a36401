//! Writes a synthetic CSV for trying out the explorer:
//! a categorical `region`, numeric drivers, a `sales` column that is linear
//! in them plus noise, a boolean `promo` flag and a few missing cells.
//!
//! Usage: `generate_sample [OUTPUT.csv] [ROWS]`

use anyhow::{Context, Result};

const DEFAULT_OUTPUT: &str = "sample_data.csv";
const DEFAULT_ROWS: usize = 300;

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output_path = args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let rows = match args.next() {
        Some(n) => n.parse::<usize>().with_context(|| format!("invalid row count '{n}'"))?,
        None => DEFAULT_ROWS,
    };

    let mut rng = SimpleRng::new(42);
    let regions = [("North", -4.0), ("South", 6.0), ("East", 1.0), ("West", -1.5)];

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record(["day", "region", "temperature", "advertising", "sales", "promo"])?;

    for day in 1..=rows {
        let (region, offset) = *rng.pick(&regions);
        let temperature = rng.gauss(18.0 + offset, 5.0);
        let advertising = (rng.next_f64() * 100.0).round();
        let promo = rng.next_f64() < 0.3;
        let sales = 20.0
            + 3.0 * temperature
            + 0.5 * advertising
            + if promo { 15.0 } else { 0.0 }
            + rng.gauss(0.0, 8.0);

        // Every 50th day the thermometer was broken.
        let temperature = if day % 50 == 0 {
            String::new()
        } else {
            format!("{temperature:.1}")
        };

        writer.write_record([
            day.to_string(),
            region.to_string(),
            temperature,
            advertising.to_string(),
            format!("{sales:.2}"),
            promo.to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;

    log::info!("generated {rows} rows");
    println!("Wrote {rows} rows to {output_path}");
    Ok(())
}
