use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Write a synthetic cytometry dataset: training matrix, labels, test archive.
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
struct Args {
    /// Output directory
    #[arg(default_value = "sample_data")]
    out_dir: PathBuf,

    /// Training cells per population
    #[arg(long, default_value_t = 200)]
    cells: usize,

    /// Number of test samples in the archive
    #[arg(long, default_value_t = 3)]
    samples: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Populations and their mean expression over six markers
/// (CD3, CD4, CD8, CD19, CD56, CD14).
const POPULATIONS: &[(&str, [f64; 6])] = &[
    ("CD4 T", [4.0, 4.0, 0.5, 0.3, 0.4, 0.3]),
    ("CD8 T", [4.0, 0.5, 4.0, 0.3, 0.6, 0.3]),
    ("B", [0.3, 0.4, 0.3, 4.5, 0.3, 0.4]),
    ("NK", [0.4, 0.3, 1.0, 0.3, 4.2, 0.3]),
    ("Monocyte", [0.3, 1.5, 0.3, 0.4, 0.3, 4.8]),
];

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

    /// Uniform integer in `0..n`; 0 when `n` is 0.
    fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        (self.next_f64() * n as f64) as usize % n
    }
}

fn cell(rng: &mut SimpleRng, means: &[f64; 6]) -> String {
    means
        .iter()
        .map(|&m| format!("{:.4}", rng.gauss(m, 0.6).max(0.0)))
        .collect::<Vec<_>>()
        .join(",")
}

fn gzip_to(path: &Path, text: &str) {
    let file = File::create(path).expect("Failed to create output file");
    let mut enc = GzEncoder::new(file, Compression::default());
    enc.write_all(text.as_bytes()).expect("Failed to write gzip data");
    enc.finish().expect("Failed to finish gzip stream");
}

fn main() {
    let args = Args::parse();
    std::fs::create_dir_all(&args.out_dir).expect("Failed to create output directory");
    let mut rng = SimpleRng::new(args.seed);

    // Training matrix (gzip) and labels (plain); a few labels are left missing.
    let mut matrix = String::new();
    let mut labels = String::new();
    for (name, means) in POPULATIONS {
        for _ in 0..args.cells {
            matrix.push_str(&cell(&mut rng, means));
            matrix.push('\n');
            if rng.next_f64() < 0.01 {
                labels.push_str("NA\n");
            } else {
                labels.push_str(name);
                labels.push('\n');
            }
        }
    }
    gzip_to(&args.out_dir.join("train_matrix.csv.gz"), &matrix);
    std::fs::write(args.out_dir.join("train_labels.csv"), labels).expect("Failed to write labels");

    // Test archive: one headerless matrix per sample.
    let archive_path = args.out_dir.join("test_matrices.tar.gz");
    let file = File::create(&archive_path).expect("Failed to create test archive");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let mut total = 0;
    for i in 0..args.samples {
        let n_cells = 100 + rng.below(200);
        let mut text = String::new();
        for _ in 0..n_cells {
            let (_, means) = &POPULATIONS[rng.below(POPULATIONS.len())];
            text.push_str(&cell(&mut rng, means));
            text.push('\n');
        }
        let mut header = tar::Header::new_gnu();
        header.set_size(text.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, format!("sample_{}.csv", i + 1), text.as_bytes())
            .expect("Failed to append test sample");
        total += n_cells;
    }
    builder
        .into_inner()
        .and_then(|enc| enc.finish())
        .expect("Failed to finish test archive");

    println!(
        "Wrote {} training cells and {} test samples ({total} cells) to {}",
        POPULATIONS.len() * args.cells,
        args.samples,
        args.out_dir.display()
    );
}
