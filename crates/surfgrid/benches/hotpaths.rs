use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use surfgrid::grid::{bin_samples, HeightMap};
use surfgrid::nce::partition_fields;
use surfgrid::plane::{fit_plane, remove_form};
use surfgrid::sfma::simulate_sfma;
use surfgrid::tilt::estimate_tilt;
use surfgrid::{GridConfig, NceConfig, RawSample, SfmaConfig};

/// Tilted, slightly curved surface with nanometer noise and ~1 % dropouts,
/// sampled on the default 3.4 mm × 0.5 mm lattice.
fn make_surface_fixture(rows: usize, cols: usize, seed: u64) -> HeightMap {
    let mut rng = StdRng::seed_from_u64(seed);
    let pitch = [0.0034, 0.0005];
    let origin = [
        -0.5 * pitch[0] * cols as f64,
        -0.5 * pitch[1] * rows as f64,
    ];
    let mut map = HeightMap::new(rows, cols, origin, pitch);
    for r in 0..rows {
        for c in 0..cols {
            if rng.gen_range(0.0f64..1.0) < 0.01 {
                continue;
            }
            let (x, y) = (map.x_at(c), map.y_at(r));
            let z = 2e-6 * x - 1e-6 * y + 4e-5 * (x * x + y * y) + rng.gen_range(-2e-9f64..2e-9);
            map.set(r, c, Some(z));
        }
    }
    map
}

fn make_scan_samples(nx: i64, ny: i64, seed: u64) -> Vec<RawSample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = Vec::with_capacity((nx * ny) as usize);
    for iy in 0..ny {
        for ix in 0..nx {
            if rng.gen_range(0.0f64..1.0) < 0.02 {
                samples.push(RawSample::missing(ix, iy));
            } else {
                let h = 0.01 * ix as f64 - 0.02 * iy as f64 + rng.gen_range(-0.005f64..0.005);
                samples.push(RawSample::present(ix, iy, h));
            }
        }
    }
    samples
}

fn bench_binning(c: &mut Criterion) {
    let samples = make_scan_samples(600, 600, 7);
    let cfg = GridConfig::default();
    c.bench_function("bin_samples_600x600", |b| {
        b.iter(|| {
            let grid = bin_samples(black_box(&samples), black_box(&cfg))
                .expect("fixture has valid samples");
            black_box(grid.n_bins())
        })
    });
}

fn bench_plane_fit(c: &mut Criterion) {
    let map = make_surface_fixture(32, 16, 12345);
    let points = map.points();
    c.bench_function("fit_plane_512pts", |b| {
        b.iter(|| black_box(fit_plane(black_box(&points))))
    });

    let large = make_surface_fixture(400, 60, 99);
    c.bench_function("remove_form_400x60", |b| {
        b.iter(|| black_box(remove_form(black_box(&large)).map(|f| f.pv)))
    });
}

fn bench_sfma(c: &mut Criterion) {
    let map = make_surface_fixture(400, 60, 123);
    let cfg = SfmaConfig::default();
    c.bench_function("sfma_sweep_400x60", |b| {
        b.iter(|| {
            let out = simulate_sfma(black_box(&map), black_box(&cfg));
            black_box(out.windows_fitted)
        })
    });
}

fn bench_tilt(c: &mut Criterion) {
    let map = make_surface_fixture(400, 60, 321);
    c.bench_function("tilt_400x60", |b| {
        b.iter(|| {
            let out = estimate_tilt(black_box(&map));
            black_box(out.magnitude.n_defined())
        })
    });
}

fn bench_nce(c: &mut Criterion) {
    let points = make_surface_fixture(400, 60, 555).points();
    let cfg = NceConfig::default();
    c.bench_function("nce_partition_400x60", |b| {
        b.iter(|| {
            let out = partition_fields(black_box(&points), black_box(&cfg));
            black_box(out.fields_fitted)
        })
    });
}

criterion_group!(
    hotpaths,
    bench_binning,
    bench_plane_fit,
    bench_sfma,
    bench_tilt,
    bench_nce
);
criterion_main!(hotpaths);
