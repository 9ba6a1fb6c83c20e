//! Benchmark: per-tick rebuild and query cost at a combat-sized population.
//!
//! A busy system is a few hundred ships plus a few thousand projectiles;
//! 2000 bodies on a 64×64 grid of 256-unit cells is the stress shape. The
//! rebuild benchmark measures the full clear → add → finalize cycle the
//! simulation pays every tick.

use collision::{Body, CollisionIndex, Government, Mask};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::DVec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fleet(u8);

impl Government for Fleet {
    fn is_enemy(&self, other: &Self) -> bool {
        self.0 != other.0
    }
}

#[derive(Debug)]
struct Disk {
    radius: f64,
}

impl Mask for Disk {
    fn collide(&self, offset: DVec2, direction: DVec2, _facing: f64) -> f64 {
        let c = offset.length_squared() - self.radius * self.radius;
        if c <= 0.0 {
            return 0.0;
        }
        let a = direction.length_squared();
        if a == 0.0 {
            return 1.0;
        }
        let b = offset.dot(direction);
        let disc = b * b - a * c;
        if disc < 0.0 {
            return 1.0;
        }
        let t = (-b - disc.sqrt()) / a;
        if (0.0..1.0).contains(&t) {
            t
        } else {
            1.0
        }
    }

    fn within_ring(&self, offset: DVec2, _facing: f64, inner: f64, outer: f64) -> bool {
        let d = offset.length();
        d - self.radius <= outer && d + self.radius >= inner
    }
}

#[derive(Debug)]
struct Ship {
    position: DVec2,
    mask: Disk,
    fleet: Fleet,
}

impl Body for Ship {
    type Gov = Fleet;
    type Mask = Disk;

    fn position(&self) -> DVec2 {
        self.position
    }

    fn radius(&self) -> f64 {
        self.mask.radius
    }

    fn facing(&self) -> f64 {
        0.0
    }

    fn government(&self) -> Option<&Fleet> {
        Some(&self.fleet)
    }

    fn mask(&self, _step: u64) -> &Disk {
        &self.mask
    }
}

/// Deterministic scatter across the 16384-unit grid span; a cheap integer
/// hash keeps the benchmark reproducible.
fn fleet(count: usize) -> Vec<Ship> {
    (0..count)
        .map(|i| {
            let h = (i as i64).wrapping_mul(2_654_435_761);
            let x = ((h >> 8) & 0x3FFF) as f64;
            let y = ((h >> 22) & 0x3FFF) as f64;
            Ship {
                position: DVec2::new(x, y),
                mask: Disk {
                    radius: 12.0 + (i % 40) as f64,
                },
                fleet: Fleet((i % 3) as u8),
            }
        })
        .collect()
}

fn bench_rebuild(c: &mut Criterion) {
    let ships = fleet(2000);
    c.bench_function("rebuild_2000_bodies_64x64", |b| {
        let mut index = CollisionIndex::new(256, 64);
        b.iter(|| {
            index.clear(0);
            for ship in &ships {
                index.add(ship);
            }
            index.finalize();
            black_box(&index);
        });
    });
}

fn bench_line_query(c: &mut Criterion) {
    let ships = fleet(2000);
    let gov = Fleet(0);
    c.bench_function("line_query_cross_map", |b| {
        let mut index = CollisionIndex::new(256, 64);
        index.clear(0);
        for ship in &ships {
            index.add(ship);
        }
        index.finalize();
        b.iter(|| {
            black_box(index.line(
                DVec2::new(0.0, 0.0),
                DVec2::new(9000.0, 9000.0),
                None,
                Some(&gov),
                None,
            ));
        });
    });
}

fn bench_ring_query(c: &mut Criterion) {
    let ships = fleet(2000);
    c.bench_function("ring_query_500_radius", |b| {
        let mut index = CollisionIndex::new(256, 64);
        index.clear(0);
        for ship in &ships {
            index.add(ship);
        }
        index.finalize();
        b.iter(|| {
            black_box(index.ring(DVec2::new(8000.0, 8000.0), 100.0, 500.0).len());
        });
    });
}

criterion_group!(benches, bench_rebuild, bench_line_query, bench_ring_query);
criterion_main!(benches);
