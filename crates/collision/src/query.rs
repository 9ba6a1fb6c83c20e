//! Line, circle and ring queries against the finalized bin table.

use std::sync::atomic::{AtomicBool, Ordering};

use glam::DVec2;
use log::warn;

use crate::body::{Body, Government, Mask, Projectile};
use crate::CollisionIndex;

/// Longest segment the scaled integer traversal accepts. Beyond this the
/// boundary cross-products could overflow 64 bits, so `line` clamps.
pub const MAX_VELOCITY: i64 = 450_000;

/// Length that overlong segments are clamped to.
pub const USED_MAX_VELOCITY: i64 = MAX_VELOCITY - 1;

/// Clamping is expected to be rare; warn the first time it happens and stay
/// silent afterwards.
static VELOCITY_WARNED: AtomicBool = AtomicBool::new(false);

/// Closest hit found so far during a line query.
struct Nearest<'a, B> {
    range: f64,
    body: Option<&'a B>,
}

impl<'a, B: Body> CollisionIndex<'a, B> {
    /// First body the segment `from..to` hits, or `None`.
    ///
    /// `closest_hit` is a fraction of the segment: on entry it caps the
    /// search, and on return it holds the winning fraction if a strictly
    /// closer hit was found. A body is eligible if it is `target`, if
    /// either government is absent, or if the two governments are enemies.
    pub fn line(
        &mut self,
        from: DVec2,
        to: DVec2,
        closest_hit: Option<&mut f64>,
        gov: Option<&B::Gov>,
        target: Option<&B>,
    ) -> Option<&'a B> {
        debug_assert!(self.finalized, "line() before finalize()");

        let x = from.x as i64;
        let y = from.y as i64;
        let end_x = to.x as i64;
        let end_y = to.y as i64;

        let mut gx = x >> self.shift;
        let mut gy = y >> self.shift;
        let end_gx = end_x >> self.shift;
        let end_gy = end_y >> self.shift;

        let mut nearest = Nearest {
            range: closest_hit.as_deref().copied().unwrap_or(1.0),
            body: None,
        };
        let delta = to - from;

        // Most segments are short: start and end in the same cell.
        if gx == end_gx && gy == end_gy {
            self.scan_cell(gx, gy, from, delta, gov, target, None, &mut nearest);
            return Self::resolve(nearest, closest_hit);
        }

        // Cap the segment so every product in the traversal below stays
        // within 64 bits.
        if delta.length() > MAX_VELOCITY as f64 {
            if !VELOCITY_WARNED.swap(true, Ordering::Relaxed) {
                warn!("collision segment longer than {MAX_VELOCITY}; clamping");
            }
            let capped = from + delta.normalize() * USED_MAX_VELOCITY as f64;
            return self.line(from, capped, closest_hit, gov, target);
        }

        let step_x: i64 = if x <= end_x { 1 } else { -1 };
        let step_y: i64 = if y <= end_y { 1 } else { -1 };
        let mx = (end_x - x).abs();
        let my = (end_y - y).abs();
        // A common unit in which both per-axis remainders divide exactly.
        let scale = mx.max(1) * my.max(1);
        let full_scale = self.cell_size * scale;

        // Remaining distance to the next cell boundary on each axis, in
        // `scale` units.
        let mut rx = scale * (x & self.cell_mask);
        let mut ry = scale * (y & self.cell_mask);
        if step_x > 0 {
            rx = full_scale - rx;
        }
        if step_y > 0 {
            ry = full_scale - ry;
        }

        let epoch = self.next_epoch();
        loop {
            self.scan_cell(gx, gy, from, delta, gov, target, Some(epoch), &mut nearest);
            if nearest.body.is_some() || (gx == end_gx && gy == end_gy) {
                break;
            }

            let diff = rx * my - ry * mx;
            if diff == 0 {
                // The segment crosses a cell corner exactly and moves
                // diagonally into the next cell on both axes.
                rx = full_scale;
                ry = full_scale;
                if gx == end_gx || gy == end_gy {
                    // Stepping diagonally would overshoot the end cell.
                    break;
                }
                gx += step_x;
                gy += step_y;
            } else if diff < 0 {
                // The vertical boundary is nearer. The division is exact:
                // rx stays a multiple of mx throughout.
                ry -= my * (rx / mx);
                rx = full_scale;
                gx += step_x;
            } else {
                rx -= mx * (ry / my);
                ry = full_scale;
                gy += step_y;
            }
        }

        Self::resolve(nearest, closest_hit)
    }

    /// Line query for a projectile: the segment runs from its position to
    /// `position + velocity`, filtered by its government, with its target
    /// always hittable.
    pub fn line_for<P>(
        &mut self,
        projectile: &P,
        closest_hit: Option<&mut f64>,
    ) -> Option<&'a B>
    where
        P: Projectile<Body = B>,
    {
        let from = projectile.position();
        let to = from + projectile.velocity();
        self.line(from, to, closest_hit, projectile.government(), projectile.target())
    }

    /// Every body whose silhouette overlaps the disk of `radius` at
    /// `center`. Equivalent to `ring(center, 0.0, radius)`.
    pub fn circle(&mut self, center: DVec2, radius: f64) -> &[&'a B] {
        self.ring(center, 0.0, radius)
    }

    /// Every body whose silhouette overlaps the annulus `inner..=outer`
    /// around `center`.
    ///
    /// The returned view lives in a buffer reused by the next `ring` or
    /// `circle` call on this index.
    pub fn ring(&mut self, center: DVec2, inner: f64, outer: f64) -> &[&'a B] {
        debug_assert!(self.finalized, "ring() before finalize()");

        let min_gx = ((center.x - outer) as i64) >> self.shift;
        let max_gx = ((center.x + outer) as i64) >> self.shift;
        let min_gy = ((center.y - outer) as i64) >> self.shift;
        let max_gy = ((center.y + outer) as i64) >> self.shift;

        let epoch = self.next_epoch();
        self.result.clear();
        for gy in min_gy..=max_gy {
            for gx in min_gx..=max_gx {
                let bin = self.bin(gx, gy);
                let start = self.counts[bin] as usize;
                let end = self.counts[bin + 1] as usize;
                for entry in &self.sorted[start..end] {
                    // Entries hashed here from another tile of the wrapped
                    // grid.
                    if entry.x != gx || entry.y != gy {
                        continue;
                    }
                    if self.seen[entry.index as usize] == epoch {
                        continue;
                    }
                    self.seen[entry.index as usize] = epoch;

                    let body = entry.body;
                    let offset = center - body.position();
                    let length = offset.length();
                    if (inner..=outer).contains(&length)
                        || body
                            .mask(self.step)
                            .within_ring(offset, body.facing(), inner, outer)
                    {
                        self.result.push(body);
                    }
                }
            }
        }
        &self.result
    }

    /// Scan one cell's bin, updating the closest hit in place. `epoch` is
    /// `None` on the single-cell fast path, where no body can recur.
    #[allow(clippy::too_many_arguments)]
    fn scan_cell(
        &mut self,
        gx: i64,
        gy: i64,
        from: DVec2,
        direction: DVec2,
        gov: Option<&B::Gov>,
        target: Option<&B>,
        epoch: Option<u32>,
        nearest: &mut Nearest<'a, B>,
    ) {
        let bin = self.bin(gx, gy);
        let start = self.counts[bin] as usize;
        let end = self.counts[bin + 1] as usize;
        for entry in &self.sorted[start..end] {
            if entry.x != gx || entry.y != gy {
                continue;
            }
            if let Some(epoch) = epoch {
                // Consider each body at most once per query.
                if self.seen[entry.index as usize] == epoch {
                    continue;
                }
                self.seen[entry.index as usize] = epoch;
            }

            let body = entry.body;
            let is_target = target.is_some_and(|t| std::ptr::eq(t, body));
            let eligible = is_target
                || match (gov, body.government()) {
                    (Some(ours), Some(theirs)) => ours.is_enemy(theirs),
                    _ => true,
                };
            if !eligible {
                continue;
            }

            let range = body
                .mask(self.step)
                .collide(from - body.position(), direction, body.facing());
            if range < nearest.range {
                nearest.range = range;
                nearest.body = Some(body);
            }
        }
    }

    /// Write the winning fraction back through `closest_hit`, never
    /// widening the caller's bound.
    fn resolve(nearest: Nearest<'a, B>, closest_hit: Option<&mut f64>) -> Option<&'a B> {
        if let Some(out) = closest_hit {
            if nearest.range < 1.0 {
                *out = nearest.range;
            }
        }
        nearest.body
    }
}
