//! Body, mask and government doubles shared by the unit and property tests.

use std::cell::Cell;

use glam::DVec2;

use crate::body::{Body, Government, Mask, Projectile};

/// Faction double: two teams are enemies iff their ids differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Team(pub u8);

impl Government for Team {
    fn is_enemy(&self, other: &Self) -> bool {
        self.0 != other.0
    }
}

#[derive(Debug, Clone, Copy)]
enum MaskKind {
    /// Circular silhouette with exact ray and annulus math.
    Disk { radius: f64 },
    /// Reports a fixed collision fraction regardless of geometry.
    Fixed { fraction: f64 },
}

/// Test mask counting how many ray probes it receives.
#[derive(Debug)]
pub(crate) struct TestMask {
    kind: MaskKind,
    pub probes: Cell<usize>,
}

/// Smallest t in [0, 1) with |offset + t * direction| = radius, or 1.0.
fn ray_disk(offset: DVec2, direction: DVec2, radius: f64) -> f64 {
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        // The ray starts inside the disk.
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

impl Mask for TestMask {
    fn collide(&self, offset: DVec2, direction: DVec2, _facing: f64) -> f64 {
        self.probes.set(self.probes.get() + 1);
        match self.kind {
            MaskKind::Disk { radius } => ray_disk(offset, direction, radius),
            MaskKind::Fixed { fraction } => fraction,
        }
    }

    fn within_ring(&self, offset: DVec2, _facing: f64, inner: f64, outer: f64) -> bool {
        match self.kind {
            MaskKind::Disk { radius } => {
                let d = offset.length();
                d - radius <= outer && d + radius >= inner
            }
            MaskKind::Fixed { .. } => false,
        }
    }
}

/// Minimal body: a disk or scripted mask, an optional team, and a record of
/// the step the index last asked a mask for.
#[derive(Debug)]
pub(crate) struct TestBody {
    pub position: DVec2,
    pub radius: f64,
    pub facing: f64,
    pub government: Option<Team>,
    pub mask: TestMask,
    pub mask_step: Cell<u64>,
}

impl TestBody {
    pub fn disk(position: DVec2, radius: f64) -> Self {
        Self {
            position,
            radius,
            facing: 0.0,
            government: None,
            mask: TestMask {
                kind: MaskKind::Disk { radius },
                probes: Cell::new(0),
            },
            mask_step: Cell::new(0),
        }
    }

    /// Body whose mask always reports `fraction`, useful for scripting the
    /// narrow phase.
    pub fn fixed(position: DVec2, radius: f64, fraction: f64) -> Self {
        Self {
            position,
            radius,
            facing: 0.0,
            government: None,
            mask: TestMask {
                kind: MaskKind::Fixed { fraction },
                probes: Cell::new(0),
            },
            mask_step: Cell::new(0),
        }
    }

    pub fn with_team(mut self, team: u8) -> Self {
        self.government = Some(Team(team));
        self
    }

    /// Ray probes the mask has received so far.
    pub fn probes(&self) -> usize {
        self.mask.probes.get()
    }
}

impl Body for TestBody {
    type Gov = Team;
    type Mask = TestMask;

    fn position(&self) -> DVec2 {
        self.position
    }

    fn radius(&self) -> f64 {
        self.radius
    }

    fn facing(&self) -> f64 {
        self.facing
    }

    fn government(&self) -> Option<&Team> {
        self.government.as_ref()
    }

    fn mask(&self, step: u64) -> &TestMask {
        self.mask_step.set(step);
        &self.mask
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TestProjectile<'b> {
    pub position: DVec2,
    pub velocity: DVec2,
    pub government: Option<Team>,
    pub target: Option<&'b TestBody>,
}

impl Projectile for TestProjectile<'_> {
    type Body = TestBody;

    fn position(&self) -> DVec2 {
        self.position
    }

    fn velocity(&self) -> DVec2 {
        self.velocity
    }

    fn government(&self) -> Option<&Team> {
        self.government.as_ref()
    }

    fn target(&self) -> Option<&TestBody> {
        self.target
    }
}
