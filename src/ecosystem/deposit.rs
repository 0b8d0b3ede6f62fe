use super::field::GrowthMap;
use super::organism::{Organism, OrganismKind};
use crate::rng::RandomSource;
use std::f32::consts::TAU;

/// Organisms at or below this energy leave nothing behind.
pub(crate) const DEPOSIT_FLOOR: f32 = 20.0;

/// Paints `org`'s residue onto the growth map in its kind's pattern.
pub(crate) fn residue(map: &mut GrowthMap, org: &Organism, rng: &mut impl RandomSource) {
    if org.energy <= DEPOSIT_FLOOR {
        return;
    }
    let vigor = (org.energy / org.traits().energy_cap).clamp(0.0, 1.0);
    match org.kind {
        OrganismKind::Spore => tendrils(map, org, 1, 40.0 * vigor, rng),
        OrganismKind::Mycelium => tendrils(map, org, 2, 55.0 * vigor, rng),
        OrganismKind::Slime => burst(map, org, 6, 45.0 * vigor, rng),
        OrganismKind::Worm => segments(map, org, 50.0 * vigor),
        OrganismKind::Beetle => ring(map, org, 40.0 * vigor),
        OrganismKind::Mite => {
            for _ in 0..2 {
                let x = org.x + rng.signed(2.5);
                let y = org.y + rng.signed(2.5);
                map.deposit(x, y, 30.0 * vigor, org.color);
            }
        }
        OrganismKind::Insect | OrganismKind::Fly => fading_trail(map, org, 35.0 * vigor),
        OrganismKind::Apex => apex_burst(map, org, 120.0 * vigor),
    }
}

fn heading(org: &Organism) -> f32 {
    if org.vx == 0.0 && org.vy == 0.0 {
        0.0
    } else {
        org.vy.atan2(org.vx)
    }
}

fn tendrils(map: &mut GrowthMap, org: &Organism, count: usize, amount: f32, rng: &mut impl RandomSource) {
    let len = 3.0 + org.gene.shape * 4.0;
    for _ in 0..count {
        let angle = heading(org) + std::f32::consts::PI + rng.signed(1.2);
        let (dy, dx) = angle.sin_cos();
        let steps = len as usize;
        for s in 1..=steps {
            let t = s as f32;
            map.deposit(org.x + dx * t, org.y + dy * t, amount * (1.0 - t / (len + 1.0)), org.color);
        }
    }
}

fn burst(map: &mut GrowthMap, org: &Organism, rays: usize, amount: f32, rng: &mut impl RandomSource) {
    map.deposit(org.x, org.y, amount, org.color);
    for k in 0..rays {
        let angle = k as f32 * TAU / rays as f32 + rng.signed(0.3);
        let (dy, dx) = angle.sin_cos();
        let reach = rng.range(2.0, 4.0);
        map.deposit(org.x + dx * reach, org.y + dy * reach, amount * 0.6, org.color);
    }
}

fn segments(map: &mut GrowthMap, org: &Organism, amount: f32) {
    map.deposit(org.x, org.y, amount, org.color);
    let n = org.trail.len().max(1) as f32;
    for (i, p) in org.trail.iter().enumerate().step_by(2) {
        map.deposit(p.x, p.y, amount * (1.0 - i as f32 / n), org.color);
    }
}

fn ring(map: &mut GrowthMap, org: &Organism, amount: f32) {
    let radius = org.size + 1.5;
    for k in 0..12 {
        let (dy, dx) = (k as f32 * TAU / 12.0).sin_cos();
        map.deposit(org.x + dx * radius, org.y + dy * radius, amount, org.color);
    }
}

fn fading_trail(map: &mut GrowthMap, org: &Organism, amount: f32) {
    map.deposit(org.x, org.y, amount, org.color);
    for p in &org.trail {
        map.deposit(p.x, p.y, amount * p.opacity, org.color);
    }
}

fn apex_burst(map: &mut GrowthMap, org: &Organism, amount: f32) {
    let r = 3i32;
    for dy in -r..=r {
        for dx in -r..=r {
            let d2 = dx * dx + dy * dy;
            if d2 > r * r {
                continue;
            }
            let falloff = 1.0 - (d2 as f32).sqrt() / (r as f32 + 1.0);
            let color = if (dx + dy) % 2 == 0 { org.color } else { org.accent };
            map.deposit(org.x + dx as f32, org.y + dy as f32, amount * falloff, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;

    fn organism(kind: OrganismKind, energy: f32) -> Organism {
        let mut o = Organism::spawn(1, kind, 50.0, 50.0, &mut seeded(4));
        o.energy = energy;
        o.vx = 1.0;
        for i in 0..12 {
            o.x = 50.0 - i as f32;
            o.record_trail();
        }
        o.x = 50.0;
        o
    }

    #[test]
    fn starving_organisms_leave_nothing() {
        let mut rng = seeded(1);
        for kind in OrganismKind::ALL {
            let mut map = GrowthMap::new(100, 100);
            residue(&mut map, &organism(kind, DEPOSIT_FLOOR), &mut rng);
            assert_eq!(map.len(), 0, "{}", kind.label());
        }
    }

    #[test]
    fn every_kind_marks_the_map() {
        let mut rng = seeded(1);
        for kind in OrganismKind::ALL {
            let mut map = GrowthMap::new(100, 100);
            residue(&mut map, &organism(kind, kind.traits().energy_cap), &mut rng);
            assert!(map.len() > 0, "{}", kind.label());
        }
    }

    #[test]
    fn apex_outshines_a_mite() {
        let mut rng = seeded(2);
        let mut apex = GrowthMap::new(100, 100);
        residue(&mut apex, &organism(OrganismKind::Apex, 220.0), &mut rng);
        let mut mite = GrowthMap::new(100, 100);
        residue(&mut mite, &organism(OrganismKind::Mite, 90.0), &mut rng);
        let peak = |m: &GrowthMap| m.intensities().fold(0.0f32, f32::max);
        assert!(peak(&apex) > peak(&mite));
        assert!(apex.len() > mite.len());
    }

    #[test]
    fn insect_trail_fades_with_age() {
        let mut map = GrowthMap::new(100, 100);
        let o = organism(OrganismKind::Insect, 150.0);
        residue(&mut map, &o, &mut seeded(5));
        // trail holds x = 39 (newest) .. 46 (oldest)
        let at = |x| map.get(x, 50).map_or(0.0, |c| c.intensity);
        assert!(at(39) > at(42));
        assert!(at(42) > at(46));
        assert!(at(46) > 0.0);
    }

    #[test]
    fn edge_deposits_are_clipped() {
        let mut map = GrowthMap::new(100, 100);
        let mut o = organism(OrganismKind::Beetle, 180.0);
        o.x = 0.0;
        o.y = 0.0;
        o.trail.clear();
        residue(&mut map, &o, &mut seeded(3));
        assert!(map.iter().all(|(x, y, _)| x < 100 && y < 100));
        assert!(map.len() < 12);
    }
}
