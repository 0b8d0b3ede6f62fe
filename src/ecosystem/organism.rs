use crate::genetics::{
    create_base_gene, gene_to_rgb, wrap_hue, GeneSignature, Genus, Rgb, DEFAULT_LIGHTNESS,
};
use crate::rng::RandomSource;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum OrganismKind {
    Spore,
    Mycelium,
    Insect,
    Slime,
    Beetle,
    Mite,
    Worm,
    Fly,
    Apex,
}

/// Fixed per-type behaviour table.
#[derive(Clone, Copy, Debug)]
pub(crate) struct KindTraits {
    pub(crate) genus: Genus,
    pub(crate) max_population: usize,
    pub(crate) energy_cap: f32,
    pub(crate) max_age: u32,
    pub(crate) jitter: f32,
    pub(crate) friction: f32,
    pub(crate) territory: f32,
    pub(crate) reproduction: f32,
    pub(crate) base_size: f32,
    pub(crate) strength: f32,
    pub(crate) energy_decay: f32,
    pub(crate) trail_len: usize,
}

#[allow(clippy::too_many_arguments)]
const fn traits(
    genus: Genus,
    max_population: usize,
    energy_cap: f32,
    max_age: u32,
    motion: (f32, f32),
    territory: f32,
    reproduction: f32,
    base_size: f32,
    strength: f32,
    trail_len: usize,
) -> KindTraits {
    KindTraits {
        genus,
        max_population,
        energy_cap,
        max_age,
        jitter: motion.0,
        friction: motion.1,
        territory,
        reproduction,
        base_size,
        strength,
        energy_decay: 0.08,
        trail_len,
    }
}

const SPORE: KindTraits = traits(Genus::Fungi, 60, 120.0, 1800, (0.05, 0.90), 0.6, 0.018, 1.0, 0.6, 0);
const MYCELIUM: KindTraits = traits(Genus::Fungi, 50, 140.0, 2400, (0.03, 0.92), 0.8, 0.015, 1.4, 0.8, 0);
const INSECT: KindTraits = traits(Genus::Arthropod, 40, 150.0, 1500, (0.45, 0.94), 1.0, 0.012, 1.6, 1.0, 8);
const SLIME: KindTraits = traits(Genus::Ooze, 45, 160.0, 2000, (0.12, 0.88), 1.2, 0.014, 2.0, 0.9, 0);
const BEETLE: KindTraits = traits(Genus::Arthropod, 25, 180.0, 2600, (0.20, 0.90), 1.5, 0.008, 2.4, 1.4, 0);
const MITE: KindTraits = traits(Genus::Arthropod, 70, 90.0, 1000, (0.60, 0.85), 0.4, 0.04, 0.8, 0.4, 0);
const WORM: KindTraits = traits(Genus::Annelid, 35, 150.0, 2200, (0.15, 0.93), 1.0, 0.01, 1.8, 0.9, 12);
const FLY: KindTraits = traits(Genus::Arthropod, 40, 110.0, 1200, (0.70, 0.96), 0.7, 0.02, 1.0, 0.7, 6);
const APEX: KindTraits = KindTraits {
    energy_decay: 0.25,
    ..traits(Genus::Predator, 2, 220.0, 3600, (0.25, 0.95), 3.0, 0.0, 3.5, 2.5, 10)
};

impl OrganismKind {
    pub(crate) const COUNT: usize = 9;

    pub(crate) const ALL: [OrganismKind; Self::COUNT] = [
        OrganismKind::Spore,
        OrganismKind::Mycelium,
        OrganismKind::Insect,
        OrganismKind::Slime,
        OrganismKind::Beetle,
        OrganismKind::Mite,
        OrganismKind::Worm,
        OrganismKind::Fly,
        OrganismKind::Apex,
    ];

    /// Everything that breeds; apex predators only arrive by spawn events.
    pub(crate) const BREEDERS: [OrganismKind; Self::COUNT - 1] = [
        OrganismKind::Spore,
        OrganismKind::Mycelium,
        OrganismKind::Insect,
        OrganismKind::Slime,
        OrganismKind::Beetle,
        OrganismKind::Mite,
        OrganismKind::Worm,
        OrganismKind::Fly,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            OrganismKind::Spore => "spore",
            OrganismKind::Mycelium => "mycelium",
            OrganismKind::Insect => "insect",
            OrganismKind::Slime => "slime",
            OrganismKind::Beetle => "beetle",
            OrganismKind::Mite => "mite",
            OrganismKind::Worm => "worm",
            OrganismKind::Fly => "fly",
            OrganismKind::Apex => "apex",
        }
    }

    pub(crate) fn traits(self) -> &'static KindTraits {
        match self {
            OrganismKind::Spore => &SPORE,
            OrganismKind::Mycelium => &MYCELIUM,
            OrganismKind::Insect => &INSECT,
            OrganismKind::Slime => &SLIME,
            OrganismKind::Beetle => &BEETLE,
            OrganismKind::Mite => &MITE,
            OrganismKind::Worm => &WORM,
            OrganismKind::Fly => &FLY,
            OrganismKind::Apex => &APEX,
        }
    }

    pub(crate) fn genus(self) -> Genus {
        self.traits().genus
    }

    pub(crate) fn is_apex(self) -> bool {
        self == OrganismKind::Apex
    }

    /// Who may eat whom, and how likely a single encounter is to end in a meal.
    pub(crate) fn predation_chance(self, prey: OrganismKind) -> Option<f32> {
        use OrganismKind::*;
        match (self, prey) {
            (Apex, p) if p != Apex => Some(0.08),
            (Beetle, Mite | Insect) => Some(0.02),
            (Insect, Mite) => Some(0.015),
            _ => None,
        }
    }
}

/// A past position. `opacity` starts just under 1 and steps down each time a
/// newer point is recorded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TrailPoint {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) opacity: f32,
}

#[derive(Clone, Debug)]
pub(crate) struct Organism {
    pub(crate) id: u64,
    pub(crate) kind: OrganismKind,
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) vx: f32,
    pub(crate) vy: f32,
    pub(crate) size: f32,
    pub(crate) age: u32,
    pub(crate) energy: f32,
    pub(crate) gene: GeneSignature,
    pub(crate) color: Rgb,
    /// Complementary hue, used by the apex's two-tone residue.
    pub(crate) accent: Rgb,
    pub(crate) trail: VecDeque<TrailPoint>,
    /// Same-kind head count, refreshed once per frame.
    pub(crate) population: usize,
    /// Resource eaten over a lifetime; partly returned on death.
    pub(crate) consumed: f32,
}

impl Organism {
    pub(crate) fn new(id: u64, kind: OrganismKind, x: f32, y: f32, gene: GeneSignature, energy: f32) -> Self {
        let t = kind.traits();
        let accent_gene = GeneSignature {
            hue: wrap_hue(gene.hue + 180.0),
            ..gene
        };
        Self {
            id,
            kind,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            size: t.base_size * (0.75 + gene.shape * 0.5),
            age: 0,
            energy: energy.clamp(0.0, t.energy_cap),
            gene,
            color: gene_to_rgb(&gene, DEFAULT_LIGHTNESS),
            accent: gene_to_rgb(&accent_gene, DEFAULT_LIGHTNESS),
            trail: VecDeque::with_capacity(t.trail_len),
            population: 0,
            consumed: 0.0,
        }
    }

    /// A fresh organism of `kind` with a base gene for its genus.
    pub(crate) fn spawn(id: u64, kind: OrganismKind, x: f32, y: f32, rng: &mut impl RandomSource) -> Self {
        let gene = create_base_gene(kind.genus(), rng);
        let cap = kind.traits().energy_cap;
        let mut org = Self::new(id, kind, x, y, gene, cap * rng.range(0.5, 0.8));
        org.vx = rng.signed(0.5);
        org.vy = rng.signed(0.5);
        org
    }

    pub(crate) fn traits(&self) -> &'static KindTraits {
        self.kind.traits()
    }

    pub(crate) fn record_trail(&mut self) {
        let len = self.traits().trail_len;
        if len == 0 {
            return;
        }
        if self.trail.len() == len {
            self.trail.pop_back();
        }
        let step = 1.0 / (len as f32 + 1.0);
        for p in &mut self.trail {
            p.opacity = (p.opacity - step).max(0.0);
        }
        self.trail.push_front(TrailPoint {
            x: self.x,
            y: self.y,
            opacity: 1.0 - step,
        });
    }
}
