use crate::rng::RandomSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Genus {
    Fungi,
    Arthropod,
    Ooze,
    Annelid,
    Predator,
}

impl Genus {
    pub(crate) const ALL: [Genus; 5] = [
        Genus::Fungi,
        Genus::Arthropod,
        Genus::Ooze,
        Genus::Annelid,
        Genus::Predator,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Genus::Fungi => "fungi",
            Genus::Arthropod => "arthropod",
            Genus::Ooze => "ooze",
            Genus::Annelid => "annelid",
            Genus::Predator => "predator",
        }
    }

    pub(crate) fn base_hue(self) -> f32 {
        match self {
            Genus::Fungi => 120.0,
            Genus::Arthropod => 25.0,
            Genus::Ooze => 170.0,
            Genus::Annelid => 5.0,
            Genus::Predator => 48.0,
        }
    }

    pub(crate) fn base_saturation(self) -> f32 {
        match self {
            Genus::Fungi => 0.75,
            Genus::Arthropod => 0.8,
            Genus::Ooze => 0.65,
            Genus::Annelid => 0.7,
            Genus::Predator => 0.9,
        }
    }
}

/// Lineage colour/shape signature. Never edited in place; children get a
/// fresh one from [`mutate_gene`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GeneSignature {
    pub(crate) hue: f32,
    pub(crate) saturation: f32,
    pub(crate) shape: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Mutation {
    pub(crate) gene: GeneSignature,
    pub(crate) hue_delta: f32,
    pub(crate) shape_delta: f32,
}

const BASE_HUE_SPREAD: f32 = 18.0;
const BASE_SAT_SPREAD: f32 = 0.05;
const MUTATE_HUE: f32 = 12.0;
const MUTATE_SAT: f32 = 0.04;
const MUTATE_SHAPE: f32 = 0.12;

pub(crate) fn wrap_hue(value: f32) -> f32 {
    let h = value.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negatives
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

pub(crate) fn create_base_gene(genus: Genus, rng: &mut impl RandomSource) -> GeneSignature {
    GeneSignature {
        hue: wrap_hue(genus.base_hue() + rng.signed(BASE_HUE_SPREAD)),
        saturation: clamp01(genus.base_saturation() + rng.signed(BASE_SAT_SPREAD)),
        shape: clamp01(rng.unit()),
    }
}

pub(crate) fn mutate_gene(
    parent: &GeneSignature,
    intensity: f32,
    rng: &mut impl RandomSource,
) -> Mutation {
    let hue_delta = rng.signed(MUTATE_HUE * intensity);
    let shape_delta = rng.signed(MUTATE_SHAPE * intensity);
    let sat_delta = rng.signed(MUTATE_SAT * intensity);
    Mutation {
        gene: GeneSignature {
            hue: wrap_hue(parent.hue + hue_delta),
            saturation: clamp01(parent.saturation + sat_delta),
            shape: clamp01(parent.shape + shape_delta),
        },
        hue_delta: hue_delta.abs(),
        shape_delta: shape_delta.abs(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub(crate) fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `#rrggbb` only; anything else is `None` so callers can skip the paint.
    pub(crate) fn from_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#')?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(byte(0)?, byte(2)?, byte(4)?))
    }

    pub(crate) fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub(crate) fn scale(self, k: f32) -> Rgb {
        let s = |c: u8| (c as f32 * k).round().clamp(0.0, 255.0) as u8;
        Rgb::new(s(self.r), s(self.g), s(self.b))
    }
}

/// HSL sextant conversion at the given lightness.
pub(crate) fn gene_to_rgb(gene: &GeneSignature, lightness: f32) -> Rgb {
    let l = clamp01(lightness);
    let s = clamp01(gene.saturation);
    let hue = wrap_hue(gene.hue);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((hue / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = if hue < 60.0 {
        (c, x, 0.0)
    } else if hue < 120.0 {
        (x, c, 0.0)
    } else if hue < 180.0 {
        (0.0, c, x)
    } else if hue < 240.0 {
        (0.0, x, c)
    } else if hue < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };
    let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(r), channel(g), channel(b))
}

pub(crate) const DEFAULT_LIGHTNESS: f32 = 0.55;

pub(crate) fn gene_to_color(gene: &GeneSignature, lightness: f32) -> String {
    gene_to_rgb(gene, lightness).to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{seeded, Scripted};

    fn hue_distance(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    fn is_hex(s: &str) -> bool {
        s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
    }

    #[test]
    fn base_gene_stays_near_genus_hue() {
        let mut rng = seeded(11);
        for genus in Genus::ALL {
            for _ in 0..200 {
                let g = create_base_gene(genus, &mut rng);
                assert!(hue_distance(g.hue, genus.base_hue()) <= BASE_HUE_SPREAD + 1e-3);
                assert!((0.0..360.0).contains(&g.hue));
                assert!((0.0..=1.0).contains(&g.saturation));
                assert!((0.0..=1.0).contains(&g.shape));
            }
        }
    }

    #[test]
    fn annelid_hue_wraps_below_zero() {
        // 5 - 18 would be negative without wrapping
        let g = create_base_gene(Genus::Annelid, &mut Scripted::constant(0.0));
        assert!((g.hue - 347.0).abs() < 1e-3);
    }

    #[test]
    fn genera_are_visually_distinct() {
        let mut rng = seeded(3);
        let fungi = create_base_gene(Genus::Fungi, &mut rng);
        let predator = create_base_gene(Genus::Predator, &mut rng);
        assert!(hue_distance(fungi.hue, predator.hue) > 10.0);
    }

    #[test]
    fn mutation_clamps_at_extremes() {
        for (sat, shape) in [(0.0, 0.0), (1.0, 1.0), (0.95, 0.95)] {
            let parent = GeneSignature {
                hue: 10.0,
                saturation: sat,
                shape,
            };
            for script in [0.0, 0.5, 0.999] {
                let m = mutate_gene(&parent, 1.0, &mut Scripted::constant(script));
                assert!((0.0..=1.0).contains(&m.gene.saturation));
                assert!((0.0..=1.0).contains(&m.gene.shape));
                assert!((0.0..360.0).contains(&m.gene.hue));
                assert!(m.hue_delta >= 0.0 && m.shape_delta >= 0.0);
            }
        }
    }

    #[test]
    fn mutation_deltas_scale_with_intensity() {
        let parent = GeneSignature {
            hue: 200.0,
            saturation: 0.5,
            shape: 0.5,
        };
        let m = mutate_gene(&parent, 0.5, &mut Scripted::constant(1.0));
        assert!((m.hue_delta - 6.0).abs() < 1e-4);
        assert!((m.shape_delta - 0.06).abs() < 1e-4);
        let still = mutate_gene(&parent, 0.0, &mut Scripted::constant(0.9));
        assert_eq!(still.gene, parent);
    }

    #[test]
    fn gene_to_color_matches_known_values() {
        let red = GeneSignature {
            hue: 0.0,
            saturation: 1.0,
            shape: 0.0,
        };
        assert_eq!(gene_to_color(&red, 0.5), "#ff0000");
        let green = GeneSignature { hue: 120.0, ..red };
        assert_eq!(gene_to_color(&green, 0.5), "#00ff00");
        let blue = GeneSignature { hue: 240.0, ..red };
        assert_eq!(gene_to_color(&blue, 0.5), "#0000ff");
        let grey = GeneSignature {
            hue: 77.0,
            saturation: 0.0,
            shape: 0.3,
        };
        assert_eq!(gene_to_color(&grey, 0.5), "#808080");
    }

    #[test]
    fn gene_to_color_is_total() {
        let mut h = 0.0;
        while h < 360.0 {
            for s in [0.0, 0.33, 1.0] {
                for l in [0.0, 0.55, 1.0] {
                    let gene = GeneSignature {
                        hue: h,
                        saturation: s,
                        shape: 0.5,
                    };
                    assert!(is_hex(&gene_to_color(&gene, l)), "h={h} s={s} l={l}");
                }
            }
            h += 7.5;
        }
    }

    #[test]
    fn hex_parsing_rejects_malformed_input() {
        assert_eq!(Rgb::from_hex("#0a0B0c"), Some(Rgb::new(10, 11, 12)));
        assert_eq!(Rgb::from_hex("0a0b0c"), None);
        assert_eq!(Rgb::from_hex("#0a0b0"), None);
        assert_eq!(Rgb::from_hex("#zz0000"), None);
        assert_eq!(Rgb::from_hex("#é0000"), None);
    }
}
