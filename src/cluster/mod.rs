//! Perceptual clustering of candidate colors and palette assembly.
//!
//! Candidates are mapped into CIELAB, clustered with k-means (k-means++
//! initialization, Lloyd refinement), and the cluster centroids become the
//! palette after a perceptual dedupe walk. Role assignment picks brand roles
//! from the largest clusters and neutral roles from a light or dark preset,
//! then enforces WCAG AA contrast for the text role by shifting lightness.

pub mod lab;

use rand::Rng;
use tracing::debug;

use crate::config::ClustererConfig;
use crate::extract::CandidateColor;
use lab::{contrast_ratio, Lab, Rgb};

/// Centroid movement below this delta-E counts as converged.
const CONVERGENCE_EPSILON: f32 = 0.01;

/// One cluster: its centroid as hex plus the member colors assigned to it.
#[derive(Debug, Clone)]
pub struct ColorCluster {
    pub centroid: String,
    pub members: Vec<String>,
}

/// The seven named palette roles.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteRoles {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub surface: String,
    pub text: String,
    pub border: String,
}

/// Clustering output: the deduplicated palette and its role assignment.
#[derive(Debug, Clone)]
pub struct ClusteredPalette {
    /// Up to `max_palette` hex entries, mutually at least the dedupe
    /// threshold apart.
    pub palette: Vec<String>,
    pub clusters: Vec<ColorCluster>,
    pub roles: PaletteRoles,
    /// Whether the source colors lean perceptually light.
    pub is_light: bool,
}

/// Neutral role colors for one theme direction. The same presets seed both
/// the role assignment here and the per-variant theme builders.
pub(crate) struct NeutralPreset {
    pub(crate) background: Rgb,
    pub(crate) surface: Rgb,
    pub(crate) text: Rgb,
    pub(crate) border: Rgb,
}

pub(crate) const LIGHT_NEUTRALS: NeutralPreset = NeutralPreset {
    background: Rgb::new(0xff, 0xff, 0xff),
    surface: Rgb::new(0xf8, 0xf9, 0xfa),
    text: Rgb::new(0x20, 0x21, 0x24),
    border: Rgb::new(0xda, 0xdc, 0xe0),
};

pub(crate) const DARK_NEUTRALS: NeutralPreset = NeutralPreset {
    background: Rgb::new(0x20, 0x21, 0x24),
    surface: Rgb::new(0x29, 0x2a, 0x2d),
    text: Rgb::new(0xe8, 0xea, 0xed),
    border: Rgb::new(0x5f, 0x63, 0x68),
};

pub struct PerceptualClusterer {
    config: ClustererConfig,
}

impl PerceptualClusterer {
    pub fn new(config: ClustererConfig) -> Self {
        Self { config }
    }

    /// Cluster ranked candidates into an accessible palette.
    ///
    /// Returns `None` when there is nothing to cluster; the caller falls
    /// back to a default theme in that case.
    pub fn cluster(&self, candidates: &[CandidateColor]) -> Option<ClusteredPalette> {
        let points: Vec<(Lab, &CandidateColor)> = candidates
            .iter()
            .filter_map(|c| Rgb::from_hex(&c.hex).map(|rgb| (rgb.to_lab(), c)))
            .collect();
        if points.is_empty() {
            return None;
        }

        let k = self.config.max_palette.min(points.len());
        let mut centroids = init_centroids(&points, k);
        let mut assignments = vec![0usize; points.len()];

        for _ in 0..self.config.max_iterations {
            for (idx, (point, _)) in points.iter().enumerate() {
                assignments[idx] = nearest_centroid(*point, &centroids);
            }

            let mut moved = 0.0f32;
            for (ci, centroid) in centroids.iter_mut().enumerate() {
                let members: Vec<Lab> = points
                    .iter()
                    .zip(&assignments)
                    .filter(|(_, a)| **a == ci)
                    .map(|((lab, _), _)| *lab)
                    .collect();
                // An emptied cluster keeps its centroid; it can win points
                // back on a later iteration.
                if members.is_empty() {
                    continue;
                }
                let next = mean_of(&members);
                moved = moved.max(centroid.delta_e(next));
                *centroid = next;
            }
            if moved < CONVERGENCE_EPSILON {
                break;
            }
        }

        let clusters = assemble_clusters(&points, &assignments, &centroids);
        let palette = self.dedupe_walk(&clusters);
        let is_light = points.iter().filter(|(lab, _)| lab.l > 50.0).count() * 2 > points.len();
        let roles = self.assign_roles(&palette, is_light);

        Some(ClusteredPalette {
            palette,
            clusters,
            roles,
            is_light,
        })
    }

    /// Walk clusters largest-first, keeping a centroid only when it is at
    /// least the dedupe threshold away from everything already kept.
    fn dedupe_walk(&self, clusters: &[ColorCluster]) -> Vec<String> {
        let mut kept: Vec<(String, Lab)> = Vec::new();
        for cluster in clusters {
            if kept.len() >= self.config.max_palette {
                break;
            }
            let Some(rgb) = Rgb::from_hex(&cluster.centroid) else {
                continue;
            };
            let lab = rgb.to_lab();
            let distinct = kept
                .iter()
                .all(|(_, existing)| lab.delta_e(*existing) >= self.config.dedupe_delta_e);
            if distinct {
                kept.push((cluster.centroid.clone(), lab));
            } else {
                debug!(centroid = %cluster.centroid, "merging near-duplicate cluster");
            }
        }
        kept.into_iter().map(|(hex, _)| hex).collect()
    }

    fn assign_roles(&self, palette: &[String], is_light: bool) -> PaletteRoles {
        let preset = if is_light { &LIGHT_NEUTRALS } else { &DARK_NEUTRALS };
        let primary = palette
            .first()
            .cloned()
            .unwrap_or_else(|| preset.text.to_hex());
        let secondary = palette.get(1).cloned().unwrap_or_else(|| primary.clone());
        let accent = palette.get(2).cloned().unwrap_or_else(|| secondary.clone());

        let text = readable_text(
            preset.text,
            preset.background,
            preset.surface,
            self.config.contrast_floor,
            self.config.contrast_shift_cap,
        );

        PaletteRoles {
            primary,
            secondary,
            accent,
            background: preset.background.to_hex(),
            surface: preset.surface.to_hex(),
            text: text.to_hex(),
            border: preset.border.to_hex(),
        }
    }
}

// ---------------------------------------------------------------------------
// k-means internals
// ---------------------------------------------------------------------------

/// k-means++ seeding. The first centroid is sampled proportionally to
/// candidate weight so heavily-used colors anchor the clustering; the rest
/// are sampled proportionally to squared distance from the chosen set.
fn init_centroids(points: &[(Lab, &CandidateColor)], k: usize) -> Vec<Lab> {
    let mut rng = rand::thread_rng();
    let mut centroids: Vec<Lab> = Vec::with_capacity(k);

    let weights: Vec<f32> = points.iter().map(|(_, c)| c.weight.max(0.0)).collect();
    let first = weighted_index(&weights, &mut rng).unwrap_or(0);
    centroids.push(points[first].0);

    while centroids.len() < k {
        let distances: Vec<f32> = points
            .iter()
            .map(|(lab, _)| {
                let nearest = centroids
                    .iter()
                    .map(|c| lab.delta_e(*c))
                    .fold(f32::INFINITY, f32::min);
                nearest * nearest
            })
            .collect();
        match weighted_index(&distances, &mut rng) {
            Some(idx) => centroids.push(points[idx].0),
            // Every remaining point coincides with a centroid.
            None => break,
        }
    }
    centroids
}

/// Sample an index proportionally to its weight. `None` when all weights
/// are zero.
fn weighted_index(weights: &[f32], rng: &mut impl Rng) -> Option<usize> {
    let total: f32 = weights.iter().sum();
    if total <= f32::EPSILON {
        return None;
    }
    let target = rng.gen::<f32>() * total;
    let mut cumulative = 0.0f32;
    for (idx, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative >= target {
            return Some(idx);
        }
    }
    Some(weights.len() - 1)
}

fn nearest_centroid(point: Lab, centroids: &[Lab]) -> usize {
    let mut best = 0usize;
    let mut best_distance = f32::INFINITY;
    for (idx, centroid) in centroids.iter().enumerate() {
        let distance = point.delta_e(*centroid);
        if distance < best_distance {
            best_distance = distance;
            best = idx;
        }
    }
    best
}

fn mean_of(members: &[Lab]) -> Lab {
    let n = members.len() as f32;
    let (l, a, b) = members.iter().fold((0.0f32, 0.0f32, 0.0f32), |acc, lab| {
        (acc.0 + lab.l, acc.1 + lab.a, acc.2 + lab.b)
    });
    Lab {
        l: l / n,
        a: a / n,
        b: b / n,
    }
}

/// Materialize clusters and order them by member count, breaking ties by
/// accumulated weight and then hex for determinism.
fn assemble_clusters(
    points: &[(Lab, &CandidateColor)],
    assignments: &[usize],
    centroids: &[Lab],
) -> Vec<ColorCluster> {
    struct Accum {
        members: Vec<String>,
        weight: f32,
    }
    let mut accums: Vec<Accum> = centroids
        .iter()
        .map(|_| Accum {
            members: Vec::new(),
            weight: 0.0,
        })
        .collect();
    for ((_, candidate), assigned) in points.iter().zip(assignments) {
        accums[*assigned].members.push(candidate.hex.clone());
        accums[*assigned].weight += candidate.weight;
    }

    let mut clusters: Vec<(ColorCluster, f32)> = accums
        .into_iter()
        .zip(centroids)
        .filter(|(accum, _)| !accum.members.is_empty())
        .map(|(accum, centroid)| {
            (
                ColorCluster {
                    centroid: centroid.to_rgb().to_hex(),
                    members: accum.members,
                },
                accum.weight,
            )
        })
        .collect();
    clusters.sort_by(|(a, wa), (b, wb)| {
        b.members
            .len()
            .cmp(&a.members.len())
            .then(wb.total_cmp(wa))
            .then_with(|| a.centroid.cmp(&b.centroid))
    });
    clusters.into_iter().map(|(cluster, _)| cluster).collect()
}

// ---------------------------------------------------------------------------
// Contrast enforcement
// ---------------------------------------------------------------------------

/// Shift a text color's lightness until it clears the contrast floor against
/// both backdrops, one L unit per step. If the cap or the L range runs out
/// before the floor is met, the original color is returned unchanged.
pub(crate) fn readable_text(
    text: Rgb,
    background: Rgb,
    surface: Rgb,
    floor: f32,
    step_cap: usize,
) -> Rgb {
    let satisfied = |color: Rgb| {
        contrast_ratio(color, background) >= floor && contrast_ratio(color, surface) >= floor
    };
    if satisfied(text) {
        return text;
    }

    let darken = background.relative_luminance() > 0.5;
    let mut lab = text.to_lab();
    for _ in 0..step_cap {
        lab.l = if darken {
            (lab.l - 1.0).max(0.0)
        } else {
            (lab.l + 1.0).min(100.0)
        };
        let shifted = lab.to_rgb();
        if satisfied(shifted) {
            return shifted;
        }
        if lab.l <= 0.0 || lab.l >= 100.0 {
            break;
        }
    }
    debug!("lightness range exhausted before reaching contrast floor");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClustererConfig;

    fn candidate(hex: &str, count: u32, weight: f32) -> CandidateColor {
        CandidateColor {
            hex: hex.to_string(),
            count,
            weight,
            selectors: vec![".x".to_string()],
        }
    }

    #[test]
    fn near_duplicates_and_a_distinct_hue_form_two_clusters() {
        let config = ClustererConfig {
            max_palette: 2,
            ..ClustererConfig::default()
        };
        let clusterer = PerceptualClusterer::new(config);
        let candidates = vec![
            candidate("#ff0000", 1, 1.0),
            candidate("#fe0101", 1, 1.0),
            candidate("#00ff00", 1, 1.0),
        ];
        let clustered = clusterer.cluster(&candidates).unwrap();

        assert_eq!(clustered.clusters.len(), 2);
        let member_total: usize = clustered.clusters.iter().map(|c| c.members.len()).sum();
        assert_eq!(member_total, 3);
        // The reds end up together.
        let red_cluster = clustered
            .clusters
            .iter()
            .find(|c| c.members.contains(&"#ff0000".to_string()))
            .unwrap();
        assert!(red_cluster.members.contains(&"#fe0101".to_string()));
    }

    #[test]
    fn dedupe_collapses_centroids_inside_the_threshold() {
        let clusterer = PerceptualClusterer::new(ClustererConfig::default());
        let candidates = vec![
            candidate("#ff0000", 1, 1.0),
            candidate("#fe0101", 1, 1.0),
            candidate("#00ff00", 1, 1.0),
        ];
        let clustered = clusterer.cluster(&candidates).unwrap();
        // With k up to 8 the two reds may seed separate clusters, but the
        // palette walk merges anything closer than the delta-E threshold.
        assert_eq!(clustered.palette.len(), 2);
    }

    #[test]
    fn palette_never_exceeds_the_cap_and_stays_mutually_distinct() {
        let clusterer = PerceptualClusterer::new(ClustererConfig::default());
        let hexes = [
            "#ff0000", "#00ff00", "#0000ff", "#ffff00", "#00ffff", "#ff00ff", "#800000",
            "#008000", "#000080", "#808000", "#008080", "#800080",
        ];
        let candidates: Vec<_> = hexes.iter().map(|h| candidate(h, 1, 1.0)).collect();
        let clustered = clusterer.cluster(&candidates).unwrap();

        assert!(clustered.palette.len() <= 8);
        let labs: Vec<Lab> = clustered
            .palette
            .iter()
            .map(|h| Rgb::from_hex(h).unwrap().to_lab())
            .collect();
        for i in 0..labs.len() {
            for j in (i + 1)..labs.len() {
                assert!(
                    labs[i].delta_e(labs[j]) >= 30.0,
                    "palette entries {i} and {j} are too close"
                );
            }
        }
    }

    #[test]
    fn brand_roles_come_from_the_largest_clusters() {
        let clusterer = PerceptualClusterer::new(ClustererConfig::default());
        let candidates = vec![
            candidate("#1a73e8", 5, 15.0),
            candidate("#d93025", 2, 4.0),
            candidate("#188038", 1, 1.0),
        ];
        let clustered = clusterer.cluster(&candidates).unwrap();
        assert_eq!(clustered.roles.primary, clustered.palette[0]);
        if clustered.palette.len() > 1 {
            assert_eq!(clustered.roles.secondary, clustered.palette[1]);
        }
        if clustered.palette.len() > 2 {
            assert_eq!(clustered.roles.accent, clustered.palette[2]);
        }
    }

    #[test]
    fn a_single_candidate_fills_all_brand_roles() {
        let clusterer = PerceptualClusterer::new(ClustererConfig::default());
        let clustered = clusterer
            .cluster(&[candidate("#1a73e8", 3, 9.0)])
            .unwrap();
        assert_eq!(clustered.palette, vec!["#1a73e8".to_string()]);
        assert_eq!(clustered.roles.primary, "#1a73e8");
        assert_eq!(clustered.roles.secondary, "#1a73e8");
        assert_eq!(clustered.roles.accent, "#1a73e8");
    }

    #[test]
    fn dark_sources_pick_the_dark_neutral_preset() {
        let clusterer = PerceptualClusterer::new(ClustererConfig::default());
        let candidates = vec![
            candidate("#1a1b6e", 1, 1.0),
            candidate("#2d0a3d", 1, 1.0),
            candidate("#5c1f1f", 1, 1.0),
        ];
        let clustered = clusterer.cluster(&candidates).unwrap();
        assert!(!clustered.is_light);
        assert_eq!(clustered.roles.background, "#202124");
        assert_eq!(clustered.roles.text, "#e8eaed");
    }

    #[test]
    fn light_sources_pick_the_light_neutral_preset() {
        let clusterer = PerceptualClusterer::new(ClustererConfig::default());
        let candidates = vec![
            candidate("#8ab4f8", 1, 1.0),
            candidate("#f28b82", 1, 1.0),
            candidate("#81c995", 1, 1.0),
        ];
        let clustered = clusterer.cluster(&candidates).unwrap();
        assert!(clustered.is_light);
        assert_eq!(clustered.roles.background, "#ffffff");
    }

    #[test]
    fn empty_input_yields_none() {
        let clusterer = PerceptualClusterer::new(ClustererConfig::default());
        assert!(clusterer.cluster(&[]).is_none());
    }

    #[test]
    fn readable_text_lifts_mid_gray_over_the_aa_floor() {
        let gray = Rgb::new(0x77, 0x77, 0x77);
        let white = Rgb::new(0xff, 0xff, 0xff);
        let surface = Rgb::new(0xf8, 0xf9, 0xfa);
        assert!(contrast_ratio(gray, white) < 4.5);

        let adjusted = readable_text(gray, white, surface, 4.5, 50);
        assert_ne!(adjusted, gray);
        assert!(contrast_ratio(adjusted, white) >= 4.5);
        assert!(contrast_ratio(adjusted, surface) >= 4.5);
    }

    #[test]
    fn readable_text_keeps_the_original_when_the_floor_is_unreachable() {
        // No color can reach 25:1 against mid-gray; the original must come
        // back unchanged.
        let text = Rgb::new(0x88, 0x88, 0x88);
        let background = Rgb::new(0x80, 0x80, 0x80);
        let surface = Rgb::new(0x80, 0x80, 0x80);
        let adjusted = readable_text(text, background, surface, 25.0, 50);
        assert_eq!(adjusted, text);
    }

    #[test]
    fn readable_text_leaves_passing_colors_alone() {
        let text = Rgb::new(0x20, 0x21, 0x24);
        let white = Rgb::new(0xff, 0xff, 0xff);
        let surface = Rgb::new(0xf8, 0xf9, 0xfa);
        assert_eq!(readable_text(text, white, surface, 4.5, 50), text);
    }
}
