// crates/tmedia-core/src/image/quantize.rs
//
// K-means color quantization: reduces an image's pixels to a small palette
// of `k` representative colors. Runs T independent random-seed trials and
// keeps the one minimizing total intra-cluster squared distance, since a
// single run of k-means is sensitive to its initial centroids.

use rand::seq::SliceRandom;
use rand::thread_rng;

use super::color::{color_distance_sq, Palette, Rgb24};

const TRIALS: usize = 5;
const MAX_ITERATIONS: usize = 20;

pub fn quantize_to_palette(pixels: &[Rgb24], k: usize) -> Palette {
    if pixels.is_empty() || k == 0 {
        return Palette::new(Vec::new());
    }
    let k = k.min(pixels.len());

    let mut best_centroids: Vec<Rgb24> = Vec::new();
    let mut best_cost = f64::MAX;

    for _ in 0..TRIALS {
        let (centroids, cost) = run_trial(pixels, k);
        if cost < best_cost {
            best_cost = cost;
            best_centroids = centroids;
        }
    }

    dedup_centroids(best_centroids)
}

fn run_trial(pixels: &[Rgb24], k: usize) -> (Vec<Rgb24>, f64) {
    let mut rng = thread_rng();
    let mut centroids: Vec<Rgb24> = pixels.choose_multiple(&mut rng, k).copied().collect();
    let mut assignments = vec![0usize; pixels.len()];

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, &p) in pixels.iter().enumerate() {
            let mut best = 0;
            let mut best_dist = i64::MAX;
            for (ci, &c) in centroids.iter().enumerate() {
                let d = color_distance_sq(p, c);
                if d < best_dist {
                    best_dist = d;
                    best = ci;
                }
            }
            if assignments[i] != best {
                assignments[i] = best;
                changed = true;
            }
        }

        let mut sums = vec![(0i64, 0i64, 0i64, 0i64); centroids.len()];
        for (i, &p) in pixels.iter().enumerate() {
            let c = assignments[i];
            sums[c].0 += p.r as i64;
            sums[c].1 += p.g as i64;
            sums[c].2 += p.b as i64;
            sums[c].3 += 1;
        }
        for (ci, &(sr, sg, sb, count)) in sums.iter().enumerate() {
            if count > 0 {
                centroids[ci] = Rgb24::new((sr / count) as u8, (sg / count) as u8, (sb / count) as u8);
            }
        }

        if !changed {
            break;
        }
    }

    let cost: i64 = pixels.iter().zip(assignments.iter()).map(|(&p, &c)| color_distance_sq(p, centroids[c])).sum();
    (centroids, cost as f64)
}

fn dedup_centroids(centroids: Vec<Rgb24>) -> Palette {
    let mut unique: Vec<Rgb24> = Vec::new();
    for c in centroids {
        if !unique.contains(&c) {
            unique.push(c);
        }
    }
    Palette::new(unique)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_separates_two_clusters() {
        let mut pixels = Vec::new();
        for _ in 0..20 {
            pixels.push(Rgb24::new(10, 10, 10));
        }
        for _ in 0..20 {
            pixels.push(Rgb24::new(240, 240, 240));
        }
        let palette = quantize_to_palette(&pixels, 2);
        assert_eq!(palette.len(), 2);
        let mut sorted: Vec<u8> = palette.colors().iter().map(|c| c.r).collect();
        sorted.sort();
        assert!(sorted[0] < 60);
        assert!(sorted[1] > 200);
    }

    #[test]
    fn quantize_empty_input_yields_empty_palette() {
        let palette = quantize_to_palette(&[], 4);
        assert!(palette.is_empty());
    }

    #[test]
    fn quantize_dedups_coincident_centroids() {
        let pixels = vec![Rgb24::new(5, 5, 5); 10];
        let palette = quantize_to_palette(&pixels, 4);
        assert_eq!(palette.len(), 1);
    }
}
