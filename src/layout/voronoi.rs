use std::collections::BTreeMap;

use serde::Serialize;

use super::{HitCell, LayoutError, Rect};

/// Offset applied to the k-th repeat of an exactly coincident center.
const NUDGE_EPSILON: f64 = 1e-6;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Voronoi cells over final bubble centers, one per bubble, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tessellation {
    pub bounds: Rect,
    /// Centers the cells were built from (after nudging duplicates).
    pub sites: Vec<(f64, f64)>,
    pub cells: Vec<HitCell>,
    /// Indices whose center was nudged off an earlier identical center.
    pub nudged: Vec<usize>,
}

impl Tessellation {
    /// Index of the cell containing `point`: the nearest site, ties going to
    /// the lowest index. `None` outside the clip rectangle.
    pub fn locate(&self, point: (f64, f64)) -> Option<usize> {
        if !self.bounds.contains(point) {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for (idx, site) in self.sites.iter().enumerate() {
            let d2 = distance2(*site, point);
            if best.is_none_or(|(_, best_d2)| d2 < best_d2) {
                best = Some((idx, d2));
            }
        }
        best.map(|(idx, _)| idx)
    }
}

impl HitCell {
    /// Boundary-inclusive containment; cells are convex.
    pub fn contains(&self, point: (f64, f64)) -> bool {
        let count = self.polygon.len();
        if count < 3 {
            return false;
        }
        let orientation = signed_area(&self.polygon).signum();
        for idx in 0..count {
            let a = self.polygon[idx];
            let b = self.polygon[(idx + 1) % count];
            let cross = (b.0 - a.0) * (point.1 - a.1) - (b.1 - a.1) * (point.0 - a.0);
            let tolerance = 1e-9 * ((b.0 - a.0).hypot(b.1 - a.1)).max(1.0);
            if cross * orientation < -tolerance {
                return false;
            }
        }
        true
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.polygon).abs()
    }
}

pub(super) fn build_tessellation(
    centers: &[(f64, f64)],
    keys: &[String],
    bounds: Rect,
) -> Result<Tessellation, LayoutError> {
    let (sites, nudged) = separate_duplicates(centers, keys)?;
    let bounds = sites.iter().fold(bounds, |rect, &site| rect.including(site));

    let mut cells = Vec::with_capacity(sites.len());
    for (idx, &site) in sites.iter().enumerate() {
        let polygon = cell_polygon(idx, site, &sites, bounds);
        cells.push(HitCell {
            index: idx,
            key: keys.get(idx).cloned().unwrap_or_default(),
            polygon,
        });
    }
    if !nudged.is_empty() {
        log::debug!("tessellation nudged {} coincident centers", nudged.len());
    }
    Ok(Tessellation {
        bounds,
        sites,
        cells,
        nudged,
    })
}

/// Every later copy of an identical center moves `k * epsilon` along a
/// golden-angle direction, k being how many copies came before it.
fn separate_duplicates(
    centers: &[(f64, f64)],
    keys: &[String],
) -> Result<(Vec<(f64, f64)>, Vec<usize>), LayoutError> {
    let key_of = |idx: usize| keys.get(idx).cloned().unwrap_or_else(|| idx.to_string());
    let mut occupied: BTreeMap<(u64, u64), usize> = BTreeMap::new();
    let mut repeats: BTreeMap<(u64, u64), usize> = BTreeMap::new();
    let mut sites = Vec::with_capacity(centers.len());
    let mut nudged = Vec::new();

    for (idx, &(x, y)) in centers.iter().enumerate() {
        let bits = (x.to_bits(), y.to_bits());
        if !occupied.contains_key(&bits) {
            occupied.insert(bits, idx);
            sites.push((x, y));
            continue;
        }
        let ordinal = repeats.entry(bits).or_insert(0);
        *ordinal += 1;
        let k = *ordinal as f64;
        let angle = k * GOLDEN_ANGLE;
        let moved = (
            x + NUDGE_EPSILON * k * angle.cos(),
            y + NUDGE_EPSILON * k * angle.sin(),
        );
        let moved_bits = (moved.0.to_bits(), moved.1.to_bits());
        // the nudge can vanish into float precision far from the origin
        if let Some(&other) = occupied.get(&moved_bits) {
            return Err(LayoutError::DegenerateGeometry {
                key: key_of(idx),
                other: key_of(other),
                x,
                y,
            });
        }
        occupied.insert(moved_bits, idx);
        sites.push(moved);
        nudged.push(idx);
    }
    Ok((sites, nudged))
}

/// The clip rectangle cut by the bisector of `site` and every other site,
/// nearest first, until no remaining site can reach the cell.
fn cell_polygon(idx: usize, site: (f64, f64), sites: &[(f64, f64)], bounds: Rect) -> Vec<(f64, f64)> {
    let mut others: Vec<(usize, f64)> = sites
        .iter()
        .enumerate()
        .filter(|(other, _)| *other != idx)
        .map(|(other, &point)| (other, distance2(site, point)))
        .collect();
    others.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut polygon = bounds.corners().to_vec();
    let mut reach2 = max_distance2(site, &polygon);
    for (other, d2) in others {
        if d2 > 4.0 * reach2 {
            break;
        }
        polygon = clip_half_plane(&polygon, site, sites[other]);
        if polygon.is_empty() {
            break;
        }
        reach2 = max_distance2(site, &polygon);
    }
    polygon
}

/// Keep the part of `polygon` closer to `site` than to `other`.
fn clip_half_plane(polygon: &[(f64, f64)], site: (f64, f64), other: (f64, f64)) -> Vec<(f64, f64)> {
    let (dx, dy) = (other.0 - site.0, other.1 - site.1);
    let (mx, my) = ((site.0 + other.0) / 2.0, (site.1 + other.1) / 2.0);
    let side = |p: (f64, f64)| (p.0 - mx) * dx + (p.1 - my) * dy;

    let mut out = Vec::with_capacity(polygon.len() + 1);
    let Some(&last) = polygon.last() else {
        return out;
    };
    let mut prev = last;
    let mut prev_side = side(prev);
    for &point in polygon {
        let point_side = side(point);
        if point_side <= 0.0 {
            if prev_side > 0.0 {
                out.push(intersect(prev, point, prev_side, point_side));
            }
            out.push(point);
        } else if prev_side <= 0.0 {
            out.push(intersect(prev, point, prev_side, point_side));
        }
        prev = point;
        prev_side = point_side;
    }
    out
}

fn intersect(a: (f64, f64), b: (f64, f64), side_a: f64, side_b: f64) -> (f64, f64) {
    let t = side_a / (side_a - side_b);
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

fn distance2(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (a.0 - b.0, a.1 - b.1);
    dx * dx + dy * dy
}

fn max_distance2(site: (f64, f64), polygon: &[(f64, f64)]) -> f64 {
    polygon
        .iter()
        .map(|&point| distance2(site, point))
        .fold(0.0, f64::max)
}

fn signed_area(polygon: &[(f64, f64)]) -> f64 {
    let count = polygon.len();
    let mut twice = 0.0;
    for idx in 0..count {
        let a = polygon[idx];
        let b = polygon[(idx + 1) % count];
        twice += a.0 * b.1 - b.0 * a.1;
    }
    twice / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(count: usize) -> Vec<String> {
        (0..count).map(|idx| format!("k{idx}")).collect()
    }

    fn bounds() -> Rect {
        Rect::new(-1.0, -1.0, 101.0, 81.0)
    }

    #[test]
    fn single_site_owns_the_whole_rectangle() {
        let tess = build_tessellation(&[(40.0, 30.0)], &keys(1), bounds()).unwrap();
        assert_eq!(tess.cells.len(), 1);
        assert!((tess.cells[0].area() - 102.0 * 82.0).abs() < 1e-9);
    }

    #[test]
    fn two_sites_split_at_the_bisector() {
        let tess = build_tessellation(&[(20.0, 40.0), (60.0, 40.0)], &keys(2), bounds()).unwrap();
        let left = &tess.cells[0];
        assert!(left.polygon.iter().all(|p| p.0 <= 40.0 + 1e-9));
        assert!((left.area() - 41.0 * 82.0).abs() < 1e-9);
        assert!(left.contains((40.0, 10.0)));
        assert!(!left.contains((41.0, 10.0)));
    }

    #[test]
    fn every_center_sits_in_its_own_cell_and_cells_tile_the_bounds() {
        let centers: Vec<(f64, f64)> = (0..40)
            .map(|i| {
                let i = i as f64;
                (((i * 37.0) % 97.0) + 1.5, ((i * 53.0) % 79.0) + 0.5)
            })
            .collect();
        let tess = build_tessellation(&centers, &keys(centers.len()), bounds()).unwrap();
        for (idx, cell) in tess.cells.iter().enumerate() {
            assert!(cell.contains(centers[idx]), "cell {idx} misses its center");
            assert_eq!(tess.locate(centers[idx]), Some(idx));
        }
        let total: f64 = tess.cells.iter().map(HitCell::area).sum();
        assert!((total - 102.0 * 82.0).abs() < 1e-6, "total {total}");
    }

    #[test]
    fn coincident_centers_are_nudged_deterministically() {
        let centers = [(10.0, 10.0), (10.0, 10.0), (10.0, 10.0), (50.0, 50.0)];
        let first = build_tessellation(&centers, &keys(4), bounds()).unwrap();
        let second = build_tessellation(&centers, &keys(4), bounds()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.nudged, vec![1, 2]);
        assert_eq!(first.sites[0], (10.0, 10.0));
        assert_ne!(first.sites[1], first.sites[0]);
        assert_ne!(first.sites[2], first.sites[1]);
        for cell in &first.cells {
            assert!(cell.polygon.len() >= 3);
        }
        for (idx, &site) in first.sites.iter().enumerate() {
            assert!(first.cells[idx].contains(site), "cell {idx} misses its site");
            assert_eq!(first.locate(site), Some(idx));
        }
    }

    #[test]
    fn unseparable_centers_are_reported() {
        let far = 1e15;
        let result = build_tessellation(&[(far, far), (far, far)], &keys(2), bounds());
        assert!(matches!(result, Err(LayoutError::DegenerateGeometry { .. })));
    }

    #[test]
    fn locate_ignores_points_outside_bounds() {
        let tess = build_tessellation(&[(20.0, 40.0), (60.0, 40.0)], &keys(2), bounds()).unwrap();
        assert_eq!(tess.locate((59.0, 0.0)), Some(1));
        assert_eq!(tess.locate((-5.0, 40.0)), None);
    }

    #[test]
    fn centers_outside_the_plot_grow_the_clip_rectangle() {
        let tess = build_tessellation(&[(-10.0, 40.0), (60.0, 40.0)], &keys(2), bounds()).unwrap();
        assert_eq!(tess.bounds.x0, -10.0);
        assert!(tess.cells[0].contains((-10.0, 40.0)));
    }
}
