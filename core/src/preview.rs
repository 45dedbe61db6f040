use image::{Rgb, RgbImage};

use crate::blocks::{BlockId, BlockRegistry};
use crate::host::VoxelView;

const SKY: [u8; 3] = [18, 22, 34]; // columns with no solid voxel
const MISSING: [u8; 3] = [255, 0, 255]; // block without a material
const MIN_LIGHT: f32 = 0.55;

// Rectangle of columns to scan, with the vertical range to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceRegion {
    pub origin_x: i32,
    pub origin_z: i32,
    pub width: u32, // along x
    pub depth: u32, // along z
    pub y_min: i32,
    pub y_max: i32, // inclusive
}

// Topmost solid voxel of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceColumn {
    pub y: i32,
    pub block: BlockId,
}

// Top-down view of a region: one optional surface voxel per column.
#[derive(Debug, Clone)]
pub struct SurfaceMap {
    region: SurfaceRegion,
    columns: Vec<Option<SurfaceColumn>>, // row-major, z rows of x
}

// Scan every column of `region` from y_max down to its first solid voxel.
pub fn scan_surface<V>(view: &V, region: SurfaceRegion) -> SurfaceMap
where
    V: VoxelView + ?Sized,
{
    let mut columns = Vec::with_capacity(region.width as usize * region.depth as usize);
    for dz in 0..region.depth as i32 {
        for dx in 0..region.width as i32 {
            columns.push(top_of(view, &region, region.origin_x + dx, region.origin_z + dz));
        }
    }
    SurfaceMap { region, columns }
}

fn top_of<V>(view: &V, region: &SurfaceRegion, x: i32, z: i32) -> Option<SurfaceColumn>
where
    V: VoxelView + ?Sized,
{
    (region.y_min..=region.y_max).rev().find_map(|y| {
        let block = view.block_at([x, y, z]);
        (!block.is_empty()).then_some(SurfaceColumn { y, block })
    })
}

impl SurfaceMap {
    pub fn region(&self) -> SurfaceRegion {
        self.region
    }

    // Surface of world column (x, z); None outside the region or for open columns
    pub fn column(&self, x: i32, z: i32) -> Option<SurfaceColumn> {
        let dx = x.checked_sub(self.region.origin_x)?;
        let dz = z.checked_sub(self.region.origin_z)?;
        if dx < 0 || dz < 0 || dx >= self.region.width as i32 || dz >= self.region.depth as i32 {
            return None;
        }
        self.columns[dz as usize * self.region.width as usize + dx as usize]
    }

    // Scan again the columns in [x, x + width) x [z, z + depth) that fall
    // inside the region. Returns how many columns were scanned.
    pub fn rescan<V>(&mut self, view: &V, x: i32, z: i32, width: u32, depth: u32) -> usize
    where
        V: VoxelView + ?Sized,
    {
        let r = self.region;
        let x_end = (x as i64 + width as i64).min(r.origin_x as i64 + r.width as i64);
        let z_end = (z as i64 + depth as i64).min(r.origin_z as i64 + r.depth as i64);
        let (x0, z0) = (x.max(r.origin_x), z.max(r.origin_z));

        let mut scanned = 0;
        for cz in z0 as i64..z_end {
            for cx in x0 as i64..x_end {
                let (cx, cz) = (cx as i32, cz as i32);
                let index = (cz - r.origin_z) as usize * r.width as usize + (cx - r.origin_x) as usize;
                self.columns[index] = top_of(view, &r, cx, cz);
                scanned += 1;
            }
        }
        scanned
    }

    // Lowest and highest surface in the map
    pub fn height_range(&self) -> Option<(i32, i32)> {
        self.columns.iter().flatten().fold(None, |range, c| match range {
            None => Some((c.y, c.y)),
            Some((lo, hi)) => Some((lo.min(c.y), hi.max(c.y))),
        })
    }

    // Material color of each surface block, darker the lower it sits.
    // Pixel (px, py) shows column (origin_x + px, origin_z + py).
    pub fn to_image(&self, registry: &BlockRegistry) -> RgbImage {
        let (lo, hi) = self.height_range().unwrap_or((0, 0));
        let range = (hi - lo).max(1) as f32;

        let mut img = RgbImage::new(self.region.width, self.region.depth);
        for (i, column) in self.columns.iter().enumerate() {
            let px = i as u32 % self.region.width;
            let py = i as u32 / self.region.width;
            let rgb = match column {
                None => SKY,
                Some(c) => {
                    let base = registry
                        .material(c.block)
                        .map_or(MISSING, |m| m.rgb8());
                    let light = MIN_LIGHT + (1.0 - MIN_LIGHT) * (c.y - lo) as f32 / range;
                    base.map(|v| (v as f32 * light).round() as u8)
                }
            };
            img.put_pixel(px, py, Rgb(rgb));
        }
        img
    }
}
