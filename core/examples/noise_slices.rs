use image::{GrayImage, Luma};
use std::path::Path;
use worldgen::{NoiseField, NoiseGenerator, OctaveConfig, TerrainParams};

// Sample a generator on the y = `level` plane and save it as grayscale,
// stretched to the observed min..max.
fn save_slice<N: NoiseGenerator>(generator: &N, size: u32, level: f64, filename: &str) {
    let half = size as f64 / 2.0;
    let mut data = vec![0.0f64; (size * size) as usize];
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for z in 0..size {
        for x in 0..size {
            let v = generator.get3(x as f64 - half, level, z as f64 - half);
            data[(z * size + x) as usize] = v;
            min = min.min(v);
            max = max.max(v);
        }
    }

    let mut img = GrayImage::new(size, size);
    for (i, &v) in data.iter().enumerate() {
        let norm = if (max - min).abs() < f64::EPSILON {
            0.5
        } else {
            (v - min) / (max - min)
        };
        let gray = (norm * 255.0).round() as u8;
        img.put_pixel(i as u32 % size, i as u32 / size, Luma([gray]));
    }
    img.save(Path::new(filename)).unwrap();
    println!("Saved {} (range {:.3}..{:.3})", filename, min, max);
}

fn main() {
    let size = 256;
    let field = NoiseField::new(12345);
    let params = TerrainParams::default();

    // Raw gradient noise, zoomed so individual cells are visible
    let zoomed = field.octaves(OctaveConfig::new(1, 1.0, 0.05));
    save_slice(&zoomed, size, 0.5, "noise3_slice.png");

    // The three fields the terrain is built from
    save_slice(&field.octaves(params.height), size, 0.0, "height_field.png");
    save_slice(&field.octaves(params.cave), size, -5.0, "cave_field.png");
    save_slice(&field.octaves(params.stone), size, -12.0, "stone_field.png");
}
