//! Shared fixtures for the resource integration tests.

use std::io::Cursor;
use std::rc::Rc;

use image::{ImageFormat, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rsrc_shared::prelude::*;
use rsrc_shared::string_id::DEFAULT_STRING_SLOTS;

/// Installs a test-friendly subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Encoded unit cube.
pub fn cube_bytes() -> Vec<u8> {
    encode_to_vec(&Mesh::unit_cube()).expect("cube encodes")
}

/// A small two-glyph font over a 4x2 atlas.
pub fn sample_font() -> Font {
    Font {
        bmp_width: 4,
        bmp_height: 2,
        line_spacing: 12.5,
        glyphs: vec![
            Glyph {
                charcode: u64::from('A'),
                advance_x: 5.0,
                bearing_x: 0.5,
                bearing_y: 2.0,
                x: 0,
                y: 0,
                width: 2,
                height: 2,
            },
            Glyph {
                charcode: u64::from('B'),
                advance_x: 6.0,
                bearing_x: 0.0,
                bearing_y: 2.0,
                x: 2,
                y: 0,
                width: 2,
                height: 2,
            },
        ],
        bitmap: vec![0, 64, 128, 255, 255, 128, 64, 0],
    }
}

/// PNG of a `width` x `height` image whose top row is red and everything
/// below it is blue.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |_, y| {
        if y == 0 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("png encodes");
    out.into_inner()
}

/// Seeded generator for random payloads.
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

fn vec3s(rng: &mut StdRng, n: usize) -> Vec<[f32; 3]> {
    (0..n)
        .map(|_| {
            [
                rng.gen_range(-100.0..100.0),
                rng.gen_range(-100.0..100.0),
                rng.gen_range(-100.0..100.0),
            ]
        })
        .collect()
}

/// Random mesh with in-range indices and a random set of optional channels.
pub fn random_mesh(rng: &mut StdRng) -> Mesh {
    let nverts = rng.gen_range(1..64);
    let nindices = rng.gen_range(0..192);
    let positions = vec3s(rng, nverts);
    let indices = (0..nindices).map(|_| rng.gen_range(0..nverts as u32)).collect();
    let mut mesh = Mesh::new(positions, indices);
    if rng.gen_bool(0.5) {
        mesh = mesh.with_texcoords(vec3s(rng, nverts));
    }
    if rng.gen_bool(0.5) {
        mesh = mesh.with_normals(vec3s(rng, nverts));
    }
    mesh
}

/// Random font whose glyphs all fit the atlas.
pub fn random_font(rng: &mut StdRng) -> Font {
    let bmp_width: u16 = rng.gen_range(1..32);
    let bmp_height: u16 = rng.gen_range(1..32);
    let nglyphs = rng.gen_range(0..40);
    let glyphs = (0..nglyphs)
        .map(|i| {
            let x = rng.gen_range(0..bmp_width);
            let y = rng.gen_range(0..bmp_height);
            Glyph {
                charcode: 32 + i as u64,
                advance_x: rng.gen_range(0.0..20.0),
                bearing_x: rng.gen_range(-4.0..4.0),
                bearing_y: rng.gen_range(-4.0..16.0),
                x,
                y,
                width: rng.gen_range(0..=bmp_width - x),
                height: rng.gen_range(0..=bmp_height - y),
            }
        })
        .collect();
    let bitmap = (0..usize::from(bmp_width) * usize::from(bmp_height))
        .map(|_| rng.gen())
        .collect();
    Font {
        bmp_width,
        bmp_height,
        line_spacing: rng.gen_range(8.0..32.0),
        glyphs,
        bitmap,
    }
}

/// Arena size of the string table built by [`cache_over`].
pub const FIXTURE_ARENA_BYTES: usize = 256;

/// String table and cache over `files`, both charging `alloc`.
pub fn cache_over(
    files: impl FileProvider + 'static,
    capacities: Capacities,
    alloc: Rc<dyn Allocator>,
) -> anyhow::Result<(StringTable, ResourceCache)> {
    let strings = StringTable::new(DEFAULT_STRING_SLOTS, FIXTURE_ARENA_BYTES, alloc.clone())?;
    let cache = ResourceCache::new(capacities, Box::new(files), alloc)?;
    Ok((strings, cache))
}
