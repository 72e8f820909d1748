//! Encode/decode agreement for the engine's own layouts, over random payloads.

use rsrc_shared::font::{FONT_HEADER_SIZE, FONT_VERSION, GLYPH_PACKED_SIZE};
use rsrc_shared::mesh::{MESH_HEADER_SIZE, MESH_VERSION};
use rsrc_shared::prelude::*;
use rsrc_tests::{random_font, random_mesh, rng, sample_font};

const ROUNDS: u64 = 64;

#[test]
fn random_meshes_survive_a_round_trip() -> anyhow::Result<()> {
    let mut rng = rng(0x5eed_0001);
    for _ in 0..ROUNDS {
        let mesh = random_mesh(&mut rng);
        let bytes = encode_to_vec(&mesh)?;
        assert_eq!(bytes.len(), mesh.required_size());
        assert_eq!(bytes[0], MESH_VERSION);

        let budget = BudgetAllocator::new(usize::MAX);
        let back = Mesh::decode(&bytes, &(), &budget)?;
        assert_eq!(back, mesh);
        assert_eq!(budget.in_use(), back.heap_bytes());
        back.release(&budget);
        assert_eq!(budget.in_use(), 0);
    }
    Ok(())
}

#[test]
fn random_fonts_survive_a_round_trip() -> anyhow::Result<()> {
    let mut rng = rng(0x5eed_0002);
    for _ in 0..ROUNDS {
        let font = random_font(&mut rng);
        assert!(font.glyphs_in_bounds());
        let bytes = encode_to_vec(&font)?;
        assert_eq!(
            bytes.len(),
            FONT_HEADER_SIZE + font.nglyphs() * GLYPH_PACKED_SIZE + font.bitmap.len()
        );
        assert_eq!(bytes[0], FONT_VERSION);
        assert_eq!(Font::decode(&bytes, &(), &SystemAllocator)?, font);
    }
    Ok(())
}

/// A buffer one byte short always fails, and never with a panic.
#[test]
fn encoding_needs_exactly_required_size() -> anyhow::Result<()> {
    let mut rng = rng(0x5eed_0003);
    for _ in 0..ROUNDS {
        let mesh = random_mesh(&mut rng);
        let mut buf = vec![0u8; mesh.required_size()];
        mesh.encode(&mut buf)?;
        assert!(matches!(
            mesh.encode(&mut buf[..mesh.required_size() - 1]),
            Err(RsrcError::BufferTooSmall { .. })
        ));

        let font = random_font(&mut rng);
        let mut buf = vec![0u8; font.required_size()];
        font.encode(&mut buf)?;
        assert!(matches!(
            font.encode(&mut buf[..font.required_size() - 1]),
            Err(RsrcError::BufferTooSmall { .. })
        ));
    }
    Ok(())
}

#[test]
fn truncated_input_is_buffer_too_small() -> anyhow::Result<()> {
    let mut rng = rng(0x5eed_0004);
    for _ in 0..8 {
        let mesh = encode_to_vec(&random_mesh(&mut rng))?;
        for cut in [0, 1, MESH_HEADER_SIZE - 1, MESH_HEADER_SIZE, mesh.len() - 1] {
            assert!(
                matches!(
                    Mesh::decode(&mesh[..cut], &(), &SystemAllocator),
                    Err(RsrcError::BufferTooSmall { .. })
                ),
                "mesh cut at {cut} of {}",
                mesh.len()
            );
        }

        let font = encode_to_vec(&random_font(&mut rng))?;
        for cut in [0, FONT_HEADER_SIZE - 1, font.len() - 1] {
            assert!(
                matches!(
                    Font::decode(&font[..cut], &(), &SystemAllocator),
                    Err(RsrcError::BufferTooSmall { .. })
                ),
                "font cut at {cut} of {}",
                font.len()
            );
        }
    }
    Ok(())
}

#[test]
fn versions_are_gated() -> anyhow::Result<()> {
    let mut mesh = encode_to_vec(&Mesh::unit_cube())?;
    mesh[0] = FONT_VERSION;
    assert!(matches!(
        Mesh::decode(&mesh, &(), &SystemAllocator),
        Err(RsrcError::VersionMismatch {
            kind: ResourceKind::Mesh,
            found: 1,
            ..
        })
    ));

    let mut font = encode_to_vec(&sample_font())?;
    font[0] = MESH_VERSION;
    assert!(matches!(
        Font::decode(&font, &(), &SystemAllocator),
        Err(RsrcError::VersionMismatch {
            kind: ResourceKind::Font,
            found: 0,
            ..
        })
    ));
    Ok(())
}

/// The cube header: version, vertex count, index count, flags.
#[test]
fn cube_layout() -> anyhow::Result<()> {
    let bytes = encode_to_vec(&Mesh::unit_cube())?;
    assert_eq!(bytes.len(), MESH_HEADER_SIZE + 8 * 12 + 36 * 4);
    assert_eq!(bytes[0], 0);
    assert_eq!(&bytes[1..5], &8u32.to_ne_bytes());
    assert_eq!(&bytes[5..9], &36u32.to_ne_bytes());
    assert_eq!(bytes[9], 0);
    Ok(())
}

/// Font header stores the glyph count, then height before width.
#[test]
fn font_header_order() -> anyhow::Result<()> {
    let font = sample_font();
    let bytes = encode_to_vec(&font)?;
    assert_eq!(&bytes[1..3], &2u16.to_ne_bytes());
    assert_eq!(&bytes[3..5], &font.bmp_height.to_ne_bytes());
    assert_eq!(&bytes[5..7], &font.bmp_width.to_ne_bytes());
    assert_eq!(&bytes[7..11], &font.line_spacing.to_ne_bytes());
    Ok(())
}
