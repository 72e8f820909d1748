//! Tool commands. Each returns data; printing is left to `main`.

use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context};
use rsrc_shared::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// What a decoded resource looks like, for humans.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Summary {
    Mesh {
        nverts: usize,
        nindices: usize,
        texcoords: bool,
        normals: bool,
        indices_in_bounds: bool,
    },
    Font {
        nglyphs: usize,
        bmp_width: u16,
        bmp_height: u16,
        line_spacing: f32,
        glyphs_in_bounds: bool,
    },
    Texture {
        width: u32,
        height: u32,
        channels: u8,
    },
}

impl Summary {
    pub fn of_mesh(m: &Mesh) -> Self {
        Summary::Mesh {
            nverts: m.nverts(),
            nindices: m.nindices(),
            texcoords: m.texcoords.is_some(),
            normals: m.normals.is_some(),
            indices_in_bounds: m.indices_in_bounds(),
        }
    }

    pub fn of_font(f: &Font) -> Self {
        Summary::Font {
            nglyphs: f.nglyphs(),
            bmp_width: f.bmp_width,
            bmp_height: f.bmp_height,
            line_spacing: f.line_spacing,
            glyphs_in_bounds: f.glyphs_in_bounds(),
        }
    }

    pub fn of_texture(t: &Texture) -> Self {
        Summary::Texture {
            width: t.width,
            height: t.height,
            channels: t.channels,
        }
    }

    fn of_ref(r: ResourceRef<'_>) -> Self {
        match r {
            ResourceRef::Mesh(m) => Self::of_mesh(m),
            ResourceRef::Texture(t) => Self::of_texture(t),
            ResourceRef::Font(f) => Self::of_font(f),
        }
    }
}

/// Guesses the kind from the file extension: `.mesh`, `.font`, anything
/// else is an image.
pub fn kind_for_path(path: &Path) -> ResourceKind {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mesh") => ResourceKind::Mesh,
        Some("font") => ResourceKind::Font,
        _ => ResourceKind::Texture,
    }
}

/// Parses `mesh`, `texture` or `font`.
pub fn parse_kind(s: &str) -> anyhow::Result<ResourceKind> {
    ResourceKind::ALL
        .into_iter()
        .find(|k| k.as_str() == s)
        .with_context(|| format!("unknown resource kind '{s}'"))
}

/// Parses a `kind:name` load request. Without a `kind:` prefix the kind is
/// taken from the name's extension.
pub fn parse_request(s: &str) -> anyhow::Result<(ResourceKind, String)> {
    match s.split_once(':') {
        Some((kind, name)) if !name.is_empty() => Ok((parse_kind(kind)?, name.to_string())),
        Some(_) => bail!("empty resource name in '{s}'"),
        None => Ok((kind_for_path(Path::new(s)), s.to_string())),
    }
}

/// Decodes `bytes` as `kind` and summarises the result.
pub fn summarize(bytes: &[u8], kind: ResourceKind, opts: &TextureOptions) -> anyhow::Result<Summary> {
    let alloc = SystemAllocator;
    let summary = match kind {
        ResourceKind::Mesh => Summary::of_mesh(&Mesh::decode(bytes, &(), &alloc)?),
        ResourceKind::Font => Summary::of_font(&Font::decode(bytes, &(), &alloc)?),
        ResourceKind::Texture => Summary::of_texture(&Texture::decode(bytes, opts, &alloc)?),
    };
    Ok(summary)
}

/// Reads and decodes one file.
pub fn inspect(path: &Path, kind: Option<ResourceKind>) -> anyhow::Result<Summary> {
    let kind = kind.unwrap_or_else(|| kind_for_path(path));
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    debug!(path = %path.display(), %kind, bytes = bytes.len(), "Inspecting");
    summarize(&bytes, kind, &TextureOptions::default())
        .with_context(|| format!("decode {} as {kind}", path.display()))
}

/// Writes the unit cube mesh to `out`, returning the number of bytes.
pub fn pack_cube(out: &Path) -> anyhow::Result<usize> {
    let bytes = encode_to_vec(&Mesh::unit_cube()).context("encode cube")?;
    std::fs::write(out, &bytes).with_context(|| format!("write {}", out.display()))?;
    info!(path = %out.display(), bytes = bytes.len(), "Packed cube mesh");
    Ok(bytes.len())
}

/// Loads every request through one cache rooted at `cfg.asset_root`, then
/// unloads them again. Fails on the first request that cannot be loaded.
pub fn load_all(
    cfg: &RsrcConfig,
    requests: &[(ResourceKind, String)],
) -> anyhow::Result<Vec<(String, Summary)>> {
    let alloc = Rc::new(BudgetAllocator::new(usize::MAX));
    let shared: Rc<dyn Allocator> = alloc.clone();
    let mut strings = StringTable::new(cfg.string_slots, cfg.arena_bytes, shared.clone())
        .context("create string table")?;
    let files = Box::new(DirProvider::new(&cfg.asset_root));
    let mut cache = ResourceCache::from_config(cfg, files, shared).context("create cache")?;

    let mut tokens = Vec::with_capacity(requests.len());
    let mut out = Vec::with_capacity(requests.len());
    for (kind, name) in requests {
        let token = cache
            .load_named(&mut strings, *kind, name)
            .with_context(|| format!("load {kind} '{name}'"))?;
        if let Some(r) = cache.get(&token) {
            out.push((name.clone(), Summary::of_ref(r)));
        }
        tokens.push(token);
    }
    info!(
        loaded = tokens.len(),
        bytes = alloc.in_use(),
        peak = alloc.peak(),
        "Resources resident"
    );

    for token in tokens {
        cache.unload(token).context("unload")?;
    }
    Ok(out)
}
