//! Resource tool binary.
//!
//! Usage:
//!   cargo run -p rsrc_tool -- pack-cube <out.mesh>
//!   cargo run -p rsrc_tool -- inspect <path> [--kind mesh|texture|font]
//!   cargo run -p rsrc_tool -- load [--config rsrc.json] [--root assets] <kind:name>...
//!
//! Results are printed to stdout as JSON. Set `RUST_LOG=debug` to trace
//! individual loads.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use rsrc_shared::config::RsrcConfig;
use rsrc_tool::commands::{parse_kind, parse_request};
use rsrc_tool::{inspect, load_all, pack_cube};
use tracing::info;

enum Command {
    PackCube(PathBuf),
    Inspect {
        path: PathBuf,
        kind: Option<String>,
    },
    Load {
        config: Option<PathBuf>,
        root: Option<String>,
        requests: Vec<String>,
    },
}

fn parse_args() -> anyhow::Result<Command> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(cmd) = args.first() else {
        bail!("missing command (pack-cube, inspect, load)");
    };
    let rest = &args[1..];
    match cmd.as_str() {
        "pack-cube" => {
            let out = rest.first().context("pack-cube needs an output path")?;
            Ok(Command::PackCube(PathBuf::from(out)))
        }
        "inspect" => {
            let mut path = None;
            let mut kind = None;
            let mut i = 0;
            while i < rest.len() {
                match rest[i].as_str() {
                    "--kind" if i + 1 < rest.len() => {
                        kind = Some(rest[i + 1].clone());
                        i += 2;
                    }
                    other => {
                        path = Some(PathBuf::from(other));
                        i += 1;
                    }
                }
            }
            let path = path.context("inspect needs a path")?;
            Ok(Command::Inspect { path, kind })
        }
        "load" => {
            let mut config = None;
            let mut root = None;
            let mut requests = Vec::new();
            let mut i = 0;
            while i < rest.len() {
                match rest[i].as_str() {
                    "--config" if i + 1 < rest.len() => {
                        config = Some(PathBuf::from(&rest[i + 1]));
                        i += 2;
                    }
                    "--root" if i + 1 < rest.len() => {
                        root = Some(rest[i + 1].clone());
                        i += 2;
                    }
                    other => {
                        requests.push(other.to_string());
                        i += 1;
                    }
                }
            }
            Ok(Command::Load {
                config,
                root,
                requests,
            })
        }
        other => bail!("unknown command '{other}'"),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match parse_args()? {
        Command::PackCube(out) => {
            let bytes = pack_cube(&out)?;
            println!("{}", serde_json::json!({ "path": out, "bytes": bytes }));
        }
        Command::Inspect { path, kind } => {
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let summary = inspect(&path, kind)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Load {
            config,
            root,
            requests,
        } => {
            let mut cfg = match config {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("read {}", path.display()))?;
                    RsrcConfig::from_json_str(&text)
                        .with_context(|| format!("parse {}", path.display()))?
                }
                None => RsrcConfig::default(),
            };
            if let Some(root) = root {
                cfg.asset_root = root;
            }
            let requests = requests
                .iter()
                .map(|r| parse_request(r))
                .collect::<anyhow::Result<Vec<_>>>()?;
            info!(root = %cfg.asset_root, count = requests.len(), "Loading resources");

            let loaded = load_all(&cfg, &requests)?;
            let mut report = serde_json::Map::new();
            for (name, summary) in loaded {
                report.insert(name, serde_json::to_value(summary)?);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
