//! `rigplay validate`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rig_anim::ClipBinding;

use crate::scene_doc::load_model;

#[derive(Args)]
pub struct ValidateArgs {
    /// Scene snapshot (.json, .yaml or .yml)
    pub scene: PathBuf,

    /// Also report unweighted skinned vertices and channels that target no node
    #[arg(short, long)]
    pub warnings: bool,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let model = load_model(&args.scene)?;

    model
        .validate()
        .with_context(|| format!("{} failed validation", args.scene.display()))?;

    if args.warnings {
        for mesh in model.meshes.iter().filter(|m| m.is_skinned()) {
            let unweighted = mesh
                .vertex_influences()
                .iter()
                .filter(|influences| influences.iter().map(|i| i.weight).sum::<f32>() <= 0.0)
                .count();
            if unweighted > 0 {
                println!(
                    "warning: {} of {} vertices of mesh '{}' carry no bone weight",
                    unweighted,
                    mesh.vertex_count(),
                    mesh.name
                );
            }
        }

        for clip in &model.clips {
            let binding = ClipBinding::new(&model.scene, clip);
            for name in binding.unbound_channels() {
                println!(
                    "warning: channel '{}' of clip '{}' targets no node",
                    name, clip.name
                );
            }
        }
    }

    println!("✓ {} is valid", args.scene.display());
    Ok(())
}
