//! `rigplay info`

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rig_anim::ClipBinding;

use crate::scene_doc::load_model;
use crate::utils::{add_table_row, create_summary_table, create_table, format_seconds};

#[derive(Args)]
pub struct InfoArgs {
    /// Scene snapshot (.json, .yaml or .yml)
    pub scene: PathBuf,
}

pub fn execute(args: InfoArgs) -> Result<()> {
    let model = load_model(&args.scene)?;
    let scene = &model.scene;

    let max_depth = scene
        .pre_order()
        .iter()
        .map(|&id| scene.depth(id))
        .max()
        .unwrap_or(0);
    let vertices: usize = model.meshes.iter().map(|m| m.vertex_count()).sum();
    let triangles: usize = model.meshes.iter().map(|m| m.triangle_count()).sum();

    println!("=== Scene: {} ===", args.scene.display());
    create_summary_table(&[
        ("Nodes", scene.len().to_string()),
        ("Hierarchy depth", max_depth.to_string()),
        ("Meshes", model.meshes.len().to_string()),
        ("Skinned meshes", model.skinned_mesh_count().to_string()),
        ("Bones", model.bone_count().to_string()),
        ("Vertices", vertices.to_string()),
        ("Triangles", triangles.to_string()),
        ("Clips", model.clips.len().to_string()),
    ])
    .printstd();

    if !model.meshes.is_empty() {
        println!("\n=== Meshes ===");
        let mut table = create_table(vec!["#", "Name", "Vertices", "Triangles", "Bones"]);
        for (i, mesh) in model.meshes.iter().enumerate() {
            add_table_row(
                &mut table,
                vec![
                    i.to_string(),
                    mesh.name.clone(),
                    mesh.vertex_count().to_string(),
                    mesh.triangle_count().to_string(),
                    mesh.bones.len().to_string(),
                ],
            );
        }
        table.printstd();
    }

    if !model.clips.is_empty() {
        println!("\n=== Clips ===");
        let mut table = create_table(vec![
            "#",
            "Name",
            "Ticks",
            "Ticks/s",
            "Length",
            "Channels",
            "Unbound",
        ]);
        for (i, clip) in model.clips.iter().enumerate() {
            let binding = ClipBinding::new(scene, clip);
            add_table_row(
                &mut table,
                vec![
                    i.to_string(),
                    clip.name.clone(),
                    format!("{:.1}", clip.duration),
                    format!("{:.1}", clip.effective_ticks_per_second()),
                    format_seconds(clip.duration_seconds()),
                    clip.channels.len().to_string(),
                    binding.unbound_channels().len().to_string(),
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}
