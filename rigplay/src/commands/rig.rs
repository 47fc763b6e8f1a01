//! `rigplay rig`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rig_anim::{ActiveClip, AnimationClock, ClipBinding, Pose, extract_rig, propagate};

use crate::scene_doc::load_model;
use crate::utils::{add_table_row, create_table, format_vec3};

#[derive(Args)]
pub struct RigArgs {
    /// Scene snapshot (.json, .yaml or .yml)
    pub scene: PathBuf,

    /// Node to extract the skeleton below (defaults to the scene root)
    #[arg(short, long)]
    pub root: Option<String>,

    /// Playback time in seconds; wraps around the clip length
    #[arg(short, long, default_value = "0")]
    pub time: f64,

    /// Clip to sample (defaults to the bind pose)
    #[arg(short, long)]
    pub clip: Option<String>,

    /// Print the segments as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: RigArgs) -> Result<()> {
    let model = load_model(&args.scene)?;
    let scene = &model.scene;

    let pose = match args.clip.as_deref() {
        Some(name) => {
            let (_, clip) = model
                .clip(name)
                .with_context(|| format!("No clip named '{name}'"))?;
            let mut clock = AnimationClock::new(clip)?;
            let time = clock.tick(args.time.max(0.0)).animation_time;
            log::info!("Sampling clip '{}' at tick {:.3}", clip.name, time);

            let binding = ClipBinding::new(scene, clip);
            propagate(
                scene,
                &model.meshes,
                Some(ActiveClip::new(clip, &binding)),
                time,
            )?
        }
        None => Pose::bind_pose(scene, &model.meshes),
    };

    let root = match args.root {
        Some(root) => root,
        None => scene
            .node(scene.root())
            .map(|n| n.name.clone())
            .unwrap_or_default(),
    };
    let segments = extract_rig(scene, &pose, &root);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&segments)?);
        return Ok(());
    }

    if segments.is_empty() {
        println!("No bone segments below '{root}'");
        return Ok(());
    }

    let mut table = create_table(vec!["Bone", "From", "To", "Length"]);
    for segment in &segments {
        add_table_row(
            &mut table,
            vec![
                segment.name.clone(),
                format_vec3(segment.parent_position),
                format_vec3(segment.child_position),
                format!("{:.3}", segment.length()),
            ],
        );
    }
    table.printstd();
    Ok(())
}
