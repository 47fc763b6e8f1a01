//! `rigplay play`

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use rig_anim::{AnimationPlayer, FrameOrder, PlayerConfig};

use crate::scene_doc::load_model;
use crate::utils::{add_table_row, create_progress_bar, create_table, format_vec3};

/// Frame ordering as exposed on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    /// Skin with this frame's bone transforms
    #[default]
    Current,
    /// Skin with the previous frame's bone transforms
    Lagged,
}

impl From<OrderArg> for FrameOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Current => FrameOrder::PropagateThenDeform,
            OrderArg::Lagged => FrameOrder::DeformThenPropagate,
        }
    }
}

#[derive(Args)]
pub struct PlayArgs {
    /// Scene snapshot (.json, .yaml or .yml)
    pub scene: PathBuf,

    /// Frames per second
    #[arg(long, default_value = "60")]
    pub fps: f64,

    /// Wall time to simulate, in seconds
    #[arg(short, long, default_value = "2")]
    pub seconds: f64,

    /// Clip to play (defaults to the first one)
    #[arg(short, long)]
    pub clip: Option<String>,

    /// Ordering of hierarchy propagation and skinning
    #[arg(long, value_enum, default_value_t = OrderArg::Current)]
    pub order: OrderArg,

    /// Start this many seconds into the clip
    #[arg(long, default_value = "0")]
    pub offset: f64,

    /// Playback speed multiplier
    #[arg(long, default_value = "1")]
    pub speed: f64,
}

pub fn execute(args: PlayArgs, quiet: bool) -> Result<()> {
    if !(args.fps.is_finite() && args.fps > 0.0) {
        bail!("--fps must be positive, got {}", args.fps);
    }
    if !(args.seconds.is_finite() && args.seconds >= 0.0) {
        bail!("--seconds must be non-negative, got {}", args.seconds);
    }

    let model = load_model(&args.scene)?;
    model
        .validate()
        .with_context(|| format!("{} failed validation", args.scene.display()))?;

    let config = PlayerConfig {
        order: args.order.into(),
        start_offset_seconds: args.offset,
        speed: args.speed,
        ..PlayerConfig::default()
    };
    let mut player = AnimationPlayer::new(model, config)?;
    if let Some(name) = args.clip.as_deref() {
        player.select_clip(name)?;
    }

    let clip_name = player
        .active_clip()
        .map_or_else(|| "<bind pose>".to_string(), |c| c.name.clone());
    let frames = (args.seconds * args.fps).ceil() as u64;
    let dt = 1.0 / args.fps;

    let pb = create_progress_bar(frames, &clip_name)?;
    if quiet {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let mut loops = Vec::new();
    for _ in 0..frames {
        let frame = player.advance(dt)?;
        if frame.looped {
            loops.push(frame.index);
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let frame = player.frame();
    println!("Clip:           {clip_name}");
    println!("Frames:         {}", frame.index);
    println!("Animation time: {:.3} ticks", frame.animation_time);
    if loops.is_empty() {
        println!("Loops:          none");
    } else {
        let at: Vec<String> = loops.iter().map(ToString::to_string).collect();
        println!("Loops:          {} (frames {})", loops.len(), at.join(", "));
    }

    let meshes = &player.model().meshes;
    if !meshes.is_empty() {
        let mut table = create_table(vec!["Mesh", "Kind", "Min", "Max"]);
        for (i, mesh) in meshes.iter().enumerate() {
            let label = if mesh.name.is_empty() {
                i.to_string()
            } else {
                mesh.name.clone()
            };

            let row = match frame.skinning.mesh(i) {
                Some(skinned) => {
                    let (min, max) = skinned.bounds().unzip();
                    vec![
                        label,
                        "skinned".to_string(),
                        min.map(format_vec3).unwrap_or_default(),
                        max.map(format_vec3).unwrap_or_default(),
                    ]
                }
                None => {
                    let model_matrix = frame.pose.mesh_transform(i).unwrap_or_default();
                    let (min, max) = mesh
                        .positions
                        .iter()
                        .map(|&p| model_matrix.transform_point3(p))
                        .fold(None, |acc: Option<(glam::Vec3, glam::Vec3)>, p| {
                            Some(acc.map_or((p, p), |(lo, hi)| (lo.min(p), hi.max(p))))
                        })
                        .unzip();
                    vec![
                        label,
                        "rigid".to_string(),
                        min.map(format_vec3).unwrap_or_default(),
                        max.map(format_vec3).unwrap_or_default(),
                    ]
                }
            };
            add_table_row(&mut table, row);
        }
        println!();
        table.printstd();
    }

    Ok(())
}
