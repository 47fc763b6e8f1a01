//! `rigplay tree`

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rig_anim::{AnimatedModel, NodeId};

use crate::scene_doc::load_model;
use crate::utils::{NodeType, TreeNode, TreeOptions, render_tree};

#[derive(Args)]
pub struct TreeArgs {
    /// Scene snapshot (.json, .yaml or .yml)
    pub scene: PathBuf,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

pub fn execute(args: TreeArgs) -> Result<()> {
    let model = load_model(&args.scene)?;
    let root = build_tree(&model, NodeId::ROOT);

    let options = TreeOptions {
        max_depth: args.depth,
        no_color: args.no_color,
    };
    print!("{}", render_tree(&root, &options));
    Ok(())
}

/// Mirror the scene hierarchy below `id` as a [`TreeNode`]
pub fn build_tree(model: &AnimatedModel, id: NodeId) -> TreeNode {
    let bone_names: HashSet<&str> = model
        .meshes
        .iter()
        .flat_map(|m| m.bones.iter().map(|b| b.name.as_str()))
        .collect();
    let animated: HashSet<&str> = model
        .clips
        .iter()
        .flat_map(|c| c.channels.iter().map(|ch| ch.node_name.as_str()))
        .collect();

    build_subtree(model, id, &bone_names, &animated)
}

fn build_subtree(
    model: &AnimatedModel,
    id: NodeId,
    bone_names: &HashSet<&str>,
    animated: &HashSet<&str>,
) -> TreeNode {
    let Some(node) = model.scene.node(id) else {
        return TreeNode::new(format!("<missing node {}>", id.index()), NodeType::Group);
    };

    let node_type = if id == NodeId::ROOT {
        NodeType::Root
    } else if bone_names.contains(node.name.as_str()) {
        NodeType::Bone
    } else if !node.meshes.is_empty() {
        NodeType::Mesh
    } else {
        NodeType::Group
    };

    let mut tree = TreeNode::new(node.name.clone(), node_type);
    if animated.contains(node.name.as_str()) {
        tree = tree.with_tag("animated");
    }
    if !node.meshes.is_empty() {
        let meshes: Vec<String> = node.meshes.iter().map(ToString::to_string).collect();
        tree = tree.with_tag(format!("meshes: {}", meshes.join(", ")));
    }

    node.children.iter().fold(tree, |tree, &child| {
        tree.add_child(build_subtree(model, child, bone_names, animated))
    })
}
