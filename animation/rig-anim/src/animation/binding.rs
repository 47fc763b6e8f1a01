//! Precomputed node-to-channel mapping for a clip

use std::collections::HashMap;

use super::types::{AnimationChannel, AnimationClip};
use crate::scene::{NodeId, SceneGraph};

/// Maps every scene node to the channel that animates it, if any
///
/// The first channel carrying a given node name wins, and every node bearing
/// that name is driven by it. Built once per (scene, clip) pair so that the
/// per-frame walk never searches the channel list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipBinding {
    channels: Vec<Option<usize>>,
    unbound: Vec<String>,
}

impl ClipBinding {
    /// Bind the channels of `clip` to the nodes of `scene`
    pub fn new(scene: &SceneGraph, clip: &AnimationClip) -> Self {
        let mut by_name: HashMap<&str, usize> = HashMap::with_capacity(clip.channels.len());
        for (index, channel) in clip.channels.iter().enumerate() {
            by_name.entry(channel.node_name.as_str()).or_insert(index);
        }

        let channels: Vec<Option<usize>> = scene
            .nodes()
            .iter()
            .map(|node| by_name.get(node.name.as_str()).copied())
            .collect();

        let mut unbound: Vec<String> = Vec::new();
        for channel in &clip.channels {
            if scene.find(&channel.node_name).is_none() && !unbound.contains(&channel.node_name) {
                unbound.push(channel.node_name.clone());
            }
        }

        for name in &unbound {
            log::warn!(
                "Channel '{}' of clip '{}' targets no node in the scene",
                name,
                clip.name
            );
        }

        log::debug!(
            "Bound clip '{}': {} channels, {} animated nodes",
            clip.name,
            clip.channels.len(),
            channels.iter().flatten().count()
        );

        Self { channels, unbound }
    }

    /// Channel index driving the given node
    pub fn channel_index(&self, node: NodeId) -> Option<usize> {
        self.channels.get(node.index()).copied().flatten()
    }

    /// Channel driving the given node
    pub fn channel<'a>(&self, clip: &'a AnimationClip, node: NodeId) -> Option<&'a AnimationChannel> {
        self.channel_index(node)
            .and_then(|index| clip.channels.get(index))
    }

    /// Number of nodes the binding was built for
    pub fn node_count(&self) -> usize {
        self.channels.len()
    }

    /// Names of channels that matched no node
    pub fn unbound_channels(&self) -> &[String] {
        &self.unbound
    }
}
