//! Versioned binary persistence for blend trees.
//!
//! The layout is little-endian and byte-packed:
//!
//! ```text
//! node_count: u8 | binding_count: u8 | exit_node_index: u8
//! per node:    kind tag u8, then the variant payload
//!   Clip:      clip id u8
//!   SyncClip:  clip id u8, leader clip id u8
//!   Blend:     weight f32 LE, input index u8 x2
//!   Blend1D:   weight f32 LE, input index u8 x3
//! per binding: node index u8, name length u8, name bytes (UTF-8)
//! ```
//!
//! Node indices are positions in the tree's all-nodes list, so a stream
//! may reference nodes that appear later in the table; decoding therefore
//! runs in two passes, instantiating every node before linking inputs.
//!
//! The leading format version byte is the container's concern: hosts embed
//! tree payloads inside larger scene files, so [`write_version`] and
//! [`check_version`] are standalone and [`BlendTree::write`]/
//! [`BlendTree::read`] handle only the tree body.

use std::io::{self, Read, Write};

use crate::clip::ClipBank;
use crate::error::Error;
use crate::ids::{ClipId, NodeId};
use crate::node::{NodeKind, NodeVariant};
use crate::tree::BlendTree;

/// Current revision of the tree layout. Bumped whenever the byte layout
/// changes; older streams are rejected rather than migrated.
pub const FORMAT_VERSION: u8 = 2;

/// Write the format version byte that must precede a tree body.
pub fn write_version(w: &mut dyn Write) -> Result<(), Error> {
    w.write_all(&[FORMAT_VERSION])?;
    Ok(())
}

/// Read and verify the format version byte preceding a tree body.
pub fn check_version(r: &mut dyn Read) -> Result<(), Error> {
    let found = read_u8(r)?;
    if found != FORMAT_VERSION {
        return Err(Error::VersionMismatch {
            found,
            expected: FORMAT_VERSION,
        });
    }
    Ok(())
}

fn read_exact(r: &mut dyn Read, buf: &mut [u8]) -> Result<(), Error> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::Io(e)
        }
    })
}

fn read_u8(r: &mut dyn Read) -> Result<u8, Error> {
    let mut buf = [0u8; 1];
    read_exact(r, &mut buf)?;
    Ok(buf[0])
}

fn read_f32(r: &mut dyn Read) -> Result<f32, Error> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

fn read_clip_id(r: &mut dyn Read, clips: &ClipBank) -> Result<ClipId, Error> {
    let clip = ClipId(read_u8(r)?);
    if !clips.contains(clip) {
        return Err(Error::UnknownClip { clip });
    }
    Ok(clip)
}

fn resolve(loaded: &[NodeId], index: u8) -> Result<NodeId, Error> {
    loaded
        .get(index as usize)
        .copied()
        .ok_or(Error::NodeIndexOutOfRange {
            index,
            count: loaded.len() as u8,
        })
}

impl BlendTree {
    /// Serialize the tree body (everything after the version byte).
    ///
    /// Fails without writing a partial node table when the tree cannot be
    /// represented: clip nodes must have clips attached, blend nodes their
    /// exact input count, and all counters must fit one byte.
    pub fn write(&self, w: &mut dyn Write) -> Result<(), Error> {
        if self.nodes.len() > u8::MAX as usize {
            return Err(Error::TooManyNodes {
                count: self.nodes.len(),
            });
        }
        if self.bindings.len() > u8::MAX as usize {
            return Err(Error::TooManyBindings {
                count: self.bindings.len(),
            });
        }
        self.validate_for_write()?;

        let exit_index = self
            .exit
            .and_then(|e| self.node_index(e))
            .unwrap_or(0) as u8;
        w.write_all(&[self.nodes.len() as u8, self.bindings.len() as u8, exit_index])?;

        for &id in &self.nodes {
            let node = self
                .arena
                .get(id)
                .ok_or(Error::DanglingNode { node: id })?;
            w.write_all(&[node.kind().tag()])?;
            match node.variant {
                NodeVariant::Clip { clip } => {
                    let clip = clip.ok_or(Error::MissingClip { node: id })?;
                    w.write_all(&[clip.0])?;
                }
                NodeVariant::SyncClip { clip, leader } => {
                    let clip = clip.ok_or(Error::MissingClip { node: id })?;
                    let leader = leader.ok_or(Error::MissingClip { node: id })?;
                    w.write_all(&[clip.0, leader.0])?;
                }
                NodeVariant::Blend { weight } | NodeVariant::Blend1D { weight } => {
                    w.write_all(&weight.to_le_bytes())?;
                    for &input in &node.inputs {
                        w.write_all(&[self.wire_index(input)?])?;
                    }
                }
            }
        }

        for (name, binding) in self.bindings.iter() {
            if name.len() > u8::MAX as usize {
                return Err(Error::NameTooLong {
                    name: name.to_string(),
                });
            }
            w.write_all(&[self.wire_index(binding.node)?, name.len() as u8])?;
            w.write_all(name.as_bytes())?;
        }
        Ok(())
    }

    /// Reject trees the layout cannot hold before any byte goes out.
    fn validate_for_write(&self) -> Result<(), Error> {
        for &id in &self.nodes {
            let node = self
                .arena
                .get(id)
                .ok_or(Error::DanglingNode { node: id })?;
            match node.variant {
                NodeVariant::Clip { clip } => {
                    if clip.is_none() {
                        return Err(Error::MissingClip { node: id });
                    }
                }
                NodeVariant::SyncClip { clip, leader } => {
                    if clip.is_none() || leader.is_none() {
                        return Err(Error::MissingClip { node: id });
                    }
                }
                NodeVariant::Blend { .. } | NodeVariant::Blend1D { .. } => {
                    let expected = node.required_inputs();
                    if node.inputs.len() != expected {
                        return Err(Error::BadArity {
                            node: id,
                            expected,
                            found: node.inputs.len(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn wire_index(&self, node: NodeId) -> Result<u8, Error> {
        self.node_index(node)
            .map(|i| i as u8)
            .ok_or(Error::DanglingNode { node })
    }

    /// Deserialize a tree body into this tree, appending to whatever it
    /// already holds (typically nothing). Node indices in the stream
    /// resolve against the nodes created by this call; clip ids must
    /// resolve against `clips`. The stream's exit node becomes the tree's
    /// exit unless the stream is empty.
    ///
    /// A failed read leaves already-instantiated nodes behind; callers
    /// treat the tree as poisoned and [`cleanup`](BlendTree::cleanup) it.
    pub fn read(&mut self, r: &mut dyn Read, clips: &ClipBank) -> Result<(), Error> {
        let node_count = read_u8(r)?;
        let binding_count = read_u8(r)?;
        let exit_index = read_u8(r)?;

        // Pass one: instantiate nodes, deferring input linkage because the
        // format allows forward references.
        let mut loaded: Vec<NodeId> = Vec::with_capacity(node_count as usize);
        let mut deferred: Vec<(NodeId, [Option<u8>; 3])> = Vec::new();
        for _ in 0..node_count {
            let tag = read_u8(r)?;
            let kind = NodeKind::from_tag(tag).ok_or(Error::UnknownNodeTag { tag })?;
            let id = match kind {
                NodeKind::Clip => {
                    let clip = read_clip_id(r, clips)?;
                    self.add_clip_node(Some(clip))
                }
                NodeKind::SyncClip => {
                    let clip = read_clip_id(r, clips)?;
                    let leader = read_clip_id(r, clips)?;
                    self.add_synced_clip_node(Some(clip), Some(leader))
                }
                NodeKind::Blend => {
                    let weight = read_f32(r)?;
                    let inputs = [Some(read_u8(r)?), Some(read_u8(r)?), None];
                    let id = self.add_blend_node();
                    self.set_blend_weight(id, weight);
                    deferred.push((id, inputs));
                    id
                }
                NodeKind::Blend1D => {
                    let weight = read_f32(r)?;
                    let inputs = [Some(read_u8(r)?), Some(read_u8(r)?), Some(read_u8(r)?)];
                    let id = self.add_blend1d_node();
                    self.set_blend_weight(id, weight);
                    deferred.push((id, inputs));
                    id
                }
            };
            loaded.push(id);
        }

        // Pass two: link inputs now that every index has a node.
        for (id, indices) in deferred {
            for index in indices.into_iter().flatten() {
                let input = resolve(&loaded, index)?;
                self.connect(id, input);
            }
        }

        if node_count > 0 {
            self.exit = Some(resolve(&loaded, exit_index)?);
        }

        for _ in 0..binding_count {
            let node = resolve(&loaded, read_u8(r)?)?;
            let len = read_u8(r)? as usize;
            let mut bytes = vec![0u8; len];
            read_exact(r, &mut bytes)?;
            let name = String::from_utf8(bytes).map_err(|_| Error::MalformedName)?;
            self.bind_value(&name, node)?;
        }
        Ok(())
    }
}
