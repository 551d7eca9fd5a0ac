mod scale;

pub use self::scale::{scaled, scaled_i16, scaled_i8, unscaled, Factor};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type BoneId = i32;

/// Bone id of a joint without a parent, and of unmapped vertex links.
pub const ROOT_BONE_ID: BoneId = -1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub u: f32,
    pub v: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Normals {
    pub i: f32,
    pub j: f32,
    pub k: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneLink {
    pub id: BoneId,
    pub weight: f32,
}

/// Skin influences of a single vertex, one entry per slot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexBone {
    pub links: Vec<BoneLink>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vector,
    pub texture: Texture,
    pub normals: Normals,
    pub bone: VertexBone,
}

/// Triangle referencing vertices of its own mesh, 0-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Polygon {
    pub fn indices(&self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }

    /// Shift all indices by `base`, `None` if any leaves the `u32` range.
    pub fn offset(&self, base: u32) -> Option<Self> {
        Some(Polygon {
            a: self.a.checked_add(base)?,
            b: self.b.checked_add(base)?,
            c: self.c.checked_add(base)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub material: String,
    /// Number of bone influences per vertex, 0 to 4.
    pub link_count: u8,
    pub vertices: Vec<Vertex>,
    pub polygons: Vec<Polygon>,
}

impl Default for Mesh {
    fn default() -> Self {
        Mesh {
            name: "name".to_string(),
            material: "material".to_string(),
            link_count: 0,
            vertices: Vec::new(),
            polygons: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    pub parent_id: BoneId,
    pub position: Vector,
    pub rotation: Vector,
}

impl Bone {
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_BONE_ID
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
}

/// Per-model multipliers of the quantized streams.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub position: f32,
    pub texture: f32,
    pub normals: f32,
    pub unknown: f32,
}

impl Default for Scale {
    fn default() -> Self {
        Scale {
            position: 1.0,
            texture: 1.0,
            normals: 1.0,
            unknown: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub skeleton: Skeleton,
    pub scale: Scale,
}

impl Model {
    pub fn total_vertices(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }

    pub fn total_polygons(&self) -> usize {
        self.meshes.iter().map(|m| m.polygons.len()).sum()
    }

    /// Mesh names with collisions resolved, in mesh order.
    pub fn unique_names(&self) -> Vec<String> {
        unique_names(self.meshes.iter().map(|m| m.name.as_str()), |name| {
            name.to_string()
        })
    }

    /// Polygons of every mesh re-indexed into the model-wide vertex space,
    /// where the vertices of all meshes are concatenated in mesh order.
    ///
    /// Returns `None` when an index does not fit that space in 32 bits.
    pub fn global_polygons(&self) -> Option<Vec<Vec<Polygon>>> {
        let mut base = 0u32;
        let mut result = Vec::with_capacity(self.meshes.len());
        for mesh in &self.meshes {
            let polygons = mesh
                .polygons
                .iter()
                .map(|p| p.offset(base))
                .collect::<Option<Vec<_>>>()?;
            result.push(polygons);
            base = u32::try_from(mesh.vertices.len())
                .ok()
                .and_then(|count| base.checked_add(count))?;
        }
        Some(result)
    }
}

/// Resolve name collisions by suffixing `_2`, `_3`, ... to later duplicates.
///
/// `finish` maps a candidate to its final stored form (e.g. a truncated
/// fixed-width field); uniqueness is checked on that form.
pub fn unique_names<'a, I, F>(names: I, mut finish: F) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
    F: FnMut(&str) -> String,
{
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for name in names {
        let mut candidate = finish(name);
        let mut index = 2;
        while seen.contains(&candidate) {
            let suffix = format!("_{}", index);
            let raw = format!("{}{}", name, suffix);
            candidate = finish(&raw);
            if candidate != raw {
                // the suffix got cut off, shorten the base instead
                let head = finish(name);
                let keep = head.len().saturating_sub(suffix.len());
                let cut = (0..=keep).rev().find(|&i| head.is_char_boundary(i)).unwrap_or(0);
                candidate = finish(&format!("{}{}", &head[..cut], suffix));
            }
            index += 1;
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }
    result
}
