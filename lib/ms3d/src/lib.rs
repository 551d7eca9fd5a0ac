//! Writer for the MilkShape 3D binary format (`.ms3d`).
//!
//! Every mesh becomes one group with a material of its own. Triangles carry
//! their own per-corner normals and texture coordinates, so the output has
//! no shared attribute buffer beyond positions.

use byteorder::{LittleEndian as E, WriteBytesExt};
use model::{Mesh, Model, Polygon, Vertex};
use std::io::{self, Write};

const SIGNATURE: &[u8; 10] = b"MS3D000000";
const VERSION: i32 = 4;
const NAME_LEN: usize = 32;
const PATH_LEN: usize = 128;

const AMBIENT: [f32; 4] = [0.2, 0.2, 0.2, 1.0];
const DIFFUSE: [f32; 4] = [0.8, 0.8, 0.8, 1.0];
const SPECULAR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const EMISSIVE: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

const FPS: f32 = 24.0;
const CURRENT_FRAME: f32 = 1.0;
const TOTAL_FRAMES: f32 = 30.0;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("name '{name}' does not fit {} bytes", NAME_LEN - 1)]
    NameTooLong { name: String },
    #[error("too many {what}: {count}")]
    CountOverflow { what: &'static str, count: usize },
    #[error("mesh '{mesh}' refers to missing vertex {index}")]
    InvalidIndex { mesh: String, index: u32 },
    #[error("bone '{bone}' refers to missing parent {parent}")]
    UnknownParent { bone: String, parent: i32 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What to do with names longer than the fixed field allows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NamePolicy {
    /// Cut at a character boundary to 31 bytes, keeping the null terminator.
    #[default]
    Truncate,
    Fail,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    pub names: NamePolicy,
}

/// Null-padded fixed-width name field.
pub fn fixed_name(name: &str, policy: NamePolicy) -> Result<[u8; NAME_LEN], Error> {
    let mut field = [0u8; NAME_LEN];
    let bytes = truncated(name).as_bytes();
    if bytes.len() < name.len() && policy == NamePolicy::Fail {
        return Err(Error::NameTooLong {
            name: name.to_string(),
        });
    }
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(field)
}

fn truncated(name: &str) -> &str {
    let max = NAME_LEN - 1;
    if name.len() <= max {
        return name;
    }
    let end = (0..=max).rev().find(|&i| name.is_char_boundary(i)).unwrap_or(0);
    &name[..end]
}

fn check_count(what: &'static str, count: usize, max: usize) -> Result<(), Error> {
    if count > max {
        Err(Error::CountOverflow { what, count })
    } else {
        Ok(())
    }
}

pub fn to_bytes(model: &Model, options: &Options) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    save(&mut buffer, model, options)?;
    Ok(buffer)
}

pub fn save<W: Write>(mut dest: W, model: &Model, options: &Options) -> Result<(), Error> {
    profiling::scope!("Encode MS3D");
    let num_vertices = model.total_vertices();
    let num_triangles = model.total_polygons();
    check_count("vertices", num_vertices, u16::MAX as usize)?;
    check_count("triangles", num_triangles, u16::MAX as usize)?;
    check_count("meshes", model.meshes.len(), i8::MAX as usize + 1)?;
    check_count("bones", model.skeleton.bones.len(), u16::MAX as usize)?;

    for mesh in &model.meshes {
        fixed_name(&mesh.name, options.names)?;
        for polygon in &mesh.polygons {
            triangle_corners(mesh, polygon)?;
        }
    }
    let names = model::unique_names(model.meshes.iter().map(|m| m.name.as_str()), |name| {
        truncated(name).to_string()
    });
    let global_polygons = model.global_polygons().ok_or(Error::CountOverflow {
        what: "vertices",
        count: num_vertices,
    })?;

    log::debug!(
        "Writing MS3D: {} vertices, {} triangles, {} groups",
        num_vertices,
        num_triangles,
        model.meshes.len()
    );

    dest.write_all(SIGNATURE)?;
    dest.write_i32::<E>(VERSION)?;

    dest.write_u16::<E>(num_vertices as u16)?;
    for vertex in model.meshes.iter().flat_map(|m| m.vertices.iter()) {
        let pos = vertex.position;
        dest.write_u8(0)?; // flags
        write_vec(&mut dest, [pos.x, pos.y, pos.z])?;
        dest.write_i8(-1)?; // bone id
        dest.write_u8(0xFF)?; // reference count
    }

    dest.write_u16::<E>(num_triangles as u16)?;
    for (group, (mesh, polygons)) in model.meshes.iter().zip(&global_polygons).enumerate() {
        for (local, global) in mesh.polygons.iter().zip(polygons) {
            dest.write_u16::<E>(0)?; // flags
            for index in global.indices() {
                dest.write_u16::<E>(index as u16)?;
            }
            let corners = triangle_corners(mesh, local)?;
            for v in corners.iter() {
                write_vec(&mut dest, [v.normals.i, v.normals.j, v.normals.k])?;
            }
            write_vec(&mut dest, corners.map(|v| v.texture.u))?;
            write_vec(&mut dest, corners.map(|v| v.texture.v))?;
            dest.write_u8(1)?; // smoothing group
            dest.write_u8(group as u8)?;
        }
    }

    dest.write_u16::<E>(model.meshes.len() as u16)?;
    let mut first_triangle = 0usize;
    for (index, (mesh, name)) in model.meshes.iter().zip(&names).enumerate() {
        dest.write_u8(0)?; // flags
        dest.write_all(&fixed_name(name, NamePolicy::Truncate)?)?;
        dest.write_u16::<E>(mesh.polygons.len() as u16)?;
        for triangle in first_triangle..first_triangle + mesh.polygons.len() {
            dest.write_u16::<E>(triangle as u16)?;
        }
        dest.write_i8(index as i8)?; // material
        first_triangle += mesh.polygons.len();
    }

    dest.write_u16::<E>(model.meshes.len() as u16)?;
    for mesh in &model.meshes {
        dest.write_all(&fixed_name(&mesh.material, options.names)?)?;
        for color in [AMBIENT, DIFFUSE, SPECULAR, EMISSIVE] {
            for c in color {
                dest.write_f32::<E>(c)?;
            }
        }
        dest.write_f32::<E>(0.0)?; // shininess
        dest.write_f32::<E>(1.0)?; // transparency
        dest.write_i8(1)?; // mode
        dest.write_all(&[0; PATH_LEN])?; // texture
        dest.write_all(&[0; PATH_LEN])?; // alpha map
    }

    dest.write_f32::<E>(FPS)?;
    dest.write_f32::<E>(CURRENT_FRAME)?;
    dest.write_f32::<E>(TOTAL_FRAMES)?;

    let bones = &model.skeleton.bones;
    dest.write_u16::<E>(bones.len() as u16)?;
    for bone in bones {
        let parent = if bone.is_root() {
            ""
        } else {
            usize::try_from(bone.parent_id)
                .ok()
                .and_then(|id| bones.get(id))
                .map(|parent| parent.name.as_str())
                .ok_or_else(|| Error::UnknownParent {
                    bone: bone.name.clone(),
                    parent: bone.parent_id,
                })?
        };
        dest.write_u8(0)?; // flags
        dest.write_all(&fixed_name(&bone.name, options.names)?)?;
        dest.write_all(&fixed_name(parent, options.names)?)?;
        let rot = bone.rotation;
        let pos = bone.position;
        write_vec(&mut dest, [rot.x, rot.y, rot.z])?;
        write_vec(&mut dest, [pos.x, pos.y, pos.z])?;
        dest.write_u16::<E>(0)?; // rotation keyframes
        dest.write_u16::<E>(0)?; // translation keyframes
    }

    Ok(())
}

fn triangle_corners<'a>(mesh: &'a Mesh, polygon: &Polygon) -> Result<[&'a Vertex; 3], Error> {
    let get = |index: u32| {
        mesh.vertices
            .get(index as usize)
            .ok_or_else(|| Error::InvalidIndex {
                mesh: mesh.name.clone(),
                index,
            })
    };
    Ok([get(polygon.a)?, get(polygon.b)?, get(polygon.c)?])
}

fn write_vec<W: Write>(dest: &mut W, v: [f32; 3]) -> io::Result<()> {
    dest.write_f32::<E>(v[0])?;
    dest.write_f32::<E>(v[1])?;
    dest.write_f32::<E>(v[2])
}
