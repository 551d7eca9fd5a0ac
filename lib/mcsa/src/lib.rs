//! Decoder for MCSA, a quantized binary model container.
//!
//! The layout depends on the version float at the start and a set of
//! per-file flags selecting optional sections. Every reserved field is
//! consumed byte-exact so the following reads stay aligned.

mod flags;
mod reader;

pub use self::flags::{Flag, Flags, Version, MAX_FLAGS};
pub use self::reader::Reader;

use model::{
    scaled_i16, scaled_i8, BoneLink, Factor, Mesh, Model, Polygon, Scale, Skeleton, Vector,
    Vertex, ROOT_BONE_ID,
};
use std::io::{self, Read};

/// Floats of reserved data following the counts in version 10 meshes.
const V10_RESERVED_FLOATS: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported MCSA version {0}")]
    UnsupportedVersion(f32),
    #[error("unknown bone link count {0}")]
    UnknownLinkCount(u8),
    #[error("stream truncated at offset {offset}")]
    StreamTruncated { offset: u64 },
    #[error("read failure at offset {offset}: {source}")]
    StreamRead { offset: u64, source: io::Error },
    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidString { offset: u64 },
    #[error("malformed count at offset {offset}")]
    MalformedCount { offset: u64 },
    #[error("mesh {mesh}: polygon index {index} out of {vertices} vertices")]
    PolygonIndexOutOfRange {
        mesh: String,
        index: u32,
        vertices: usize,
    },
}

/// Decode one model from the start of `source`.
pub fn load<R: Read>(source: R) -> Result<Model, Error> {
    profiling::scope!("Decode MCSA");
    let mut reader = Reader::new(source);

    let raw_version = reader.read_f32()?;
    let version = Version::from_raw(raw_version).ok_or(Error::UnsupportedVersion(raw_version))?;

    let mut flags = Flags::default();
    for index in 0..version.flag_count() {
        flags.set(index, reader.read_bool()?);
    }
    log::debug!("MCSA {:?} with {:?}", version, flags);

    let mut decoder = Decoder {
        reader,
        version,
        flags,
        scale: Scale::default(),
    };
    decoder.read_scales()?;

    let num_meshes = decoder.reader.read_u32()?;
    let mut meshes = Vec::with_capacity(num_meshes.min(0x100) as usize);
    for _ in 0..num_meshes {
        meshes.push(decoder.read_mesh()?);
    }

    let skeleton = if decoder.flags[Flag::Skeleton] {
        decoder.read_skeleton()
    } else {
        Skeleton::default()
    };

    Ok(Model {
        meshes,
        skeleton,
        scale: decoder.scale,
    })
}

pub fn load_bytes(data: &[u8]) -> Result<Model, Error> {
    load(data)
}

struct Decoder<R> {
    reader: Reader<R>,
    version: Version,
    flags: Flags,
    scale: Scale,
}

impl<R: Read> Decoder<R> {
    fn read_scales(&mut self) -> Result<(), Error> {
        self.scale.position = self.reader.read_f32()?;
        if self.flags[Flag::Uv] {
            self.scale.texture = self.reader.read_f32()?;
        }
        // other versions keep the default
        if self.flags[Flag::Normals] && self.version == Version::V10 {
            self.scale.normals = self.reader.read_f32()?;
        }
        Ok(())
    }

    fn read_mesh(&mut self) -> Result<Mesh, Error> {
        profiling::scope!("Decode mesh");
        let name = self.reader.read_string()?;
        let material = self.reader.read_string()?;

        let mut link_count = 0;
        let mut bone_table = Vec::new();
        if self.flags[Flag::Skeleton] {
            link_count = self.reader.read_u8()?;
            let num_bones = self.reader.read_u8()?;
            for _ in 0..num_bones {
                bone_table.push(self.reader.read_i8()?);
            }
        }

        let num_vertices = self.reader.read_count()? as usize;
        let num_polygons = self.reader.read_count()? as usize;
        log::debug!(
            "\tMesh '{}' ({}): {} vertices, {} polygons",
            name,
            material,
            num_vertices,
            num_polygons
        );

        if self.flags[Flag::Uv] {
            self.scale.unknown = self.reader.read_f32()?;
        }
        if self.version == Version::V10 {
            self.reader.skip(V10_RESERVED_FLOATS as u64 * 4)?;
        }

        let position = self.scale.position;
        let mut vertices: Vec<Vertex> = self
            .reader
            .read_xyz(num_vertices)?
            .into_iter()
            .map(|xyz| Vertex {
                position: Vector {
                    x: scaled_i16(xyz[0], position),
                    y: scaled_i16(xyz[1], position),
                    z: scaled_i16(xyz[2], position),
                },
                ..Vertex::default()
            })
            .collect();

        if self.flags[Flag::Uv] {
            let texture = self.scale.texture;
            for (vertex, uv) in vertices.iter_mut().zip(self.reader.read_uv(num_vertices)?) {
                vertex.texture.u = scaled_i16(uv[0], texture);
                vertex.texture.v = scaled_i16(uv[1], texture);
            }
        }

        if self.flags[Flag::Normals] {
            let normals = self.scale.normals;
            for (vertex, n) in vertices
                .iter_mut()
                .zip(self.reader.read_normals(num_vertices)?)
            {
                vertex.normals.i = scaled_i8(n[0], normals);
                vertex.normals.j = scaled_i8(n[1], normals);
                vertex.normals.k = scaled_i8(n[2], normals);
            }
        }

        // one reserved 32-bit field per vertex each
        if self.flags[Flag::Flag4] {
            self.skip_vertices(num_vertices)?;
        }
        if self.flags[Flag::Flag5] {
            self.skip_vertices(num_vertices)?;
        }

        if self.flags[Flag::Skeleton] {
            self.read_links(link_count, &bone_table, &mut vertices)?;
        }

        if self.flags[Flag::Flag6] {
            self.skip_vertices(num_vertices)?;
        }

        let polygons = self
            .reader
            .read_polygons(num_polygons)?
            .into_iter()
            .map(|[a, b, c]| match [a, b, c].into_iter().find(|&i| i as usize >= num_vertices) {
                Some(index) => Err(Error::PolygonIndexOutOfRange {
                    mesh: name.clone(),
                    index,
                    vertices: num_vertices,
                }),
                None => Ok(Polygon { a, b, c }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Mesh {
            name,
            material,
            link_count,
            vertices,
            polygons,
        })
    }

    fn skip_vertices(&mut self, num_vertices: usize) -> Result<(), Error> {
        self.reader.skip(num_vertices as u64 * 4)
    }

    fn read_links(
        &mut self,
        link_count: u8,
        bone_table: &[i8],
        vertices: &mut [Vertex],
    ) -> Result<(), Error> {
        match link_count {
            0 => {}
            1 | 2 => {
                for vertex in vertices.iter_mut() {
                    self.read_link_ids(vertex, 2, bone_table)?;
                    self.read_link_weights(vertex)?;
                }
            }
            3 | 4 => {
                for vertex in vertices.iter_mut() {
                    self.read_link_ids(vertex, 4, bone_table)?;
                }
                for vertex in vertices.iter_mut() {
                    self.read_link_weights(vertex)?;
                }
            }
            other => return Err(Error::UnknownLinkCount(other)),
        }
        Ok(())
    }

    fn read_link_ids(
        &mut self,
        vertex: &mut Vertex,
        slots: usize,
        bone_table: &[i8],
    ) -> Result<(), Error> {
        vertex.bone.links.clear();
        for _ in 0..slots {
            let local = self.reader.read_i8()?;
            let id = usize::try_from(local)
                .ok()
                .and_then(|slot| bone_table.get(slot))
                .map_or(ROOT_BONE_ID, |&id| id as i32);
            vertex.bone.links.push(BoneLink { id, weight: 0.0 });
        }
        Ok(())
    }

    fn read_link_weights(&mut self, vertex: &mut Vertex) -> Result<(), Error> {
        for link in vertex.bone.links.iter_mut() {
            link.weight = self.reader.read_i8()? as f32 / Factor::BONE_WEIGHT;
        }
        Ok(())
    }

    /// Bone lists are not exported yet: nothing is consumed and the
    /// skeleton stays empty.
    fn read_skeleton(&mut self) -> Skeleton {
        Skeleton::default()
    }
}
