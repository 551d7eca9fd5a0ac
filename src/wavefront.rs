//! Wavefront OBJ text output.

use model::Model;
use std::io::{Error as IoError, ErrorKind, Result as IoResult, Write};

pub fn save<W: Write>(mut dest: W, model: &Model) -> IoResult<()> {
    profiling::scope!("Encode OBJ");
    let names = model.unique_names();
    let global_polygons = model.global_polygons().ok_or_else(|| {
        IoError::new(ErrorKind::InvalidData, "vertex indices exceed 32 bits")
    })?;

    writeln!(dest, "# scfile")?;
    writeln!(dest)?;

    for v in model.meshes.iter().flat_map(|m| m.vertices.iter()) {
        let p = v.position;
        writeln!(dest, "v {} {} {}", p.x, p.y, p.z)?;
    }
    writeln!(dest)?;
    for v in model.meshes.iter().flat_map(|m| m.vertices.iter()) {
        writeln!(dest, "vt {} {}", v.texture.u, v.texture.v)?;
    }
    writeln!(dest)?;
    for v in model.meshes.iter().flat_map(|m| m.vertices.iter()) {
        let n = v.normals;
        writeln!(dest, "vn {} {} {}", n.i, n.j, n.k)?;
    }

    for ((mesh, name), polygons) in model.meshes.iter().zip(&names).zip(&global_polygons) {
        writeln!(dest)?;
        writeln!(dest, "g {}", name)?;
        writeln!(dest, "usemtl {}", mesh.material)?;
        for p in polygons {
            write!(dest, "f")?;
            // OBJ indices are 1-based
            for index in p.indices() {
                write!(dest, " {0}/{0}/{0}", u64::from(index) + 1)?;
            }
            writeln!(dest)?;
        }
    }

    Ok(())
}

pub fn to_bytes(model: &Model) -> IoResult<Vec<u8>> {
    let mut buffer = Vec::new();
    save(&mut buffer, model)?;
    Ok(buffer)
}
