use byteorder::{LittleEndian as E, ReadBytesExt, WriteBytesExt};
use model::{unscaled, Factor};
use scfile::{Format, Settings};
use std::io::{Cursor, Seek, SeekFrom};

const POSITION_SCALE: f32 = 12.5;
const TEXTURE_SCALE: f32 = 2.0;

const POSITIONS: [[i16; 4]; 3] = [[-32768, 0, 32767, 1], [100, -200, 300, 2], [7, 8, -9, 3]];
const UVS: [[i16; 2]; 3] = [[0, 16384], [32767, -1], [-12000, 5]];
const NORMALS: [[i8; 4]; 3] = [[127, 0, 0, 0], [0, -127, 0, 0], [64, 64, -64, 0]];

/// Version 10 file with UVs and normals, two copies of one triangle mesh.
fn fixture() -> Vec<u8> {
    let mut data = Vec::new();
    data.write_f32::<E>(10.0).unwrap();
    data.extend_from_slice(&[0, 1, 1, 0, 0, 0]);
    data.write_f32::<E>(POSITION_SCALE).unwrap();
    data.write_f32::<E>(TEXTURE_SCALE).unwrap();
    data.write_f32::<E>(1.0).unwrap();
    data.write_u32::<E>(2).unwrap();
    for _ in 0..2 {
        for s in ["plate", "steel"] {
            data.write_u16::<E>(s.len() as u16).unwrap();
            data.extend_from_slice(s.as_bytes());
        }
        data.extend_from_slice(&[3, 1]);
        data.write_f32::<E>(1.0).unwrap();
        for _ in 0..6 {
            data.write_f32::<E>(0.0).unwrap();
        }
        for p in POSITIONS.iter().flatten() {
            data.write_i16::<E>(*p).unwrap();
        }
        for t in UVS.iter().flatten() {
            data.write_i16::<E>(*t).unwrap();
        }
        for n in NORMALS.iter().flatten() {
            data.write_i8(*n).unwrap();
        }
        for index in [0u16, 1, 2] {
            data.write_u16::<E>(index).unwrap();
        }
    }
    data
}

fn read_vec(src: &mut Cursor<Vec<u8>>) -> [f32; 3] {
    [
        src.read_f32::<E>().unwrap(),
        src.read_f32::<E>().unwrap(),
        src.read_f32::<E>().unwrap(),
    ]
}

#[test]
fn ms3d_preserves_samples() {
    let out = scfile::convert(&fixture(), Format::Ms3d, &Settings::default()).unwrap();
    let mut src = Cursor::new(out);
    src.seek(SeekFrom::Start(14)).unwrap();
    assert_eq!(src.read_u16::<E>().unwrap(), 6);
    for i in 0..6 {
        src.read_u8().unwrap();
        let pos = read_vec(&mut src);
        for c in 0..3 {
            assert_eq!(unscaled(pos[c], POSITION_SCALE, Factor::I16), POSITIONS[i % 3][c] as i32);
        }
        src.seek(SeekFrom::Current(2)).unwrap();
    }

    assert_eq!(src.read_u16::<E>().unwrap(), 2);
    for triangle in 0..2 {
        src.read_u16::<E>().unwrap();
        let indices: Vec<_> = (0..3).map(|_| src.read_u16::<E>().unwrap()).collect();
        let base = triangle * 3;
        assert_eq!(indices, [base, base + 1, base + 2]);
        for n in NORMALS.iter() {
            let normal = read_vec(&mut src);
            for c in 0..3 {
                assert_eq!(unscaled(normal[c], 1.0, Factor::I8), n[c] as i32);
            }
        }
        let u = read_vec(&mut src);
        let v = read_vec(&mut src);
        for corner in 0..3 {
            assert_eq!(unscaled(u[corner], TEXTURE_SCALE, Factor::I16), UVS[corner][0] as i32);
            assert_eq!(unscaled(v[corner], TEXTURE_SCALE, Factor::I16), UVS[corner][1] as i32);
        }
        assert_eq!(src.read_u8().unwrap(), 1);
        assert_eq!(src.read_u8().unwrap(), triangle as u8);
    }

    assert_eq!(src.read_u16::<E>().unwrap(), 2);
    let mut names = Vec::new();
    for _ in 0..2 {
        src.read_u8().unwrap();
        let mut name = [0u8; 32];
        std::io::Read::read_exact(&mut src, &mut name).unwrap();
        names.push(name);
        let count = src.read_u16::<E>().unwrap();
        src.seek(SeekFrom::Current(count as i64 * 2 + 1)).unwrap();
    }
    assert_eq!(&names[0][..6], b"plate\0");
    assert_eq!(&names[1][..8], b"plate_2\0");
}

#[test]
fn deterministic() {
    let data = fixture();
    let settings = Settings::default();
    for format in [Format::Ms3d, Format::Obj, Format::Ron] {
        assert_eq!(
            scfile::convert(&data, format, &settings).unwrap(),
            scfile::convert(&data, format, &settings).unwrap()
        );
    }
}

#[test]
fn obj_matches_model() {
    let out = scfile::convert(&fixture(), Format::Obj, &Settings::default()).unwrap();
    let data = obj::ObjData::load_buf(&out[..]).unwrap();
    assert_eq!(data.position.len(), 6);
    let p = data.position[4];
    assert_eq!(unscaled(p[1], POSITION_SCALE, Factor::I16), -200);
    let polys: Vec<_> = data
        .objects
        .iter()
        .flat_map(|o| o.groups.iter())
        .flat_map(|g| g.polys.iter())
        .collect();
    assert_eq!(polys.len(), 2);
    assert_eq!(polys[1].0[0].0, 3);
}

#[test]
fn ron_dump_is_empty_skeleton() {
    let out = scfile::convert(&fixture(), Format::Ron, &Settings::default()).unwrap();
    let model: model::Model = ron::de::from_bytes(&out).unwrap();
    assert_eq!(model.meshes.len(), 2);
    assert!(model.skeleton.bones.is_empty());
}

#[test]
fn decode_errors_surface() {
    let mut data = fixture();
    data[..4].copy_from_slice(&9.0f32.to_le_bytes());
    match scfile::convert(&data, Format::Ms3d, &Settings::default()) {
        Err(scfile::ConvertError::Decode(mcsa::Error::UnsupportedVersion(v))) => assert_eq!(v, 9.0),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn convert_file_names_output() {
    let dir = std::env::temp_dir().join(format!("scfile-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let source = dir.join("plate.mcsa");
    std::fs::write(&source, fixture()).unwrap();

    let dest = scfile::convert_file(&source, None, Format::Obj, &Settings::default()).unwrap();
    assert_eq!(dest, dir.join("plate.obj"));
    assert!(std::fs::read_to_string(&dest).unwrap().contains("g plate_2"));

    let missing = dir.join("missing.mcsa");
    assert!(matches!(
        scfile::convert_file(&missing, None, Format::Ms3d, &Settings::default()),
        Err(scfile::ConvertError::Io { .. })
    ));
    std::fs::remove_dir_all(&dir).unwrap();
}
