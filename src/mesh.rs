use crate::error::MeshError;
use crate::math::{Color, Point3, Vec3};
use crate::triangle::Uv;
use std::path::Path;

/// The three per-vertex attribute sets needed to build a `Triangle`, as
/// pulled directly out of an imported OBJ face.
pub struct RawTriangle {
    pub positions: (Point3, Point3, Point3),
    pub normals: Option<(Vec3, Vec3, Vec3)>,
    pub uvs: Option<(Uv, Uv, Uv)>,
}

/// The result of importing one OBJ file: its triangles, flattened across
/// every sub-mesh in the file, plus the first associated MTL material's
/// diffuse color, if any.
pub struct LoadedMesh {
    pub triangles: Vec<RawTriangle>,
    pub diffuse_color: Option<Color>,
}

/// Imports a triangle mesh from an OBJ file. Triangulation, single-indexing,
/// and stray point/line primitives are handled by the options passed to
/// `tobj::load_obj` so the caller only ever sees triangles.
pub fn load_model(path: impl AsRef<Path>) -> Result<LoadedMesh, MeshError> {
    let path = path.as_ref();
    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ignore_points: true,
        ignore_lines: true,
    };
    let (models, materials_result) =
        tobj::load_obj(path, &load_options).map_err(|source| MeshError::Load {
            path: path.to_path_buf(),
            source,
        })?;

    let mut triangles = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        let has_normals = !mesh.normals.is_empty();
        let has_uvs = !mesh.texcoords.is_empty();

        for face in mesh.indices.chunks_exact(3) {
            let position = |i: u32| {
                let base = (i as usize) * 3;
                Point3::new(
                    mesh.positions[base] as f64,
                    mesh.positions[base + 1] as f64,
                    mesh.positions[base + 2] as f64,
                )
            };
            let normal = |i: u32| {
                let base = (i as usize) * 3;
                Vec3::new(
                    mesh.normals[base] as f64,
                    mesh.normals[base + 1] as f64,
                    mesh.normals[base + 2] as f64,
                )
            };
            let uv = |i: u32| -> Uv {
                let base = (i as usize) * 2;
                (mesh.texcoords[base] as f64, mesh.texcoords[base + 1] as f64)
            };

            triangles.push(RawTriangle {
                positions: (position(face[0]), position(face[1]), position(face[2])),
                normals: has_normals
                    .then(|| (normal(face[0]), normal(face[1]), normal(face[2]))),
                uvs: has_uvs.then(|| (uv(face[0]), uv(face[1]), uv(face[2]))),
            });
        }
    }

    if triangles.is_empty() {
        return Err(MeshError::Empty {
            path: path.to_path_buf(),
        });
    }

    let diffuse_color = materials_result
        .ok()
        .and_then(|materials| materials.into_iter().next())
        .and_then(|m| m.diffuse)
        .map(|d| Color::new(d[0] as f64, d[1] as f64, d[2] as f64));

    Ok(LoadedMesh {
        triangles,
        diffuse_color,
    })
}
