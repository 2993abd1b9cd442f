//! Minimal glTF 2.0 binary writer: one node and one mesh per part, float
//! positions and `u32` indices in a single buffer.

use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use skyview_scene::MeshData;

use crate::error::{GenerateError, Result};
use crate::wing::WingModel;

const GLB_MAGIC: u32 = 0x4654_6C67;
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;
const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

fn pad_to_four(bytes: &mut Vec<u8>, fill: u8) {
    while bytes.len() % 4 != 0 {
        bytes.push(fill);
    }
}

/// Encodes `parts` as children of a single root node called `name`.
pub fn encode_glb(name: &str, parts: &[(&str, &MeshData)]) -> Result<Vec<u8>> {
    let mut bin = Vec::new();
    let mut nodes = vec![json!({
        "name": name,
        "children": (1..=parts.len()).collect::<Vec<_>>(),
    })];
    let mut meshes = Vec::new();
    let mut materials = Vec::new();
    let mut accessors = Vec::new();
    let mut views = Vec::new();

    for (index, (part_name, mesh)) in parts.iter().enumerate() {
        if mesh.positions.is_empty() || mesh.triangles.is_empty() {
            return Err(GenerateError::InvalidGlb(format!("part {part_name:?} has no geometry")));
        }

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        let position_offset = bin.len();
        for p in &mesh.positions {
            let p = [p.x as f32, p.y as f32, p.z as f32];
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
                bin.extend_from_slice(&p[axis].to_le_bytes());
            }
        }
        let position_len = bin.len() - position_offset;

        let index_offset = bin.len();
        for vertex in mesh.triangles.iter().flatten() {
            bin.extend_from_slice(&vertex.to_le_bytes());
        }
        let index_len = bin.len() - index_offset;

        let view = views.len();
        views.push(json!({
            "buffer": 0,
            "byteOffset": position_offset,
            "byteLength": position_len,
            "target": ARRAY_BUFFER,
        }));
        views.push(json!({
            "buffer": 0,
            "byteOffset": index_offset,
            "byteLength": index_len,
            "target": ELEMENT_ARRAY_BUFFER,
        }));

        let accessor = accessors.len();
        accessors.push(json!({
            "bufferView": view,
            "componentType": FLOAT,
            "count": mesh.positions.len(),
            "type": "VEC3",
            "min": min,
            "max": max,
        }));
        accessors.push(json!({
            "bufferView": view + 1,
            "componentType": UNSIGNED_INT,
            "count": mesh.triangles.len() * 3,
            "type": "SCALAR",
        }));

        let material = &mesh.material;
        let [r, g, b] = material.color.to_linear();
        let alpha_mode = if material.transparent { "BLEND" } else { "OPAQUE" };
        materials.push(json!({
            "name": format!("{part_name} Material"),
            "pbrMetallicRoughness": {
                "baseColorFactor": [r, g, b, material.opacity as f32],
                "metallicFactor": 0.1,
                "roughnessFactor": 0.6,
            },
            "alphaMode": alpha_mode,
            "doubleSided": true,
        }));
        meshes.push(json!({
            "name": part_name,
            "primitives": [{
                "attributes": { "POSITION": accessor },
                "indices": accessor + 1,
                "material": index,
                "mode": 4,
            }],
        }));
        nodes.push(json!({ "name": part_name, "mesh": index }));
    }

    let document = json!({
        "asset": { "version": "2.0", "generator": "skyview" },
        "scene": 0,
        "scenes": [{ "name": name, "nodes": [0] }],
        "nodes": nodes,
        "meshes": meshes,
        "materials": materials,
        "accessors": accessors,
        "bufferViews": views,
        "buffers": [{ "byteLength": bin.len() }],
    });

    let mut json_chunk = serde_json::to_vec(&document)?;
    pad_to_four(&mut json_chunk, b' ');
    pad_to_four(&mut bin, 0);

    let total = HEADER_LEN + 2 * CHUNK_HEADER_LEN + json_chunk.len() + bin.len();
    let total_u32 = u32::try_from(total)
        .map_err(|_| GenerateError::InvalidGlb(format!("{total} bytes exceeds the GLB limit")))?;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&total_u32.to_le_bytes());
    for (kind, chunk) in [(CHUNK_JSON, &json_chunk), (CHUNK_BIN, &bin)] {
        out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(chunk);
    }
    Ok(out)
}

/// Writes both wing halves to `path`, creating parent directories.
/// Returns the number of bytes written.
pub fn write_glb(path: &Path, wing: &WingModel) -> Result<usize> {
    let parts: Vec<(&str, &MeshData)> = wing
        .halves()
        .into_iter()
        .map(|(side, mesh)| (side.label(), mesh))
        .collect();
    let bytes = encode_glb("Wing", &parts)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| GenerateError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, &bytes).map_err(|source| GenerateError::Io {
        operation: "write",
        path: path.to_path_buf(),
        source,
    })?;
    Ok(bytes.len())
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let word = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
}

/// Checks the container framing and returns the parsed JSON chunk.
pub fn read_glb_json(bytes: &[u8]) -> Result<Value> {
    let invalid = |message: &str| GenerateError::InvalidGlb(message.to_string());
    if read_u32(bytes, 0) != Some(GLB_MAGIC) {
        return Err(invalid("missing glTF magic"));
    }
    if read_u32(bytes, 4) != Some(GLB_VERSION) {
        return Err(invalid("unsupported container version"));
    }
    if read_u32(bytes, 8).map(|len| len as usize) != Some(bytes.len()) {
        return Err(invalid("declared length does not match data"));
    }
    let json_len = read_u32(bytes, HEADER_LEN).ok_or_else(|| invalid("truncated header"))? as usize;
    if read_u32(bytes, HEADER_LEN + 4) != Some(CHUNK_JSON) {
        return Err(invalid("first chunk is not JSON"));
    }
    let start = HEADER_LEN + CHUNK_HEADER_LEN;
    let chunk = bytes
        .get(start..start + json_len)
        .ok_or_else(|| invalid("truncated JSON chunk"))?;
    Ok(serde_json::from_slice(chunk)?)
}
