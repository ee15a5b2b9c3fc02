//! Minimal MTL parser: `newmtl`, ambient/diffuse/specular colors,
//! shininess, dissolve and the diffuse texture map.

use anyhow::{Context, Result, anyhow};

/// One material definition from an MTL library.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    /// Opacity in [0,1]; 1.0 is fully opaque. The loader forces this to
    /// 1.0 after parsing regardless of what the file says.
    pub dissolve: f32,
    pub diffuse_map: Option<String>,
}

impl Material {
    fn named(name: String) -> Self {
        Self {
            name,
            ambient: [0.0; 3],
            diffuse: [0.8; 3],
            specular: [0.0; 3],
            shininess: 0.0,
            dissolve: 1.0,
            diffuse_map: None,
        }
    }
}

/// Materials in file order, looked up by name at bind time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialLib {
    pub materials: Vec<Material>,
}

impl MaterialLib {
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    /// Override any transparency encoded in the file. The viewer always
    /// draws the mesh fully opaque.
    pub fn force_opaque(&mut self) {
        for material in &mut self.materials {
            material.dissolve = 1.0;
        }
    }

    /// Distinct texture file names referenced by the materials.
    pub fn texture_names(&self) -> impl Iterator<Item = &str> {
        self.materials
            .iter()
            .filter_map(|m| m.diffuse_map.as_deref())
    }
}

/// Parse an MTL library from a string.
pub fn load_mtl_from_str(contents: &str) -> Result<MaterialLib> {
    let mut lib = MaterialLib::default();
    let mut current: Option<Material> = None;

    for (line_no, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let tag = parts.next().unwrap_or_default();

        match tag {
            "newmtl" => {
                let name = parts
                    .next()
                    .ok_or_else(|| anyhow!("newmtl without a name on line {}", line_no + 1))?;
                if let Some(prev) = current.replace(Material::named(name.to_string())) {
                    lib.materials.push(prev);
                }
            }
            "Ka" | "Kd" | "Ks" => {
                let material = current
                    .as_mut()
                    .ok_or_else(|| anyhow!("{} before newmtl on line {}", tag, line_no + 1))?;
                let rgb = parse_rgb(&mut parts, line_no, tag)?;
                match tag {
                    "Ka" => material.ambient = rgb,
                    "Kd" => material.diffuse = rgb,
                    _ => material.specular = rgb,
                }
            }
            "Ns" => {
                if let Some(material) = current.as_mut() {
                    material.shininess = parse_scalar(parts.next(), line_no, "Ns")?;
                }
            }
            "d" => {
                if let Some(material) = current.as_mut() {
                    material.dissolve = parse_scalar(parts.next(), line_no, "d")?;
                }
            }
            "Tr" => {
                // Inverted dissolve convention.
                if let Some(material) = current.as_mut() {
                    material.dissolve = 1.0 - parse_scalar(parts.next(), line_no, "Tr")?;
                }
            }
            "map_Kd" => {
                if let Some(material) = current.as_mut() {
                    material.diffuse_map = parts.next().map(str::to_string);
                }
            }
            _ => {
                // Ignore illumination models and the rarer map channels.
            }
        }
    }

    if let Some(prev) = current {
        lib.materials.push(prev);
    }

    if lib.materials.is_empty() {
        anyhow::bail!("MTL contained no materials");
    }
    Ok(lib)
}

fn parse_rgb<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
    tag: &str,
) -> Result<[f32; 3]> {
    let r = parse_scalar(parts.next(), line_no, tag)?;
    let g = parse_scalar(parts.next(), line_no, tag)?;
    let b = parse_scalar(parts.next(), line_no, tag)?;
    Ok([r, g, b])
}

fn parse_scalar(value: Option<&str>, line_no: usize, tag: &str) -> Result<f32> {
    let token =
        value.ok_or_else(|| anyhow!("Missing {} component on line {}", tag, line_no + 1))?;
    token
        .parse::<f32>()
        .with_context(|| format!("Failed to parse {} value on line {}", tag, line_no + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_MTL: &str = r#"
        # cube material
        newmtl white
        Ka 0.2 0.2 0.2
        Kd 0.9 0.9 0.9
        Ks 0.1 0.1 0.1
        Ns 32.0
        d 0.25
    "#;

    #[test]
    fn parse_single_material() {
        let lib = load_mtl_from_str(CUBE_MTL).expect("parse mtl");
        assert_eq!(lib.materials.len(), 1);
        let m = lib.get("white").expect("material by name");
        assert_eq!(m.diffuse, [0.9, 0.9, 0.9]);
        assert_eq!(m.shininess, 32.0);
        assert_eq!(m.dissolve, 0.25);
    }

    #[test]
    fn force_opaque_overrides_file_dissolve() {
        let mut lib = load_mtl_from_str(CUBE_MTL).expect("parse mtl");
        lib.force_opaque();
        assert_eq!(lib.materials[0].dissolve, 1.0);
    }

    #[test]
    fn tr_is_inverted_dissolve() {
        let lib = load_mtl_from_str("newmtl a\nTr 0.3\n").expect("parse");
        assert!((lib.materials[0].dissolve - 0.7).abs() < 1e-6);
    }

    #[test]
    fn map_kd_and_multiple_materials() {
        let src = "newmtl a\nmap_Kd checker.png\nnewmtl b\nKd 1 0 0\n";
        let lib = load_mtl_from_str(src).expect("parse");
        assert_eq!(lib.materials.len(), 2);
        assert_eq!(lib.get("a").unwrap().diffuse_map.as_deref(), Some("checker.png"));
        assert_eq!(lib.texture_names().collect::<Vec<_>>(), vec!["checker.png"]);
    }

    #[test]
    fn attribute_before_newmtl_is_rejected() {
        assert!(load_mtl_from_str("Kd 1 1 1\n").is_err());
    }

    #[test]
    fn empty_mtl_is_rejected() {
        assert!(load_mtl_from_str("# nothing\n").is_err());
    }
}
