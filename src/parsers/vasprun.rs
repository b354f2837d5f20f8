//! # vasprun.xml 解析器
//!
//! 遍历 XML 树提取：
//! - `incar` 参数（带 `name` 属性的子元素）
//! - 最后一个 `calculation/energy` 块的各能量项（`scstep/energy` 不计入）
//! - 最后一个 `calculation` 是否含有 `eigenvalues` 与 `dos`，以及 `dos/i[@name='efermi']`
//! - 最终构型：最后一个 `calculation/structure` 的晶格与坐标
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` (CalculationDir)、`commands/` 使用
//! - 使用 `models/structure.rs`
//! - 使用 `roxmltree` 构建只读 DOM

use super::read_artifact;
use crate::config::Artifact;
use crate::error::{Result, VaspError};
use crate::models::{Diagnostic, Diagnostics, Lattice};

use indexmap::IndexMap;
use log::debug;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// vasprun.xml 提取结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VasprunResult {
    /// INCAR 参数，保持文件顺序
    pub parameters: IndexMap<String, String>,
    /// 最终能量项，如 e_fr_energy, e_wo_entrp, e_0_energy
    pub final_energies: IndexMap<String, f64>,
    pub has_eigenvalues: bool,
    pub has_dos: bool,
    /// 费米能 (eV)
    pub efermi: Option<f64>,
    /// 最终晶格
    pub final_lattice: Option<Lattice>,
    /// 最终分数坐标
    pub final_positions: Option<Vec<[f64; 3]>>,
    /// 被跳过字段的诊断
    pub diagnostics: Vec<Diagnostic>,
}

/// 解析 vasprun.xml
pub fn parse_vasprun(path: &Path) -> Result<VasprunResult> {
    let content = read_artifact(path, Artifact::Vasprun)?;
    parse_vasprun_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 vasprun.xml
pub fn parse_vasprun_content(content: &str, source: &str) -> Result<VasprunResult> {
    let doc = Document::parse(content).map_err(|e| VaspError::Xml {
        path: source.to_string(),
        source: e,
    })?;
    let mut diags = Diagnostics::new(source);

    let mut parameters = IndexMap::new();
    for incar in doc.descendants().filter(|n| n.has_tag_name("incar")) {
        for item in incar.children().filter(|n| n.is_element()) {
            if let Some(name) = item.attribute("name") {
                parameters.insert(name.to_string(), node_text(item).to_string());
            }
        }
    }

    let mut final_energies = IndexMap::new();
    let last_energy = doc
        .descendants()
        .filter(|n| n.has_tag_name("energy") && has_ancestors(*n, &["calculation"]))
        .last();
    if let Some(energy) = last_energy {
        for item in energy.children().filter(|n| n.is_element()) {
            if let Some(name) = item.attribute("name") {
                if let Some(v) = parse_node_f64(&doc, item, name, node_text(item), &mut diags) {
                    final_energies.insert(name.to_string(), v);
                }
            }
        }
    }

    let last_calc = doc
        .descendants()
        .filter(|n| n.has_tag_name("calculation"))
        .last();
    let has_eigenvalues = last_calc.map_or(false, |c| child(c, "eigenvalues").is_some());
    let dos = last_calc.and_then(|c| child(c, "dos"));
    let efermi = dos
        .and_then(|d| {
            d.children()
                .find(|n| n.has_tag_name("i") && n.attribute("name") == Some("efermi"))
        })
        .and_then(|i| parse_node_f64(&doc, i, "efermi", node_text(i), &mut diags));

    let final_lattice = last_varray(&doc, "basis", &["crystal", "structure", "calculation"])
        .and_then(|v| {
            let rows = read_vectors(&doc, v, "basis", &mut diags);
            match rows.as_slice() {
                [a, b, c] => Some(Lattice::from_vectors([*a, *b, *c])),
                _ => {
                    diags.skip(line_of(&doc, v), "basis", &format!("{} rows", rows.len()));
                    None
                }
            }
        });

    let final_positions = last_varray(&doc, "positions", &["structure", "calculation"])
        .map(|v| read_vectors(&doc, v, "positions", &mut diags));

    debug!(
        "{}: {} parameters, {} energy terms, eigenvalues: {}, dos: {}",
        source,
        parameters.len(),
        final_energies.len(),
        has_eigenvalues,
        dos.is_some()
    );

    Ok(VasprunResult {
        parameters,
        final_energies,
        has_eigenvalues,
        has_dos: dos.is_some(),
        efermi,
        final_lattice,
        final_positions,
        diagnostics: diags.into_vec(),
    })
}

fn node_text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("").trim()
}

/// `text_pos_at` 从头扫描文本，只在记录诊断时调用
fn line_of(doc: &Document, node: Node) -> usize {
    doc.text_pos_at(node.range().start).row as usize
}

/// 解析节点内的一个数值，失败时以节点所在行记录诊断
fn parse_node_f64(
    doc: &Document,
    node: Node,
    field: &str,
    token: &str,
    diags: &mut Diagnostics,
) -> Option<f64> {
    match token.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            diags.skip(line_of(doc, node), field, token);
            None
        }
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

/// 父元素链依次为 `names`
fn has_ancestors(node: Node, names: &[&str]) -> bool {
    let mut cur = node;
    for name in names {
        match cur.parent_element() {
            Some(p) if p.has_tag_name(*name) => cur = p,
            _ => return false,
        }
    }
    true
}

/// 最后一个指定名称且位于指定路径下的 `varray`
fn last_varray<'a, 'input>(
    doc: &'a Document<'input>,
    name: &str,
    ancestors: &[&str],
) -> Option<Node<'a, 'input>> {
    doc.descendants()
        .filter(|n| {
            n.has_tag_name("varray")
                && n.attribute("name") == Some(name)
                && has_ancestors(*n, ancestors)
        })
        .last()
}

/// 读取 `varray` 下的 `<v>` 三元组；无法解析的行被跳过
fn read_vectors(doc: &Document, varray: Node, field: &str, diags: &mut Diagnostics) -> Vec<[f64; 3]> {
    let mut rows = Vec::new();
    'rows: for v in varray.children().filter(|n| n.has_tag_name("v")) {
        let tokens: Vec<&str> = node_text(v).split_whitespace().collect();
        if tokens.len() < 3 {
            diags.skip(line_of(doc, v), field, node_text(v));
            continue;
        }
        let mut row = [0.0; 3];
        for (x, tok) in row.iter_mut().zip(&tokens) {
            match parse_node_f64(doc, v, field, tok, diags) {
                Some(val) => *x = val,
                None => continue 'rows,
            }
        }
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const VASPRUN: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<modeling>
 <generator>
  <i name="program" type="string">vasp </i>
 </generator>
 <incar>
  <i type="string" name="PREC">accurate</i>
  <i name="ENCUT">    520.00000000</i>
  <i name="ISPIN">      1</i>
 </incar>
 <calculation>
  <scstep>
   <energy>
    <i name="e_fr_energy">    -99.00000000 </i>
   </energy>
  </scstep>
  <structure>
   <crystal>
    <varray name="basis" >
     <v>       5.00000000       0.00000000       0.00000000 </v>
     <v>       0.00000000       5.00000000       0.00000000 </v>
     <v>       0.00000000       0.00000000       5.00000000 </v>
    </varray>
   </crystal>
   <varray name="positions" >
    <v>       0.00000000       0.00000000       0.00000000 </v>
   </varray>
  </structure>
  <energy>
   <i name="e_fr_energy">    -10.00000000 </i>
  </energy>
 </calculation>
 <calculation>
  <scstep>
   <energy>
    <i name="e_fr_energy">    -98.00000000 </i>
   </energy>
  </scstep>
  <structure>
   <crystal>
    <varray name="basis" >
     <v>       5.10000000       0.00000000       0.00000000 </v>
     <v>       0.00000000       5.10000000       0.00000000 </v>
     <v>       0.00000000       0.00000000       5.10000000 </v>
    </varray>
    <varray name="rec_basis" >
     <v>       0.19607843       0.00000000       0.00000000 </v>
    </varray>
   </crystal>
   <varray name="positions" >
    <v>       0.10000000       0.00000000       0.00000000 </v>
    <v>       0.50000000       0.50000000       0.50000000 </v>
   </varray>
  </structure>
  <energy>
   <i name="e_fr_energy">    -12.50000000 </i>
   <i name="e_wo_entrp">    -12.40000000 </i>
   <i name="e_0_energy">    -12.45000000 </i>
  </energy>
  <eigenvalues>
   <array/>
  </eigenvalues>
  <dos>
   <i name="efermi">      5.12340000 </i>
  </dos>
 </calculation>
 <structure name="finalpos" >
  <crystal>
   <varray name="basis" >
    <v>       9.00000000       0.00000000       0.00000000 </v>
   </varray>
  </crystal>
 </structure>
</modeling>
"#;

    #[test]
    fn test_parameters_keep_order() {
        let result = parse_vasprun_content(VASPRUN, "vasprun.xml").unwrap();
        let names: Vec<&str> = result.parameters.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["PREC", "ENCUT", "ISPIN"]);
        assert_eq!(result.parameters["ENCUT"], "520.00000000");
    }

    #[test]
    fn test_final_energy_skips_scsteps() {
        let result = parse_vasprun_content(VASPRUN, "vasprun.xml").unwrap();
        assert_eq!(result.final_energies["e_fr_energy"], -12.5);
        assert_eq!(result.final_energies["e_0_energy"], -12.45);
        assert_eq!(result.final_energies.len(), 3);
    }

    #[test]
    fn test_last_calculation_structure_and_dos() {
        let result = parse_vasprun_content(VASPRUN, "vasprun.xml").unwrap();
        assert!(result.has_eigenvalues);
        assert!(result.has_dos);
        assert_eq!(result.efermi, Some(5.1234));

        let lattice = result.final_lattice.unwrap();
        assert_eq!(lattice.matrix[0][0], 5.1);
        let positions = result.final_positions.unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0], [0.1, 0.0, 0.0]);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_malformed_number_becomes_diagnostic() {
        let content = VASPRUN.replace("-12.40000000", "**********");
        let result = parse_vasprun_content(&content, "vasprun.xml").unwrap();
        assert!(!result.final_energies.contains_key("e_wo_entrp"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].field, "e_wo_entrp");
        assert_eq!(result.diagnostics[0].line, 57);
    }

    #[test]
    fn test_bad_position_row_reports_its_line() {
        let content = VASPRUN.replace(
            "0.50000000       0.50000000       0.50000000",
            "0.50000000       0.5.000000       0.50000000",
        );
        let result = parse_vasprun_content(&content, "vasprun.xml").unwrap();
        assert_eq!(result.final_positions.unwrap().len(), 1);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].field, "positions");
        assert_eq!(result.diagnostics[0].line, 52);
    }

    #[test]
    fn test_truncated_document_is_xml_error() {
        let truncated = &VASPRUN[..VASPRUN.len() / 2];
        let err = parse_vasprun_content(truncated, "vasprun.xml").unwrap_err();
        assert!(matches!(err, VaspError::Xml { .. }));
    }
}
