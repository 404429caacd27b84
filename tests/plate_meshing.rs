use std::collections::BTreeMap;

use approx::assert_relative_eq;
use structure_calc::mesh::ElementKind;
use structure_calc::prelude::*;

/// Splits every face into two triangles along the i-m diagonal
struct DiagonalSplit;

impl SurfaceMesher for DiagonalSplit {
    fn name(&self) -> &str {
        "diagonal-split"
    }

    fn mesh(&self, face: &Face, _size: f64) -> CalcResult<MeshOutput> {
        let nodes: BTreeMap<usize, [f64; 3]> = face
            .corners
            .iter()
            .enumerate()
            .map(|(k, p)| (k + 10, *p))
            .collect();
        let mut elements = BTreeMap::new();
        elements.insert(1, vec![10, 11, 12]);
        elements.insert(2, vec![10, 12, 13]);
        Ok(MeshOutput { nodes, elements })
    }
}

const CORNERS: [[f64; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [2000.0, 0.0, 0.0],
    [2000.0, 1000.0, 0.0],
    [0.0, 1000.0, 0.0],
];

/// Edge beams around a 2 m x 1 m slab, pinned at the corners
fn framed_slab(mesh_size: Option<f64>) -> StructureInput {
    let mut input = StructureInput {
        frames: vec![FrameObject {
            name: "Edge".into(),
            vertices: vec![CORNERS[0], CORNERS[1], CORNERS[2], CORNERS[3], CORNERS[0]],
            edges: vec![],
            material: None,
            section: Some("Box".into()),
            rotation: 0.0,
            truss: false,
        }],
        plates: vec![PlateObject {
            name: "Slab".into(),
            outline: CORNERS.to_vec(),
            corners: Some(CORNERS.to_vec()),
            thickness: 200.0,
            material: None,
            mesh_size,
        }],
        supports: CORNERS
            .iter()
            .enumerate()
            .map(|(k, p)| SupportObject {
                name: format!("S{}", k),
                target: SupportTarget::Point { point: *p },
                fixity: CadFixity::pinned(),
            })
            .collect(),
        area_loads: vec![AreaLoadObject {
            name: "Floor".into(),
            load_type: None,
            pressure: Quantity::new(5.0, "kPa"),
            plate: None,
            parent: Some("Slab".into()),
        }],
        ..StructureInput::default()
    };
    input.sections.insert(
        "Box".into(),
        SectionSource {
            area: 4000.0,
            iy: 2.0e7,
            iz: 2.0e7,
            iyz: 0.0,
            j: 3.0e7,
            unit: LengthUnit::Mm,
        },
    );
    input
}

#[test]
fn test_single_plate_uses_frame_corners() {
    let report = Pipeline::new(CalcOptions::default()).run(&framed_slab(None));
    assert_eq!(report.state, RunState::ResultsExtracted);
    assert_eq!(report.nodes, 4);

    let plate = &report.plates[0];
    assert_eq!(plate.kind, ElementKind::Plate);
    assert_eq!(plate.elements, vec!["Slab"]);
    assert_eq!(plate.reused_nodes, 4);
    assert_eq!(plate.new_nodes, 0);
}

#[test]
fn test_meshed_plate_reconciles_with_frame_nodes() {
    let report = Pipeline::new(CalcOptions::default()).run(&framed_slab(Some(1000.0)));
    assert_eq!(report.state, RunState::ResultsExtracted);

    let plate = &report.plates[0];
    assert_eq!(plate.kind, ElementKind::Quad);
    assert_eq!(plate.mesher, "structured-grid");
    assert_eq!(plate.elements, vec!["Slab_Q1", "Slab_Q2"]);
    // Corners come from the frame, the two mid-edge nodes are new
    assert_eq!(plate.reused_nodes, 4);
    assert_eq!(plate.new_nodes, 2);
    assert_eq!(report.nodes, 6);

    let quality = plate.quality.as_ref().unwrap();
    assert_eq!(quality.total, 2);
    assert_eq!(quality.grade, structure_calc::mesh::QualityGrade::Excellent);

    // 5 kPa over 2 m² = 10 kN, carried by the corner supports
    assert_relative_eq!(report.reactions.sum.fy.abs(), 10.0, max_relative = 1e-6);
    assert_eq!(report.reactions.records.len(), 4);
}

#[test]
fn test_external_mesher_triangles_are_padded() {
    let mut pipeline = Pipeline::new(CalcOptions::default()).with_mesher(Box::new(DiagonalSplit));
    let report = pipeline.run(&framed_slab(Some(500.0)));

    let plate = &report.plates[0];
    assert_eq!(plate.mesher, "diagonal-split");
    assert_eq!(plate.elements.len(), 2);
    assert_eq!(plate.new_nodes, 0);
    assert_eq!(plate.reused_nodes, 4);
    assert_eq!(report.nodes, 4);

    let quality = plate.quality.as_ref().unwrap();
    assert!(quality.quads.is_none());
    assert_eq!(quality.triangles.as_ref().unwrap().count, 2);
}

#[test]
fn test_area_load_on_unknown_plate_is_recovered() {
    let mut input = framed_slab(None);
    input.area_loads[0].parent = Some("Roof".into());
    let report = Pipeline::new(CalcOptions::default()).run(&input);
    assert_eq!(report.state, RunState::ResultsExtracted);
    assert!(report.warnings.iter().any(|w| w.starts_with("area load Floor")));
    assert!(report.reactions.sum.fy.abs() < 1e-9);
}
