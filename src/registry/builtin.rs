//! Fixed-coordinate schemas for the shipped inspection templates.

use std::collections::BTreeMap;

use crate::cell_ref::{CellAddr, Span};
use crate::types::{Bounds, Field, FieldBehavior, FieldType, ReplicatePlan, Section, SectionKind};

const OPTIONS: [&str; 3] = ["SI", "NO", "N/A"];

fn basic(label: &str, field_type: FieldType, row: u32, col: u32, required: bool) -> Field {
    let cell = CellAddr::new(row, col);
    let field = Field::new(format!("basic_{cell}"), label, field_type, cell);
    if required {
        field.required()
    } else {
        field
    }
}

/// Column layout of a SI/NO/N/A checklist block.
struct ChecklistLayout {
    id_prefix: &'static str,
    /// SI, NO and N/A columns, in option order
    option_cols: [u32; 3],
    obs_col: u32,
}

impl ChecklistLayout {
    /// One radio plus one observations textarea per item, from `first_row` down.
    fn rows(&self, fields: &mut Vec<Field>, first_row: u32, items: &[&str], group: Option<&str>) {
        for (row, item) in (first_row..).zip(items) {
            let targets: BTreeMap<String, CellAddr> = OPTIONS
                .iter()
                .zip(self.option_cols)
                .map(|(name, col)| ((*name).to_string(), CellAddr::new(row, col)))
                .collect();

            let mut radio = Field::new(
                format!("{}item_{row}", self.id_prefix),
                *item,
                FieldType::Radio,
                CellAddr::new(row, self.option_cols[0]),
            )
            .with_options(OPTIONS)
            .with_behavior(FieldBehavior::RadioTargets { targets });

            let obs_cell = CellAddr::new(row, self.obs_col);
            let mut obs = Field::new(
                format!("obs_{obs_cell}"),
                "Observaciones",
                FieldType::Textarea,
                obs_cell,
            );

            if let Some(group) = group {
                radio = radio.with_group(group);
                obs = obs.with_group(group);
            }
            fields.push(radio);
            fields.push(obs);
        }
    }
}

fn observations(row: u32, bounds: Bounds) -> Section {
    let cell = CellAddr::new(row, 1);
    Section::new("observations", SectionKind::Observations, "Observaciones Generales")
        .with_fields(vec![Field::new(
            format!("obs_general_{cell}"),
            "Observaciones Generales",
            FieldType::Textarea,
            cell,
        )])
        .with_bounds(bounds)
}

pub(super) fn herramientas() -> Vec<Section> {
    use FieldType::{Date, Text};

    let basic_info = Section::new("basic_info", SectionKind::BasicInfo, "Información Básica")
        .with_fields(vec![
            basic("REALIZADO POR", Text, 5, 1, true),
            basic("CARGO", Text, 6, 1, true),
            basic("LUGAR ZONA DE TRABAJO", Text, 5, 6, true),
            basic("FECHA", Date, 6, 6, true),
        ])
        .with_bounds(Bounds::rows(5, 6, 12));

    let tools = [
        "Agarradoras para cable",
        "Alicate aislado",
        "Barreton- Barra punta",
        "Candados",
        "Cavador (hoyadoras/paladraga)",
        "Cizalla con mangos aislados",
        "Cuchilla de exacto",
        "Cuerda de nylon",
        "Destornilladores estriados aislado",
        "Destornilladores pala aislado",
        "Diferencial tipo señorita (guaya o cadena)",
        "Flexometro",
        "Macho solo boca recta - pinza de presion",
        "Linterna de mano",
        "Llave de expansion",
        "Llave tipo Rachet",
        "Llaves mixta (corona y boca)",
        "Lima plana",
        "Machete o Rula",
        "Martillo mango aislado",
        "Pala cuadrada",
        "Segueta con marco aislado con hojas",
        "Zunchadora",
        "Pinza voltiamperimetrica",
        "Coratafrios",
        "Escalera dielectrica de dos cuerpos",
        "Escalera tipo tijera",
        "Conos de seguridad",
        "Rollo de cinta de seguridad para demarcar",
    ];
    let layout = ChecklistLayout {
        id_prefix: "",
        option_cols: [6, 7, 8],
        obs_col: 9,
    };
    let mut checklist_fields = Vec::new();
    layout.rows(&mut checklist_fields, 10, &tools, None);
    let checklist = Section::new("checklist", SectionKind::Checklist, "Inspección de Herramientas")
        .with_fields(checklist_fields)
        .with_bounds(Bounds {
            start_row: 10,
            end_row: 38,
            start_col: 2,
            end_col: 12,
        });

    // A39:L40 merge; the placement span comes from the sheet
    let signatures = Section::new("signatures", SectionKind::Signatures, "Firma")
        .with_fields(vec![Field::new(
            "sig_A39",
            "Firma del Inspector",
            FieldType::Signature,
            CellAddr::new(39, 1),
        )
        .required()
        .with_behavior(FieldBehavior::RoleFilter {
            role: "inspector".to_string(),
        })])
        .with_bounds(Bounds::rows(39, 40, 12));

    vec![
        basic_info,
        checklist,
        signatures,
        observations(42, Bounds::rows(41, 47, 12)),
    ]
}

pub(super) fn vehiculo() -> Vec<Section> {
    use FieldType::{Date, Number, Text};

    let basic_info = Section::new(
        "basic_info",
        SectionKind::BasicInfo,
        "Información Básica del Vehículo",
    )
    .with_fields(vec![
        basic("REALIZADO POR", Text, 5, 1, true),
        basic("CARGO", Text, 6, 1, true),
        basic("MARCA", Text, 7, 1, true),
        basic("LINEA", Text, 7, 4, true),
        basic("FECHA CAMBIO DE ACEITE", Date, 8, 1, false),
        basic("LUGAR ZONA DE TRABAJO", Text, 5, 6, true),
        basic("FECHA", Date, 6, 6, true),
        basic("KILOMETRAJE ACTUAL", Number, 6, 10, true),
        basic("PLACA", Text, 7, 6, true),
        basic("MODELO", Text, 7, 10, true),
        basic("CAMBIO DE ACEITE KILOMETRAJE", Number, 8, 6, false),
    ])
    .with_bounds(Bounds::rows(5, 8, 12));

    let groups: [(&str, u32, &[&str]); 6] = [
        (
            "DOCUMENTACION DEL EQUIPO",
            11,
            &[
                "TARJETA DE PROPIEDAD",
                "SOAT VIGENTE",
                "REVISION TECNICO MECANICA VIGENTE (SI APLICA)",
            ],
        ),
        (
            "LUCES",
            14,
            &[
                "FAROLA IZQUIERDA",
                "FAROLA DERECHA",
                "EXPLORADORAS",
                "DIRECCIONAL FRONTAL IZQUIERDO",
                "DIRECCIONAL FRONTAL DERECHO",
                "DIRECCIONAL TRASERO IZQUIERDO",
                "DIRECCIONAL TRASERO DERECHO",
                "FRENOS",
                "TERCER STOP",
                "RETROCESO",
                "PARQUEO O ESTACIONAMIENTO",
                "CABIANA INTERIOR",
                "TABLERO DE INSTRUMENTOS",
            ],
        ),
        (
            "NEUMATICOS",
            27,
            &[
                "FRONTAL IZQUIERDA",
                "FRONTAL DERECHA",
                "TRASERA IZQUIERDA",
                "TRASERA DERECHA",
                "REPUESTO",
            ],
        ),
        (
            "VIDRIOS",
            32,
            &[
                "PANORAMICO",
                "TRASERO",
                "LATERAL IZQUIERDO  DELANTERO",
                "LATERAL IZQUIERDO  TRASERO",
                "LATERAL DERECHO DELANTERO",
                "LATERAL DERECHO TRASERO",
            ],
        ),
        (
            "ESPEJOS",
            38,
            &[
                "LATERAL IZQUIERDO",
                "LATERAL DERECHO",
                "LUNAS",
                "FRONTAL INTERIOR CABINA",
            ],
        ),
        (
            "GENERAL",
            42,
            &[
                "BRAZO MECANICO LIMPIA PARABRISAS",
                "PLUMILLAS O CUCHILLAS LIMPIA PARABRISAS",
                "TAPA COMBUSTIBLE",
                "COJINERIA",
                "PINTURA",
                "PITO",
                "AIRE ACONDICIONADO",
                "RADIO",
                "ELEVAVIDRIOS DELANTEROS",
                "ELEVAVIDRIOS TRASEROS",
                "FRENOS",
                "FRENO DE MANO",
                "GATO",
                "CONOS",
                "EXTINTOR",
                "CRUCETA",
                "LINTERNA DE BATERIAS",
                "BOTIQUIN",
                "CINTURONES DE SEGURIDAD",
            ],
        ),
    ];

    let layout = ChecklistLayout {
        id_prefix: "",
        option_cols: [6, 7, 8],
        obs_col: 9,
    };
    let mut checklist_fields = Vec::new();
    for (group, first_row, items) in groups {
        layout.rows(&mut checklist_fields, first_row, items, Some(group));
    }
    let checklist = Section::new("checklist", SectionKind::Checklist, "Inspección del Vehículo")
        .with_fields(checklist_fields)
        .with_bounds(Bounds {
            start_row: 11,
            end_row: 60,
            start_col: 2,
            end_col: 12,
        });

    vec![basic_info, checklist, observations(63, Bounds::rows(62, 63, 12))]
}

pub(super) fn grua() -> Vec<Section> {
    use FieldType::{Date, Number, Text};

    let basic_info = Section::new(
        "basic_info",
        SectionKind::BasicInfo,
        "Información Básica del Equipo",
    )
    .with_fields(vec![
        basic("REALIZADO POR", Text, 6, 1, true),
        basic("CARGO", Text, 7, 1, true),
        basic("KILOMETRAJE ACTUAL", Number, 8, 1, true),
        basic("PLACA", Text, 7, 8, true),
        basic("ULTIMO CAMBIO DE ACEITE FECHA", Date, 8, 8, false),
        basic("MARCA", Text, 6, 9, true),
        basic("MODELO", Text, 7, 9, true),
        basic("LINEA", Text, 6, 16, true),
        basic("FECHA", Date, 7, 16, true),
        basic("KILOMETRAJE CAMBIO DE ACEITE", Number, 8, 15, false),
    ])
    .with_bounds(Bounds::rows(6, 8, 16));

    let left_groups: [(&str, u32, &[&str]); 4] = [
        (
            "DOCUMENTACION DEL EQUIPO",
            11,
            &[
                "PERMISO DE CIRCULACION AL DIA",
                "REVISION TECNOMECANICA AL DIA",
                "SOAT VIGENTE",
            ],
        ),
        (
            "LUCES",
            17,
            &[
                "ALTAS",
                "BAJAS",
                "RETROCESO",
                "LATERAL DERECHA DELANTERA",
                "LATERAL IZQUIERDA DELANTERA",
                "LATERAL DERECHA TRASERA",
                "LATERAL IZQUIERDA TRASERA",
                "FRENO",
                "ESTACIONAMIENTO",
                "CABINA INTERIOR",
                "EMERGENCIA",
            ],
        ),
        (
            "NEUMATICOS",
            31,
            &[
                "DELANTERO IZQUIERDO",
                "DELANTERO DERECHO",
                "TRASERO INTERNO DERECHO",
                "TRASERO INTERNO IZQUIERDO",
                "TRASERO DERECHO",
                "TRASERO IZQUIERDO",
                "REPUESTOS",
            ],
        ),
        (
            "ESPEJOS",
            43,
            &["LATERAL IZQUIERDO", "LATERAL DERECHO", "FRONTAL CABINA"],
        ),
    ];
    let right_groups: [(&str, u32, &[&str]); 4] = [
        (
            "OPERADOR",
            11,
            &["LICENCIA MUNICIPAL", "CURSO DE OPERADOR", "LICENCIA INTERNA"],
        ),
        (
            "ACCESORIO Y SEGURIDAD",
            17,
            &[
                "EXTINTOR",
                "BOTIQUIN",
                "CONOS",
                "BOCINA",
                "SIRENA",
                "ESCALERAS",
                "INDICADOR DE CAPACIDAD",
                "CORTACORRIENTES",
                "SISTEMA DE COMUNICACIÓN O RADIO",
            ],
        ),
        (
            "GENERAL",
            31,
            &[
                "ESTABILIZADORES",
                "BRAZO GIRATORIO",
                "ESCALERA DE ACCESO",
                "SISTEMA OPERACIONAL",
                "CANASTA",
                "POLEAS",
                "CABLES",
                "GANCHOS",
                "SEGURO GANCHOS",
            ],
        ),
        (
            "VIDRIOS",
            43,
            &["PARABRISAS", "IZQUIERDO", "DERECHO", "LUNETAS", "TRASERO"],
        ),
    ];

    let left = ChecklistLayout {
        id_prefix: "left_",
        option_cols: [4, 5, 6],
        obs_col: 8,
    };
    let mut left_fields = Vec::new();
    for (group, first_row, items) in left_groups {
        left.rows(&mut left_fields, first_row, items, Some(group));
    }

    let right = ChecklistLayout {
        id_prefix: "right_",
        option_cols: [12, 13, 14],
        obs_col: 16,
    };
    let mut right_fields = Vec::new();
    for (group, first_row, items) in right_groups {
        right.rows(&mut right_fields, first_row, items, Some(group));
    }

    // One inspector signature, stamped next to every checklist block
    let signature = Field::new(
        "sig_G11",
        "Firma (se aplicará a todos los espacios)",
        FieldType::Signature,
        CellAddr::new(11, 7),
    )
    .required()
    .with_behavior(FieldBehavior::Replicate {
        plan: ReplicatePlan::Uniform {
            column: 7,
            rows: vec![11, 17, 31, 43],
            span: Span::new(3, 1),
        },
    });

    vec![
        basic_info,
        Section::new("checklist_left", SectionKind::Checklist, "Inspección - Parte 1")
            .with_fields(left_fields)
            .with_bounds(Bounds {
                start_row: 11,
                end_row: 45,
                start_col: 1,
                end_col: 8,
            }),
        Section::new("checklist_right", SectionKind::Checklist, "Inspección - Parte 2")
            .with_fields(right_fields)
            .with_bounds(Bounds {
                start_row: 11,
                end_row: 47,
                start_col: 9,
                end_col: 16,
            }),
        Section::new("signatures", SectionKind::Signatures, "Firma del Inspector")
            .with_fields(vec![signature])
            .with_bounds(Bounds::rows(48, 48, 16)),
    ]
}
