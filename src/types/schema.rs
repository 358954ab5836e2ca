use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cell_ref::{CellAddr, Span};

/// Kind of a detected or hand-authored section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Header,
    BasicInfo,
    Checklist,
    Signatures,
    Observations,
    Table,
    WorkerList,
}

/// Input type of a field, which selects its write rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Time,
    Textarea,
    Checkbox,
    Radio,
    Select,
    Signature,
}

/// Inclusive row/column rectangle, used for step grouping only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub start_row: u32,
    pub end_row: u32,
    pub start_col: u32,
    pub end_col: u32,
}

impl Bounds {
    pub fn rows(start_row: u32, end_row: u32, cols: u32) -> Self {
        Self {
            start_row,
            end_row,
            start_col: 1,
            end_col: cols.max(1),
        }
    }
}

/// One physical placement of a replicated signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementTarget {
    pub cell: CellAddr,
    #[serde(default)]
    pub span: Span,
}

/// Where a replicated signature goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReplicatePlan {
    /// One column, many rows, one shared span.
    Uniform {
        column: u32,
        rows: Vec<u32>,
        #[serde(default)]
        span: Span,
    },
    /// Independent anchors, each with its own span.
    Explicit { targets: Vec<PlacementTarget> },
}

impl ReplicatePlan {
    pub fn targets(&self) -> Vec<PlacementTarget> {
        match self {
            Self::Uniform { column, rows, span } => rows
                .iter()
                .map(|&row| PlacementTarget {
                    cell: CellAddr::new(row, *column),
                    span: *span,
                })
                .collect(),
            Self::Explicit { targets } => targets.clone(),
        }
    }
}

/// Type-specific write plan. A field carries at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldBehavior {
    /// Split a date into three cells.
    DecomposeDate {
        day: CellAddr,
        month: CellAddr,
        year: CellAddr,
    },
    /// Overwrite the cell with `"{label_text} {value}{suffix}"`.
    AppendToLabel {
        label_text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suffix: Option<String>,
    },
    /// Option name to the cell that receives the marker.
    RadioTargets { targets: BTreeMap<String, CellAddr> },
    Replicate { plan: ReplicatePlan },
    /// Tag the value-collection step uses to filter signatures; ignored by rendering.
    RoleFilter { role: String },
    /// Worker name/role fields: always overwrite, never append.
    ReplaceExisting,
}

/// A fillable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub cell_ref: CellAddr,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<FieldBehavior>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl Field {
    pub fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType, cell_ref: CellAddr) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type,
            cell_ref,
            required: false,
            options: Vec::new(),
            group: None,
            behavior: None,
            placeholder: None,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn with_behavior(mut self, behavior: FieldBehavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Every cell this field may write to.
    pub fn target_cells(&self) -> Vec<CellAddr> {
        let mut cells = vec![self.cell_ref];
        match &self.behavior {
            Some(FieldBehavior::DecomposeDate { day, month, year }) => {
                cells.extend([*day, *month, *year]);
            }
            Some(FieldBehavior::RadioTargets { targets }) => cells.extend(targets.values().copied()),
            Some(FieldBehavior::Replicate { plan }) => {
                for t in plan.targets() {
                    cells.push(t.cell);
                    cells.push(t.cell.offset(t.span.rows.saturating_sub(1), t.span.cols.saturating_sub(1)));
                }
            }
            _ => {}
        }
        cells
    }

    pub fn radio_targets(&self) -> Option<&BTreeMap<String, CellAddr>> {
        match &self.behavior {
            Some(FieldBehavior::RadioTargets { targets }) => Some(targets),
            _ => None,
        }
    }

    /// The option cell chosen by `choice`: an exact option name first, then
    /// one that differs only in ASCII case. Surrounding spaces are ignored.
    pub fn radio_target_for(&self, choice: &str) -> Option<CellAddr> {
        let choice = choice.trim();
        let targets = self.radio_targets()?;
        targets.get(choice).copied().or_else(|| {
            targets
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(choice))
                .map(|(_, addr)| *addr)
        })
    }

    pub fn role_filter(&self) -> Option<&str> {
        match &self.behavior {
            Some(FieldBehavior::RoleFilter { role }) => Some(role),
            _ => None,
        }
    }
}

/// A group of fields shown as one wizard step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub kind: SectionKind,
    pub title: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

impl Section {
    pub fn new(id: impl Into<String>, kind: SectionKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            fields: Vec::new(),
            bounds: None,
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// Sections detected (or registered) for one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSchema {
    pub sheet: String,
    pub sections: Vec<Section>,
}

/// Complete field schema of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSchema {
    pub template_id: String,
    pub sheets: Vec<SheetSchema>,
}

impl TemplateSchema {
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sheets
            .iter()
            .flat_map(|s| s.sections.iter())
            .flat_map(|s| s.fields.iter())
    }

    pub fn section_count(&self) -> usize {
        self.sheets.iter().map(|s| s.sections.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.section_count() == 0
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields().find(|f| f.id == id)
    }
}
